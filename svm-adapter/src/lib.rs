//! Solana (SVM) chain adapter: ingests gateway events, tracks their confirmation depth and
//! assembles TSS-authorized outbound transactions for the universal cross-chain client.
//!
//! See `DESIGN.md` at the workspace root for how each module here is grounded.

pub mod chain_id;
pub mod client;
pub mod confirmer;
pub mod config;
pub mod db;
pub mod decoder;
pub mod errors;
pub mod event;
pub mod event_parser;
pub mod listener;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod outbound;
pub mod relayer_key;
pub mod reorg;
pub mod rpc_pool;
pub mod tracker;

pub use errors::SvmAdapterError;
