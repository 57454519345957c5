//! Solana primitive types shared between the RPC client and the chain adapter:
//! base58 addresses/signatures/digests and program-derived-address math.

pub mod address;
pub mod consts;
pub mod digest;
pub mod pda;
pub mod signature;

pub use address::Address;
pub use digest::Digest;
pub use signature::Signature;
