#[macro_use]
mod macros;

pub mod error;
pub mod jsonrpsee;
pub mod responses;
pub mod traits;
pub mod types;

pub use jsonrpsee::SolanaClient;
pub use traits::SolanaApi;
