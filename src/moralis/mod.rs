pub mod client;
pub mod types;

pub use client::{FetchError, MoralisClient};
pub use types::{RawTransfer, TransferPage};

use async_trait::async_trait;

/// Parameters for one transfer lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferQuery {
    pub address: String,
    pub token_contract: String,
    pub chain: String,
    pub limit: u32,
}

/// Upstream source of raw ERC-20 transfer records.
///
/// Implementations may fail for network, auth, or rate-limit reasons; the
/// caller is expected to fall back to synthetic data.
#[async_trait]
pub trait TransferSource: Send + Sync {
    async fn fetch_transfers(&self, query: &TransferQuery) -> Result<Vec<RawTransfer>, FetchError>;
}
