pub mod json_file;
pub mod sentiment_store;
pub mod whale_store;

pub use json_file::StoreError;
pub use sentiment_store::SentimentStore;
pub use whale_store::WhaleStore;

use std::path::{Path, PathBuf};

pub const WHALE_FILE: &str = "whale_transactions.json";
pub const SENTIMENT_FILE: &str = "sentiment_data.json";

/// Make sure the data directory exists and return the two snapshot paths.
pub async fn init_data_dir(data_dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    tokio::fs::create_dir_all(data_dir).await?;

    // Verify the directory is usable
    let metadata = tokio::fs::metadata(data_dir).await?;
    if !metadata.is_dir() {
        anyhow::bail!("DATA_DIR {} is not a directory", data_dir.display());
    }

    Ok((data_dir.join(WHALE_FILE), data_dir.join(SENTIMENT_FILE)))
}
