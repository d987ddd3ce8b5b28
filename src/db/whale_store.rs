use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::json_file::{self, StoreError};
use crate::models::{WhaleListing, WhaleSnapshot};

type SnapshotMap = BTreeMap<String, WhaleSnapshot>;

/// Per-address whale snapshots backed by a single JSON file.
///
/// Every upsert is a full read-merge-write of the file. Writers are
/// serialized through `write_lock`, so concurrent handlers and the poller
/// can never clobber each other's keys.
#[derive(Debug)]
pub struct WhaleStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl WhaleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the snapshot for `snapshot.whale_address`, keeping every other key.
    pub async fn upsert(&self, snapshot: WhaleSnapshot) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut all = match json_file::read_json::<SnapshotMap>(&self.path).await {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) if e.is_corrupt() => {
                let moved = json_file::quarantine(&self.path).await?;
                tracing::warn!(
                    error = %e,
                    moved_to = %moved.display(),
                    "Whale store file unreadable, starting a fresh map"
                );
                SnapshotMap::new()
            }
            Err(e) => return Err(e),
        };

        let address = snapshot.whale_address.clone();
        all.insert(address.clone(), snapshot);
        json_file::write_json(&self.path, &all).await?;

        tracing::debug!(
            address = %address,
            tracked = all.len(),
            path = %self.path.display(),
            "Whale snapshot saved"
        );

        Ok(())
    }

    /// Latest snapshot for `address`. Unreadable storage reads as not found.
    pub async fn get(&self, address: &str) -> Option<WhaleSnapshot> {
        self.load().await.remove(address)
    }

    /// One listing row per known address.
    pub async fn list(&self) -> Vec<WhaleListing> {
        self.load().await.values().map(WhaleListing::from).collect()
    }

    async fn load(&self) -> SnapshotMap {
        match json_file::read_json::<SnapshotMap>(&self.path).await {
            Ok(map) => map.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read whale store, treating as empty");
                SnapshotMap::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Transaction};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn snapshot(address: &str, amounts: &[i64], summary: &str) -> WhaleSnapshot {
        WhaleSnapshot {
            whale_address: address.to_string(),
            transactions: amounts
                .iter()
                .enumerate()
                .map(|(i, a)| Transaction {
                    id: format!("whale-tx-1-{i}"),
                    direction: Direction::Buy,
                    amount: Decimal::from(*a),
                    token: "USDC".into(),
                    timestamp: Utc::now(),
                    tx_hash: format!("0x{i}"),
                    counterparty: None,
                })
                .collect(),
            summary: summary.to_string(),
            last_updated: Utc::now(),
        }
    }

    fn store() -> (tempfile::TempDir, WhaleStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = WhaleStore::new(dir.path().join("whales.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_upsert_does_not_clobber_other_keys() {
        let (_dir, store) = store();
        store.upsert(snapshot("0xA", &[10], "a")).await.unwrap();
        store.upsert(snapshot("0xB", &[20], "b")).await.unwrap();

        let listing = store.list().await;
        assert_eq!(listing.len(), 2);
        assert_eq!(store.get("0xA").await.unwrap().summary, "a");
        assert_eq!(store.get("0xB").await.unwrap().summary, "b");
    }

    #[tokio::test]
    async fn test_second_upsert_replaces_not_merges() {
        let (_dir, store) = store();
        store.upsert(snapshot("0xA", &[1, 2, 3], "first")).await.unwrap();
        store.upsert(snapshot("0xA", &[9], "second")).await.unwrap();

        let got = store.get("0xA").await.unwrap();
        assert_eq!(got.summary, "second");
        assert_eq!(got.transactions.len(), 1);
        assert_eq!(got.transactions[0].amount, Decimal::from(9));
    }

    #[tokio::test]
    async fn test_unknown_address_and_missing_file() {
        let (_dir, store) = store();
        assert!(store.get("0xNope").await.is_none());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_degrades_and_recovers() {
        let (dir, store) = store();
        tokio::fs::write(store.path(), "{{{{").await.unwrap();

        assert!(store.list().await.is_empty());
        assert!(store.get("0xA").await.is_none());

        store.upsert(snapshot("0xA", &[5], "fresh")).await.unwrap();
        assert_eq!(store.list().await.len(), 1);

        // The unreadable original is kept next to the store
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut quarantined = 0;
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry.file_name().to_string_lossy().contains(".corrupt-") {
                quarantined += 1;
            }
        }
        assert_eq!(quarantined, 1);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_every_key() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(snapshot(&format!("0x{i:02}"), &[i], "s"))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.list().await.len(), 16);
    }
}
