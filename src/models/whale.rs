use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Transaction;

/// Latest full aggregation result for one watched address.
///
/// A new poll replaces the previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleSnapshot {
    pub whale_address: String,
    /// Most recent first.
    pub transactions: Vec<Transaction>,
    pub summary: String,
    pub last_updated: DateTime<Utc>,
}

/// Lightweight row returned when listing every tracked whale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleListing {
    pub address: String,
    pub last_updated: DateTime<Utc>,
    pub summary: String,
}

impl From<&WhaleSnapshot> for WhaleListing {
    fn from(snapshot: &WhaleSnapshot) -> Self {
        Self {
            address: snapshot.whale_address.clone(),
            last_updated: snapshot.last_updated,
            summary: snapshot.summary.clone(),
        }
    }
}
