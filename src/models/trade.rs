use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// A classified, normalized token transfer for one watched address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub direction: Direction,
    /// Token units (raw value already divided by 10^decimals).
    pub amount: Decimal,
    pub token: String,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl Transaction {
    pub fn is_buy(&self) -> bool {
        self.direction == Direction::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.direction == Direction::Sell
    }
}
