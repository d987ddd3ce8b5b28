use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Transaction;

/// Summary of the significant transfers found for one watched address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleReport {
    pub transactions: Vec<Transaction>,
    pub buy_count: usize,
    pub sell_count: usize,
    pub total_buy_volume: Decimal,
    pub total_sell_volume: Decimal,
    pub summary: String,
}

impl WhaleReport {
    pub fn buys(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| tx.is_buy())
    }

    pub fn sells(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| tx.is_sell())
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Keep only transactions strictly above `threshold`, in their original order.
/// A transaction exactly at the threshold is dropped.
pub fn filter_by_threshold(txs: Vec<Transaction>, threshold: Decimal) -> Vec<Transaction> {
    txs.into_iter().filter(|tx| tx.amount > threshold).collect()
}

/// Split into buys and sells, total the volumes, and render the summary line.
pub fn aggregate(txs: Vec<Transaction>, threshold: Decimal, token: &str) -> WhaleReport {
    let (mut buy_count, mut sell_count) = (0usize, 0usize);
    let (mut total_buy_volume, mut total_sell_volume) = (Decimal::ZERO, Decimal::ZERO);

    for tx in &txs {
        if tx.is_sell() {
            sell_count += 1;
            total_sell_volume += tx.amount;
        } else {
            buy_count += 1;
            total_buy_volume += tx.amount;
        }
    }

    let summary = if txs.is_empty() {
        format!("No {token} transactions > {} {token} detected", threshold.normalize())
    } else {
        format!(
            "Found {buy_count} buys ({total_buy_volume:.2} {token}) and {sell_count} sells ({total_sell_volume:.2} {token}) exceeding {} {token}",
            threshold.normalize(),
        )
    };

    WhaleReport {
        transactions: txs,
        buy_count,
        sell_count,
        total_buy_volume,
        total_sell_volume,
        summary,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
