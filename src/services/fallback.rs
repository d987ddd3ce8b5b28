use chrono::{Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use crate::intelligence::{aggregate, WhaleReport};
use crate::models::{Direction, SentimentLabel, TokenSentiment, Transaction};

/// Summary used when the whole tracking run fails, not just the fetch.
pub const ERROR_SUMMARY: &str = "Mock data used due to error in processing";

/// The single place that decides what synthetic data looks like when an
/// upstream collaborator is unavailable.
#[derive(Debug, Clone)]
pub struct DegradedMode {
    token_symbol: String,
}

impl DegradedMode {
    pub fn new(token_symbol: impl Into<String>) -> Self {
        Self {
            token_symbol: token_symbol.into(),
        }
    }

    /// One whale-sized buy an hour ago.
    pub fn mock_transactions(&self) -> Vec<Transaction> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();

        // 1,000,000.00 - 1,499,999.99
        let cents: i64 = rng.gen_range(100_000_000..150_000_000);
        let hash: u64 = rng.gen();

        vec![Transaction {
            id: format!("whale-tx-{}-1", now.timestamp_millis()),
            direction: Direction::Buy,
            amount: Decimal::new(cents, 2),
            token: self.token_symbol.clone(),
            timestamp: now - Duration::hours(1),
            tx_hash: format!("0x{hash:016x}"),
            counterparty: None,
        }]
    }

    /// Mock transactions run through the normal aggregation, so the summary
    /// keeps its usual shape. The threshold filter is not applied.
    pub fn mock_report(&self, threshold: Decimal) -> WhaleReport {
        aggregate(self.mock_transactions(), threshold, &self.token_symbol)
    }

    pub fn error_summary(&self) -> &'static str {
        ERROR_SUMMARY
    }

    /// Mock transactions with the processing-error summary.
    pub fn error_report(&self) -> WhaleReport {
        let mut report = aggregate(self.mock_transactions(), Decimal::ZERO, &self.token_symbol);
        report.summary = self.error_summary().to_string();
        report
    }

    /// Plausible starting counters for a token nobody has talked about yet.
    pub fn mock_sentiment(&self, token: &str) -> TokenSentiment {
        let mut rng = rand::thread_rng();
        let buys: u64 = rng.gen_range(5..15);
        let sells: u64 = rng.gen_range(1..8);
        let neutral: u64 = rng.gen_range(3..8);

        TokenSentiment {
            token: token.to_uppercase(),
            buy_count: buys,
            sell_count: sells,
            neutral_count: neutral,
            label: SentimentLabel::from_counts(buys, sells),
            last_update: Utc::now(),
        }
    }

    /// Small `(buys, sells, neutral)` increments for the synthetic ticker.
    pub fn nudge(&self) -> (u64, u64, u64) {
        let mut rng = rand::thread_rng();
        (rng.gen_range(0..3), rng.gen_range(0..2), rng.gen_range(0..2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transactions_shape() {
        let fallback = DegradedMode::new("USDC");
        for _ in 0..50 {
            let txs = fallback.mock_transactions();
            assert_eq!(txs.len(), 1);
            let tx = &txs[0];
            assert_eq!(tx.direction, Direction::Buy);
            assert_eq!(tx.token, "USDC");
            assert!(tx.amount >= Decimal::from(1_000_000));
            assert!(tx.amount < Decimal::from(1_500_000));
            assert!(tx.tx_hash.starts_with("0x"));
            assert!(tx.timestamp < Utc::now());
        }
    }

    #[test]
    fn test_mock_report_uses_normal_summary() {
        let report = DegradedMode::new("USDC").mock_report(Decimal::from(5_000_000));
        // Not filtered even though the threshold is higher than any mock amount
        assert_eq!(report.buy_count, 1);
        assert!(report.summary.starts_with("Found 1 buys ("));
        assert!(report.summary.ends_with("exceeding 5000000 USDC"));
    }

    #[test]
    fn test_error_report_summary() {
        let report = DegradedMode::new("USDC").error_report();
        assert_eq!(report.summary, ERROR_SUMMARY);
        assert_eq!(report.transactions.len(), 1);
    }

    #[test]
    fn test_mock_sentiment_label_is_consistent() {
        let fallback = DegradedMode::new("USDC");
        for _ in 0..50 {
            let s = fallback.mock_sentiment("arb");
            assert_eq!(s.token, "ARB");
            assert!((5..15).contains(&s.buy_count));
            assert!((1..8).contains(&s.sell_count));
            assert!((3..8).contains(&s.neutral_count));
            assert_eq!(s.label, SentimentLabel::from_counts(s.buy_count, s.sell_count));
        }
    }

    #[test]
    fn test_nudge_bounds() {
        let fallback = DegradedMode::new("USDC");
        for _ in 0..50 {
            let (b, s, n) = fallback.nudge();
            assert!(b < 3 && s < 2 && n < 2);
        }
    }
}
