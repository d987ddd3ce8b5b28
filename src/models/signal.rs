use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-message trading signal extracted from chat text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

/// Overall sentiment derived from the buy/sell ratio of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    /// `buys / (buys + sells)` above 0.6 is positive, below 0.4 negative.
    /// With no buys or sells at all the label stays neutral.
    pub fn from_counts(buys: u64, sells: u64) -> Self {
        let total = buys + sells;
        if total == 0 {
            return SentimentLabel::Neutral;
        }

        let ratio = Decimal::from(buys) / Decimal::from(total);

        if ratio > Decimal::new(60, 2) {
            SentimentLabel::Positive
        } else if ratio < Decimal::new(40, 2) {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolling sentiment counters for one token symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSentiment {
    pub token: String,
    pub buy_count: u64,
    pub sell_count: u64,
    pub neutral_count: u64,
    pub label: SentimentLabel,
    pub last_update: DateTime<Utc>,
}

impl TokenSentiment {
    pub fn zero(token: &str, at: DateTime<Utc>) -> Self {
        Self {
            token: token.to_string(),
            buy_count: 0,
            sell_count: 0,
            neutral_count: 0,
            label: SentimentLabel::Neutral,
            last_update: at,
        }
    }

    /// Increment the counter matching `signal` and refresh the label.
    pub fn record(&mut self, signal: Signal, at: DateTime<Utc>) {
        match signal {
            Signal::Buy => self.buy_count += 1,
            Signal::Sell => self.sell_count += 1,
            Signal::Neutral => self.neutral_count += 1,
        }
        self.touch(at);
    }

    /// Add to all three counters at once and refresh the label.
    pub fn add(&mut self, buys: u64, sells: u64, neutral: u64, at: DateTime<Utc>) {
        self.buy_count += buys;
        self.sell_count += sells;
        self.neutral_count += neutral;
        self.touch(at);
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.label = SentimentLabel::from_counts(self.buy_count, self.sell_count);
        self.last_update = at;
    }
}
