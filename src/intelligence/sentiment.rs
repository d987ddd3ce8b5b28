use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{Signal, TokenSentiment};

pub const BUY_KEYWORDS: &[&str] = &["buy", "bullish", "moon"];
pub const SELL_KEYWORDS: &[&str] = &["sell", "bearish", "dump"];

/// Keyword classification of a whole message. Buy keywords win when both
/// sets match.
pub fn classify_text(text: &str) -> Signal {
    let lower = text.to_lowercase();

    if BUY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Signal::Buy
    } else if SELL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

/// Watched symbols appearing anywhere in the text (case-insensitive substring).
pub fn mentioned_tokens<'a>(text: &str, watched: &'a [String]) -> Vec<&'a str> {
    let upper = text.to_uppercase();
    watched
        .iter()
        .map(String::as_str)
        .filter(|token| !token.is_empty() && upper.contains(&token.to_uppercase()))
        .collect()
}

/// One `(token, signal)` pair per watched token the message mentions.
pub fn classify_message(text: &str, watched: &[String]) -> Vec<(String, Signal)> {
    let tokens = mentioned_tokens(text, watched);
    if tokens.is_empty() {
        return Vec::new();
    }

    let signal = classify_text(text);
    tokens
        .into_iter()
        .map(|t| (t.to_uppercase(), signal))
        .collect()
}

/// Per-token rolling counters. Counters only ever grow until `clear`.
#[derive(Debug, Clone, Default)]
pub struct SentimentAggregator {
    tokens: BTreeMap<String, TokenSentiment>,
}

impl SentimentAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries. Labels are recomputed rather than trusted.
    pub fn from_entries(entries: impl IntoIterator<Item = TokenSentiment>) -> Self {
        let mut tokens = BTreeMap::new();
        for mut entry in entries {
            entry.token = entry.token.to_uppercase();
            entry.label = crate::models::SentimentLabel::from_counts(entry.buy_count, entry.sell_count);
            tokens.insert(entry.token.clone(), entry);
        }
        Self { tokens }
    }

    pub fn record(&mut self, token: &str, signal: Signal, at: DateTime<Utc>) -> &TokenSentiment {
        let entry = self.entry(token, at);
        entry.record(signal, at);
        entry
    }

    /// Classify `text` and fold it into every mentioned token. Returns the
    /// tokens that changed.
    pub fn apply(&mut self, text: &str, watched: &[String], at: DateTime<Utc>) -> Vec<String> {
        let classified = classify_message(text, watched);
        for (token, signal) in &classified {
            self.record(token, *signal, at);
        }
        classified.into_iter().map(|(token, _)| token).collect()
    }

    /// Additive update used by the synthetic ticker.
    pub fn nudge(&mut self, token: &str, buys: u64, sells: u64, neutral: u64, at: DateTime<Utc>) {
        self.entry(token, at).add(buys, sells, neutral, at);
    }

    /// Insert `seed` only when the token has never been seen.
    pub fn seed(&mut self, seed: TokenSentiment) -> bool {
        let key = seed.token.to_uppercase();
        if self.tokens.contains_key(&key) {
            return false;
        }
        let mut seed = seed;
        seed.token = key.clone();
        self.tokens.insert(key, seed);
        true
    }

    pub fn get(&self, token: &str) -> Option<&TokenSentiment> {
        self.tokens.get(&token.to_uppercase())
    }

    /// Read that lazily creates a zero-state entry for unknown tokens.
    pub fn get_or_create(&mut self, token: &str, at: DateTime<Utc>) -> TokenSentiment {
        self.entry(token, at).clone()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains_key(&token.to_uppercase())
    }

    pub fn tokens(&self) -> &BTreeMap<String, TokenSentiment> {
        &self.tokens
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    fn entry(&mut self, token: &str, at: DateTime<Utc>) -> &mut TokenSentiment {
        let key = token.to_uppercase();
        self.tokens
            .entry(key.clone())
            .or_insert_with(|| TokenSentiment::zero(&key, at))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
