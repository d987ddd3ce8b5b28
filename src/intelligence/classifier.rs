use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{Direction, Transaction};
use crate::moralis::RawTransfer;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMALS: u32 = 28;

/// Everything classification needs besides the transfer itself.
#[derive(Debug, Clone)]
pub struct ClassifyContext {
    pub token_symbol: String,
    /// Used when the record does not carry its own decimals.
    pub default_decimals: u32,
    /// Batch clock: fallback timestamp and id prefix.
    pub now: DateTime<Utc>,
}

impl ClassifyContext {
    pub fn new(token_symbol: impl Into<String>, default_decimals: u32) -> Self {
        Self {
            token_symbol: token_symbol.into(),
            default_decimals,
            now: Utc::now(),
        }
    }
}

/// Turn one raw transfer into a directional transaction relative to `watched`.
///
/// A missing sender or receiver is treated as an empty address. An empty
/// sender can never match the watched address, so such records come out as
/// buys.
pub fn classify_transfer(
    raw: &RawTransfer,
    watched: &str,
    ctx: &ClassifyContext,
    index: usize,
) -> Transaction {
    let from = raw.from_address.as_deref().unwrap_or("");
    let to = raw.to_address.as_deref().unwrap_or("");

    let direction = Direction::relative_to(from, watched);
    let counterparty = match direction {
        Direction::Sell => to,
        Direction::Buy => from,
    };

    let decimals = raw.token_decimals.unwrap_or(ctx.default_decimals);
    let raw_value = raw.value.as_deref().unwrap_or("0");
    let amount = normalize_amount(raw_value, decimals).unwrap_or_else(|| {
        tracing::debug!(value = %raw_value, decimals, "Unparsable transfer value, using zero");
        Decimal::ZERO
    });

    let timestamp = raw
        .block_timestamp
        .as_deref()
        .and_then(parse_block_timestamp)
        .unwrap_or(ctx.now);

    let millis = ctx.now.timestamp_millis();
    let tx_hash = raw
        .transaction_hash
        .clone()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| format!("unknown-{millis}"));

    Transaction {
        id: format!("whale-tx-{millis}-{index}"),
        direction,
        amount,
        token: ctx.token_symbol.clone(),
        timestamp,
        tx_hash,
        counterparty: (!counterparty.is_empty()).then(|| counterparty.to_string()),
    }
}

/// Classify a whole fetch result, preserving upstream order.
pub fn classify_batch(
    transfers: &[RawTransfer],
    watched: &str,
    ctx: &ClassifyContext,
) -> Vec<Transaction> {
    transfers
        .iter()
        .enumerate()
        .map(|(i, raw)| classify_transfer(raw, watched, ctx, i))
        .collect()
}

/// `raw / 10^decimals`, rounded to cents. `None` for negative or unparsable input.
///
/// Plain integer strings are scaled as text, so raw values wider than a
/// `Decimal` (18-decimal tokens above ~79 billion units) still normalize.
pub fn normalize_amount(raw: &str, decimals: u32) -> Option<Decimal> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return scale_digits(raw, decimals as usize);
    }

    if decimals > MAX_DECIMALS {
        return None;
    }

    let value = Decimal::from_str(raw).ok()?;
    if value.is_sign_negative() {
        return None;
    }

    let unit = Decimal::from_i128_with_scale(1, decimals);
    value.checked_mul(unit).map(|v| v.round_dp(2))
}

/// Move the decimal point of an unsigned digit string `decimals` places left.
///
/// Only three fractional digits are kept, plus a trailing `1` when anything
/// non-zero was cut off, which is exactly what rounding to cents looks at.
fn scale_digits(digits: &str, decimals: usize) -> Option<Decimal> {
    let digits = digits.trim_start_matches('0');
    let split = digits.len().saturating_sub(decimals);
    let (int_part, frac_part) = digits.split_at(split);
    let int_part = if int_part.is_empty() { "0" } else { int_part };

    // Leading zeros the fraction needs to span `decimals` places
    let pad = decimals - frac_part.len();
    let mut frac: String = std::iter::repeat('0')
        .take(pad)
        .chain(frac_part.chars())
        .take(3)
        .collect();
    let kept = 3usize.saturating_sub(pad).min(frac_part.len());
    if frac_part[kept..].bytes().any(|b| b != b'0') {
        frac.push('1');
    }

    let value = if frac.is_empty() {
        Decimal::from_str(int_part).ok()?
    } else {
        Decimal::from_str(&format!("{int_part}.{frac}"))
            .or_else(|_| Decimal::from_str(int_part))
            .ok()?
    };
    Some(value.round_dp(2))
}

/// Accepts RFC 3339 strings and unix seconds or milliseconds.
fn parse_block_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = ts.parse::<i64>() {
        // If >1e12, it's milliseconds
        if secs > 1_000_000_000_000 {
            return DateTime::from_timestamp(secs / 1000, ((secs % 1000) * 1_000_000) as u32);
        }
        return DateTime::from_timestamp(secs, 0);
    }
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
