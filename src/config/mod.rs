use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_WHALE_ADDRESS: &str = "0x2Df1c51E09aECF9cacB7bc98cB1742757f163dF7";
const SECOND_WHALE_ADDRESS: &str = "0xf89d7b9c864f589bbF53a82105107622B35EaA40";
/// USDC on Arbitrum.
const DEFAULT_TOKEN_CONTRACT: &str = "0xaf88d065e77c8cC2239327C5EDb3A432268e5831";
/// Arbitrum mainnet chain ID.
const DEFAULT_CHAIN: &str = "0xa4b1";
const DEFAULT_SENTIMENT_TOKENS: &str = "ETH,BTC,ARB,SOL,AVAX";

/// A watched address and the minimum transfer size worth reporting for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedWhale {
    pub address: String,
    pub threshold: Decimal,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,

    // Transfer source
    pub moralis_api_key: Option<String>,
    pub moralis_base_url: Option<String>,
    pub fetch_limit: u32,
    pub fetch_timeout_secs: u64,

    // Token being tracked
    pub token_contract: String,
    pub token_symbol: String,
    pub token_decimals: u32,
    pub chain: String,

    // Whale polling
    pub default_whale_address: String,
    pub default_threshold: Decimal,
    pub watched_whales: Vec<WatchedWhale>,
    pub whale_poll_interval_secs: u64,

    // Sentiment
    pub sentiment_tokens: Vec<String>,
    pub sentiment_tick_interval_secs: u64,
    pub message_window: usize,
    pub telegram_bot_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let default_threshold: Decimal = env::var("DEFAULT_THRESHOLD")
            .unwrap_or_else(|_| "1000000".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("DEFAULT_THRESHOLD is not a decimal: {e}"))?;

        let default_whale_address =
            env::var("DEFAULT_WHALE_ADDRESS").unwrap_or_else(|_| DEFAULT_WHALE_ADDRESS.into());

        let watched_whales = match env::var("WATCHED_WHALES") {
            Ok(raw) if !raw.trim().is_empty() => parse_watched_whales(&raw, default_threshold)?,
            _ => vec![
                WatchedWhale {
                    address: default_whale_address.clone(),
                    threshold: default_threshold,
                },
                WatchedWhale {
                    address: SECOND_WHALE_ADDRESS.into(),
                    threshold: Decimal::from(1_000),
                },
            ],
        };

        let sentiment_tokens = parse_token_list(
            &env::var("SENTIMENT_TOKENS").unwrap_or_else(|_| DEFAULT_SENTIMENT_TOKENS.into()),
        );

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),

            moralis_api_key: env::var("MORALIS_API_KEY").ok().filter(|k| !k.is_empty()),
            moralis_base_url: env::var("MORALIS_BASE_URL").ok().filter(|u| !u.is_empty()),
            fetch_limit: parse_or("FETCH_LIMIT", 30),
            fetch_timeout_secs: parse_or("FETCH_TIMEOUT_SECS", 10),

            token_contract: env::var("TOKEN_CONTRACT")
                .unwrap_or_else(|_| DEFAULT_TOKEN_CONTRACT.into()),
            token_symbol: env::var("TOKEN_SYMBOL").unwrap_or_else(|_| "USDC".into()),
            token_decimals: parse_or("TOKEN_DECIMALS", 6),
            chain: env::var("CHAIN").unwrap_or_else(|_| DEFAULT_CHAIN.into()),

            default_whale_address,
            default_threshold,
            watched_whales,
            whale_poll_interval_secs: parse_or("WHALE_POLL_INTERVAL_SECS", 300),

            sentiment_tokens,
            sentiment_tick_interval_secs: parse_or("SENTIMENT_TICK_INTERVAL_SECS", 30),
            message_window: parse_or("MESSAGE_WINDOW", 100),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// `0xabc:1000000,0xdef:1000,0x123`: entries without a threshold use `default`.
pub fn parse_watched_whales(raw: &str, default: Decimal) -> anyhow::Result<Vec<WatchedWhale>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (address, threshold) = match entry.split_once(':') {
                Some((addr, t)) => {
                    let threshold = Decimal::from_str(t.trim())
                        .map_err(|e| anyhow::anyhow!("invalid threshold in WATCHED_WHALES entry {entry:?}: {e}"))?;
                    (addr.trim(), threshold)
                }
                None => (entry, default),
            };
            if address.is_empty() {
                anyhow::bail!("empty address in WATCHED_WHALES entry {entry:?}");
            }
            if threshold.is_sign_negative() {
                anyhow::bail!("negative threshold in WATCHED_WHALES entry {entry:?}");
            }
            Ok(WatchedWhale {
                address: address.to_string(),
                threshold,
            })
        })
        .collect()
}

/// Comma separated symbols, upper-cased and deduplicated in order.
pub fn parse_token_list(raw: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for t in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !t.is_empty() && !tokens.contains(&t) {
            tokens.push(t);
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watched_whales() {
        let whales = parse_watched_whales(" 0xA:1000000 , 0xB:1000,0xC ", Decimal::from(7)).unwrap();
        assert_eq!(whales.len(), 3);
        assert_eq!(whales[0].address, "0xA");
        assert_eq!(whales[0].threshold, Decimal::from(1_000_000));
        assert_eq!(whales[1].threshold, Decimal::from(1_000));
        assert_eq!(whales[2].threshold, Decimal::from(7));
    }

    #[test]
    fn test_parse_watched_whales_rejects_garbage() {
        assert!(parse_watched_whales("0xA:lots", Decimal::ONE).is_err());
        assert!(parse_watched_whales(":100", Decimal::ONE).is_err());
        assert!(parse_watched_whales("0xA:-5", Decimal::ONE).is_err());
    }

    #[test]
    fn test_parse_token_list() {
        assert_eq!(parse_token_list("eth, BTC,,eth ,arb"), vec!["ETH", "BTC", "ARB"]);
        assert!(parse_token_list("").is_empty());
    }
}
