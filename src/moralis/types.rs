use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ERC-20 transfer (Moralis wallet transfers endpoint)
// ---------------------------------------------------------------------------

/// One transfer as returned by the indexer. Every field is optional because
/// the API has shipped both snake_case and camelCase payloads.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTransfer {
    #[serde(default, alias = "fromAddress")]
    pub from_address: Option<String>,
    #[serde(default, alias = "toAddress")]
    pub to_address: Option<String>,
    /// Raw integer amount in the token's smallest unit.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, alias = "tokenDecimals", deserialize_with = "de_decimals")]
    pub token_decimals: Option<u32>,
    #[serde(default, alias = "blockTimestamp")]
    pub block_timestamp: Option<String>,
    #[serde(default, alias = "transactionHash")]
    pub transaction_hash: Option<String>,
    #[serde(default, alias = "tokenSymbol")]
    pub token_symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferPage {
    #[serde(default)]
    pub result: Vec<RawTransfer>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Decimals arrive either as a JSON number or as a numeric string.
fn de_decimals<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_snake_case_page() {
        let json = r#"{
            "cursor": null,
            "result": [{
                "from_address": "0xabc",
                "to_address": "0xdef",
                "value": "2000000000000",
                "token_decimals": "6",
                "block_timestamp": "2024-03-01T12:00:00.000Z",
                "transaction_hash": "0xhash"
            }]
        }"#;
        let page: TransferPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.result.len(), 1);
        let t = &page.result[0];
        assert_eq!(t.from_address.as_deref(), Some("0xabc"));
        assert_eq!(t.token_decimals, Some(6));
        assert_eq!(t.transaction_hash.as_deref(), Some("0xhash"));
    }

    #[test]
    fn test_parses_camel_case_and_missing_fields() {
        let json = r#"{"fromAddress": "0x1", "value": "5", "tokenDecimals": 18}"#;
        let t: RawTransfer = serde_json::from_str(json).unwrap();
        assert_eq!(t.from_address.as_deref(), Some("0x1"));
        assert_eq!(t.token_decimals, Some(18));
        assert!(t.to_address.is_none());
        assert!(t.block_timestamp.is_none());
    }
}
