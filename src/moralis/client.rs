use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::types::{RawTransfer, TransferPage};
use super::{TransferQuery, TransferSource};

const MORALIS_API_BASE: &str = "https://deep-index.moralis.io/api/v2.2";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("upstream fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("MORALIS_API_KEY is not configured")]
    MissingApiKey,

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Client for the Moralis wallet ERC-20 transfers endpoint.
#[derive(Debug, Clone)]
pub struct MoralisClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl MoralisClient {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: MORALIS_API_BASE.into(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn from_config(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        let client = Self::new(http, api_key);
        Ok(match base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Fetch the most recent transfers of one token for a wallet, newest first.
    pub async fn get_wallet_token_transfers(
        &self,
        query: &TransferQuery,
    ) -> Result<Vec<RawTransfer>, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        let url = format!("{}/{}/erc20/transfers", self.base_url, query.address);
        let limit = query.limit.to_string();
        let resp = self
            .http
            .get(&url)
            .header("X-API-Key", api_key)
            .header("accept", "application/json")
            .query(&[
                ("chain", query.chain.as_str()),
                ("contract_addresses[0]", query.token_contract.as_str()),
                ("limit", limit.as_str()),
                ("order", "DESC"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let page: TransferPage = resp
            .json()
            .await
            .map_err(|e| FetchError::Unexpected(e.to_string()))?;

        tracing::debug!(
            address = %query.address,
            count = page.result.len(),
            "Fetched token transfers"
        );

        Ok(page.result)
    }
}

#[async_trait]
impl TransferSource for MoralisClient {
    async fn fetch_transfers(&self, query: &TransferQuery) -> Result<Vec<RawTransfer>, FetchError> {
        self.get_wallet_token_transfers(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = MoralisClient::new(Client::new(), None).with_base_url("http://127.0.0.1:1/");
        let query = TransferQuery {
            address: "0xabc".into(),
            token_contract: "0xdef".into(),
            chain: "0xa4b1".into(),
            limit: 30,
        };
        let err = client.fetch_transfers(&query).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = MoralisClient::new(Client::new(), None).with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
