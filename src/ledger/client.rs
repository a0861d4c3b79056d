// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Digital Asset Standard (DAS) client for token-ownership lookups.
//!
//! Calls the `getAsset` JSON-RPC method exposed by ledger indexers and reads
//! `ownership.owner`, `ownership.frozen` and `burnt` from the result.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::types::{LedgerError, LedgerIndex, TokenHolder};

/// JSON-RPC envelope returned by the indexer.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Subset of the DAS asset document we care about.
#[derive(Debug, Deserialize)]
struct Asset {
    #[serde(default)]
    burnt: bool,
    #[serde(default)]
    ownership: Option<AssetOwnership>,
}

#[derive(Debug, Deserialize)]
struct AssetOwnership {
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    frozen: bool,
}

/// DAS JSON-RPC client.
pub struct DasClient {
    rpc_url: url::Url,
    http: reqwest::Client,
}

impl DasClient {
    /// Create a new client; `timeout` bounds every request.
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let rpc_url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        Ok(Self { rpc_url, http })
    }

    /// Endpoint this client talks to.
    pub fn rpc_url(&self) -> &url::Url {
        &self.rpc_url
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": uuid::Uuid::new_v4().to_string(),
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!("HTTP {status}")));
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::MalformedResponse(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(envelope.result)
    }
}

#[async_trait]
impl LedgerIndex for DasClient {
    async fn get_token_holder(&self, token_id: &str) -> Result<Option<TokenHolder>, LedgerError> {
        let asset = match self.call::<Asset>("getAsset", json!({ "id": token_id })).await {
            Ok(asset) => asset,
            Err(LedgerError::Rpc { message, .. })
                if message.to_lowercase().contains("not found") =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(asset) = asset else {
            return Ok(None);
        };

        let Some(ownership) = asset.ownership else {
            return Ok(None);
        };

        let Some(owner) = ownership.owner else {
            return Ok(None);
        };

        Ok(Some(TokenHolder {
            holder: owner,
            burned: asset.burnt,
            frozen: ownership.frozen,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::Value;

    /// Serve a single canned JSON-RPC response on an ephemeral port.
    async fn stub_indexer(reply: Value) -> String {
        let app = Router::new().route(
            "/",
            post(move |Json(request): Json<Value>| {
                let reply = reply.clone();
                async move {
                    assert_eq!(request["method"], "getAsset");
                    Json(reply)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn reads_owner_burn_and_freeze() {
        let url = stub_indexer(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {
                "id": "Mint111",
                "burnt": false,
                "ownership": { "owner": "Wallet111", "frozen": true }
            }
        }))
        .await;

        let client = DasClient::new(&url, Duration::from_secs(5)).unwrap();
        let holder = client.get_token_holder("Mint111").await.unwrap().unwrap();
        assert_eq!(
            holder,
            TokenHolder {
                holder: "Wallet111".into(),
                burned: false,
                frozen: true,
            }
        );
    }

    #[tokio::test]
    async fn asset_not_found_is_none() {
        let url = stub_indexer(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": { "code": -32000, "message": "Asset Not Found" }
        }))
        .await;

        let client = DasClient::new(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(client.get_token_holder("Missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_result_or_missing_owner_is_none() {
        for reply in [
            json!({ "jsonrpc": "2.0", "id": "1", "result": null }),
            json!({ "jsonrpc": "2.0", "id": "1" }),
            json!({ "jsonrpc": "2.0", "id": "1", "result": { "id": "Mint", "burnt": true } }),
        ] {
            let url = stub_indexer(reply).await;
            let client = DasClient::new(&url, Duration::from_secs(5)).unwrap();
            assert_eq!(client.get_token_holder("Mint").await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn other_rpc_errors_surface() {
        let url = stub_indexer(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": { "code": 429, "message": "rate limited" }
        }))
        .await;

        let client = DasClient::new(&url, Duration::from_secs(5)).unwrap();
        let err = client.get_token_holder("Mint").await.unwrap_err();
        assert!(matches!(err, LedgerError::Rpc { code: 429, .. }));
    }

    #[tokio::test]
    async fn unreachable_indexer_is_transport_error() {
        let client = DasClient::new("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap();
        let err = client.get_token_holder("Mint").await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(
            DasClient::new("not a url", Duration::from_secs(1)),
            Err(LedgerError::InvalidRpcUrl(_))
        ));
    }
}
