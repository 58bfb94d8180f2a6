//! HTTP JSON-RPC client for the wallet daemon.

use async_trait::async_trait;
use dustsweep_types::{Amount, OutPoint};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::RpcError;
use crate::wallet::{RpcMethod, WalletRpc};
use crate::wire::{DecodedTransaction, SignedTransaction, UnspentRecord};

/// HTTP basic-auth credentials for the daemon's RPC port.
#[derive(Clone)]
pub struct RpcAuth {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for RpcAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcAuth")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// JSON-RPC 1.0 client for a bitcoin-style wallet daemon.
///
/// Wraps one `reqwest::Client`; the consolidation session uses it serially.
pub struct DaemonClient {
    http: reqwest::Client,
    url: String,
    auth: RpcAuth,
    next_id: AtomicU64,
}

impl DaemonClient {
    /// Create a client targeting the given URL (e.g. `http://127.0.0.1:15715`).
    pub fn new(url: impl Into<String>, auth: RpcAuth, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            auth,
            next_id: AtomicU64::new(1),
        })
    }

    /// The configured daemon URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one JSON-RPC request and decode its `result` field.
    async fn call<T: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": method.as_str(),
            "params": params,
        });
        tracing::debug!(%method, id, "sending rpc request");

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.auth.user, Some(&self.auth.password))
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RpcError::ResponseLost(format!("failed to read response body: {e}")))?;

        // Daemons answer RPC errors with HTTP 500 and a JSON body, so the
        // envelope is inspected before the status.
        let envelope: Option<Value> = serde_json::from_str(&text).ok();
        if let Some(error) = envelope
            .as_ref()
            .and_then(|json| json.get("error"))
            .filter(|e| !e.is_null())
        {
            return Err(daemon_error(error));
        }
        if !status.is_success() {
            return Err(RpcError::Http {
                status: status.as_u16(),
            });
        }

        let envelope = envelope
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method} response is not JSON")))?;
        let result = envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method} response has no result")))?;
        tracing::debug!(%method, id, "rpc request succeeded");

        serde_json::from_value(result)
            .map_err(|e| RpcError::InvalidResponse(format!("unexpected {method} result: {e}")))
    }
}

fn classify_send_error(e: reqwest::Error) -> RpcError {
    if e.is_connect() || e.is_builder() {
        RpcError::Transport(e.to_string())
    } else {
        RpcError::ResponseLost(e.to_string())
    }
}

fn daemon_error(error: &Value) -> RpcError {
    RpcError::Daemon {
        code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
        message: error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    }
}

#[async_trait]
impl WalletRpc for DaemonClient {
    async fn list_unspent(&self) -> Result<Vec<UnspentRecord>, RpcError> {
        self.call(RpcMethod::ListUnspent, json!([])).await
    }

    async fn create_raw_transaction(
        &self,
        inputs: &[OutPoint],
        address: &str,
        amount: Amount,
    ) -> Result<String, RpcError> {
        let mut outputs = serde_json::Map::new();
        outputs.insert(address.to_string(), json!(amount.to_coins()));
        self.call(
            RpcMethod::CreateRawTransaction,
            json!([inputs, Value::Object(outputs)]),
        )
        .await
    }

    async fn sign_raw_transaction(&self, raw_hex: &str) -> Result<SignedTransaction, RpcError> {
        self.call(RpcMethod::SignRawTransaction, json!([raw_hex]))
            .await
    }

    async fn decode_raw_transaction(
        &self,
        raw_hex: &str,
    ) -> Result<DecodedTransaction, RpcError> {
        self.call(RpcMethod::DecodeRawTransaction, json!([raw_hex]))
            .await
    }

    async fn send_raw_transaction(&self, signed_hex: &str) -> Result<String, RpcError> {
        self.call(RpcMethod::SendRawTransaction, json!([signed_hex]))
            .await
    }
}
