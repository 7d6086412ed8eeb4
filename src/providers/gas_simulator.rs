//! Gas Simulator - JSON-RPC `eth_estimateGas`
//!
//! Dry-runs a transaction against a node and reports success, failure or
//! an abnormally high estimate. Every failure mode (unreachable node,
//! non-2xx, RPC error, garbage body, timeout) becomes a failed
//! [`SimulationOutcome`]; the analyzer never sees an error from here.
//!
//! One attempt per check, no retries: the HTTP timeout is kept below the
//! relay window and a retry would eat into it.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::models::config::SimulatorConfig;
use crate::models::errors::{ErrorCode, GuardError, GuardResult};
use crate::models::types::{SimulationOutcome, TransactionRequest};
use crate::utils::constants::USER_AGENT as USER_AGENT_STRING;
use crate::utils::decoder::parse_u64_quantity;

/// Anything that can dry-run a transaction
#[async_trait]
pub trait GasEstimator: Send + Sync {
    async fn simulate(&self, tx: &TransactionRequest, rpc_url: &str) -> SimulationOutcome;
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    message: String,
}

/// `eth_estimateGas` over HTTP
#[derive(Clone)]
pub struct RpcGasSimulator {
    client: reqwest::Client,
    config: SimulatorConfig,
}

impl RpcGasSimulator {
    pub fn new(config: SimulatorConfig) -> GuardResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.rpc_timeout)
            .build()
            .map_err(|e| {
                GuardError::with_source(ErrorCode::ConfigInvalidValue, "Failed to build HTTP client", e)
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Transaction object as the node expects it; absent fields are omitted
    fn tx_object(tx: &TransactionRequest) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(from) = &tx.from {
            obj.insert("from".into(), json!(from));
        }
        if let Some(to) = &tx.to {
            obj.insert("to".into(), json!(to));
        }
        if let Some(data) = &tx.data {
            obj.insert("data".into(), json!(data));
        }
        if let Some(value) = &tx.value {
            obj.insert("value".into(), json!(value));
        }
        serde_json::Value::Object(obj)
    }

    /// Raw estimate in gas units
    pub async fn estimate_gas(&self, tx: &TransactionRequest, rpc_url: &str) -> GuardResult<u64> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_estimateGas",
            "params": [Self::tx_object(tx)],
        });

        let response = self.client.post(rpc_url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GuardError::new(
                ErrorCode::RpcHttpStatus,
                format!("HTTP error: {}", status),
            ));
        }

        let body: RpcResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(GuardError::rpc_error(format!(
                "{} (code: {})",
                error.message, error.code
            )));
        }

        let raw = body.result.ok_or_else(|| {
            GuardError::new(ErrorCode::RpcInvalidResponse, "No result in response")
        })?;
        parse_u64_quantity(&raw).ok_or_else(|| {
            GuardError::new(
                ErrorCode::RpcInvalidResponse,
                format!("Unparseable gas amount: {}", raw),
            )
        })
    }
}

#[async_trait]
impl GasEstimator for RpcGasSimulator {
    async fn simulate(&self, tx: &TransactionRequest, rpc_url: &str) -> SimulationOutcome {
        match self.estimate_gas(tx, rpc_url).await {
            Ok(gas) if gas > self.config.high_gas_threshold => {
                warn!(gas, threshold = self.config.high_gas_threshold, "⛽ High gas estimate");
                SimulationOutcome::high_gas(gas, self.config.high_gas_threshold)
            }
            Ok(gas) => {
                debug!(gas, "gas estimate ok");
                SimulationOutcome::success(gas)
            }
            Err(e) => {
                warn!(code = e.code_str(), "⚠️ Gas simulation failed: {}", e.message);
                SimulationOutcome::failure(e.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_object_omits_absent_fields() {
        let tx = TransactionRequest {
            to: Some("0x1111111111111111111111111111111111111111".into()),
            data: None,
            value: Some("0x0".into()),
            from: None,
        };
        let obj = RpcGasSimulator::tx_object(&tx);
        assert_eq!(
            obj,
            json!({ "to": "0x1111111111111111111111111111111111111111", "value": "0x0" })
        );
    }

    #[tokio::test]
    async fn test_unreachable_node_is_failure() {
        let sim = RpcGasSimulator::new(SimulatorConfig {
            rpc_timeout: std::time::Duration::from_millis(300),
            ..SimulatorConfig::default()
        })
        .unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let outcome = sim
            .simulate(&TransactionRequest::default(), "http://127.0.0.1:9")
            .await;
        assert!(!outcome.ok);
        assert!(!outcome.is_high_gas());
    }
}
