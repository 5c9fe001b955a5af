use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prost::Message;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::proto::{
    QueryAllContractStateRequest, QueryAllContractStateResponse, QuerySmartContractStateRequest,
    QuerySmartContractStateResponse,
};
use super::ChainQuerier;
use crate::constants::{ALL_CONTRACT_STATE_PATH, SMART_CONTRACT_STATE_PATH};
use crate::types::{MonitorError, MonitorResult, PageCursor, StatePage};

/// Tendermint JSON-RPC 클라이언트
///
/// `status` 로 높이를 읽고, wasm 모듈 gRPC 쿼리는 `abci_query` 로 보낸다.
pub struct CosmosRpcClient {
    http_client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

/// JSON-RPC 응답 봉투
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
struct SyncInfo {
    latest_block_height: String,
}

#[derive(Debug, Deserialize)]
struct AbciQueryResult {
    response: AbciQueryResponse,
}

#[derive(Debug, Deserialize)]
struct AbciQueryResponse {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
    #[serde(default)]
    codespace: String,
    /// base64, 값이 없으면 null
    #[serde(default)]
    value: Option<String>,
}

impl CosmosRpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> MonitorResult<Self> {
        info!("🔌 Tendermint RPC client: {}", endpoint);

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            request_id: AtomicU64::new(0),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> MonitorResult<T> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.http_client.post(&self.endpoint).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(MonitorError::Transport(format!(
                "{} request failed: HTTP {}",
                method,
                response.status()
            )));
        }

        let envelope: JsonRpcResponse<T> = response.json().await?;
        parse_envelope(method, envelope)
    }

    /// ABCI 쿼리. 응답 code 가 0 이 아니면 `Query` 에러.
    pub async fn abci_query(&self, path: &str, data: Vec<u8>) -> MonitorResult<Vec<u8>> {
        let params = json!({
            "path": path,
            "data": hex::encode(data),
            "height": "0",
            "prove": false,
        });

        let result: AbciQueryResult = self.call("abci_query", params).await?;
        decode_abci_response(result.response)
    }
}

fn parse_envelope<T>(method: &str, envelope: JsonRpcResponse<T>) -> MonitorResult<T> {
    match (envelope.result, envelope.error) {
        (Some(result), _) => Ok(result),
        (None, Some(error)) => Err(MonitorError::Transport(format!(
            "{} rpc error {}: {} {}",
            method,
            error.code,
            error.message,
            error.data.map(|d| d.to_string()).unwrap_or_default()
        ))),
        (None, None) => Err(MonitorError::Transport(format!(
            "{} returned neither result nor error",
            method
        ))),
    }
}

fn decode_abci_response(response: AbciQueryResponse) -> MonitorResult<Vec<u8>> {
    if response.code != 0 {
        return Err(MonitorError::Query {
            codespace: response.codespace,
            code: response.code,
            log: response.log,
        });
    }

    match response.value {
        Some(value) if !value.is_empty() => STANDARD
            .decode(value)
            .map_err(|e| MonitorError::Transport(format!("invalid base64 value: {}", e))),
        _ => Ok(Vec::new()),
    }
}

#[async_trait]
impl ChainQuerier for CosmosRpcClient {
    async fn get_height(&self) -> MonitorResult<u64> {
        let status: StatusResult = self.call("status", json!({})).await?;

        status
            .sync_info
            .latest_block_height
            .parse()
            .map_err(|_| {
                MonitorError::Transport(format!(
                    "invalid latest_block_height: {}",
                    status.sync_info.latest_block_height
                ))
            })
    }

    async fn query_all_state(
        &self,
        contract: &str,
        cursor: &PageCursor,
        limit: u64,
    ) -> MonitorResult<StatePage> {
        let request = QueryAllContractStateRequest::page(contract, cursor, limit);
        let bytes = self
            .abci_query(ALL_CONTRACT_STATE_PATH, request.encode_to_vec())
            .await?;

        let response = QueryAllContractStateResponse::decode(bytes.as_slice())?;
        debug!(
            "📄 AllContractState {} from {}: {} models",
            contract,
            cursor,
            response.models.len()
        );

        Ok(response.into())
    }

    async fn query_contract_smart(
        &self,
        contract: &str,
        msg: &serde_json::Value,
    ) -> MonitorResult<serde_json::Value> {
        let request = QuerySmartContractStateRequest {
            address: contract.to_string(),
            query_data: serde_json::to_vec(msg)?,
        };
        let bytes = self
            .abci_query(SMART_CONTRACT_STATE_PATH, request.encode_to_vec())
            .await?;

        let response = QuerySmartContractStateResponse::decode(bytes.as_slice())?;
        Ok(serde_json::from_slice(&response.data)?)
    }
}
