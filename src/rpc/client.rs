use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use super::error::RpcError;
use super::types::{AbciQueryResult, CommitResult, JsonRpcEnvelope};
use super::{AbciQuery, TxBroadcaster};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Tendermint 风格 JSON-RPC 节点客户端。
#[derive(Clone, Debug)]
pub struct NodeClient {
    endpoint: String,
    http: reqwest::Client,
}

impl NodeClient {
    /// `timeout` 是单次请求的上限；`broadcast_tx_commit` 会阻塞到出块，需留足余量。
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RpcError> {
        let endpoint = normalize_endpoint(endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { endpoint, http })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let started = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.classify(err))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        debug!(
            target: "rpc",
            endpoint = %self.endpoint,
            method,
            %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rpc call finished"
        );

        parse_envelope(&self.endpoint, method, status, &body)
    }

    fn classify(&self, err: reqwest::Error) -> RpcError {
        if err.is_timeout() {
            RpcError::Timeout {
                endpoint: self.endpoint.clone(),
            }
        } else {
            RpcError::Http(err)
        }
    }
}

#[async_trait]
impl AbciQuery for NodeClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn abci_query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let result: AbciQueryResult = self
            .call(
                "abci_query",
                json!({
                    "path": path,
                    "data": hex::encode(data),
                    "height": "0",
                    "prove": false,
                }),
            )
            .await?;

        let response = result.response;
        if response.code != 0 {
            return Err(RpcError::Query {
                code: response.code,
                log: response.log,
            });
        }

        match response.value.as_deref().map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(encoded) => general_purpose::STANDARD
                .decode(encoded)
                .map_err(|err| RpcError::Schema(format!("abci_query value 非 base64: {err}"))),
        }
    }
}

#[async_trait]
impl TxBroadcaster for NodeClient {
    async fn broadcast_tx_commit(&self, tx: &[u8]) -> Result<CommitResult, RpcError> {
        let result: CommitResult = self
            .call(
                "broadcast_tx_commit",
                json!({ "tx": general_purpose::STANDARD.encode(tx) }),
            )
            .await?;
        info!(
            target: "rpc",
            endpoint = %self.endpoint,
            hash = %result.hash,
            height = result.height,
            check_code = result.check_tx.code,
            deliver_code = result.deliver_tx.code,
            "broadcast_tx_commit returned"
        );
        Ok(result)
    }
}

fn parse_envelope<T: DeserializeOwned>(
    endpoint: &str,
    method: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<T, RpcError> {
    // 节点对 JSON-RPC 错误可能同时返回 5xx，优先解析错误对象
    let envelope = match serde_json::from_slice::<JsonRpcEnvelope<T>>(body) {
        Ok(envelope) => envelope,
        Err(err) if status.is_success() => {
            return Err(RpcError::Schema(format!("{method} 响应解析失败: {err}")));
        }
        Err(_) => {
            return Err(RpcError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }
    };

    if let Some(error) = envelope.error {
        return Err(error.into());
    }
    if !status.is_success() {
        return Err(RpcError::Status {
            endpoint: endpoint.to_string(),
            status,
        });
    }
    envelope
        .result
        .ok_or_else(|| RpcError::Schema(format!("{method} 响应缺少 result")))
}

/// 规范化节点地址：`tcp://` 视作 `http://`，缺省协议时补 `http://`。
pub fn normalize_endpoint(raw: &str) -> Result<String, RpcError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RpcError::InvalidEndpoint {
            url: raw.to_string(),
            reason: "地址为空".to_string(),
        });
    }

    let candidate = if let Some(rest) = trimmed.strip_prefix("tcp://") {
        format!("http://{rest}")
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|err| RpcError::InvalidEndpoint {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(RpcError::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("不支持的协议 {other}"),
        }),
    }
}
