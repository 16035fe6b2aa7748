use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use super::error::RpcError;

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcEnvelope<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl From<RpcErrorObject> for RpcError {
    fn from(object: RpcErrorObject) -> Self {
        RpcError::Remote {
            code: object.code,
            message: object.message,
            data: object.data.map(|value| match value {
                Value::String(text) => text,
                other => other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbciQueryResult {
    pub response: AbciQueryResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbciQueryResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub log: String,
    /// base64；键不存在时为 null 或缺省。
    #[serde(default)]
    pub value: Option<String>,
}

/// 单个执行阶段（check / deliver）的结果。
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxExecResult {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub log: String,
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    #[serde(rename = "gasUsed", alias = "gas_used")]
    pub gas_used: Option<i64>,
}

impl TxExecResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// `broadcast_tx_commit` 的返回：交易已被打包并执行完毕。
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitResult {
    #[serde(default)]
    pub check_tx: TxExecResult,
    #[serde(default)]
    pub deliver_tx: TxExecResult,
    pub hash: String,
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub height: i64,
}

impl CommitResult {
    /// 首个返回非零状态码的阶段。
    pub fn failure(&self) -> Option<(&'static str, &TxExecResult)> {
        if !self.check_tx.is_ok() {
            Some(("check_tx", &self.check_tx))
        } else if !self.deliver_tx.is_ok() {
            Some(("deliver_tx", &self.deliver_tx))
        } else {
            None
        }
    }
}
