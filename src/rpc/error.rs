use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("节点请求失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("节点请求超时: {endpoint}")]
    Timeout { endpoint: String },
    #[error("节点 {endpoint} 返回 HTTP 状态 {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
    #[error("节点返回错误 {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<String>,
    },
    #[error("ABCI 查询失败 code={code}: {log}")]
    Query { code: u32, log: String },
    #[error("节点响应格式错误: {0}")]
    Schema(String),
    #[error("节点地址 `{url}` 非法: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}
