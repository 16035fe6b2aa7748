//! 节点 RPC：只读查询与交易广播两类接口。

mod client;
mod error;
mod types;

pub use client::{NodeClient, normalize_endpoint};
pub use error::RpcError;
pub use types::{CommitResult, TxExecResult};

use async_trait::async_trait;

/// 按存储路径与键查询节点状态。空结果表示键不存在。
#[async_trait]
pub trait AbciQuery: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn abci_query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, RpcError>;
}

/// 提交已签名交易并等待其被打包执行。
#[async_trait]
pub trait TxBroadcaster: Send + Sync {
    async fn broadcast_tx_commit(&self, tx: &[u8]) -> Result<CommitResult, RpcError>;
}
