use thiserror::Error;

use crate::chain::{Address, CodecError};
use crate::keys::KeyStoreError;
use crate::rpc::RpcError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("节点请求失败: {0}")]
    Transport(#[from] RpcError),
    #[error("账户 {address} 不存在（链上无记录）")]
    NotFound { address: Address },
    #[error("账户数据解析失败: {0}")]
    Decode(#[source] CodecError),
    #[error("交易编码失败: {0}")]
    Encode(#[source] CodecError),
    #[error("gas 上限不能为负数: {0}")]
    InvalidFee(i64),
    #[error("交易不包含任何子交易")]
    EmptyEnvelope,
    #[error("签名者 {address} 的 nonce 非法: {detail}")]
    InvalidNonce { address: Address, detail: String },
    #[error("签名者 {address} 不在本地密钥库中")]
    UnknownSigner { address: Address },
    #[error("密钥 `{name}` 签名失败: {source}")]
    Signature {
        name: String,
        #[source]
        source: KeyStoreError,
    },
    #[error("交易被链拒绝 ({stage} code={code}, hash={hash}): {log}")]
    RejectedByChain {
        stage: &'static str,
        code: u32,
        log: String,
        hash: String,
    },
    #[error("委托数量必须大于 0")]
    InvalidAmount,
    #[error("配置缺失或非法: {0}")]
    InvalidConfig(String),
    #[error("周期内部异常: {0}")]
    InternalFault(String),
}

impl EngineError {
    /// 日志与指标使用的短标签。
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Transport(_) => "transport",
            EngineError::NotFound { .. } => "not_found",
            EngineError::Decode(_) => "decode",
            EngineError::Encode(_) => "encode",
            EngineError::InvalidFee(_) => "invalid_fee",
            EngineError::EmptyEnvelope => "empty_envelope",
            EngineError::InvalidNonce { .. } => "invalid_nonce",
            EngineError::UnknownSigner { .. } => "unknown_signer",
            EngineError::Signature { .. } => "signature",
            EngineError::RejectedByChain { .. } => "rejected_by_chain",
            EngineError::InvalidAmount => "invalid_amount",
            EngineError::InvalidConfig(_) => "invalid_config",
            EngineError::InternalFault(_) => "internal_fault",
        }
    }

    /// 下一个周期用同样的输入重试是否可能成功。
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transport(_) | EngineError::NotFound { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
