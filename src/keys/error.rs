use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("密钥 `{name}` 不存在")]
    NotFound { name: String },
    #[error("密钥 `{name}` 已存在")]
    AlreadyExists { name: String },
    #[error("密钥名 `{name}` 非法，仅允许字母、数字、`-` 与 `_`")]
    InvalidName { name: String },
    #[error("密钥 `{name}` 口令错误或数据已损坏")]
    WrongPassphrase { name: String },
    #[error("密钥 `{name}` 数据损坏: {reason}")]
    Corrupted { name: String, reason: String },
    #[error("读写 {path} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析 {path} 失败: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("加解密失败: {0}")]
    Crypto(String),
    #[error("读取口令失败: {0}")]
    Prompt(String),
}
