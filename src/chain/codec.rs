use bincode::config;
use bincode::error::{DecodeError, EncodeError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::account::Account;
use super::tx::TxEnvelope;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("序列化失败: {0}")]
    Encode(#[from] EncodeError),
    #[error("反序列化失败: {0}")]
    Decode(#[from] DecodeError),
    #[error("反序列化后残留 {0} 字节")]
    TrailingBytes(usize),
}

/// 与节点交互时使用的线上编码。
pub trait TxCodec: Send + Sync {
    fn encode_tx(&self, tx: &TxEnvelope) -> Result<Vec<u8>, CodecError>;
    fn decode_account(&self, bytes: &[u8]) -> Result<Account, CodecError>;
}

/// 默认编码：bincode 标准配置，字段顺序即声明顺序。
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl TxCodec for BincodeCodec {
    fn encode_tx(&self, tx: &TxEnvelope) -> Result<Vec<u8>, CodecError> {
        canonical_bytes(tx)
    }

    fn decode_account(&self, bytes: &[u8]) -> Result<Account, CodecError> {
        let (account, read): (Account, usize) =
            bincode::serde::decode_from_slice(bytes, config::standard())?;
        if read != bytes.len() {
            return Err(CodecError::TrailingBytes(bytes.len() - read));
        }
        Ok(account)
    }
}

pub(crate) fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(value, config::standard())?)
}

/// 交易哈希：线上字节的 SHA-256，大写十六进制。
pub fn tx_hash(bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::address::ADDRESS_LEN;
    use crate::chain::Address;

    #[test]
    fn decodes_account_written_by_same_codec() {
        let mut account = Account::new(Address::new([4u8; ADDRESS_LEN]), 1_000, 7);
        account.qscs.insert("qstar".to_string(), 5);
        let bytes = canonical_bytes(&account).expect("encode");
        let decoded = BincodeCodec.decode_account(&bytes).expect("decode");
        assert_eq!(decoded, account);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(BincodeCodec.decode_account(&[0xff, 0x01]).is_err());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let account = Account::new(Address::new([4u8; ADDRESS_LEN]), 1, 0);
        let mut bytes = canonical_bytes(&account).expect("encode");
        bytes.extend_from_slice(&[0, 0]);
        assert!(matches!(
            BincodeCodec.decode_account(&bytes),
            Err(CodecError::TrailingBytes(2))
        ));
    }

    #[test]
    fn tx_hash_is_uppercase_sha256() {
        let hash = tx_hash(b"abc");
        assert_eq!(
            hash,
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }
}
