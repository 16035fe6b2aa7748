use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::address::{Address, PublicKey};

/// 账户存储在节点上的查询路径。
pub const ACCOUNT_STORE_PATH: &str = "/store/acc/key";

const ACCOUNT_KEY_PREFIX: &[u8] = b"account:";

/// 链上账户快照，由链创建，本程序只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    #[serde(default)]
    pub public_key: Option<PublicKey>,
    /// 已授权交易数；下一笔交易使用 `nonce + 1`。
    pub nonce: i64,
    /// 原生代币余额。
    pub qos: u128,
    /// 其它代币余额，按代币名索引。
    #[serde(default)]
    pub qscs: BTreeMap<String, u128>,
}

impl Account {
    pub fn new(address: Address, qos: u128, nonce: i64) -> Self {
        Self {
            address,
            public_key: None,
            nonce,
            qos,
            qscs: BTreeMap::new(),
        }
    }
}

/// 账户在存储中的键：`account:` 前缀加原始地址字节。
pub fn account_store_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_KEY_PREFIX.len() + address.as_bytes().len());
    key.extend_from_slice(ACCOUNT_KEY_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::address::ADDRESS_LEN;

    #[test]
    fn store_key_prefixes_raw_address() {
        let address = Address::new([9u8; ADDRESS_LEN]);
        let key = account_store_key(&address);
        assert!(key.starts_with(b"account:"));
        assert_eq!(&key[8..], address.as_bytes());
    }
}
