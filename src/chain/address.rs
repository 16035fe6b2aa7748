use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const ADDRESS_LEN: usize = 20;
pub const PUBLIC_KEY_LEN: usize = 32;

const ADDRESS_HRP: Hrp = Hrp::parse_unchecked("address");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("bech32 解码失败: {0}")]
    Bech32(String),
    #[error("地址前缀应为 `address`，实际为 `{0}`")]
    Prefix(String),
    #[error("地址长度应为 {ADDRESS_LEN} 字节，实际为 {0}")]
    Length(usize),
}

/// 账户地址：公钥 SHA-256 摘要的前 20 字节，文本形式为 `address1…` bech32。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_bech32(&self) -> String {
        // 20 字节的数据远小于 bech32 长度上限，编码不会失败
        bech32::encode::<Bech32>(ADDRESS_HRP, &self.0).unwrap_or_else(|_| hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data) =
            bech32::decode(s.trim()).map_err(|err| AddressError::Bech32(err.to_string()))?;
        if hrp.to_lowercase() != ADDRESS_HRP.to_lowercase() {
            return Err(AddressError::Prefix(hrp.to_string()));
        }
        let bytes: [u8; ADDRESS_LEN] = data
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::Length(data.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bech32())
    }
}

/// Ed25519 公钥。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bech32_text_form_parses_back() {
        let address = Address::new([7u8; ADDRESS_LEN]);
        let text = address.to_string();
        assert!(text.starts_with("address1"));
        assert_eq!(text.parse::<Address>().expect("parse address"), address);
    }

    #[test]
    fn parses_original_genesis_address() {
        let address: Address = "address1k0m8ucnqug974maa6g36zw7g2wvfd4sug6uxay"
            .parse()
            .expect("parse address");
        assert_eq!(
            address.to_string(),
            "address1k0m8ucnqug974maa6g36zw7g2wvfd4sug6uxay"
        );
    }

    #[test]
    fn rejects_foreign_prefix() {
        let text = bech32::encode::<Bech32>(Hrp::parse_unchecked("cosmos"), &[1u8; ADDRESS_LEN])
            .expect("encode");
        assert_eq!(
            text.parse::<Address>(),
            Err(AddressError::Prefix("cosmos".to_string()))
        );
    }

    #[test]
    fn rejects_wrong_length() {
        let text = bech32::encode::<Bech32>(ADDRESS_HRP, &[1u8; 8]).expect("encode");
        assert_eq!(text.parse::<Address>(), Err(AddressError::Length(8)));
    }

    #[test]
    fn address_is_derived_from_public_key_digest() {
        let key = PublicKey::new([3u8; PUBLIC_KEY_LEN]);
        let digest = Sha256::digest(key.as_bytes());
        let address = Address::from_public_key(&key);
        assert_eq!(&address.as_bytes()[..], &digest[..ADDRESS_LEN]);
    }
}
