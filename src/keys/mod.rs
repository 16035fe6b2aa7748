//! 密钥库：按名称保存签名密钥，私钥只在签名时用口令解密。

mod error;
pub mod file;
mod passphrase;

pub use error::KeyStoreError;
pub use file::FileKeyStore;
pub use passphrase::{Passphrase, capture_passphrase, prompt_new_passphrase};

use crate::chain::{Address, PublicKey};

const UNLOCK_PROBE: &[u8] = b"qosbot/unlock-probe";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub name: String,
    pub address: Address,
    pub public_key: PublicKey,
}

pub trait KeyStore: Send + Sync {
    fn key_info(&self, name: &str) -> Result<KeyInfo, KeyStoreError>;

    /// 按地址反查密钥名；地址不在库中时返回 `None`。
    fn name_by_address(&self, address: &Address) -> Result<Option<String>, KeyStoreError>;

    fn list(&self) -> Result<Vec<KeyInfo>, KeyStoreError>;

    fn sign(
        &self,
        name: &str,
        passphrase: &Passphrase,
        payload: &[u8],
    ) -> Result<(Vec<u8>, PublicKey), KeyStoreError>;

    fn verify_passphrase(&self, name: &str, passphrase: &Passphrase) -> Result<(), KeyStoreError> {
        self.sign(name, passphrase, UNLOCK_PROBE).map(|_| ())
    }
}
