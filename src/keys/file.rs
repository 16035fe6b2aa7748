use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine as _, engine::general_purpose};
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use super::error::KeyStoreError;
use super::passphrase::Passphrase;
use super::{KeyInfo, KeyStore};
use crate::chain::{Address, PublicKey};

const MAGIC: &[u8; 8] = b"QOSBOTKY";
const FORMAT_VERSION: u8 = 1;
const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const SEED_SIZE: usize = 32;
const KEYS_DIR: &str = "keys";
const KEY_FILE_EXT: &str = "json";

/// Argon2id 参数，随密钥文件一起保存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 128 * 1024,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct KeyRecord {
    name: String,
    address: String,
    public_key: String,
    kdf: KdfParams,
    cipher: String,
}

/// `<home>/keys/<name>.json` 形式的本地密钥库。
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
    kdf: KdfParams,
}

impl FileKeyStore {
    pub fn open(home: &Path) -> Result<Self, KeyStoreError> {
        let dir = home.join(KEYS_DIR);
        fs::create_dir_all(&dir).map_err(|source| KeyStoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            kdf: KdfParams::default(),
        })
    }

    /// 仅影响之后新建的密钥；已有密钥沿用文件中的参数。
    #[cfg(test)]
    pub(crate) fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 新建密钥。`seed` 为空时随机生成。
    pub fn create(
        &self,
        name: &str,
        passphrase: &Passphrase,
        seed: Option<[u8; SEED_SIZE]>,
    ) -> Result<KeyInfo, KeyStoreError> {
        validate_name(name)?;
        let path = self.key_path(name);
        if path.exists() {
            return Err(KeyStoreError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let mut seed = Zeroizing::new(seed.unwrap_or_else(|| {
            let mut fresh = [0u8; SEED_SIZE];
            OsRng.fill_bytes(&mut fresh);
            fresh
        }));
        let signing_key = SigningKey::from_bytes(&seed);
        let public_key = PublicKey::new(signing_key.verifying_key().to_bytes());
        let address = Address::from_public_key(&public_key);

        let cipher = encrypt_seed(&seed[..], passphrase.as_str(), &self.kdf)?;
        seed.zeroize();

        let record = KeyRecord {
            name: name.to_string(),
            address: address.to_string(),
            public_key: public_key.to_hex(),
            kdf: self.kdf,
            cipher: general_purpose::STANDARD.encode(cipher),
        };
        let contents =
            serde_json::to_vec_pretty(&record).map_err(|source| KeyStoreError::Json {
                path: path.clone(),
                source,
            })?;
        fs::write(&path, contents).map_err(|source| KeyStoreError::Io {
            path: path.clone(),
            source,
        })?;

        info!(
            target: "keys",
            key = name,
            address = %address,
            path = %path.display(),
            "已写入新密钥"
        );
        Ok(KeyInfo {
            name: name.to_string(),
            address,
            public_key,
        })
    }

    fn key_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{KEY_FILE_EXT}"))
    }

    fn load_record(&self, name: &str) -> Result<KeyRecord, KeyStoreError> {
        validate_name(name)?;
        let path = self.key_path(name);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(KeyStoreError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(source) => return Err(KeyStoreError::Io { path, source }),
        };
        let record: KeyRecord = serde_json::from_slice(&contents)
            .map_err(|source| KeyStoreError::Json { path, source })?;
        if record.name != name {
            return Err(KeyStoreError::Corrupted {
                name: name.to_string(),
                reason: format!("文件内记录的名称为 `{}`", record.name),
            });
        }
        Ok(record)
    }
}

impl KeyStore for FileKeyStore {
    fn key_info(&self, name: &str) -> Result<KeyInfo, KeyStoreError> {
        let record = self.load_record(name)?;
        record_info(&record)
    }

    fn name_by_address(&self, address: &Address) -> Result<Option<String>, KeyStoreError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|info| info.address == *address)
            .map(|info| info.name))
    }

    fn list(&self) -> Result<Vec<KeyInfo>, KeyStoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| KeyStoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| KeyStoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(KEY_FILE_EXT) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_name(name).is_err() {
                debug!(target: "keys", path = %path.display(), "跳过非法命名的密钥文件");
                continue;
            }
            match self.key_info(name) {
                Ok(info) => keys.push(info),
                Err(err) => {
                    warn!(target: "keys", path = %path.display(), error = %err, "跳过无法解析的密钥文件");
                }
            }
        }
        keys.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(keys)
    }

    fn sign(
        &self,
        name: &str,
        passphrase: &Passphrase,
        payload: &[u8],
    ) -> Result<(Vec<u8>, PublicKey), KeyStoreError> {
        let record = self.load_record(name)?;
        let info = record_info(&record)?;
        let cipher = general_purpose::STANDARD
            .decode(record.cipher.trim())
            .map_err(|err| KeyStoreError::Corrupted {
                name: name.to_string(),
                reason: format!("cipher 非 base64: {err}"),
            })?;

        let seed = decrypt_seed(name, &cipher, passphrase.as_str(), &record.kdf)?;
        let signing_key = SigningKey::from_bytes(&seed);
        let public_key = PublicKey::new(signing_key.verifying_key().to_bytes());
        if public_key != info.public_key {
            return Err(KeyStoreError::Corrupted {
                name: name.to_string(),
                reason: "解密出的私钥与记录的公钥不一致".to_string(),
            });
        }

        let signature = signing_key.sign(payload);
        Ok((signature.to_bytes().to_vec(), public_key))
    }
}

fn record_info(record: &KeyRecord) -> Result<KeyInfo, KeyStoreError> {
    let corrupted = |reason: String| KeyStoreError::Corrupted {
        name: record.name.clone(),
        reason,
    };
    let address: Address = record
        .address
        .parse()
        .map_err(|err| corrupted(format!("地址非法: {err}")))?;
    let key_bytes =
        hex::decode(&record.public_key).map_err(|err| corrupted(format!("公钥非法: {err}")))?;
    let public_key = PublicKey::from_slice(&key_bytes)
        .ok_or_else(|| corrupted(format!("公钥长度 {} 非法", key_bytes.len())))?;
    if Address::from_public_key(&public_key) != address {
        return Err(corrupted("地址与公钥不匹配".to_string()));
    }
    Ok(KeyInfo {
        name: record.name.clone(),
        address,
        public_key,
    })
}

fn validate_name(name: &str) -> Result<(), KeyStoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(KeyStoreError::InvalidName {
            name: name.to_string(),
        })
    }
}

fn encrypt_seed(plaintext: &[u8], password: &str, kdf: &KdfParams) -> Result<Vec<u8>, KeyStoreError> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let mut encryption_key = derive_encryption_key(password, &salt, kdf)?;
    let cipher = Aes256Gcm::new_from_slice(&encryption_key[..])
        .map_err(|err| KeyStoreError::Crypto(format!("初始化加密器失败: {err}")))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|err| KeyStoreError::Crypto(format!("加密私钥失败: {err}")))?;
    encryption_key.zeroize();

    let mut data = Vec::with_capacity(MAGIC.len() + 1 + SALT_SIZE + NONCE_SIZE + ciphertext.len());
    data.extend_from_slice(MAGIC);
    data.push(FORMAT_VERSION);
    data.extend_from_slice(&salt);
    data.extend_from_slice(&nonce);
    data.extend_from_slice(&ciphertext);
    Ok(data)
}

fn decrypt_seed(
    name: &str,
    data: &[u8],
    password: &str,
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; SEED_SIZE]>, KeyStoreError> {
    let corrupted = |reason: &str| KeyStoreError::Corrupted {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let header_len = MAGIC.len() + 1;
    if data.len() < header_len + SALT_SIZE + NONCE_SIZE {
        return Err(corrupted("密文长度不足"));
    }
    let (magic, rest) = data.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(corrupted("未知的密文格式"));
    }
    if rest[0] != FORMAT_VERSION {
        return Err(corrupted("不支持的密文版本"));
    }
    let rest = &rest[1..];

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&rest[..SALT_SIZE]);
    let nonce = &rest[SALT_SIZE..SALT_SIZE + NONCE_SIZE];
    let ciphertext = &rest[SALT_SIZE + NONCE_SIZE..];

    let mut encryption_key = derive_encryption_key(password, &salt, kdf)?;
    let cipher = Aes256Gcm::new_from_slice(&encryption_key[..])
        .map_err(|err| KeyStoreError::Crypto(format!("初始化解密器失败: {err}")))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| KeyStoreError::WrongPassphrase {
                name: name.to_string(),
            })?,
    );
    encryption_key.zeroize();

    let seed: [u8; SEED_SIZE] = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| corrupted("私钥长度非法"))?;
    Ok(Zeroizing::new(seed))
}

fn derive_encryption_key(
    password: &str,
    salt: &[u8; SALT_SIZE],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, KeyStoreError> {
    let params = Params::new(kdf.m_cost, kdf.t_cost, kdf.p_cost, Some(32))
        .map_err(|err| KeyStoreError::Crypto(format!("Argon2 参数无效: {err}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|err| KeyStoreError::Crypto(format!("派生加密密钥失败: {err}")))?;
    Ok(key)
}
