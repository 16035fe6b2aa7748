//! 测试替身：脚本化的节点与内存密钥库。

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use parking_lot::Mutex;

use crate::chain::codec::canonical_bytes;
use crate::chain::{Account, Address, PublicKey, account_store_key, tx_hash};
use crate::config::BotSettings;
use crate::keys::{KeyInfo, KeyStore, KeyStoreError, Passphrase};
use crate::rpc::{AbciQuery, CommitResult, RpcError, TxBroadcaster, TxExecResult};

pub struct FakeNode {
    endpoint: String,
    store: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    query_failures: Mutex<VecDeque<RpcError>>,
    broadcast_script: Mutex<VecDeque<Result<CommitResult, RpcError>>>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
    queries: AtomicUsize,
}

impl FakeNode {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            store: Mutex::new(HashMap::new()),
            query_failures: Mutex::new(VecDeque::new()),
            broadcast_script: Mutex::new(VecDeque::new()),
            broadcasts: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn put_account(&self, account: &Account) {
        let bytes = canonical_bytes(account).expect("encode account");
        self.put_raw(&account.address, bytes);
    }

    pub fn put_raw(&self, address: &Address, bytes: Vec<u8>) {
        self.store.lock().insert(account_store_key(address), bytes);
    }

    pub fn fail_next_query(&self, err: RpcError) {
        self.query_failures.lock().push_back(err);
    }

    /// 脚本耗尽后默认返回成功的提交结果。
    pub fn push_broadcast(&self, result: Result<CommitResult, RpcError>) {
        self.broadcast_script.lock().push_back(result);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().len()
    }

    pub fn last_broadcast(&self) -> Option<Vec<u8>> {
        self.broadcasts.lock().last().cloned()
    }
}

#[async_trait]
impl AbciQuery for FakeNode {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn abci_query(&self, _path: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.query_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.store.lock().get(data).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TxBroadcaster for FakeNode {
    async fn broadcast_tx_commit(&self, tx: &[u8]) -> Result<CommitResult, RpcError> {
        let height = {
            let mut broadcasts = self.broadcasts.lock();
            broadcasts.push(tx.to_vec());
            broadcasts.len() as i64
        };
        match self.broadcast_script.lock().pop_front() {
            Some(result) => result,
            None => Ok(CommitResult {
                check_tx: TxExecResult::default(),
                deliver_tx: TxExecResult::default(),
                hash: tx_hash(tx),
                height,
            }),
        }
    }
}

/// 所有密钥共用一个口令的内存密钥库。
pub struct MemoryKeyStore {
    passphrase: String,
    keys: Mutex<BTreeMap<String, SigningKey>>,
    sign_calls: AtomicUsize,
}

impl MemoryKeyStore {
    pub fn new(passphrase: &str) -> Self {
        Self {
            passphrase: passphrase.to_string(),
            keys: Mutex::new(BTreeMap::new()),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, name: &str, seed: [u8; 32]) -> KeyInfo {
        let key = SigningKey::from_bytes(&seed);
        let info = info_for(name, &key);
        self.keys.lock().insert(name.to_string(), key);
        info
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

fn info_for(name: &str, key: &SigningKey) -> KeyInfo {
    let public_key = PublicKey::new(key.verifying_key().to_bytes());
    KeyInfo {
        name: name.to_string(),
        address: Address::from_public_key(&public_key),
        public_key,
    }
}

impl KeyStore for MemoryKeyStore {
    fn key_info(&self, name: &str) -> Result<KeyInfo, KeyStoreError> {
        self.keys
            .lock()
            .get(name)
            .map(|key| info_for(name, key))
            .ok_or_else(|| KeyStoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn name_by_address(&self, address: &Address) -> Result<Option<String>, KeyStoreError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|info| info.address == *address)
            .map(|info| info.name))
    }

    fn list(&self) -> Result<Vec<KeyInfo>, KeyStoreError> {
        Ok(self
            .keys
            .lock()
            .iter()
            .map(|(name, key)| info_for(name, key))
            .collect())
    }

    fn sign(
        &self,
        name: &str,
        passphrase: &Passphrase,
        payload: &[u8],
    ) -> Result<(Vec<u8>, PublicKey), KeyStoreError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if passphrase.as_str() != self.passphrase {
            return Err(KeyStoreError::WrongPassphrase {
                name: name.to_string(),
            });
        }
        let keys = self.keys.lock();
        let key = keys.get(name).ok_or_else(|| KeyStoreError::NotFound {
            name: name.to_string(),
        })?;
        let public_key = PublicKey::new(key.verifying_key().to_bytes());
        Ok((key.sign(payload).to_bytes().to_vec(), public_key))
    }
}

pub fn settings_for(delegator: Address, validator: Address) -> BotSettings {
    BotSettings {
        ticker: Duration::from_secs(60),
        node: "http://primary/".to_string(),
        nonce_node: None,
        chain_id: "qos-test".to_string(),
        from_chain_id: String::new(),
        validator,
        delegator,
        amount: 1_000,
        compound: false,
        max_gas: 0,
        nonce: None,
        min_balance: 0,
        home: PathBuf::from("/tmp/qosbot-test"),
        request_timeout: Duration::from_secs(5),
    }
}
