use std::sync::Arc;

use tracing::debug;

use super::error::{EngineError, EngineResult};
use crate::chain::{ACCOUNT_STORE_PATH, Account, Address, TxCodec, account_store_key};
use crate::rpc::AbciQuery;

/// 只读账户查询。本层不做重试，由调度器在下一个周期重来。
#[derive(Clone)]
pub struct AccountQueryClient {
    query: Arc<dyn AbciQuery>,
    codec: Arc<dyn TxCodec>,
}

impl AccountQueryClient {
    pub fn new(query: Arc<dyn AbciQuery>, codec: Arc<dyn TxCodec>) -> Self {
        Self { query, codec }
    }

    pub fn endpoint(&self) -> &str {
        self.query.endpoint()
    }

    pub async fn query_account(&self, address: &Address) -> EngineResult<Account> {
        let key = account_store_key(address);
        let bytes = self.query.abci_query(ACCOUNT_STORE_PATH, &key).await?;
        if bytes.is_empty() {
            return Err(EngineError::NotFound { address: *address });
        }

        let account = self
            .codec
            .decode_account(&bytes)
            .map_err(EngineError::Decode)?;
        debug!(
            target: "engine::cycle",
            endpoint = self.endpoint(),
            address = %address,
            nonce = account.nonce,
            qos = %account.qos,
            "account fetched"
        );
        Ok(account)
    }
}
