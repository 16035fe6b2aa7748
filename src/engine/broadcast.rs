use std::sync::Arc;

use tracing::{info, warn};

use super::error::{EngineError, EngineResult};
use super::signer::SignedTx;
use crate::chain::{TxCodec, tx_hash};
use crate::rpc::TxBroadcaster;

/// 已上链交易的回执。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub hash: String,
    pub height: i64,
    pub gas_used: Option<i64>,
}

#[derive(Clone)]
pub struct BroadcastClient {
    broadcaster: Arc<dyn TxBroadcaster>,
    codec: Arc<dyn TxCodec>,
}

impl BroadcastClient {
    pub fn new(broadcaster: Arc<dyn TxBroadcaster>, codec: Arc<dyn TxCodec>) -> Self {
        Self { broadcaster, codec }
    }

    /// 提交并等待出块。链上拒绝不会在此重试，nonce 已被消耗。
    pub async fn broadcast(&self, signed: SignedTx) -> EngineResult<CommitReceipt> {
        let signers = signed
            .signer_order()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let envelope = signed.into_envelope();
        let bytes = self
            .codec
            .encode_tx(&envelope)
            .map_err(EngineError::Encode)?;
        let local_hash = tx_hash(&bytes);

        info!(
            target: "engine::broadcast",
            hash = %local_hash,
            size = bytes.len(),
            signatures = envelope.signatures().len(),
            signers = ?signers,
            "broadcasting transaction"
        );

        let result = match self.broadcaster.broadcast_tx_commit(&bytes).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    target: "engine::broadcast",
                    hash = %local_hash,
                    error = %err,
                    "广播请求失败，交易是否已上链未知；下个周期将重新查询 nonce"
                );
                return Err(err.into());
            }
        };

        let hash = if result.hash.trim().is_empty() {
            local_hash
        } else {
            result.hash.clone()
        };

        if let Some((stage, exec)) = result.failure() {
            return Err(EngineError::RejectedByChain {
                stage,
                code: exec.code,
                log: exec.log.clone(),
                hash,
            });
        }

        Ok(CommitReceipt {
            hash,
            height: result.height,
            gas_used: result.deliver_tx.gas_used,
        })
    }
}
