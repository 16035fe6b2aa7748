use std::sync::Arc;

use tracing::{debug, info};

use super::assembler::AssembledTx;
use super::context::SigningContext;
use super::error::{EngineError, EngineResult};
use super::nonce::NonceResolver;
use crate::chain::{Address, PublicKey, Signature, SubTransaction, TxEnvelope};
use crate::keys::{KeyStore, KeyStoreError, Passphrase};

/// 已按签名顺序完成全部签名的信封。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    envelope: TxEnvelope,
    signer_order: Vec<Address>,
}

impl SignedTx {
    pub fn envelope(&self) -> &TxEnvelope {
        &self.envelope
    }

    pub fn signer_order(&self) -> &[Address] {
        &self.signer_order
    }

    pub fn into_envelope(self) -> TxEnvelope {
        self.envelope
    }
}

/// 多签流水线。任一签名者失败都会丢弃整个信封，下个周期需从组装重新开始。
#[derive(Clone)]
pub struct SigningPipeline {
    keystore: Arc<dyn KeyStore>,
    passphrase: Arc<Passphrase>,
}

impl SigningPipeline {
    pub fn new(keystore: Arc<dyn KeyStore>, passphrase: Arc<Passphrase>) -> Self {
        Self {
            keystore,
            passphrase,
        }
    }

    pub async fn sign(
        &self,
        assembled: AssembledTx,
        ctx: &SigningContext,
        nonces: &mut NonceResolver<'_>,
    ) -> EngineResult<SignedTx> {
        let AssembledTx {
            mut envelope,
            signer_order,
        } = assembled;

        for (index, signer) in signer_order.iter().enumerate() {
            let name = self
                .keystore
                .name_by_address(signer)
                .map_err(|source| EngineError::Signature {
                    name: signer.to_string(),
                    source,
                })?
                .ok_or(EngineError::UnknownSigner { address: *signer })?;

            let nonce = nonces.resolve(signer).await?;
            let payload = envelope
                .signature_bytes(nonce, &ctx.from_chain_id)
                .map_err(EngineError::Encode)?;

            let (signature, public_key) = self.sign_payload(&name, payload).await?;
            let derived = Address::from_public_key(&public_key);
            if derived != *signer {
                return Err(EngineError::Signature {
                    name: name.clone(),
                    source: KeyStoreError::Corrupted {
                        name,
                        reason: format!("公钥对应地址 {derived} 与签名者 {signer} 不一致"),
                    },
                });
            }

            envelope.push_signature(Signature {
                public_key,
                signature,
                nonce,
            });
            debug!(
                target: "engine::signer",
                index,
                key = %name,
                signer = %signer,
                nonce,
                "signature appended"
            );
        }

        if envelope.signatures().len() != signer_order.len() {
            return Err(EngineError::InternalFault(format!(
                "签名数量 {} 与签名者数量 {} 不一致",
                envelope.signatures().len(),
                signer_order.len()
            )));
        }

        info!(
            target: "engine::signer",
            signers = signer_order.len(),
            itxs = ?envelope.itxs().iter().map(SubTransaction::kind).collect::<Vec<_>>(),
            chain_id = envelope.chain_id(),
            from_chain_id = %ctx.from_chain_id,
            "envelope signed"
        );
        Ok(SignedTx {
            envelope,
            signer_order,
        })
    }

    /// Argon2 解密私钥较慢，放到阻塞线程池执行。
    async fn sign_payload(
        &self,
        name: &str,
        payload: Vec<u8>,
    ) -> EngineResult<(Vec<u8>, PublicKey)> {
        let keystore = Arc::clone(&self.keystore);
        let passphrase = Arc::clone(&self.passphrase);
        let key_name = name.to_string();
        let result = tokio::task::spawn_blocking(move || {
            keystore.sign(&key_name, &passphrase, &payload)
        })
        .await
        .map_err(|err| EngineError::InternalFault(format!("签名任务异常退出: {err}")))?;

        result.map_err(|source| EngineError::Signature {
            name: name.to_string(),
            source,
        })
    }
}
