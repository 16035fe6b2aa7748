use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::account::AccountQueryClient;
use super::assembler::TxAssembler;
use super::broadcast::BroadcastClient;
use super::context::SigningContext;
use super::error::{EngineError, EngineResult};
use super::nonce::NonceResolver;
use super::scheduler::{CycleJob, CycleOutcome};
use super::signer::SigningPipeline;
use crate::chain::{SubTransaction, TxCreateDelegation};
use crate::config::BotSettings;

/// 委托周期：查询余额，满足条件时组装、签名并广播一笔委托交易。
pub struct DelegationCycle {
    settings: Arc<BotSettings>,
    accounts: AccountQueryClient,
    nonce_accounts: Option<AccountQueryClient>,
    assembler: TxAssembler,
    signer: SigningPipeline,
    broadcaster: BroadcastClient,
}

impl DelegationCycle {
    pub fn new(
        settings: Arc<BotSettings>,
        accounts: AccountQueryClient,
        nonce_accounts: Option<AccountQueryClient>,
        signer: SigningPipeline,
        broadcaster: BroadcastClient,
    ) -> Self {
        let assembler = TxAssembler::new(settings.chain_id.clone());
        Self {
            settings,
            accounts,
            nonce_accounts,
            assembler,
            signer,
            broadcaster,
        }
    }

    fn delegation(&self) -> EngineResult<SubTransaction> {
        if self.settings.amount == 0 {
            return Err(EngineError::InvalidAmount);
        }
        Ok(TxCreateDelegation {
            delegator: self.settings.delegator,
            validator_owner: self.settings.validator,
            amount: self.settings.amount,
            is_compound: self.settings.compound,
        }
        .into())
    }

    pub async fn run_once(&self) -> EngineResult<CycleOutcome> {
        let ctx = SigningContext::from_settings(&self.settings);
        let itx = self.delegation()?;
        let assembled = self.assembler.assemble(vec![itx], &ctx)?;

        let delegator = self.settings.delegator;
        let account = self.accounts.query_account(&delegator).await?;
        let required = u128::from(self.settings.amount).saturating_add(self.settings.min_balance);
        info!(
            target: "engine::cycle",
            delegator = %delegator,
            balance = %account.qos,
            nonce = account.nonce,
            required = %required,
            "delegator account"
        );
        if account.qos < required {
            return Ok(CycleOutcome::Skipped {
                reason: format!("余额 {} 不足，需要 {}", account.qos, required),
            });
        }

        let mut nonces = NonceResolver::new(&self.accounts, self.nonce_accounts.as_ref(), &ctx);
        let signed = self.signer.sign(assembled, &ctx, &mut nonces).await?;
        let receipt = self.broadcaster.broadcast(signed).await?;
        Ok(CycleOutcome::Committed(receipt))
    }
}

#[async_trait]
impl CycleJob for DelegationCycle {
    async fn run_cycle(&self) -> EngineResult<CycleOutcome> {
        self.run_once().await
    }
}
