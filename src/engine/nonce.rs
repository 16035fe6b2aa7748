use tracing::debug;

use super::account::AccountQueryClient;
use super::context::SigningContext;
use super::error::{EngineError, EngineResult};
use crate::chain::Address;

/// 单次签名流程内的 nonce 来源。每个周期重新构造，不跨周期复用。
pub struct NonceResolver<'a> {
    source: &'a AccountQueryClient,
    override_base: Option<i64>,
    processed: i64,
}

impl<'a> NonceResolver<'a> {
    /// 配置了独立 nonce 节点时查询它，否则查询主节点。
    pub fn new(
        primary: &'a AccountQueryClient,
        nonce_node: Option<&'a AccountQueryClient>,
        ctx: &SigningContext,
    ) -> Self {
        Self {
            source: nonce_node.unwrap_or(primary),
            override_base: ctx.nonce_override,
            processed: 0,
        }
    }

    /// 本周期已分配 nonce 的签名者数量。
    pub fn processed(&self) -> i64 {
        self.processed
    }

    pub async fn resolve(&mut self, signer: &Address) -> EngineResult<i64> {
        let invalid = |detail: String| EngineError::InvalidNonce {
            address: *signer,
            detail,
        };

        let nonce = match self.override_base {
            Some(base) => {
                if base < 0 {
                    return Err(invalid(format!("nonce 覆盖值为负数: {base}")));
                }
                base.checked_add(self.processed)
                    .and_then(|value| value.checked_add(1))
                    .ok_or_else(|| invalid(format!("nonce 覆盖值溢出: {base}")))?
            }
            None => {
                let account = self.source.query_account(signer).await?;
                if account.nonce < 0 {
                    return Err(invalid(format!("链上 nonce 为负数: {}", account.nonce)));
                }
                account
                    .nonce
                    .checked_add(1)
                    .ok_or_else(|| invalid(format!("链上 nonce 溢出: {}", account.nonce)))?
            }
        };
        if nonce <= 0 {
            return Err(invalid(format!("解析出的 nonce 非正数: {nonce}")));
        }

        self.processed += 1;
        debug!(
            target: "engine::signer",
            signer = %signer,
            nonce,
            overridden = self.override_base.is_some(),
            endpoint = self.source.endpoint(),
            "nonce resolved"
        );
        Ok(nonce)
    }
}
