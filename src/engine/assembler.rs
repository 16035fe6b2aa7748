use super::context::SigningContext;
use super::error::{EngineError, EngineResult};
use crate::chain::{Address, SubTransaction, TxEnvelope};

/// 组装结果：未签名信封与签名顺序。签名顺序在此固定，签名阶段不得改动。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledTx {
    pub envelope: TxEnvelope,
    pub signer_order: Vec<Address>,
}

#[derive(Debug, Clone)]
pub struct TxAssembler {
    default_chain_id: String,
}

impl TxAssembler {
    pub fn new(default_chain_id: impl Into<String>) -> Self {
        Self {
            default_chain_id: default_chain_id.into(),
        }
    }

    /// 纯本地校验与构造，不做任何网络请求。
    pub fn assemble(
        &self,
        itxs: Vec<SubTransaction>,
        ctx: &SigningContext,
    ) -> EngineResult<AssembledTx> {
        if ctx.max_gas < 0 {
            return Err(EngineError::InvalidFee(ctx.max_gas));
        }
        if itxs.is_empty() {
            return Err(EngineError::EmptyEnvelope);
        }

        let chain_id = ctx
            .chain_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(self.default_chain_id.as_str());
        if chain_id.is_empty() {
            return Err(EngineError::InvalidConfig("未配置目标 chain_id".to_string()));
        }

        let envelope = TxEnvelope::new(chain_id.to_string(), ctx.max_gas as u64, itxs);
        let signer_order = envelope.signers();
        Ok(AssembledTx {
            envelope,
            signer_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::address::ADDRESS_LEN;
    use crate::chain::TxCreateDelegation;

    fn addr(tag: u8) -> Address {
        Address::new([tag; ADDRESS_LEN])
    }

    fn delegation(delegator: u8) -> SubTransaction {
        TxCreateDelegation {
            delegator: addr(delegator),
            validator_owner: addr(0xaa),
            amount: 10,
            is_compound: true,
        }
        .into()
    }

    fn ctx(chain_id: Option<&str>, max_gas: i64) -> SigningContext {
        SigningContext {
            node: "http://primary/".to_string(),
            nonce_node: None,
            chain_id: chain_id.map(str::to_string),
            from_chain_id: String::new(),
            max_gas,
            nonce_override: None,
        }
    }

    #[test]
    fn signer_order_is_first_seen_and_deduplicated() {
        let assembler = TxAssembler::new("qos-test");
        let assembled = assembler
            .assemble(
                vec![delegation(2), delegation(1), delegation(2), delegation(3)],
                &ctx(None, 100),
            )
            .expect("assemble");
        assert_eq!(assembled.signer_order, vec![addr(2), addr(1), addr(3)]);
        assert!(assembled.envelope.signatures().is_empty());
        assert_eq!(assembled.envelope.max_gas(), 100);
    }

    #[test]
    fn negative_fee_is_rejected_before_anything_else() {
        let assembler = TxAssembler::new("qos-test");
        assert!(matches!(
            assembler.assemble(vec![delegation(1)], &ctx(None, -1)),
            Err(EngineError::InvalidFee(-1))
        ));
        assert!(matches!(
            assembler.assemble(Vec::new(), &ctx(None, -1)),
            Err(EngineError::InvalidFee(-1))
        ));
    }

    #[test]
    fn empty_sub_transactions_are_rejected() {
        let assembler = TxAssembler::new("qos-test");
        assert!(matches!(
            assembler.assemble(Vec::new(), &ctx(None, 0)),
            Err(EngineError::EmptyEnvelope)
        ));
    }

    #[test]
    fn chain_id_falls_back_to_default() {
        let assembler = TxAssembler::new("qos-test");
        let defaulted = assembler
            .assemble(vec![delegation(1)], &ctx(Some("  "), 0))
            .expect("assemble");
        assert_eq!(defaulted.envelope.chain_id(), "qos-test");

        let explicit = assembler
            .assemble(vec![delegation(1)], &ctx(Some("qsc-1"), 0))
            .expect("assemble");
        assert_eq!(explicit.envelope.chain_id(), "qsc-1");

        let unset = TxAssembler::new("");
        assert!(matches!(
            unset.assemble(vec![delegation(1)], &ctx(None, 0)),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn assembly_is_repeatable() {
        let assembler = TxAssembler::new("qos-test");
        let context = ctx(None, 5);
        let first = assembler
            .assemble(vec![delegation(1), delegation(2)], &context)
            .expect("assemble");
        let second = assembler
            .assemble(vec![delegation(1), delegation(2)], &context)
            .expect("assemble");
        assert_eq!(first, second);
    }
}
