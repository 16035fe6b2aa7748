use serde::{Deserialize, Serialize};

use super::address::{Address, PublicKey};
use super::codec::{CodecError, canonical_bytes};

/// 创建委托：把 `amount` 个 QOS 从委托人委托给验证人。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCreateDelegation {
    pub delegator: Address,
    pub validator_owner: Address,
    pub amount: u64,
    pub is_compound: bool,
}

/// 业务子交易。签名流水线只关心 [`SubTransaction::signers`]。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubTransaction {
    CreateDelegation(TxCreateDelegation),
}

impl SubTransaction {
    pub fn signers(&self) -> Vec<Address> {
        match self {
            SubTransaction::CreateDelegation(tx) => vec![tx.delegator],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubTransaction::CreateDelegation(_) => "create_delegation",
        }
    }
}

impl From<TxCreateDelegation> for SubTransaction {
    fn from(tx: TxCreateDelegation) -> Self {
        SubTransaction::CreateDelegation(tx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub public_key: PublicKey,
    pub signature: Vec<u8>,
    pub nonce: i64,
}

/// 交易信封。组装后子交易、目标链与 gas 上限不可再变，签名只能追加。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEnvelope {
    itxs: Vec<SubTransaction>,
    chain_id: String,
    max_gas: u64,
    signatures: Vec<Signature>,
}

#[derive(Serialize)]
struct SignDoc<'a> {
    itxs: &'a [SubTransaction],
    chain_id: &'a str,
    max_gas: u64,
    nonce: i64,
    from_chain_id: &'a str,
}

impl TxEnvelope {
    pub(crate) fn new(chain_id: String, max_gas: u64, itxs: Vec<SubTransaction>) -> Self {
        Self {
            itxs,
            chain_id,
            max_gas,
            signatures: Vec::new(),
        }
    }

    pub fn itxs(&self) -> &[SubTransaction] {
        &self.itxs
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn max_gas(&self) -> u64 {
        self.max_gas
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// 所有子交易声明的签名者，按首次出现顺序去重。
    pub fn signers(&self) -> Vec<Address> {
        let mut signers: Vec<Address> = Vec::new();
        for address in self.itxs.iter().flat_map(SubTransaction::signers) {
            if !signers.contains(&address) {
                signers.push(address);
            }
        }
        signers
    }

    /// 待签名的规范字节：绑定 nonce、来源链以及信封的全部内容（不含已有签名）。
    pub fn signature_bytes(&self, nonce: i64, from_chain_id: &str) -> Result<Vec<u8>, CodecError> {
        canonical_bytes(&SignDoc {
            itxs: &self.itxs,
            chain_id: &self.chain_id,
            max_gas: self.max_gas,
            nonce,
            from_chain_id,
        })
    }

    pub(crate) fn push_signature(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }
}
