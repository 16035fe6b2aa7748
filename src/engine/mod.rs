//! 委托周期的核心流水线：账户查询、nonce 解析、组装、多签、广播与调度。

mod account;
mod assembler;
mod broadcast;
mod context;
mod cycle;
mod error;
mod nonce;
mod scheduler;
mod signer;

pub use account::AccountQueryClient;
pub use broadcast::{BroadcastClient, CommitReceipt};
pub use cycle::DelegationCycle;
pub use error::EngineError;
pub use scheduler::Scheduler;
pub use signer::SigningPipeline;
