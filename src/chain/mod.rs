//! 链上数据模型：地址、账户、子交易与交易信封，以及默认的线上编码。

pub mod account;
pub mod address;
pub mod codec;
pub mod tx;

pub use account::{ACCOUNT_STORE_PATH, Account, account_store_key};
pub use address::{Address, PublicKey};
pub use codec::{BincodeCodec, CodecError, TxCodec, tx_hash};
pub use tx::{Signature, SubTransaction, TxCreateDelegation, TxEnvelope};
