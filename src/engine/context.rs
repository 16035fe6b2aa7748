use crate::config::BotSettings;

/// 单个周期内的签名上下文，周期结束即丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    pub node: String,
    pub nonce_node: Option<String>,
    /// 为空时由组装器回落到默认链。
    pub chain_id: Option<String>,
    /// 同链交易为空串。
    pub from_chain_id: String,
    pub max_gas: i64,
    /// 设置后不再查询链上 nonce，而是在本地逐个签名者递增。
    pub nonce_override: Option<i64>,
}

impl SigningContext {
    pub fn from_settings(settings: &BotSettings) -> Self {
        Self {
            node: settings.node.clone(),
            nonce_node: settings.nonce_node.clone(),
            chain_id: Some(settings.chain_id.clone()),
            from_chain_id: settings.from_chain_id.clone(),
            max_gas: settings.max_gas,
            nonce_override: settings.nonce,
        }
    }
}
