use serde::Deserialize;

/// `qosbot.yaml` 的原始结构。字段含义见 `qosbot.yaml` 模版。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// 周期间隔（毫秒）。
    #[serde(default = "super::default_ticker_ms")]
    pub ticker: u64,
    #[serde(default = "super::default_node")]
    pub node: String,
    /// 查询 nonce 使用的独立节点，缺省时使用 `node`。
    #[serde(default)]
    pub nonce_node: Option<String>,
    #[serde(default)]
    pub chain_id: String,
    /// 跨链交易的来源链，同链交易留空。
    #[serde(default)]
    pub from_chain_id: String,
    #[serde(default)]
    pub validator_address: String,
    #[serde(default)]
    pub delegator_address: String,
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub compound: bool,
    #[serde(default, alias = "max-gas")]
    pub max_gas: i64,
    /// 显式 nonce，大于 0 时不再查询链上状态。
    #[serde(default)]
    pub nonce: Option<i64>,
    /// 委托后账户至少保留的余额。
    #[serde(default)]
    pub min_balance: u64,
    #[serde(default = "super::default_home")]
    pub home: String,
    #[serde(default = "super::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            ticker: super::default_ticker_ms(),
            node: super::default_node(),
            nonce_node: None,
            chain_id: String::new(),
            from_chain_id: String::new(),
            validator_address: String::new(),
            delegator_address: String::new(),
            amount: 0,
            compound: false,
            max_gas: 0,
            nonce: None,
            min_balance: 0,
            home: super::default_home(),
            request_timeout_ms: super::default_request_timeout_ms(),
            logging: LoggingConfig::default(),
            prometheus: PrometheusConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "super::default_timezone_offset_hours")]
    pub timezone_offset_hours: i8,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: super::default_logging_level(),
            json: false,
            timezone_offset_hours: super::default_timezone_offset_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "super::default_prometheus_listen")]
    pub listen: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            listen: super::default_prometheus_listen(),
        }
    }
}
