use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use super::{BotConfig, ConfigError};
use crate::chain::Address;
use crate::rpc::normalize_endpoint;

pub const NODE_ENV: &str = "QOSBOT_NODE";
pub const NONCE_NODE_ENV: &str = "QOSBOT_NONCE_NODE";

/// 校验后的运行参数，启动时构造一次，之后只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSettings {
    pub ticker: Duration,
    pub node: String,
    pub nonce_node: Option<String>,
    pub chain_id: String,
    pub from_chain_id: String,
    pub validator: Address,
    pub delegator: Address,
    pub amount: u64,
    pub compound: bool,
    pub max_gas: i64,
    pub nonce: Option<i64>,
    pub min_balance: u128,
    pub home: PathBuf,
    pub request_timeout: Duration,
}

impl BotSettings {
    pub fn from_config(config: &BotConfig) -> Result<Self, ConfigError> {
        Self::resolve(config, |key| env::var(key).ok())
    }

    fn resolve<F>(config: &BotConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if config.ticker == 0 {
            return Err(ConfigError::Invalid("ticker 必须大于 0".to_string()));
        }
        if config.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms 必须大于 0".to_string(),
            ));
        }

        let raw_node = env_value(NODE_ENV).unwrap_or_else(|| config.node.clone());
        let node = normalize_endpoint(&raw_node)
            .map_err(|err| ConfigError::Invalid(format!("node: {err}")))?;
        let nonce_node = env_value(NONCE_NODE_ENV)
            .or_else(|| config.nonce_node.clone())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| {
                normalize_endpoint(&value)
                    .map_err(|err| ConfigError::Invalid(format!("nonce_node: {err}")))
            })
            .transpose()?;

        let chain_id = config.chain_id.trim().to_string();
        if chain_id.is_empty() {
            return Err(ConfigError::Invalid("chain_id 未配置".to_string()));
        }

        let validator = parse_address("validator_address", &config.validator_address)?;
        let delegator = parse_address("delegator_address", &config.delegator_address)?;

        if config.amount == 0 {
            return Err(ConfigError::Invalid("amount 必须大于 0".to_string()));
        }
        if let Some(nonce) = config.nonce {
            if nonce < 0 {
                return Err(ConfigError::Invalid(format!("nonce 不能为负数: {nonce}")));
            }
        }

        Ok(Self {
            ticker: Duration::from_millis(config.ticker),
            node,
            nonce_node,
            chain_id,
            from_chain_id: config.from_chain_id.trim().to_string(),
            validator,
            delegator,
            amount: config.amount,
            compound: config.compound,
            max_gas: config.max_gas,
            // 0 表示不覆盖，仍从链上查询
            nonce: config.nonce.filter(|nonce| *nonce > 0),
            min_balance: u128::from(config.min_balance),
            home: expand_home(&config.home, lookup("HOME")),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    /// 启动时打印全部生效配置，不含任何密钥信息。
    pub fn log_summary(&self) {
        info!(
            target: "config",
            ticker_ms = self.ticker.as_millis() as u64,
            node = %self.node,
            nonce_node = self.nonce_node.as_deref().unwrap_or("-"),
            chain_id = %self.chain_id,
            from_chain_id = %self.from_chain_id,
            validator = %self.validator,
            delegator = %self.delegator,
            amount = self.amount,
            compound = self.compound,
            max_gas = self.max_gas,
            nonce = ?self.nonce,
            min_balance = %self.min_balance,
            home = %self.home.display(),
            request_timeout_ms = self.request_timeout.as_millis() as u64,
            "配置已生效"
        );
    }
}

/// 只解析密钥库目录，供不需要完整配置的 `keys` 子命令使用。
pub fn resolve_home(config: &BotConfig) -> PathBuf {
    expand_home(&config.home, env::var("HOME").ok())
}

fn parse_address(field: &str, raw: &str) -> Result<Address, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} 未配置")));
    }
    trimmed
        .parse()
        .map_err(|err| ConfigError::Invalid(format!("{field} 非法: {err}")))
}

fn expand_home(raw: &str, home_dir: Option<String>) -> PathBuf {
    let trimmed = raw.trim();
    match (trimmed.strip_prefix('~'), home_dir) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            PathBuf::from(format!("{home}{rest}"))
        }
        _ => PathBuf::from(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const ADDRESS: &str = "address1k0m8ucnqug974maa6g36zw7g2wvfd4sug6uxay";

    fn base_config() -> BotConfig {
        BotConfig {
            chain_id: "qos-test".to_string(),
            validator_address: ADDRESS.to_string(),
            delegator_address: ADDRESS.to_string(),
            amount: 10,
            ..BotConfig::default()
        }
    }

    fn resolve_with(config: &BotConfig, vars: &[(&str, &str)]) -> Result<BotSettings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        BotSettings::resolve(config, |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_resolve_to_normalised_values() {
        let settings = resolve_with(&base_config(), &[("HOME", "/home/bot")]).expect("settings");
        assert_eq!(settings.node, "http://127.0.0.1:26657/");
        assert_eq!(settings.ticker, Duration::from_secs(60));
        assert_eq!(settings.home, PathBuf::from("/home/bot/.qosbot"));
        assert!(settings.nonce_node.is_none());
        assert_eq!(settings.delegator.to_string(), ADDRESS);
    }

    #[test]
    fn environment_overrides_nodes() {
        let settings = resolve_with(
            &base_config(),
            &[
                (NODE_ENV, "tcp://10.1.1.1:26657"),
                (NONCE_NODE_ENV, "10.1.1.2:26657"),
            ],
        )
        .expect("settings");
        assert_eq!(settings.node, "http://10.1.1.1:26657/");
        assert_eq!(settings.nonce_node.as_deref(), Some("http://10.1.1.2:26657/"));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let mut config = base_config();
        config.chain_id = " ".to_string();
        assert!(matches!(
            resolve_with(&config, &[]),
            Err(ConfigError::Invalid(message)) if message.contains("chain_id")
        ));

        let mut config = base_config();
        config.delegator_address = "not-an-address".to_string();
        assert!(matches!(
            resolve_with(&config, &[]),
            Err(ConfigError::Invalid(message)) if message.contains("delegator_address")
        ));

        let mut config = base_config();
        config.amount = 0;
        assert!(resolve_with(&config, &[]).is_err());

        let mut config = base_config();
        config.ticker = 0;
        assert!(resolve_with(&config, &[]).is_err());

        let mut config = base_config();
        config.nonce = Some(-1);
        assert!(resolve_with(&config, &[]).is_err());
    }

    #[test]
    fn zero_nonce_means_query_the_chain() {
        let mut config = base_config();
        config.nonce = Some(0);
        assert_eq!(resolve_with(&config, &[]).expect("settings").nonce, None);

        config.nonce = Some(7);
        assert_eq!(resolve_with(&config, &[]).expect("settings").nonce, Some(7));
    }

    #[test]
    fn negative_max_gas_is_left_for_assembly() {
        let mut config = base_config();
        config.max_gas = -5;
        let settings = resolve_with(&config, &[]).expect("settings");
        assert_eq!(settings.max_gas, -5);
    }

    #[test]
    fn home_expansion_only_touches_leading_tilde() {
        assert_eq!(
            expand_home("~", Some("/root".to_string())),
            PathBuf::from("/root")
        );
        assert_eq!(
            expand_home("/srv/qosbot", Some("/root".to_string())),
            PathBuf::from("/srv/qosbot")
        );
        assert_eq!(expand_home("~other/x", Some("/root".to_string())), PathBuf::from("~other/x"));
        assert_eq!(expand_home("~/.qosbot", None), PathBuf::from("~/.qosbot"));
    }
}
