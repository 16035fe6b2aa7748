//! 配置：YAML 文件加载、默认值、校验与环境变量覆盖。

pub mod loader;
pub mod settings;
pub mod types;

pub use loader::*;
pub use settings::{BotSettings, resolve_home};
pub use types::*;

pub(crate) fn default_ticker_ms() -> u64 {
    60_000
}

pub(crate) fn default_node() -> String {
    "tcp://127.0.0.1:26657".to_string()
}

pub(crate) fn default_home() -> String {
    "~/.qosbot".to_string()
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    30_000
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_timezone_offset_hours() -> i8 {
    0
}

pub(crate) fn default_prometheus_listen() -> String {
    "0.0.0.0:9898".to_string()
}
