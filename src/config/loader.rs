use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::BotConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["qosbot.yaml", "config/qosbot.yaml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("配置非法: {0}")]
    Invalid(String),
}

/// 加载结果。`source` 为空表示未找到配置文件、使用了默认配置。
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: BotConfig,
    pub source: Option<PathBuf>,
}

/// 依次尝试显式路径或默认路径；都不存在时返回默认配置，由校验阶段报告缺失项。
pub fn load_config(path: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let explicit = path.is_some();
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<PathBuf>>(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            return Ok(LoadedConfig {
                config,
                source: Some(candidate),
            });
        } else if explicit {
            return Err(ConfigError::Io {
                path: candidate,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
    }

    Ok(LoadedConfig {
        config: BotConfig::default(),
        source: None,
    })
}

fn try_load_file(path: &Path) -> Result<Option<BotConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(config))
}

pub fn parse_config(contents: &str) -> Result<BotConfig, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(BotConfig::default());
    }
    serde_yaml::from_str(contents)
}
