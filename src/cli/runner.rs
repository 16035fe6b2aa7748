use anyhow::Result;
use tracing::{info, warn};

use crate::cli::args::{Cli, Command};
use crate::cli::context::{init_configs, init_tracing, print_version};
use crate::cli::keys::handle_keys_cmd;
use crate::cli::start::run_start;
use crate::config::{BotSettings, LoadedConfig, load_config};

pub async fn run(cli: Cli) -> Result<()> {
    let Cli { config, command } = cli;

    match command {
        Command::Init(args) => init_configs(args),
        Command::Version => {
            print_version();
            Ok(())
        }
        Command::Keys(cmd) => {
            let loaded = load_config(config)?;
            handle_keys_cmd(cmd, &loaded.config)
        }
        Command::Start => {
            let LoadedConfig { config, source } = load_config(config)?;
            init_tracing(&config.logging)?;
            match source {
                Some(path) => info!(target: "config", path = %path.display(), "配置文件已加载"),
                None => warn!(target: "config", "未找到配置文件，使用默认配置"),
            }
            if config.prometheus.enable {
                crate::monitoring::try_init_prometheus(&config.prometheus.listen)?;
            }
            let settings = BotSettings::from_config(&config)?;
            run_start(settings).await
        }
    }
}
