use std::fs;

use anyhow::{Result, anyhow};
use time::UtcOffset;
use time::macros::format_description;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::args::InitCmd;
use crate::config::LoggingConfig;

const CONFIG_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/qosbot.yaml"));

pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // 压低 HTTP 依赖的调试输出；显式配置了对应 target 时不覆盖
    const QUIET_TARGETS: &[(&str, &str)] = &[
        ("hyper", "warn"),
        ("hyper_util::client::legacy", "warn"),
        ("reqwest", "info"),
    ];
    for (module, level) in QUIET_TARGETS {
        if !config.level.contains(module) {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::from_hms(config.timezone_offset_hours, 0, 0).map_err(|err| {
        anyhow!(
            "invalid logging timezone offset {}: {err}",
            config.timezone_offset_hours
        )
    })?;
    let offset_timer = OffsetTime::new(offset, time_format);

    let base = fmt()
        .with_timer(offset_timer)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true)
        .with_level(true);

    if config.json {
        base.json()
            .with_current_span(false)
            .with_span_list(false)
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    } else {
        base.with_env_filter(filter)
            .event_format(fmt::format().compact())
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    }
    Ok(())
}

pub fn init_configs(args: InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(&output_dir)?;

    let target_path = output_dir.join("qosbot.yaml");
    if target_path.exists() && !args.force {
        println!(
            "跳过 {}（文件已存在，如需覆盖请加 --force）",
            target_path.display()
        );
        return Ok(());
    }

    fs::write(&target_path, CONFIG_TEMPLATE)?;
    println!("已写入 {}", target_path.display());
    Ok(())
}

pub fn print_version() {
    println!("qosbot - QOS 自动委托机器人");
    println!("-----------------------------");
    println!("version:\t{}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn bundled_template_parses() {
        let config = parse_config(CONFIG_TEMPLATE).expect("template parses");
        assert_eq!(config.ticker, 60_000);
        assert!(!config.prometheus.enable);
    }

    #[test]
    fn init_respects_force_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("qosbot.yaml");
        fs::write(&target, "custom").expect("write");

        init_configs(InitCmd {
            output: Some(dir.path().to_path_buf()),
            force: false,
        })
        .expect("init");
        assert_eq!(fs::read_to_string(&target).expect("read"), "custom");

        init_configs(InitCmd {
            output: Some(dir.path().to_path_buf()),
            force: true,
        })
        .expect("init");
        assert_eq!(fs::read_to_string(&target).expect("read"), CONFIG_TEMPLATE);
    }
}
