use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use once_cell::sync::OnceCell;
use tracing::info;

pub const CYCLES_TOTAL: &str = "qosbot_cycles_total";
pub const CYCLE_ERRORS_TOTAL: &str = "qosbot_cycle_errors_total";
pub const CYCLE_DURATION_SECONDS: &str = "qosbot_cycle_duration_seconds";

// 一个周期包含查询、签名与 broadcast_tx_commit，出块等待通常在秒级
const CYCLE_DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

static EXPORTER: OnceCell<SocketAddr> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleResult {
    Committed,
    Skipped,
    Failed,
}

impl CycleResult {
    pub fn label(self) -> &'static str {
        match self {
            CycleResult::Committed => "committed",
            CycleResult::Skipped => "skipped",
            CycleResult::Failed => "failed",
        }
    }
}

/// 安装 Prometheus HTTP 导出器，重复调用只生效一次。
pub fn try_init_prometheus(listen: &str) -> Result<()> {
    EXPORTER
        .get_or_try_init(|| {
            let addr: SocketAddr = listen
                .parse()
                .with_context(|| format!("invalid prometheus listen address: {listen}"))?;
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .set_buckets_for_metric(
                    Matcher::Full(CYCLE_DURATION_SECONDS.to_string()),
                    CYCLE_DURATION_BUCKETS,
                )
                .context("invalid histogram buckets")?
                .install()
                .context("failed to install prometheus exporter")?;
            describe_metrics();
            info!(target: "monitoring", listen = %addr, "Prometheus 导出器已启动");
            Ok(addr)
        })
        .map(|_| ())
}

pub fn prometheus_enabled() -> bool {
    EXPORTER.get().is_some()
}

fn describe_metrics() {
    describe_counter!(CYCLES_TOTAL, "委托周期数，按 result 区分");
    describe_counter!(CYCLE_ERRORS_TOTAL, "失败周期数，按错误 kind 区分");
    describe_histogram!(CYCLE_DURATION_SECONDS, Unit::Seconds, "单个委托周期耗时");
}

pub fn record_cycle(result: CycleResult, elapsed: Duration) {
    if !prometheus_enabled() {
        return;
    }
    counter!(CYCLES_TOTAL, "result" => result.label()).increment(1);
    histogram!(CYCLE_DURATION_SECONDS, "result" => result.label()).record(elapsed.as_secs_f64());
}

pub fn record_cycle_error(kind: &'static str) {
    if prometheus_enabled() {
        counter!(CYCLE_ERRORS_TOTAL, "kind" => kind).increment(1);
    }
}
