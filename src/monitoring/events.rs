use std::time::Duration;

use tracing::{error, info, warn};

use super::metrics::{CycleResult, record_cycle, record_cycle_error};
use crate::engine::{CommitReceipt, EngineError};

pub fn cycle_committed(receipt: &CommitReceipt, elapsed: Duration) {
    info!(
        target: "engine::cycle",
        event = "committed",
        hash = %receipt.hash,
        height = receipt.height,
        gas_used = ?receipt.gas_used,
        elapsed_ms = elapsed.as_millis() as u64,
        "委托交易已上链"
    );

    record_cycle(CycleResult::Committed, elapsed);
}

pub fn cycle_skipped(reason: &str, elapsed: Duration) {
    info!(
        target: "engine::cycle",
        event = "skipped",
        reason,
        elapsed_ms = elapsed.as_millis() as u64,
        "本周期未满足委托条件"
    );

    record_cycle(CycleResult::Skipped, elapsed);
}

/// 可重试的错误记为 warn，配置或凭据类问题记为 error。
pub fn cycle_failed(err: &EngineError, elapsed: Duration) {
    let kind = err.kind();
    if err.is_retryable() {
        warn!(
            target: "engine::cycle",
            event = "failed",
            kind,
            error = %err,
            elapsed_ms = elapsed.as_millis() as u64,
            "周期失败，下个 tick 重试"
        );
    } else {
        error!(
            target: "engine::cycle",
            event = "failed",
            kind,
            error = %err,
            elapsed_ms = elapsed.as_millis() as u64,
            "周期失败"
        );
    }

    record_cycle(CycleResult::Failed, elapsed);
    record_cycle_error(kind);
}
