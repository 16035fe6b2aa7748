use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::info;

use super::broadcast::CommitReceipt;
use super::error::{EngineError, EngineResult};
use crate::monitoring::events;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Committed(CommitReceipt),
    Skipped { reason: String },
}

/// 调度器驱动的一次完整周期。
#[async_trait]
pub trait CycleJob: Send + Sync {
    async fn run_cycle(&self) -> EngineResult<CycleOutcome>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub cycles: u64,
    pub committed: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl SchedulerSummary {
    fn record(&mut self, result: &EngineResult<CycleOutcome>) {
        self.cycles += 1;
        match result {
            Ok(CycleOutcome::Committed(_)) => self.committed += 1,
            Ok(CycleOutcome::Skipped { .. }) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// 固定周期调度：启动时先跑一次，之后每个 tick 串行执行一个周期。
#[derive(Clone, Copy, Debug)]
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// 运行到 `shutdown` 完成为止。进行中的周期不会被取消，结束后才检查退出信号。
    pub async fn run<J, S>(&self, job: &J, shutdown: S) -> SchedulerSummary
    where
        J: CycleJob + ?Sized,
        S: Future<Output = ()>,
    {
        let mut summary = SchedulerSummary::default();
        tokio::pin!(shutdown);

        info!(
            target: "scheduler",
            period_ms = self.period.as_millis() as u64,
            "running warm-up cycle"
        );
        run_and_report(job, &mut summary).await;

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(
                        target: "scheduler",
                        cycles = summary.cycles,
                        committed = summary.committed,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "scheduler stopped"
                    );
                    break;
                }
                _ = ticker.tick() => {
                    run_and_report(job, &mut summary).await;
                }
            }
        }

        summary
    }
}

/// 周期边界的兜底：panic 转成 `InternalFault`，不影响计时器与进程。
pub async fn run_guarded<J>(job: &J) -> EngineResult<CycleOutcome>
where
    J: CycleJob + ?Sized,
{
    match AssertUnwindSafe(job.run_cycle()).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(EngineError::InternalFault(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn run_and_report<J>(job: &J, summary: &mut SchedulerSummary)
where
    J: CycleJob + ?Sized,
{
    let started = Instant::now();
    let result = run_guarded(job).await;
    let elapsed = started.elapsed();
    match &result {
        Ok(CycleOutcome::Committed(receipt)) => events::cycle_committed(receipt, elapsed),
        Ok(CycleOutcome::Skipped { reason }) => events::cycle_skipped(reason, elapsed),
        Err(err) => events::cycle_failed(err, elapsed),
    }
    summary.record(&result);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::rpc::RpcError;

    struct ScriptedJob {
        calls: AtomicUsize,
        in_flight: AtomicBool,
        work: Duration,
        panic_on: Option<usize>,
    }

    impl ScriptedJob {
        fn new(work: Duration, panic_on: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicBool::new(false),
                work,
                panic_on,
            }
        }
    }

    #[async_trait]
    impl CycleJob for ScriptedJob {
        async fn run_cycle(&self) -> EngineResult<CycleOutcome> {
            assert!(
                !self.in_flight.swap(true, Ordering::SeqCst),
                "cycles must not overlap"
            );
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.work.is_zero() {
                tokio::time::sleep(self.work).await;
            }
            self.in_flight.store(false, Ordering::SeqCst);

            if Some(call) == self.panic_on {
                panic!("cycle {call} exploded");
            }
            match call % 3 {
                0 => Ok(CycleOutcome::Skipped {
                    reason: "balance too low".to_string(),
                }),
                1 => Err(EngineError::Transport(RpcError::Timeout {
                    endpoint: "http://node/".to_string(),
                })),
                _ => Ok(CycleOutcome::Committed(CommitReceipt {
                    hash: format!("HASH{call}"),
                    height: call as i64,
                    gas_used: None,
                })),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn warm_up_runs_before_first_tick_and_ticks_follow() {
        let job = ScriptedJob::new(Duration::ZERO, None);
        let scheduler = Scheduler::new(Duration::from_secs(1));

        let summary = scheduler
            .run(&job, tokio::time::sleep(Duration::from_millis(3_500)))
            .await;

        // warm-up at t=0, ticks at 1s, 2s, 3s
        assert_eq!(summary.cycles, 4);
        assert_eq!(job.calls.load(Ordering::SeqCst), 4);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.committed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_cycle_is_contained() {
        let job = ScriptedJob::new(Duration::ZERO, Some(1));
        let scheduler = Scheduler::new(Duration::from_secs(1));

        let summary = scheduler
            .run(&job, tokio::time::sleep(Duration::from_millis(2_500)))
            .await;

        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(job.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn guarded_panic_becomes_internal_fault() {
        let job = ScriptedJob::new(Duration::ZERO, Some(0));
        let err = run_guarded(&job).await.expect_err("panic converted");
        match err {
            EngineError::InternalFault(message) => assert!(message.contains("cycle 0 exploded")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycles_never_overlap() {
        let job = ScriptedJob::new(Duration::from_millis(2_500), None);
        let scheduler = Scheduler::new(Duration::from_secs(1));

        let summary = scheduler
            .run(&job, tokio::time::sleep(Duration::from_secs(10)))
            .await;

        // 周期耗时 2.5s：0s 预热，3.5s 首个 tick，之后错过的 tick 只补一次
        assert_eq!(summary.cycles, 4);
    }
}
