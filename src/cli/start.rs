use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::chain::{BincodeCodec, TxCodec};
use crate::config::BotSettings;
use crate::engine::{
    AccountQueryClient, BroadcastClient, DelegationCycle, Scheduler, SigningPipeline,
};
use crate::keys::{FileKeyStore, KeyStore, capture_passphrase};
use crate::rpc::NodeClient;

/// 启动顺序：打开密钥库 → 一次性录入口令 → 构造客户端 → 预热周期 → 定时循环。
pub async fn run_start(settings: BotSettings) -> Result<()> {
    settings.log_summary();

    let keystore = Arc::new(
        FileKeyStore::open(&settings.home)
            .with_context(|| format!("打开密钥库失败: {}", settings.home.display()))?,
    );
    let delegator_key = keystore
        .name_by_address(&settings.delegator)?
        .ok_or_else(|| {
            anyhow!(
                "委托人 {} 不在密钥库 {} 中，请先执行 `qosbot keys add`",
                settings.delegator,
                keystore.dir().display()
            )
        })?;
    info!(target: "keys", key = %delegator_key, address = %settings.delegator, "委托人密钥已找到");

    let verifier = Arc::clone(&keystore);
    let key_name = delegator_key.clone();
    let passphrase = tokio::task::spawn_blocking(move || {
        capture_passphrase(&key_name, |candidate| {
            verifier.verify_passphrase(&key_name, candidate)
        })
    })
    .await
    .context("口令录入任务异常退出")??;

    let codec: Arc<dyn TxCodec> = Arc::new(BincodeCodec);
    let node = Arc::new(NodeClient::new(&settings.node, settings.request_timeout)?);
    let nonce_accounts = match settings.nonce_node.as_deref() {
        Some(endpoint) => {
            let client = Arc::new(NodeClient::new(endpoint, settings.request_timeout)?);
            Some(AccountQueryClient::new(client, Arc::clone(&codec)))
        }
        None => None,
    };

    let settings = Arc::new(settings);
    let cycle = DelegationCycle::new(
        Arc::clone(&settings),
        AccountQueryClient::new(node.clone(), Arc::clone(&codec)),
        nonce_accounts,
        SigningPipeline::new(keystore, Arc::new(passphrase)),
        BroadcastClient::new(node, codec),
    );

    let scheduler = Scheduler::new(settings.ticker);
    let summary = scheduler
        .run(&cycle, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(target: "scheduler", error = %err, "监听退出信号失败");
                std::future::pending::<()>().await;
            }
            info!(target: "scheduler", "收到退出信号，等待当前周期结束");
        })
        .await;

    info!(
        target: "scheduler",
        cycles = summary.cycles,
        committed = summary.committed,
        skipped = summary.skipped,
        failed = summary.failed,
        "qosbot 已退出"
    );
    Ok(())
}
