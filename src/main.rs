//! Rebalance Keeper - Entry Point
//!
//! Wiring sequence:
//! 1. Load configuration from the environment
//! 2. Init tracing (JSON structured logging)
//! 3. Build the target registry
//! 4. Connect to the RPC node and load the keeper key
//! 5. Create the Telegram notifier and the optional PPS store
//! 6. Spawn the metrics/health server if `METRICS_BIND_ADDR` is set
//! 7. Run the scheduler until SIGINT

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use rebalance_keeper::adapters::chain::{parse_signer, HyperEvmClient, HyperEvmProvider};
use rebalance_keeper::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use rebalance_keeper::adapters::notify::TelegramNotifier;
use rebalance_keeper::adapters::store::UpstashClient;
use rebalance_keeper::config::loader::load_from_env;
use rebalance_keeper::domain::RebalanceArgs;
use rebalance_keeper::ports::chain_client::ChainClient;
use rebalance_keeper::usecases::registry::build_registry;
use rebalance_keeper::usecases::{scheduler, JobContext, PpsStore, Rebalancer, Reporter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config = load_from_env().context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.observability.log_level)
            }),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        targets = config.targets.len(),
        interval_minutes = config.schedule.interval_minutes,
        pps_store = config.store.is_some(),
        "Starting rebalance keeper"
    );

    // ── 3. Typed target registry ────────────────────────────
    let targets = build_registry(&config.targets).context("Invalid target configuration")?;

    // ── 4. Chain connection + signer ────────────────────────
    let provider = Arc::new(
        HyperEvmProvider::connect(&config.chain.rpc_url, config.chain.expected_chain_id)
            .await
            .context("Failed to connect to chain")?,
    );
    let signer = parse_signer(&config.chain.private_key)?;
    let chain = Arc::new(HyperEvmClient::new(provider, signer));
    info!(signer = %chain.signer_address(), "Chain client ready");

    // ── 5. Notifier and optional PPS store ──────────────────
    let notifier = Arc::new(
        TelegramNotifier::new(config.telegram.clone()).context("Failed to create notifier")?,
    );

    let args = RebalanceArgs {
        cloid_btc: config.schedule.cloid_btc,
        cloid_hype: config.schedule.cloid_hype,
    };
    let mut rebalancer = Rebalancer::<_, UpstashClient>::new(Arc::clone(&chain), args);
    match &config.store {
        Some(store) => {
            let client = UpstashClient::new(store.clone()).context("Failed to create store client")?;
            rebalancer = rebalancer.with_pps_store(PpsStore::new(client), store.retention_days);
        }
        None => warn!("UPSTASH_REDIS_REST_URL/TOKEN not set, PPS samples will not be persisted"),
    }

    rebalancer.latest_stored_pps(&targets).await;

    let health = Arc::new(HealthState::new());
    let mut ctx = JobContext::new(targets, rebalancer, Reporter::new(notifier))
        .with_observer(health.clone());

    // ── 6. Shutdown channel + optional metrics server ───────
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server_handle = match &config.observability.metrics_bind_addr {
        Some(bind_addr) => {
            let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics")?);
            ctx = ctx.with_observer(metrics.clone());
            let server = HealthServer::new(Arc::clone(&health), metrics, bind_addr.clone());
            let server_shutdown = shutdown_tx.subscribe();
            Some(tokio::spawn(async move {
                if let Err(e) = server.run(server_shutdown).await {
                    error!(error = %e, "Health server failed");
                }
            }))
        }
        None => None,
    };

    // ── 7. Scheduler until SIGINT ───────────────────────────
    let scheduler_shutdown = shutdown_tx.subscribe();
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            return;
        }
        info!("SIGINT received, stopping after the current cycle");
        let _ = signal_tx.send(());
    });

    let cycles = scheduler::run(&ctx, config.schedule.interval(), scheduler_shutdown).await;

    let _ = shutdown_tx.send(());
    if let Some(handle) = server_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!(cycles, "Shutdown complete");
    Ok(())
}
