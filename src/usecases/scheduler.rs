//! Scheduler Use Case - Periodic Cycle Driver
//!
//! `JobContext` owns everything one cycle needs. `run` fires a cycle
//! immediately, then once per period, until a shutdown signal arrives.
//!
//! Cycle flow:
//! 1. Rebalance every target in order
//! 2. Send the report
//! 3. Notify observers (metrics, readiness)
//!
//! A cycle is never interrupted; shutdown is only observed between cycles.
//! An overrunning cycle delays the next tick instead of causing a burst.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::domain::report::CycleSummary;
use crate::domain::target::ContractTarget;
use crate::ports::chain_client::ChainClient;
use crate::ports::cycle_observer::CycleObserver;
use crate::ports::kv_store::KvStore;
use crate::ports::notifier::Notifier;
use crate::usecases::rebalancer::Rebalancer;
use crate::usecases::reporter::Reporter;

/// Format of the timestamp label at the top of each report.
pub const REPORT_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Everything a cycle needs, built once at startup.
pub struct JobContext<C: ChainClient, K: KvStore, N: Notifier> {
  targets: Vec<ContractTarget>,
  rebalancer: Rebalancer<C, K>,
  reporter: Reporter<N>,
  observers: Vec<Arc<dyn CycleObserver>>,
}

impl<C: ChainClient, K: KvStore, N: Notifier> JobContext<C, K, N> {
  pub fn new(
    targets: Vec<ContractTarget>,
    rebalancer: Rebalancer<C, K>,
    reporter: Reporter<N>,
  ) -> Self {
    Self {
      targets,
      rebalancer,
      reporter,
      observers: Vec::new(),
    }
  }

  /// Register a hook that runs after every cycle.
  pub fn with_observer(mut self, observer: Arc<dyn CycleObserver>) -> Self {
    self.observers.push(observer);
    self
  }

  pub fn targets(&self) -> &[ContractTarget] {
    &self.targets
  }

  /// Run one full cycle: rebalance, report, observe.
  pub async fn run_cycle(&self) -> CycleSummary {
    let cycle_id = Uuid::new_v4();
    let span = info_span!("cycle", %cycle_id, targets = self.targets.len());

    async {
      info!("Cycle started");
      let outcomes = self.rebalancer.execute_cycle(&self.targets).await;

      let finished = Utc::now();
      let label = finished.format(REPORT_LABEL_FORMAT).to_string();
      let delivered = self.reporter.report(&outcomes, &label).await;

      let finished_at = finished.timestamp();
      for observer in &self.observers {
        if !delivered {
          observer.report_undelivered();
        }
        observer.cycle_finished(&outcomes, finished_at);
      }

      let summary = CycleSummary::from_outcomes(&outcomes);
      info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        delivered,
        "Cycle finished"
      );
      summary
    }
    .instrument(span)
    .await
  }
}

/// Run cycles every `period` until `shutdown_rx` fires. The first cycle
/// runs immediately. Returns the number of completed cycles.
pub async fn run<C, K, N>(
  ctx: &JobContext<C, K, N>,
  period: Duration,
  mut shutdown_rx: broadcast::Receiver<()>,
) -> u64
where
  C: ChainClient,
  K: KvStore,
  N: Notifier,
{
  let mut ticker = tokio::time::interval(period);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  info!(
    period_secs = period.as_secs(),
    targets = ctx.targets().len(),
    "Scheduler started"
  );

  let mut cycles = 0u64;
  loop {
    tokio::select! {
      biased;
      _ = shutdown_rx.recv() => {
        info!(cycles, "Shutdown signal received, stopping scheduler");
        break;
      }
      _ = ticker.tick() => {
        ctx.run_cycle().await;
        cycles += 1;
      }
    }
  }

  cycles
}
