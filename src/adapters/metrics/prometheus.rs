//! Prometheus Metrics Registry - Keeper Observability
//!
//! Counts cycles and rebalance results, tracks gas used and the latest
//! equity / PPS per target. All metrics are prefixed `rebalance_keeper_`
//! and labelled by target name.

use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;

use crate::domain::target::RebalanceOutcome;
use crate::ports::cycle_observer::CycleObserver;

/// Centralized Prometheus metrics for the keeper.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Completed cycles.
    pub cycles: IntCounter,
    /// Rebalance attempts by target and result (success / reverted / error).
    pub rebalances: IntCounterVec,
    /// Gas consumed per confirmed rebalance.
    pub gas_used: HistogramVec,
    /// Latest observed equity in USD.
    pub equity_usd: GaugeVec,
    /// Latest observed vault price-per-share.
    pub pps: GaugeVec,
    /// Reports that could not be delivered.
    pub notifications_failed: IntCounter,
    /// Unix time the last cycle finished.
    pub last_cycle_timestamp: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles = IntCounter::new("rebalance_keeper_cycles_total", "Completed rebalance cycles")?;

        let rebalances = IntCounterVec::new(
            Opts::new(
                "rebalance_keeper_rebalances_total",
                "Rebalance attempts by result",
            ),
            &["target", "result"],
        )?;

        let gas_used = HistogramVec::new(
            HistogramOpts::new(
                "rebalance_keeper_gas_used",
                "Gas used by confirmed rebalance transactions",
            )
            .buckets(vec![
                50_000.0, 100_000.0, 200_000.0, 400_000.0, 800_000.0, 1_600_000.0, 3_200_000.0,
            ]),
            &["target"],
        )?;

        let equity_usd = GaugeVec::new(
            Opts::new("rebalance_keeper_equity_usd", "Post-rebalance equity in USD"),
            &["target"],
        )?;

        let pps = GaugeVec::new(
            Opts::new("rebalance_keeper_pps", "Post-rebalance vault price-per-share"),
            &["target"],
        )?;

        let notifications_failed = IntCounter::new(
            "rebalance_keeper_notifications_failed_total",
            "Reports that failed to reach Telegram",
        )?;

        let last_cycle_timestamp = IntGauge::new(
            "rebalance_keeper_last_cycle_timestamp_seconds",
            "Unix time the last cycle finished",
        )?;

        // Register all metrics
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(rebalances.clone()))?;
        registry.register(Box::new(gas_used.clone()))?;
        registry.register(Box::new(equity_usd.clone()))?;
        registry.register(Box::new(pps.clone()))?;
        registry.register(Box::new(notifications_failed.clone()))?;
        registry.register(Box::new(last_cycle_timestamp.clone()))?;

        Ok(Self {
            registry,
            cycles,
            rebalances,
            gas_used,
            equity_usd,
            pps,
            notifications_failed,
            last_cycle_timestamp,
        })
    }

    /// Record one target's outcome.
    pub fn record_outcome(&self, outcome: &RebalanceOutcome) {
        let target = outcome.name.as_str();
        let result = match (outcome.success, outcome.error.is_some()) {
            (true, _) => "success",
            (false, true) => "error",
            (false, false) => "reverted",
        };
        self.rebalances.with_label_values(&[target, result]).inc();

        if let Some(gas) = outcome.gas_used.and_then(|g| g.to_f64()) {
            self.gas_used.with_label_values(&[target]).observe(gas);
        }
        if let Some(equity) = outcome.equity_usd.and_then(|d| d.to_f64()) {
            self.equity_usd.with_label_values(&[target]).set(equity);
        }
        if let Some(pps) = outcome.price_per_share.and_then(|d| d.to_f64()) {
            self.pps.with_label_values(&[target]).set(pps);
        }
    }

    /// Record a finished cycle and all of its outcomes.
    pub fn record_cycle(&self, outcomes: &[RebalanceOutcome], finished_at: i64) {
        for outcome in outcomes {
            self.record_outcome(outcome);
        }
        self.cycles.inc();
        self.last_cycle_timestamp.set(finished_at);
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl CycleObserver for MetricsRegistry {
    fn cycle_finished(&self, outcomes: &[RebalanceOutcome], finished_at: i64) {
        self.record_cycle(outcomes, finished_at);
    }

    fn report_undelivered(&self) {
        self.notifications_failed.inc();
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;
    use rust_decimal_macros::dec;

    use super::*;

    fn outcome(name: &str, success: bool, error: Option<&str>) -> RebalanceOutcome {
        RebalanceOutcome {
            name: name.to_string(),
            handler: Address::ZERO,
            vault: None,
            success,
            tx_hash: None,
            gas_used: success.then_some(150_000),
            block_number: None,
            equity_usd: Some(dec!(1234.56)),
            usdc_balance: None,
            price_per_share: None,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_record_cycle_counts_results() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.record_cycle(
            &[
                outcome("BTC-Vault", true, None),
                outcome("HYPE-Vault", false, Some("Broadcast failed")),
                outcome("ETH-Vault", false, None),
            ],
            1_760_000_000,
        );

        assert_eq!(metrics.cycles.get(), 1);
        assert_eq!(
            metrics.rebalances.with_label_values(&["BTC-Vault", "success"]).get(),
            1
        );
        assert_eq!(
            metrics.rebalances.with_label_values(&["HYPE-Vault", "error"]).get(),
            1
        );
        assert_eq!(
            metrics.rebalances.with_label_values(&["ETH-Vault", "reverted"]).get(),
            1
        );
        assert!((metrics.equity_usd.with_label_values(&["BTC-Vault"]).get() - 1234.56).abs() < 1e-9);

        let text = metrics.encode().unwrap();
        assert!(text.contains("rebalance_keeper_cycles_total 1"));
        assert!(text.contains("rebalance_keeper_last_cycle_timestamp_seconds 1760000000"));
    }
}
