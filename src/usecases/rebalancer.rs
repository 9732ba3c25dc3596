//! Rebalancer Use Case - One Rebalance Call per Target per Cycle
//!
//! Drives `rebalancePortfolio` on each target and observes the result.
//!
//! Per-target flow:
//! 1. Nonce, gas estimate (+20%), gas price
//! 2. Sign + broadcast, wait up to 300s for the receipt
//! 3. Always read post-call equity and USDC balance (best effort)
//! 4. On success with a vault: read PPS, persist a sample, prune history
//!
//! Errors from step 1-2 land in `RebalanceOutcome::error`; nothing
//! escapes `execute_one`, so one failing target never stops the cycle.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::sample::PpsSample;
use crate::domain::target::{ContractTarget, RebalanceArgs, RebalanceOutcome};
use crate::domain::units::{scaled_to_decimal, CORE_BALANCE_DECIMALS, WAD_DECIMALS};
use crate::ports::chain_client::{ChainClient, ReceiptSummary, TxParams};
use crate::ports::kv_store::KvStore;
use crate::usecases::pps_history::PpsStore;

/// How long to wait for a receipt before giving up on this cycle.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Gas limit submitted for a given estimate: +20%, truncating.
pub fn gas_limit_with_margin(estimate: u64) -> u64 {
  estimate.saturating_mul(12) / 10
}

/// PPS store plus its retention window.
struct PpsPersistence<K: KvStore> {
  store: PpsStore<K>,
  retention_days: u32,
}

/// Executes rebalance calls against every configured target.
pub struct Rebalancer<C: ChainClient, K: KvStore> {
  chain: Arc<C>,
  args: RebalanceArgs,
  persistence: Option<PpsPersistence<K>>,
}

impl<C: ChainClient, K: KvStore> Rebalancer<C, K> {
  /// Create a rebalancer without PPS persistence.
  pub fn new(chain: Arc<C>, args: RebalanceArgs) -> Self {
    Self {
      chain,
      args,
      persistence: None,
    }
  }

  /// Persist PPS samples to `store` and prune them after `retention_days`.
  pub fn with_pps_store(mut self, store: PpsStore<K>, retention_days: u32) -> Self {
    self.persistence = Some(PpsPersistence {
      store,
      retention_days,
    });
    self
  }

  /// Run every target strictly in order.
  pub async fn execute_cycle(&self, targets: &[ContractTarget]) -> Vec<RebalanceOutcome> {
    let mut outcomes = Vec::with_capacity(targets.len());
    for target in targets {
      outcomes.push(self.execute_one(target).await);
    }
    outcomes
  }

  /// Newest stored sample for every target with a vault, logged at startup.
  /// Read failures are logged and the target is left out.
  pub async fn latest_stored_pps(&self, targets: &[ContractTarget]) -> Vec<(String, PpsSample)> {
    let Some(persistence) = &self.persistence else {
      return Vec::new();
    };

    let mut latest = Vec::new();
    for target in targets {
      let Some(vault) = target.vault else {
        continue;
      };
      match persistence.store.history(&vault, Some(1)).await {
        Ok(mut samples) if !samples.is_empty() => {
          let sample = samples.swap_remove(0);
          info!(
            target = %target.name,
            vault = %vault,
            pps = %sample.price_per_share,
            block = sample.block_number,
            "Last stored PPS"
          );
          latest.push((target.name.clone(), sample));
        }
        Ok(_) => info!(target = %target.name, vault = %vault, "No stored PPS yet"),
        Err(e) => warn!(target = %target.name, error = ?e, "PPS history unavailable"),
      }
    }
    latest
  }

  /// Rebalance one target and collect everything observed about it.
  #[instrument(skip(self, target), fields(target = %target.name, handler = %target.handler))]
  pub async fn execute_one(&self, target: &ContractTarget) -> RebalanceOutcome {
    let mut outcome = RebalanceOutcome::pending(target);

    match self.submit(target).await {
      Ok(receipt) => {
        outcome.success = receipt.success;
        outcome.tx_hash = Some(format!("{:#x}", receipt.tx_hash));
        outcome.gas_used = Some(receipt.gas_used);
        outcome.block_number = receipt.block_number;

        if receipt.success {
          info!(
            tx_hash = %receipt.tx_hash,
            gas_used = receipt.gas_used,
            block = ?receipt.block_number,
            "Rebalance confirmed"
          );
        } else {
          warn!(
            tx_hash = %receipt.tx_hash,
            gas_used = receipt.gas_used,
            block = ?receipt.block_number,
            "Rebalance reverted"
          );
        }
      }
      Err(e) => {
        let message = format!("{e:#}");
        error!(error = %message, "Rebalance failed");
        outcome.error = Some(message);
      }
    }

    outcome.equity_usd = self.read_equity(target).await;
    outcome.usdc_balance = self.read_usdc_balance(target).await;

    if outcome.success {
      if let Some(vault) = target.vault {
        outcome.price_per_share = self.read_pps(vault).await;
        if let Some(pps) = outcome.price_per_share {
          self.persist_sample(vault, pps, &outcome).await;
        }
      }
    }

    outcome
  }

  /// Nonce → estimate → price → broadcast → receipt.
  async fn submit(&self, target: &ContractTarget) -> Result<ReceiptSummary> {
    let nonce = self
      .chain
      .transaction_count()
      .await
      .context("Failed to fetch nonce")?;

    let estimate = self
      .chain
      .estimate_rebalance_gas(target.handler, self.args)
      .await
      .context("Gas estimation failed")?;
    let gas_limit = gas_limit_with_margin(estimate);

    let gas_price = self
      .chain
      .gas_price()
      .await
      .context("Failed to fetch gas price")?;

    let params = TxParams {
      nonce,
      gas_limit,
      gas_price,
    };
    debug!(nonce, estimate, gas_limit, gas_price, "Submitting rebalance");

    let tx_hash = self
      .chain
      .send_rebalance(target.handler, self.args, params)
      .await
      .context("Broadcast failed")?;
    info!(tx_hash = %tx_hash, "Transaction sent");

    self
      .chain
      .wait_for_receipt(tx_hash, RECEIPT_TIMEOUT)
      .await
      .with_context(|| format!("No receipt for {tx_hash:#x}"))
  }

  /// Equity from the views contract when configured, else from the handler.
  async fn read_equity(&self, target: &ContractTarget) -> Option<Decimal> {
    let raw = match target.views {
      Some(views) => self.chain.views_equity(views, target.handler).await,
      None => self.chain.handler_equity(target.handler).await,
    };
    match raw {
      Ok(raw) => scaled_to_decimal(raw, WAD_DECIMALS),
      Err(e) => {
        debug!(error = %e, "Equity unavailable");
        None
      }
    }
  }

  async fn read_usdc_balance(&self, target: &ContractTarget) -> Option<Decimal> {
    match self.usdc_core_balance(target.handler).await {
      Ok(raw) => scaled_to_decimal(U256::from(raw), CORE_BALANCE_DECIMALS),
      Err(e) => {
        debug!(error = %e, "USDC balance unavailable");
        None
      }
    }
  }

  /// The handler's own USDC balance on the core side, 1e8-scaled.
  async fn usdc_core_balance(&self, handler: Address) -> Result<u64> {
    let token_id = self.chain.usdc_core_token_id(handler).await?;
    self.chain.spot_balance(handler, handler, token_id).await
  }

  async fn read_pps(&self, vault: Address) -> Option<Decimal> {
    match self.chain.vault_pps(vault).await {
      Ok(raw) => scaled_to_decimal(raw, WAD_DECIMALS),
      Err(e) => {
        warn!(vault = %vault, error = %e, "PPS unavailable");
        None
      }
    }
  }

  /// Store one sample, then prune. Never fails the outcome.
  async fn persist_sample(&self, vault: Address, pps: Decimal, outcome: &RebalanceOutcome) {
    let Some(persistence) = &self.persistence else {
      return;
    };

    let sample = PpsSample {
      timestamp: Utc::now().timestamp(),
      price_per_share: pps.to_string(),
      block_number: outcome.block_number.unwrap_or_default(),
      tx_hash: outcome.tx_hash.clone().unwrap_or_default(),
    };

    if !persistence.store.store_sample(&vault, &sample).await {
      return;
    }

    if let Err(e) = persistence
      .store
      .cleanup(&vault, persistence.retention_days)
      .await
    {
      warn!(vault = %vault, error = ?e, "PPS cleanup skipped");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_gas_margin() {
    assert_eq!(gas_limit_with_margin(150_000), 180_000);
    assert_eq!(gas_limit_with_margin(21_001), 25_201);
    assert_eq!(gas_limit_with_margin(0), 0);
    assert_eq!(gas_limit_with_margin(u64::MAX), u64::MAX / 10);
  }
}
