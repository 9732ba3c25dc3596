//! Chain Client Port - On-chain Interaction Interface
//!
//! Everything the rebalancer needs from the EVM node: nonce, gas
//! estimation and price, signed broadcast, receipt wait, and the
//! read-only views used to observe post-call state. The rebalancer owns
//! the sequencing; implementations only perform individual calls.

use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::domain::target::RebalanceArgs;

/// Fee and sequencing parameters for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
  pub nonce: u64,
  /// Gas limit, already including the safety margin.
  pub gas_limit: u64,
  /// Legacy gas price in wei.
  pub gas_price: u128,
}

/// The parts of a receipt the keeper reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
  pub tx_hash: TxHash,
  /// Receipt status field was 1.
  pub success: bool,
  pub gas_used: u64,
  pub block_number: Option<u64>,
}

/// Trait for on-chain interactions via alloy-rs.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// Address of the signing account.
  fn signer_address(&self) -> Address;

  /// Next nonce for the signing account.
  async fn transaction_count(&self) -> anyhow::Result<u64>;

  /// Gas estimate for `rebalancePortfolio(args)` on `handler`, sent from
  /// the signing account. No margin applied.
  async fn estimate_rebalance_gas(
    &self,
    handler: Address,
    args: RebalanceArgs,
  ) -> anyhow::Result<u64>;

  /// Current network gas price in wei.
  async fn gas_price(&self) -> anyhow::Result<u128>;

  /// Sign and broadcast `rebalancePortfolio(args)`; returns the tx hash.
  async fn send_rebalance(
    &self,
    handler: Address,
    args: RebalanceArgs,
    params: TxParams,
  ) -> anyhow::Result<TxHash>;

  /// Block until `tx_hash` is mined or `timeout` elapses.
  async fn wait_for_receipt(
    &self,
    tx_hash: TxHash,
    timeout: Duration,
  ) -> anyhow::Result<ReceiptSummary>;

  /// `views.equitySpotUsd1e18(handler)`.
  async fn views_equity(&self, views: Address, handler: Address) -> anyhow::Result<U256>;

  /// `handler.equitySpotUsd1e18()`.
  async fn handler_equity(&self, handler: Address) -> anyhow::Result<U256>;

  /// `handler.usdcCoreTokenId()`.
  async fn usdc_core_token_id(&self, handler: Address) -> anyhow::Result<u64>;

  /// `handler.spotBalance(core_user, token_id)`, 1e8-scaled.
  async fn spot_balance(
    &self,
    handler: Address,
    core_user: Address,
    token_id: u64,
  ) -> anyhow::Result<u64>;

  /// `vault.pps1e18()`.
  async fn vault_pps(&self, vault: Address) -> anyhow::Result<U256>;
}
