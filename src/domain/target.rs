//! Targets and Outcomes - What the Keeper Acts On and What It Observed
//!
//! A `ContractTarget` is built once at startup and never changes. A
//! `RebalanceOutcome` is built fresh for every target in every cycle and
//! is dropped once the cycle's report has been delivered.

use alloy::primitives::Address;
use rust_decimal::Decimal;

/// A handler contract the keeper rebalances, with its optional companions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractTarget {
  /// 1-based configuration index.
  pub index: usize,
  /// Operator-facing label, e.g. "BTC-Vault".
  pub name: String,
  /// Handler exposing `rebalancePortfolio`.
  pub handler: Address,
  /// Views contract for equity queries.
  pub views: Option<Address>,
  /// Vault contract for price-per-share queries.
  pub vault: Option<Address>,
}

/// The two `rebalancePortfolio` arguments, passed through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebalanceArgs {
  pub cloid_btc: u128,
  pub cloid_hype: u128,
}

/// Result of one rebalance attempt on one target.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceOutcome {
  pub name: String,
  pub handler: Address,
  pub vault: Option<Address>,
  /// Receipt status was 1.
  pub success: bool,
  pub tx_hash: Option<String>,
  pub gas_used: Option<u64>,
  pub block_number: Option<u64>,
  /// Post-call equity in USD, `None` when the query failed.
  pub equity_usd: Option<Decimal>,
  /// Post-call USDC balance on the core side, `None` when the query failed.
  pub usdc_balance: Option<Decimal>,
  /// Post-call vault price-per-share, only read after a successful call.
  pub price_per_share: Option<Decimal>,
  /// Failure description from nonce lookup through receipt wait.
  pub error: Option<String>,
}

impl RebalanceOutcome {
  /// Empty outcome for `target`: not successful, every observation unset.
  pub fn pending(target: &ContractTarget) -> Self {
    Self {
      name: target.name.clone(),
      handler: target.handler,
      vault: target.vault,
      success: false,
      tx_hash: None,
      gas_used: None,
      block_number: None,
      equity_usd: None,
      usdc_balance: None,
      price_per_share: None,
      error: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use alloy::primitives::address;

  use super::*;

  #[test]
  fn test_pending_outcome_copies_identity_only() {
    let target = ContractTarget {
      index: 1,
      name: "BTC-Vault".to_string(),
      handler: address!("1111111111111111111111111111111111111111"),
      views: Some(address!("2222222222222222222222222222222222222222")),
      vault: Some(address!("3333333333333333333333333333333333333333")),
    };

    let outcome = RebalanceOutcome::pending(&target);
    assert_eq!(outcome.name, "BTC-Vault");
    assert_eq!(outcome.handler, target.handler);
    assert_eq!(outcome.vault, target.vault);
    assert!(!outcome.success);
    assert!(outcome.tx_hash.is_none());
    assert!(outcome.equity_usd.is_none());
    assert!(outcome.error.is_none());
  }
}
