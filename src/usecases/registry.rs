//! Contract Registry - Typed Handles for Configured Targets
//!
//! Parses each discovered target's addresses into `Address` values.
//! Liveness is not checked here; a dead address shows up as a failed
//! call in the first cycle.

use std::str::FromStr;

use alloy::primitives::Address;
use tracing::info;

use crate::config::{ConfigError, TargetConfig};
use crate::domain::target::ContractTarget;

/// Build the immutable working set from configuration.
///
/// # Errors
/// `ConfigError::Invalid` naming the variable whose address is malformed.
pub fn build_registry(targets: &[TargetConfig]) -> Result<Vec<ContractTarget>, ConfigError> {
  targets.iter().map(build_target).collect()
}

fn build_target(config: &TargetConfig) -> Result<ContractTarget, ConfigError> {
  let index = config.index;
  let handler = parse_address(&config.handler_address, format!("HANDLER_ADDRESS_{index}"))?;
  let views = config
    .views_address
    .as_deref()
    .map(|raw| parse_address(raw, format!("CORE_VIEWS_ADDRESS_{index}")))
    .transpose()?;
  let vault = config
    .vault_address
    .as_deref()
    .map(|raw| parse_address(raw, format!("VAULT_ADDRESS_{index}")))
    .transpose()?;

  info!(
    index,
    name = %config.name,
    handler = %handler,
    views = ?views,
    vault = ?vault,
    "Target registered"
  );

  Ok(ContractTarget {
    index,
    name: config.name.clone(),
    handler,
    views,
    vault,
  })
}

fn parse_address(raw: &str, var: String) -> Result<Address, ConfigError> {
  Address::from_str(raw).map_err(|e| ConfigError::Invalid {
    var,
    reason: e.to_string(),
  })
}
