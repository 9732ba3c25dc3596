//! Configuration Loader - Environment Parsing and Target Discovery
//!
//! Reads required and optional variables, applies defaults, and scans
//! `HANDLER_ADDRESS_1`, `HANDLER_ADDRESS_2`, ... until the first gap.
//! Lookups go through a caller-supplied function so tests never touch
//! the real process environment.

use std::str::FromStr;

use tracing::info;

use super::{
  ChainConfig, ConfigError, JobConfig, ObservabilityConfig, ScheduleConfig, Secret,
  StoreConfig, TargetConfig, TelegramConfig, DEFAULT_INTERVAL_MINUTES, DEFAULT_LOG_LEVEL,
  DEFAULT_RETENTION_DAYS, DEFAULT_TELEGRAM_API_URL, MAX_INTERVAL_MINUTES,
};

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<JobConfig, ConfigError> {
  load_config(|key| std::env::var(key).ok())
}

/// Load and validate configuration through `lookup`.
///
/// # Errors
/// - `Missing` for an absent required variable
/// - `Invalid` for a tunable that does not parse, is zero, or is out of range
/// - `NoTargets` when `HANDLER_ADDRESS_1` is absent
pub fn load_config<F>(lookup: F) -> Result<JobConfig, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  let get = |key: &str| non_empty(lookup(key));

  let chain = ChainConfig {
    rpc_url: require(&get, "RPC_URL")?,
    private_key: Secret::new(require(&get, "PRIVATE_KEY")?),
    expected_chain_id: parse_opt(&get, "CHAIN_ID")?,
  };

  let telegram = TelegramConfig {
    api_url: get("TELEGRAM_API_URL")
      .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
    token: Secret::new(require(&get, "TELEGRAM_TOKEN")?),
    chat_id: require(&get, "TELEGRAM_CHAT_ID")?,
  };

  let schedule = ScheduleConfig {
    interval_minutes: parse_or(&get, "INTERVAL_MINUTES", DEFAULT_INTERVAL_MINUTES)?,
    cloid_btc: parse_or(&get, "CLOID_BTC", 0u128)?,
    cloid_hype: parse_or(&get, "CLOID_HYPE", 0u128)?,
  };
  if schedule.interval_minutes == 0 {
    return Err(invalid("INTERVAL_MINUTES", "must be greater than zero"));
  }
  if schedule.interval_minutes > MAX_INTERVAL_MINUTES {
    return Err(invalid(
      "INTERVAL_MINUTES",
      format!("must be at most {MAX_INTERVAL_MINUTES}"),
    ));
  }

  let retention_days = parse_or(&get, "PPS_RETENTION_DAYS", DEFAULT_RETENTION_DAYS)?;
  if retention_days == 0 {
    return Err(invalid("PPS_RETENTION_DAYS", "must be greater than zero"));
  }
  let store = match (get("UPSTASH_REDIS_REST_URL"), get("UPSTASH_REDIS_REST_TOKEN")) {
    (Some(rest_url), Some(token)) => Some(StoreConfig {
      rest_url,
      token: Secret::new(token),
      retention_days,
    }),
    _ => None,
  };

  let observability = ObservabilityConfig {
    log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
    metrics_bind_addr: get("METRICS_BIND_ADDR"),
  };

  let targets = discover_targets(&get)?;

  info!(
    targets = targets.len(),
    interval_minutes = schedule.interval_minutes,
    pps_store = store.is_some(),
    "Configuration loaded"
  );

  Ok(JobConfig {
    chain,
    telegram,
    schedule,
    store,
    targets,
    observability,
  })
}

/// Scan indexed target variables starting at 1, stopping at the first
/// index without a handler address. Later indices are never read.
pub fn discover_targets<F>(lookup: F) -> Result<Vec<TargetConfig>, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  let get = |key: String| non_empty(lookup(key.as_str()));

  let targets: Vec<TargetConfig> = (1..)
    .map_while(|index| {
      let handler_address = get(format!("HANDLER_ADDRESS_{index}"))?;
      Some(TargetConfig {
        index,
        name: get(format!("CONTRACT_NAME_{index}"))
          .unwrap_or_else(|| format!("Contract {index}")),
        handler_address,
        views_address: get(format!("CORE_VIEWS_ADDRESS_{index}")),
        vault_address: get(format!("VAULT_ADDRESS_{index}")),
      })
    })
    .collect();

  if targets.is_empty() {
    return Err(ConfigError::NoTargets);
  }
  Ok(targets)
}

fn non_empty(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn require<F>(get: &F, key: &str) -> Result<String, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  get(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parse_opt<F, T>(get: &F, key: &str) -> Result<Option<T>, ConfigError>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: std::fmt::Display,
{
  get(key)
    .map(|raw| raw.parse::<T>().map_err(|e| invalid(key, e)))
    .transpose()
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T, ConfigError>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: std::fmt::Display,
{
  Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn invalid(var: &str, reason: impl std::fmt::Display) -> ConfigError {
  ConfigError::Invalid {
    var: var.to_string(),
    reason: reason.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  fn base() -> HashMap<String, String> {
    env(&[
      ("RPC_URL", "https://rpc.hyperliquid-testnet.xyz/evm"),
      ("PRIVATE_KEY", "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"),
      ("TELEGRAM_TOKEN", "123:abc"),
      ("TELEGRAM_CHAT_ID", "-100200300"),
      ("HANDLER_ADDRESS_1", "0x1111111111111111111111111111111111111111"),
    ])
  }

  fn load(vars: &HashMap<String, String>) -> Result<JobConfig, ConfigError> {
    load_config(|k| vars.get(k).cloned())
  }

  #[test]
  fn test_defaults_applied() {
    let config = load(&base()).unwrap();
    assert_eq!(config.schedule.interval_minutes, 60);
    assert_eq!(config.schedule.cloid_btc, 0);
    assert_eq!(config.schedule.cloid_hype, 0);
    assert!(config.store.is_none());
    assert_eq!(config.telegram.api_url, "https://api.telegram.org");
    assert_eq!(config.targets.len(), 1);
    assert_eq!(config.targets[0].name, "Contract 1");
  }

  #[test]
  fn test_missing_required_variable() {
    let mut vars = base();
    vars.remove("TELEGRAM_CHAT_ID");
    assert_eq!(
      load(&vars).unwrap_err(),
      ConfigError::Missing("TELEGRAM_CHAT_ID".to_string())
    );
  }

  #[test]
  fn test_empty_required_variable_counts_as_missing() {
    let mut vars = base();
    vars.insert("RPC_URL".into(), "   ".into());
    assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("RPC_URL".to_string()));
  }

  #[test]
  fn test_zero_targets_fails() {
    let mut vars = base();
    vars.remove("HANDLER_ADDRESS_1");
    vars.insert("HANDLER_ADDRESS_2".into(), "0x2222222222222222222222222222222222222222".into());
    assert_eq!(load(&vars).unwrap_err(), ConfigError::NoTargets);
  }

  #[test]
  fn test_discovery_stops_at_first_gap() {
    let mut vars = base();
    vars.insert("HANDLER_ADDRESS_2".into(), "0x2222222222222222222222222222222222222222".into());
    vars.insert("HANDLER_ADDRESS_4".into(), "0x4444444444444444444444444444444444444444".into());
    vars.insert("CONTRACT_NAME_2".into(), "HYPE-Vault".into());
    vars.insert("VAULT_ADDRESS_2".into(), "0x5555555555555555555555555555555555555555".into());
    vars.insert("CORE_VIEWS_ADDRESS_2".into(), "".into());

    let config = load(&vars).unwrap();
    assert_eq!(config.targets.len(), 2);
    let second = &config.targets[1];
    assert_eq!(second.index, 2);
    assert_eq!(second.name, "HYPE-Vault");
    assert_eq!(second.views_address, None);
    assert_eq!(
      second.vault_address.as_deref(),
      Some("0x5555555555555555555555555555555555555555")
    );
  }

  #[test]
  fn test_store_enabled_only_with_url_and_token() {
    let mut vars = base();
    vars.insert("UPSTASH_REDIS_REST_URL".into(), "https://eu1-store.upstash.io".into());
    assert!(load(&vars).unwrap().store.is_none());

    vars.insert("UPSTASH_REDIS_REST_TOKEN".into(), "tok".into());
    vars.insert("PPS_RETENTION_DAYS".into(), "30".into());
    let store = load(&vars).unwrap().store.unwrap();
    assert_eq!(store.retention_days, 30);
    assert_eq!(store.token.expose(), "tok");
  }

  #[test]
  fn test_invalid_tunable_rejected() {
    let mut vars = base();
    vars.insert("INTERVAL_MINUTES".into(), "hourly".into());
    assert!(matches!(
      load(&vars).unwrap_err(),
      ConfigError::Invalid { var, .. } if var == "INTERVAL_MINUTES"
    ));

    vars.insert("INTERVAL_MINUTES".into(), "0".into());
    assert!(matches!(load(&vars).unwrap_err(), ConfigError::Invalid { .. }));
  }

  #[test]
  fn test_oversized_interval_rejected() {
    let mut vars = base();
    vars.insert("INTERVAL_MINUTES".into(), "307445734561825861".into());
    assert!(matches!(
      load(&vars).unwrap_err(),
      ConfigError::Invalid { var, .. } if var == "INTERVAL_MINUTES"
    ));

    vars.insert("INTERVAL_MINUTES".into(), MAX_INTERVAL_MINUTES.to_string());
    let config = load(&vars).unwrap();
    assert_eq!(config.schedule.interval().as_secs(), MAX_INTERVAL_MINUTES * 60);
  }

  #[test]
  fn test_call_arguments_parsed() {
    let mut vars = base();
    vars.insert("CLOID_BTC".into(), "7".into());
    vars.insert("CLOID_HYPE".into(), "340282366920938463463374607431768211455".into());
    let config = load(&vars).unwrap();
    assert_eq!(config.schedule.cloid_btc, 7);
    assert_eq!(config.schedule.cloid_hype, u128::MAX);
  }

  #[test]
  fn test_secrets_redacted_in_debug() {
    let config = load(&base()).unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("59c6995e"));
    assert!(!debug.contains("123:abc"));
  }
}
