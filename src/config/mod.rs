//! Configuration Module - Environment-based Keeper Configuration
//!
//! Everything the keeper needs is read from the process environment
//! (RPC endpoint, signing key, Telegram credentials, the indexed list of
//! handler targets, optional PPS store credentials). Addresses are kept
//! as raw strings here; the registry turns them into typed handles.

pub mod loader;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Startup configuration failure. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  /// A required variable is absent or empty.
  #[error("required environment variable {0} is not set")]
  Missing(String),
  /// A variable is present but cannot be parsed.
  #[error("environment variable {var} is invalid: {reason}")]
  Invalid {
    /// Variable name.
    var: String,
    /// Parse failure description.
    reason: String,
  },
  /// `HANDLER_ADDRESS_1` is not set.
  #[error("no targets configured: set HANDLER_ADDRESS_1 (and _2, _3, ... for more)")]
  NoTargets,
}

/// String value that never leaks through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// Borrow the underlying secret. Never log the result.
  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Secret(***)")
  }
}

/// Top-level keeper configuration.
#[derive(Debug, Clone)]
pub struct JobConfig {
  /// Chain connection and signing.
  pub chain: ChainConfig,
  /// Telegram delivery.
  pub telegram: TelegramConfig,
  /// Scheduler period and call arguments.
  pub schedule: ScheduleConfig,
  /// PPS persistence. `None` disables it.
  pub store: Option<StoreConfig>,
  /// Discovered targets, in index order.
  pub targets: Vec<TargetConfig>,
  /// Logging and metrics.
  pub observability: ObservabilityConfig,
}

/// Chain connection configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
  /// JSON-RPC endpoint.
  pub rpc_url: String,
  /// Hex-encoded private key of the keeper account.
  pub private_key: Secret,
  /// Expected chain id, checked at startup when set.
  pub expected_chain_id: Option<u64>,
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
  pub api_url: String,
  pub token: Secret,
  pub chat_id: String,
}

/// Scheduling and call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
  /// Minutes between cycles.
  pub interval_minutes: u64,
  /// First `rebalancePortfolio` argument.
  pub cloid_btc: u128,
  /// Second `rebalancePortfolio` argument.
  pub cloid_hype: u128,
}

impl ScheduleConfig {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_minutes.saturating_mul(60))
  }
}

/// Redis REST store for PPS samples.
#[derive(Debug, Clone)]
pub struct StoreConfig {
  pub rest_url: String,
  pub token: Secret,
  /// Samples older than this are pruned after each write.
  pub retention_days: u32,
}

/// One indexed target as read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
  /// 1-based suffix the target was discovered under.
  pub index: usize,
  pub name: String,
  pub handler_address: String,
  pub views_address: Option<String>,
  pub vault_address: Option<String>,
}

/// Logging and metrics endpoint.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
  /// Fallback tracing filter when `RUST_LOG` is unset.
  pub log_level: String,
  /// Bind address for `/live`, `/ready`, `/metrics`.
  pub metrics_bind_addr: Option<String>,
}

pub(crate) const DEFAULT_INTERVAL_MINUTES: u64 = 60;
/// One week. Longer periods are rejected at load time.
pub(crate) const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
pub(crate) const DEFAULT_RETENTION_DAYS: u32 = 90;
pub(crate) const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";
