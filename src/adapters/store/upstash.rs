//! Upstash Redis REST Client - KvStore over HTTP
//!
//! Each command is POSTed to the REST base URL as a JSON array
//! (`["LPUSH", "pps:0x..", "{..}"]`) with bearer auth. The response body
//! is an envelope: `{"result": ..}` on success, `{"error": ".."}` when
//! Redis rejects the command.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::StoreConfig;
use crate::ports::kv_store::KvStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure talking to the REST endpoint.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("store returned HTTP {status}: {body}")]
  Status { status: u16, body: String },
  #[error("store rejected command: {0}")]
  Command(String),
  #[error("unexpected store response: {0}")]
  Decode(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
  #[serde(default)]
  result: Option<Value>,
  #[serde(default)]
  error: Option<String>,
}

/// Unwrap a REST response body into the command's return value.
fn parse_envelope(body: &str) -> Result<Value, StoreError> {
  let envelope: Envelope =
    serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
  match envelope.error {
    Some(message) => Err(StoreError::Command(message)),
    None => Ok(envelope.result.unwrap_or(Value::Null)),
  }
}

fn expect_integer(value: Value) -> Result<u64, StoreError> {
  value
    .as_u64()
    .ok_or_else(|| StoreError::Decode(format!("expected integer, got {value}")))
}

fn expect_array(value: Value) -> Result<Vec<Value>, StoreError> {
  match value {
    Value::Array(items) => Ok(items),
    Value::Null => Ok(Vec::new()),
    other => Err(StoreError::Decode(format!("expected array, got {other}"))),
  }
}

pub struct UpstashClient {
  http: Client,
  config: StoreConfig,
}

impl UpstashClient {
  pub fn new(config: StoreConfig) -> anyhow::Result<Self> {
    let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self { http, config })
  }

  /// Run one Redis command and return its `result`.
  #[instrument(skip_all, fields(command = %command.first().copied().unwrap_or_default()))]
  async fn execute(&self, command: &[&str]) -> Result<Value, StoreError> {
    let response = self
      .http
      .post(self.config.rest_url.trim_end_matches('/'))
      .bearer_auth(self.config.token.expose())
      .json(command)
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      return Err(StoreError::Status {
        status: status.as_u16(),
        body,
      });
    }

    debug!(status = %status, "Store command ok");
    parse_envelope(&body)
  }
}

#[async_trait]
impl KvStore for UpstashClient {
  async fn lpush(&self, key: &str, values: &[String]) -> anyhow::Result<u64> {
    let mut command = Vec::with_capacity(values.len() + 2);
    command.extend(["LPUSH", key]);
    command.extend(values.iter().map(String::as_str));
    let len = expect_integer(self.execute(&command).await?)?;
    Ok(len)
  }

  async fn lrange(&self, key: &str, start: i64, stop: i64) -> anyhow::Result<Vec<Value>> {
    let (start, stop) = (start.to_string(), stop.to_string());
    let items = expect_array(self.execute(&["LRANGE", key, &start, &stop]).await?)?;
    Ok(items)
  }

  async fn del(&self, key: &str) -> anyhow::Result<u64> {
    let removed = expect_integer(self.execute(&["DEL", key]).await?)?;
    Ok(removed)
  }
}
