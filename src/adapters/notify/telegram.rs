//! Telegram Notifier - Bot API sendMessage
//!
//! Implements the `Notifier` port with a single GET to
//! `{api}/bot{token}/sendMessage` using HTML parse mode. The bot token
//! is part of the URL, so transport errors are stripped of their URL
//! before they reach a log line.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::TelegramConfig;
use crate::ports::notifier::Notifier;

/// Request timeout for one sendMessage call.
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

pub struct TelegramNotifier {
  http: Client,
  config: TelegramConfig,
}

impl TelegramNotifier {
  pub fn new(config: TelegramConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(SEND_TIMEOUT)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  fn send_url(&self) -> String {
    format!(
      "{}/bot{}/sendMessage",
      self.config.api_url.trim_end_matches('/'),
      self.config.token.expose()
    )
  }
}

#[async_trait]
impl Notifier for TelegramNotifier {
  #[instrument(skip_all, fields(chat_id = %self.config.chat_id, len = text.len()))]
  async fn send_message(&self, text: &str) -> Result<()> {
    let response = self
      .http
      .get(self.send_url())
      .query(&[
        ("chat_id", self.config.chat_id.as_str()),
        ("text", text),
        ("parse_mode", "HTML"),
      ])
      .send()
      .await
      .map_err(reqwest::Error::without_url)
      .context("Telegram request failed")?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      bail!("Telegram returned HTTP {status}: {body}");
    }

    debug!(status = %status, "Telegram message sent");
    Ok(())
  }
}
