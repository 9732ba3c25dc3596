//! Reporter Use Case - Cycle Summary Delivery
//!
//! Formats the cycle's outcomes as Telegram HTML and hands them to the
//! notifier. A delivery failure is logged and swallowed: the keeper keeps
//! running whether or not the operator hears about it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::report::format_report;
use crate::domain::target::RebalanceOutcome;
use crate::ports::notifier::Notifier;

pub struct Reporter<N: Notifier> {
  notifier: Arc<N>,
}

impl<N: Notifier> Reporter<N> {
  pub fn new(notifier: Arc<N>) -> Self {
    Self { notifier }
  }

  /// Send the report for `outcomes`. Returns whether it was delivered.
  pub async fn report(&self, outcomes: &[RebalanceOutcome], label: &str) -> bool {
    let text = format_report(outcomes, label);
    match self.notifier.send_message(&text).await {
      Ok(()) => {
        info!(targets = outcomes.len(), "Report delivered");
        true
      }
      Err(e) => {
        warn!(error = %e, "Report delivery failed");
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use async_trait::async_trait;

  use super::*;

  #[derive(Default)]
  struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    fail: bool,
  }

  #[async_trait]
  impl Notifier for RecordingNotifier {
    async fn send_message(&self, text: &str) -> anyhow::Result<()> {
      if self.fail {
        anyhow::bail!("HTTP 400: can't parse entities");
      }
      self.sent.lock().unwrap().push(text.to_string());
      Ok(())
    }
  }

  #[tokio::test]
  async fn test_report_sends_formatted_text() {
    let notifier = Arc::new(RecordingNotifier::default());
    let reporter = Reporter::new(Arc::clone(&notifier));

    assert!(reporter.report(&[], "2025-01-01 00:00:00 UTC").await);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("2025-01-01 00:00:00 UTC"));
  }

  #[tokio::test]
  async fn test_report_failure_is_swallowed() {
    let notifier = Arc::new(RecordingNotifier {
      fail: true,
      ..RecordingNotifier::default()
    });
    let reporter = Reporter::new(notifier);

    assert!(!reporter.report(&[], "label").await);
  }
}
