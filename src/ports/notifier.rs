//! Notifier Port - Operator Message Delivery
//!
//! One method: deliver a pre-formatted HTML message to the fixed
//! operator destination. Callers decide what to do on failure.

use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
  /// Deliver `text` (Telegram HTML markup).
  async fn send_message(&self, text: &str) -> anyhow::Result<()>;
}
