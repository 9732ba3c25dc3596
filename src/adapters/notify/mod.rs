//! Notification Adapters
//!
//! Operator message delivery. Telegram is the only channel.

pub mod telegram;

pub use telegram::TelegramNotifier;
