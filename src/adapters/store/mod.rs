//! Storage Adapters
//!
//! Redis list access over the Upstash REST API, backing PPS history.

pub mod upstash;

pub use upstash::{StoreError, UpstashClient};
