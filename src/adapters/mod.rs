//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (blockchain RPC, HTTP APIs). Each sub-module
//! groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `chain`: HyperEVM interaction via alloy-rs
//! - `notify`: Telegram Bot API
//! - `store`: Upstash Redis REST
//! - `metrics`: Prometheus metrics export and health checks

pub mod chain;
pub mod metrics;
pub mod notify;
pub mod store;
