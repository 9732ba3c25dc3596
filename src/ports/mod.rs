//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use cases require from the
//! outside world. Adapters implement these traits; tests mock them.
//!
//! Port categories:
//! - `ChainClient`: EVM node access and transaction submission
//! - `Notifier`: Operator message delivery
//! - `KvStore`: Redis list commands for PPS history
//! - `CycleObserver`: Post-cycle hooks (metrics, readiness)

pub mod chain_client;
pub mod cycle_observer;
pub mod kv_store;
pub mod notifier;
