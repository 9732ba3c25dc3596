//! Use Cases Layer - Application Workflows
//!
//! Orchestrates domain logic with port interfaces. Each use case is a
//! self-contained operation that tests can drive through mocked ports.
//!
//! Use cases:
//! - `registry`: Typed contract handles from configuration
//! - `Rebalancer`: One rebalance call per target, plus post-call reads
//! - `PpsStore`: PPS sample persistence and retention
//! - `Reporter`: Cycle report delivery
//! - `scheduler`: `JobContext` and the periodic cycle loop

pub mod pps_history;
pub mod rebalancer;
pub mod registry;
pub mod reporter;
pub mod scheduler;

pub use pps_history::{CleanupSummary, PpsStore};
pub use rebalancer::Rebalancer;
pub use reporter::Reporter;
pub use scheduler::JobContext;
