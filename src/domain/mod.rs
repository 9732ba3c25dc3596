//! Domain layer - Targets, outcomes, samples, and report formatting.
//!
//! Pure types and functions: nothing here performs I/O. Everything is
//! testable in isolation and shared by the use cases and adapters.

pub mod report;
pub mod sample;
pub mod target;
pub mod units;

pub use report::{format_report, CycleStatus, CycleSummary};
pub use sample::PpsSample;
pub use target::{ContractTarget, RebalanceArgs, RebalanceOutcome};
