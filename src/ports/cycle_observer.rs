//! Cycle Observer Port - Post-Cycle Hooks
//!
//! Lets the scheduler publish what a cycle did without knowing about
//! metrics registries or health probes.

use crate::domain::target::RebalanceOutcome;

pub trait CycleObserver: Send + Sync + 'static {
  /// Called once after every cycle, including cycles where every target failed.
  fn cycle_finished(&self, outcomes: &[RebalanceOutcome], finished_at: i64);

  /// Called when the cycle report could not be delivered.
  fn report_undelivered(&self) {}
}
