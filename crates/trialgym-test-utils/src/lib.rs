//! Test utilities and mock tasks for trialgym development.
//!
//! Provides small deterministic [`Task`](trialgym_engine::Task)
//! implementations in [`fixtures`] and helpers for driving a
//! [`StepDriver`] through a fixed action script.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{FailingTask, ScriptedTask};

use trialgym_engine::{StepDriver, StepError, StepResult};

/// Step `driver` once per action, collecting the results.
///
/// Stops at the first error.
pub fn run_actions(
    driver: &mut StepDriver,
    actions: &[usize],
) -> Result<Vec<StepResult>, StepError> {
    actions.iter().map(|&a| driver.step(a)).collect()
}

/// Step `driver` `n` times with the same action.
pub fn run_constant(
    driver: &mut StepDriver,
    action: usize,
    n: usize,
) -> Result<Vec<StepResult>, StepError> {
    (0..n).map(|_| driver.step(action)).collect()
}

/// Rewards of a result sequence.
pub fn rewards(results: &[StepResult]) -> Vec<f32> {
    results.iter().map(|r| r.reward).collect()
}
