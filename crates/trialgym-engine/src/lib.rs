//! Step driver and task interface for trialgym.
//!
//! A [`StepDriver`] owns one task, one RNG and the current [`Trial`].
//! Each [`step()`](StepDriver::step) call simulates exactly one timestep:
//! the task's [`classify_step`](Task::classify_step) judges the action,
//! the driver enforces the timeline's structural end (miss), applies the
//! stochastic continuation policy, and builds the next trial through the
//! task's [`build_trial`](Task::build_trial) when the current one ends.
//!
//! [`Trial`]: trialgym_epoch::Trial

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod policy;
pub mod stats;
pub mod task;

pub use config::{DriverConfig, HoldConfig, RewardConfig};
pub use driver::{StepDriver, StepError, StepInfo, StepResult};
pub use policy::{Decision, Outcome, OutcomeKind, ResponsePolicy};
pub use stats::TrialStats;
pub use task::{Spaces, StepView, Task, TrialContext};
