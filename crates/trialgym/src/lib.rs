//! trialgym: trial-structured cognitive task environments for
//! reinforcement learning.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all trialgym sub-crates. For most users, adding `trialgym` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use trialgym::prelude::*;
//!
//! let task = PerceptualDecisionMaking::new(PerceptualConfig::default()).unwrap();
//! let mut driver = StepDriver::new(Box::new(task), DriverConfig::seeded(42)).unwrap();
//!
//! // Force the next trial's conditions: rightward evidence, 330 ms stimulus.
//! driver
//!     .new_trial_with(TrialFields::new().with("left_right", 1).with("stimulus", 330.0))
//!     .unwrap();
//!
//! // Fixate through fixation and stimulus, then choose right.
//! for _ in 0..11 {
//!     assert_eq!(driver.step(0).unwrap().reward, 0.0);
//! }
//! let result = driver.step(2).unwrap();
//! assert_eq!(result.reward, 1.0);
//! assert!(result.info.new_trial);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `trialgym-core` | IDs, errors, RNG handle, duration specs |
//! | [`epoch`] | `trialgym-epoch` | Timelines, trial state, observation assembly |
//! | [`engine`] | `trialgym-engine` | Task trait, step driver, reward policy, stats |
//! | [`tasks`] | `trialgym-tasks` | The bundled task implementations |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`trialgym-core`).
///
/// Identifiers, [`types::ConfigError`], the [`types::TrialRng`] handle and
/// [`types::DurationSpec`].
pub use trialgym_core as types;

/// Epoch timelines and trial assembly (`trialgym-epoch`).
///
/// Build a [`epoch::Timeline`] with [`epoch::TimelineBuilder`], then fill
/// a [`epoch::Trial`]'s buffers with its period-scoped write API.
pub use trialgym_epoch as epoch;

/// The step driver and task interface (`trialgym-engine`).
pub use trialgym_engine as engine;

/// Bundled tasks (`trialgym-tasks`).
pub use trialgym_tasks as tasks;

/// Common imports for typical trialgym usage.
///
/// ```rust
/// use trialgym::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use trialgym_core::{ConfigError, DurationSpec, StepId, TrialId, TrialRng};

    // Trial construction
    pub use trialgym_epoch::{
        ChannelSelector, ObservationLayout, Periods, Timeline, TimelineBuilder, Trial,
        TrialFields,
    };

    // Engine
    pub use trialgym_engine::{
        Decision, DriverConfig, HoldConfig, OutcomeKind, ResponsePolicy, RewardConfig, Spaces,
        StepDriver, StepError, StepResult, StepView, Task, TrialContext, TrialStats,
    };

    // Tasks
    pub use trialgym_tasks::{
        DelayedMatchCategory, MatchCategoryConfig, NAlternativeChoice, NAlternativeConfig,
        PerceptualConfig, PerceptualDecisionMaking, ReadySetGo, ReadySetGoConfig,
    };
}
