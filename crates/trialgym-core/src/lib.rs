//! Core types for the trialgym behavioural-task framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, the configuration error taxonomy, the explicit RNG
//! handle threaded through every stochastic draw, and the duration
//! sampler used to size trial periods.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod duration;
pub mod error;
pub mod id;
pub mod random;

pub use duration::DurationSpec;
pub use error::ConfigError;
pub use id::{PeriodId, StepId, TrialId};
pub use random::{seeded_rng, standard_normal, TrialRng};
