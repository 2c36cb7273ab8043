//! Configuration error taxonomy.
//!
//! Every problem a caller can cause through configuration or task code
//! (bad timestep, inconsistent duration bounds, undeclared period names,
//! out-of-range channels) is reported through [`ConfigError`] at the
//! moment a trial or driver is constructed. Outcome classifications such
//! as abort or miss are never errors.

use std::error::Error;
use std::fmt;

/// Errors detected while validating configuration or building a trial.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The timestep size is NaN, infinite, zero, or negative.
    NonPositiveDt {
        /// The invalid value.
        value: f64,
    },
    /// A duration value is NaN, infinite, or negative.
    InvalidDuration {
        /// Description of the offending duration.
        reason: String,
    },
    /// A bounded distribution has `min > max` (after the `dt` adjustment).
    DurationBounds {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// A choice distribution was declared with no values.
    EmptyChoice,
    /// A period name was referenced that the trial never declared.
    UnknownPeriod {
        /// The undeclared name.
        name: String,
    },
    /// The same period name was declared twice in one trial.
    DuplicatePeriod {
        /// The repeated name.
        name: String,
    },
    /// A timeline was built without any period declarations.
    NoPeriods,
    /// A period does not start where its predecessor ends.
    ///
    /// Covers both gaps and overlaps; periods must partition the timeline.
    Discontiguous {
        /// The period whose start is misplaced.
        period: String,
        /// Timestep index where the previous period ended.
        expected_start: usize,
        /// Timestep index where this period would start.
        actual_start: usize,
    },
    /// The declared periods round to zero timesteps in total.
    EmptyTrial,
    /// A named channel group is not part of the observation layout.
    UnknownChannelGroup {
        /// The unknown group name.
        name: String,
    },
    /// A channel index lies outside the observation width.
    ChannelOutOfRange {
        /// The offending channel.
        channel: usize,
        /// The observation width.
        width: usize,
    },
    /// A vector value does not match the number of selected channels.
    WidthMismatch {
        /// Number of selected channels.
        expected: usize,
        /// Length of the supplied value.
        actual: usize,
    },
    /// A probability is outside `[0, 1]` or not finite.
    InvalidProbability {
        /// Which probability.
        name: &'static str,
        /// The invalid value.
        value: f64,
    },
    /// A reward value is NaN or infinite.
    InvalidReward {
        /// Which reward.
        name: &'static str,
        /// The invalid value.
        value: f32,
    },
    /// A task parameter failed validation.
    InvalidParameter {
        /// Description of the validation failure.
        reason: String,
    },
    /// A trial field the task relies on was never set.
    FieldMissing {
        /// The missing field name.
        name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveDt { value } => {
                write!(f, "dt must be finite and positive, got {value}")
            }
            Self::InvalidDuration { reason } => write!(f, "invalid duration: {reason}"),
            Self::DurationBounds { min, max } => {
                write!(f, "duration lower bound {min} exceeds upper bound {max}")
            }
            Self::EmptyChoice => write!(f, "choice distribution has no values"),
            Self::UnknownPeriod { name } => write!(f, "period '{name}' is not declared"),
            Self::DuplicatePeriod { name } => {
                write!(f, "period '{name}' is declared more than once")
            }
            Self::NoPeriods => write!(f, "timeline has no periods"),
            Self::Discontiguous {
                period,
                expected_start,
                actual_start,
            } => write!(
                f,
                "period '{period}' starts at timestep {actual_start}, \
                 previous period ends at {expected_start}"
            ),
            Self::EmptyTrial => write!(f, "trial has zero timesteps"),
            Self::UnknownChannelGroup { name } => {
                write!(f, "channel group '{name}' is not in the observation layout")
            }
            Self::ChannelOutOfRange { channel, width } => {
                write!(f, "channel {channel} out of range for width {width}")
            }
            Self::WidthMismatch { expected, actual } => {
                write!(f, "value has {actual} entries, {expected} channels selected")
            }
            Self::InvalidProbability { name, value } => {
                write!(f, "{name} must be in [0.0, 1.0], got {value}")
            }
            Self::InvalidReward { name, value } => {
                write!(f, "{name} reward must be finite, got {value}")
            }
            Self::InvalidParameter { reason } => write!(f, "invalid parameter: {reason}"),
            Self::FieldMissing { name } => write!(f, "trial field '{name}' is not set"),
        }
    }
}

impl Error for ConfigError {}
