//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a period within one trial's timeline.
///
/// Periods are assigned sequential IDs in declaration order, so
/// `PeriodId(n)` is the n-th declared period of the trial that issued it.
/// IDs are only meaningful for the timeline that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodId(pub u16);

impl PeriodId {
    /// The declaration index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PeriodId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Monotonically increasing external step counter.
///
/// Incremented once per call to the step driver and never reset by
/// trial boundaries, only by an explicit episodic reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Sequential trial counter. The eagerly built first trial is `TrialId(0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrialId(pub u64);

impl TrialId {
    /// The ID of the trial that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TrialId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
