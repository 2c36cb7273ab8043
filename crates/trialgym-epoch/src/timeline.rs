//! Discretized trial timelines.
//!
//! [`TimelineBuilder`] collects ordered period declarations in physical
//! time, converts every boundary to a timestep index with
//! `round(time / dt)`, and checks that consecutive periods meet exactly.
//! The built [`Timeline`] therefore partitions `0..N` and answers
//! membership queries through a length-`N` owner table.
//!
//! # Invariants
//!
//! - Periods are contiguous in declaration order: the first starts at
//!   timestep 0 and each later period starts where its predecessor ends.
//! - A zero-length period is legal; it owns no timesteps and is never
//!   active.
//! - The last declared period is terminal; its end index is `N`.
//! - Querying a timestep outside `0..N` panics. Task code only ever sees
//!   timesteps handed out by the step driver, so an out-of-range query is
//!   a logic error, not a recoverable condition.

use std::ops::Range;

use indexmap::IndexMap;
use trialgym_core::{ConfigError, PeriodId};

/// Where a declared period starts.
#[derive(Clone, Debug, PartialEq)]
pub enum Anchor {
    /// At the end of the previously declared period (time 0 for the first).
    Previous,
    /// At the end of the named, already declared period.
    After(String),
    /// At an absolute time offset from trial onset.
    At(f64),
}

#[derive(Clone, Debug)]
struct PeriodDecl {
    name: String,
    duration: f64,
    anchor: Anchor,
}

/// One named span of timesteps within a trial.
#[derive(Clone, Debug, PartialEq)]
pub struct Period {
    /// Declaration-order identifier.
    pub id: PeriodId,
    /// Unique name within the trial.
    pub name: String,
    /// First owned timestep.
    pub start: usize,
    /// One past the last owned timestep.
    pub end: usize,
    /// Onset in physical time.
    pub start_time: f64,
    /// Declared duration in physical time, before rounding.
    pub duration: f64,
}

impl Period {
    /// Number of owned timesteps.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the period rounded to zero timesteps.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Owned timestep indices.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Offset in physical time.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Collects period declarations and builds a [`Timeline`].
///
/// Declaration errors (unknown anchor, duplicate name, gap or overlap)
/// are reported by [`build()`](TimelineBuilder::build).
#[derive(Clone, Debug)]
pub struct TimelineBuilder {
    dt: f64,
    decls: Vec<PeriodDecl>,
}

impl TimelineBuilder {
    /// Start a timeline with the given timestep size.
    pub fn new(dt: f64) -> Result<Self, ConfigError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::NonPositiveDt { value: dt });
        }
        Ok(Self {
            dt,
            decls: Vec::new(),
        })
    }

    /// Declare a period that starts where the previous one ends.
    pub fn period(self, name: &str, duration: f64) -> Self {
        self.push(name, duration, Anchor::Previous)
    }

    /// Declare a period that starts at the end of `after`.
    pub fn period_after(self, name: &str, duration: f64, after: &str) -> Self {
        self.push(name, duration, Anchor::After(after.to_string()))
    }

    /// Declare a period at an absolute onset time.
    pub fn period_at(self, name: &str, duration: f64, onset: f64) -> Self {
        self.push(name, duration, Anchor::At(onset))
    }

    /// Declare several back-to-back periods.
    pub fn periods(self, periods: &[(&str, f64)]) -> Self {
        periods
            .iter()
            .fold(self, |b, (name, duration)| b.period(name, *duration))
    }

    fn push(mut self, name: &str, duration: f64, anchor: Anchor) -> Self {
        self.decls.push(PeriodDecl {
            name: name.to_string(),
            duration,
            anchor,
        });
        self
    }

    /// Convert declarations into a timeline.
    pub fn build(self) -> Result<Timeline, ConfigError> {
        if self.decls.is_empty() {
            return Err(ConfigError::NoPeriods);
        }
        let dt = self.dt;
        let mut names: IndexMap<String, PeriodId> = IndexMap::with_capacity(self.decls.len());
        let mut periods: Vec<Period> = Vec::with_capacity(self.decls.len());

        for (i, decl) in self.decls.into_iter().enumerate() {
            if !decl.duration.is_finite() || decl.duration < 0.0 {
                return Err(ConfigError::InvalidDuration {
                    reason: format!(
                        "period '{}' has duration {}, must be finite and >= 0",
                        decl.name, decl.duration
                    ),
                });
            }
            if names.contains_key(&decl.name) {
                return Err(ConfigError::DuplicatePeriod { name: decl.name });
            }
            let start_time = match &decl.anchor {
                Anchor::Previous => periods.last().map_or(0.0, Period::end_time),
                Anchor::After(prior) => {
                    let id = names
                        .get(prior)
                        .ok_or_else(|| ConfigError::UnknownPeriod {
                            name: prior.clone(),
                        })?;
                    periods[id.index()].end_time()
                }
                Anchor::At(onset) => {
                    if !onset.is_finite() || *onset < 0.0 {
                        return Err(ConfigError::InvalidDuration {
                            reason: format!(
                                "period '{}' has onset {onset}, must be finite and >= 0",
                                decl.name
                            ),
                        });
                    }
                    *onset
                }
            };
            let start = to_index(start_time, dt);
            let end = to_index(start_time + decl.duration, dt);
            let expected_start = periods.last().map_or(0, |p| p.end);
            if start != expected_start {
                return Err(ConfigError::Discontiguous {
                    period: decl.name,
                    expected_start,
                    actual_start: start,
                });
            }
            let id = u16::try_from(i)
                .map(PeriodId)
                .map_err(|_| ConfigError::InvalidParameter {
                    reason: format!("more than {} periods declared", u16::MAX),
                })?;
            names.insert(decl.name.clone(), id);
            periods.push(Period {
                id,
                name: decl.name,
                start,
                end,
                start_time,
                duration: decl.duration,
            });
        }

        let len = periods.last().map_or(0, |p| p.end);
        if len == 0 {
            return Err(ConfigError::EmptyTrial);
        }
        let mut owner = Vec::with_capacity(len);
        for p in &periods {
            owner.extend(std::iter::repeat_n(p.id, p.len()));
        }
        debug_assert_eq!(owner.len(), len, "periods must partition the timeline");

        Ok(Timeline {
            dt,
            periods,
            names,
            owner,
        })
    }
}

fn to_index(time: f64, dt: f64) -> usize {
    (time / dt).round() as usize
}

/// A trial's discretized time axis and its partition into periods.
#[derive(Clone, Debug)]
pub struct Timeline {
    dt: f64,
    periods: Vec<Period>,
    names: IndexMap<String, PeriodId>,
    owner: Vec<PeriodId>,
}

impl Timeline {
    /// Number of timesteps `N`.
    pub fn len(&self) -> usize {
        self.owner.len()
    }

    /// Always false: the builder rejects empty timelines.
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }

    /// Timestep size.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// All periods in declaration order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// The period with the given ID.
    pub fn period(&self, id: PeriodId) -> &Period {
        &self.periods[id.index()]
    }

    /// Look up a period by name.
    pub fn get(&self, name: &str) -> Option<&Period> {
        self.names.get(name).map(|id| &self.periods[id.index()])
    }

    /// Resolve a period name, failing for undeclared names.
    pub fn id(&self, name: &str) -> Result<PeriodId, ConfigError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownPeriod {
                name: name.to_string(),
            })
    }

    /// The last declared period.
    pub fn terminal(&self) -> &Period {
        // Non-empty by construction.
        &self.periods[self.periods.len() - 1]
    }

    /// The period that owns timestep `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()`.
    pub fn period_at(&self, t: usize) -> PeriodId {
        self.check(t);
        self.owner[t]
    }

    /// Whether period `id` owns timestep `t`. Empty periods never do.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()`.
    pub fn contains(&self, id: PeriodId, t: usize) -> bool {
        self.period_at(t) == id
    }

    /// Whether the named period owns timestep `t`.
    ///
    /// Names that this trial did not declare are never active.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()`.
    pub fn in_period(&self, name: &str, t: usize) -> bool {
        self.check(t);
        self.names
            .get(name)
            .is_some_and(|id| self.owner[t] == *id)
    }

    /// Physical time at the onset of timestep `t`.
    pub fn time_of(&self, t: usize) -> f64 {
        t as f64 * self.dt
    }

    /// Total declared duration, before rounding.
    pub fn total_duration(&self) -> f64 {
        self.terminal().end_time()
    }

    fn check(&self, t: usize) {
        assert!(
            t < self.owner.len(),
            "timestep {t} outside timeline of length {}",
            self.owner.len()
        );
    }
}
