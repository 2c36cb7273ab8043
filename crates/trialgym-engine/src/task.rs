//! The task interface and the contexts handed to it.
//!
//! A task is a pair of functions over plain data: [`Task::build_trial`]
//! declares periods, trial fields, observations and ground truth for one
//! trial, and [`Task::classify_step`] judges one action at one timestep.
//! The [`StepDriver`](crate::StepDriver) owns everything mutable.

use rand::Rng;
use trialgym_core::{ConfigError, DurationSpec, TrialId, TrialRng};
use trialgym_epoch::{ObservationLayout, Period, Timeline, TimelineBuilder, Trial, TrialFields};

use crate::config::RewardConfig;
use crate::policy::Decision;

// ── Spaces ─────────────────────────────────────────────────────────

/// Observation and action space a task exposes to the agent.
///
/// Reported once at construction for external space validation.
#[derive(Clone, Debug, PartialEq)]
pub struct Spaces {
    /// Observation channels.
    pub layout: ObservationLayout,
    /// Number of discrete actions; legal actions are `0..actions`.
    pub actions: usize,
    /// The fixate action, also the "no target" ground-truth label.
    pub fixate: usize,
}

impl Spaces {
    /// Observation vector length.
    pub fn observation_width(&self) -> usize {
        self.layout.width()
    }

    /// At least one channel and one action, and `fixate` is a legal action.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.width() == 0 {
            return Err(ConfigError::InvalidParameter {
                reason: "observation layout has no channels".to_string(),
            });
        }
        if self.fixate >= self.actions {
            return Err(ConfigError::InvalidParameter {
                reason: format!(
                    "fixate action {} outside action space of size {}",
                    self.fixate, self.actions
                ),
            });
        }
        Ok(())
    }
}

// ── Task ───────────────────────────────────────────────────────────

/// A behavioural task plugged into the step driver.
///
/// Implementations hold only validated, immutable configuration. All
/// randomness comes from the [`TrialContext`]'s RNG.
pub trait Task: Send {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Timestep size in the task's physical time unit.
    fn dt(&self) -> f64;

    /// Observation and action spaces.
    fn spaces(&self) -> &Spaces;

    /// Reward values. The driver pays `miss` for timeouts and held steps.
    fn rewards(&self) -> &RewardConfig;

    /// Build one trial.
    fn build_trial(&self, ctx: &mut TrialContext<'_>) -> Result<Trial, ConfigError>;

    /// Judge `action` at the view's timestep.
    fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision;
}

// ── TrialContext ───────────────────────────────────────────────────

/// Everything a task may use while building a trial.
///
/// Overrides let a caller force trial conditions: every helper that
/// draws a named value returns the override instead when one is set,
/// without consuming RNG draws.
pub struct TrialContext<'a> {
    rng: &'a mut TrialRng,
    dt: f64,
    id: TrialId,
    spaces: &'a Spaces,
    overrides: &'a TrialFields,
}

impl<'a> TrialContext<'a> {
    /// Assemble a context. Used by the driver and by task tests.
    pub fn new(
        rng: &'a mut TrialRng,
        dt: f64,
        id: TrialId,
        spaces: &'a Spaces,
        overrides: &'a TrialFields,
    ) -> Self {
        Self {
            rng,
            dt,
            id,
            spaces,
            overrides,
        }
    }

    /// The driver's RNG.
    pub fn rng(&mut self) -> &mut TrialRng {
        &mut *self.rng
    }

    /// Timestep size.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// ID the new trial will carry.
    pub fn id(&self) -> TrialId {
        self.id
    }

    /// Caller-forced trial fields.
    pub fn overrides(&self) -> &TrialFields {
        self.overrides
    }

    /// Sample a duration, unless `name` is overridden.
    pub fn duration(&mut self, name: &str, spec: &DurationSpec) -> Result<f64, ConfigError> {
        if self.overrides.contains(name) {
            return self.overrides.float(name);
        }
        Ok(spec.sample(&mut *self.rng))
    }

    /// Pick one of `values`, unless `name` is overridden.
    pub fn choose_int(&mut self, name: &str, values: &[i64]) -> Result<i64, ConfigError> {
        if self.overrides.contains(name) {
            return self.overrides.int(name);
        }
        trialgym_core::random::choose(&mut *self.rng, values)
            .copied()
            .ok_or_else(|| empty_choice(name))
    }

    /// Pick one of `values`, unless `name` is overridden.
    pub fn choose_float(&mut self, name: &str, values: &[f64]) -> Result<f64, ConfigError> {
        if self.overrides.contains(name) {
            return self.overrides.float(name);
        }
        trialgym_core::random::choose(&mut *self.rng, values)
            .copied()
            .ok_or_else(|| empty_choice(name))
    }

    /// Uniform draw from `[0, 1)`, unless `name` is overridden.
    pub fn uniform(&mut self, name: &str) -> Result<f64, ConfigError> {
        if self.overrides.contains(name) {
            return self.overrides.float(name);
        }
        Ok(self.rng.random())
    }

    /// A timeline builder at this trial's `dt`.
    pub fn timeline(&self) -> Result<TimelineBuilder, ConfigError> {
        TimelineBuilder::new(self.dt)
    }

    /// Allocate the trial for `timeline` with the task's layout and
    /// the fixate action as "no target".
    pub fn trial(&self, timeline: Timeline) -> Trial {
        Trial::new(self.id, timeline, &self.spaces.layout, self.spaces.fixate)
    }
}

fn empty_choice(name: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        reason: format!("no values to choose '{name}' from"),
    }
}

// ── StepView ───────────────────────────────────────────────────────

/// Read-only view of the current trial at the current timestep.
#[derive(Clone, Copy, Debug)]
pub struct StepView<'a> {
    trial: &'a Trial,
    t: usize,
}

impl<'a> StepView<'a> {
    /// View `trial` at timestep `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is outside the trial.
    pub fn new(trial: &'a Trial, t: usize) -> Self {
        assert!(
            t < trial.len(),
            "timestep {t} outside trial of length {}",
            trial.len()
        );
        Self { trial, t }
    }

    /// Current timestep index.
    pub fn t(&self) -> usize {
        self.t
    }

    /// The trial being run.
    pub fn trial(&self) -> &'a Trial {
        self.trial
    }

    /// Task-declared fields.
    pub fn fields(&self) -> &'a TrialFields {
        self.trial.fields()
    }

    /// Whether the named period is active. Undeclared names never are.
    pub fn in_period(&self, name: &str) -> bool {
        self.trial.timeline().in_period(name, self.t)
    }

    /// The active period.
    pub fn period(&self) -> &'a Period {
        let tl = self.trial.timeline();
        tl.period(tl.period_at(self.t))
    }

    /// Physical time at this timestep.
    pub fn time(&self) -> f64 {
        self.trial.timeline().time_of(self.t)
    }

    /// Physical time since the named period's first timestep.
    ///
    /// Negative before the period starts; `None` for undeclared names.
    pub fn time_since_start_of(&self, name: &str) -> Option<f64> {
        let tl = self.trial.timeline();
        tl.get(name).map(|p| tl.time_of(self.t) - tl.time_of(p.start))
    }

    /// Ground-truth label at this timestep.
    pub fn ground_truth(&self) -> usize {
        self.trial.ground_truth(self.t)
    }

    /// Observation row at this timestep.
    pub fn observation(&self) -> &'a [f32] {
        self.trial.observation(self.t)
    }

    /// Whether this is the trial's last timestep.
    pub fn is_last(&self) -> bool {
        self.t + 1 == self.trial.len()
    }
}
