//! Ready-set-go interval reproduction.
//!
//! A `ready` cue and a `set` cue are separated by a measured interval.
//! After `set`, the agent must respond (`go`) once `gain` times that
//! interval has elapsed. Reward decays with the production error and is
//! zero beyond a threshold proportional to the target interval.
//!
//! Periods are laid out back to back:
//!
//! | Period | Duration |
//! |--------|----------|
//! | `fixation` | timing |
//! | `ready` | timing |
//! | `measure` | measured interval minus `ready` |
//! | `set` | timing |
//! | `production` | twice the target interval |
//!
//! so the ready cue onset and the set cue onset are exactly one measured
//! interval apart. Channels: `[fixation, ready, set]`. Actions:
//! `{fixate, go}`.

use trialgym_core::{ConfigError, DurationSpec};
use trialgym_engine::{Decision, RewardConfig, Spaces, StepView, Task, TrialContext};
use trialgym_epoch::{ObservationLayout, Trial};

/// The response action.
pub const GO: usize = 1;

/// Candidate measured intervals.
pub const MEASURES: [f64; 7] = [500.0, 580.0, 660.0, 760.0, 840.0, 920.0, 1000.0];

/// Period durations, in the same unit as `dt`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadySetGoTiming {
    /// Default: 500.
    pub fixation: DurationSpec,
    /// Default: 83.
    pub ready: DurationSpec,
    /// Measured interval between ready and set onsets. Default: uniform
    /// choice over [`MEASURES`].
    pub measure: DurationSpec,
    /// Default: 83.
    pub set: DurationSpec,
}

impl Default for ReadySetGoTiming {
    fn default() -> Self {
        Self {
            fixation: DurationSpec::constant(500.0),
            ready: DurationSpec::constant(83.0),
            measure: DurationSpec::choice(&MEASURES),
            set: DurationSpec::constant(83.0),
        }
    }
}

/// Configuration for [`ReadySetGo`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReadySetGoConfig {
    /// Timestep size. Default: 80.
    pub dt: f64,
    /// Target production interval is `gain × measure`. Default: 1.
    pub gain: f64,
    /// Period durations.
    pub timing: ReadySetGoTiming,
    /// Default: abort -0.1, correct 1, fail 0, miss 0.
    pub rewards: RewardConfig,
    /// Whether responding during fixation ends the trial. Default: false.
    pub abort_ends_trial: bool,
}

impl Default for ReadySetGoConfig {
    fn default() -> Self {
        Self {
            dt: 80.0,
            gain: 1.0,
            timing: ReadySetGoTiming::default(),
            rewards: RewardConfig::default(),
            abort_ends_trial: false,
        }
    }
}

/// Ready-set-go timing task.
#[derive(Debug)]
pub struct ReadySetGo {
    config: ReadySetGoConfig,
    spaces: Spaces,
}

impl ReadySetGo {
    /// Validate `config` and resolve its durations at `config.dt`.
    pub fn new(config: ReadySetGoConfig) -> Result<Self, ConfigError> {
        let dt = config.dt;
        let t = &config.timing;
        let timing = ReadySetGoTiming {
            fixation: t.fixation.resolve(dt)?,
            ready: t.ready.resolve(dt)?,
            measure: t.measure.resolve(dt)?,
            set: t.set.resolve(dt)?,
        };
        config.rewards.validate()?;
        if !config.gain.is_finite() || config.gain <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                reason: format!("gain must be finite and > 0, got {}", config.gain),
            });
        }
        let (longest_ready, shortest_measure) =
            (timing.ready.upper_bound(), timing.measure.lower_bound());
        if longest_ready > shortest_measure {
            return Err(ConfigError::InvalidDuration {
                reason: format!(
                    "ready cue up to {longest_ready} can exceed measured interval {shortest_measure}"
                ),
            });
        }
        tracing::debug!(dt, gain = config.gain, "ready-set-go task configured");
        Ok(Self {
            config: ReadySetGoConfig { timing, ..config },
            spaces: Spaces {
                layout: ObservationLayout::new()
                    .group("fixation", 1)
                    .group("ready", 1)
                    .group("set", 1),
                actions: 2,
                fixate: 0,
            },
        })
    }

    /// The validated configuration, with resolved durations.
    pub fn config(&self) -> &ReadySetGoConfig {
        &self.config
    }

    /// Error below which a response earns reward.
    pub fn threshold(production: f64) -> f64 {
        0.2 * production + 25.0
    }

    /// Reward for a response `error` away from the target `production`.
    pub fn graded_reward(&self, error: f64, production: f64) -> Option<f32> {
        let threshold = Self::threshold(production);
        if error >= threshold {
            return None;
        }
        let fraction = (1.0 - error / threshold).powf(1.5) as f32;
        Some(self.config.rewards.correct * fraction)
    }
}

impl Task for ReadySetGo {
    fn name(&self) -> &str {
        "ready_set_go"
    }

    fn dt(&self) -> f64 {
        self.config.dt
    }

    fn spaces(&self) -> &Spaces {
        &self.spaces
    }

    fn rewards(&self) -> &RewardConfig {
        &self.config.rewards
    }

    fn build_trial(&self, ctx: &mut TrialContext<'_>) -> Result<Trial, ConfigError> {
        let timing = &self.config.timing;
        let dt = self.config.dt;
        let fixation = ctx.duration("fixation", &timing.fixation)?;
        let ready = ctx.duration("ready", &timing.ready)?;
        let measure = ctx.duration("measure", &timing.measure)?;
        let set = ctx.duration("set", &timing.set)?;
        if measure < ready {
            return Err(ConfigError::InvalidDuration {
                reason: format!("measured interval {measure} shorter than ready cue {ready}"),
            });
        }
        let production = measure * self.config.gain;

        let timeline = ctx
            .timeline()?
            .periods(&[
                ("fixation", fixation),
                ("ready", ready),
                ("measure", measure - ready),
                ("set", set),
                ("production", 2.0 * production),
            ])
            .build()?;
        let mut trial = ctx.trial(timeline);
        let fields = trial.fields_mut();
        fields.set("measure", measure);
        fields.set("production", production);

        trial.add_value(1.0f32, "fixation", "fixation")?;
        trial.add_value(1.0f32, "ready", "ready")?;
        trial.add_value(1.0f32, "set", "set")?;

        let tl = trial.timeline();
        let set_onset = tl.time_of(tl.get("set").map_or(0, |p| p.start));
        let go: Vec<usize> = tl
            .get("production")
            .map(|p| p.range())
            .unwrap_or_default()
            .filter(|&t| ((tl.time_of(t) - set_onset) - production).abs() < dt / 2.0 + 1.0)
            .collect();
        for t in go {
            trial.set_ground_truth_at(GO, t);
        }
        Ok(trial)
    }

    fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision {
        if action == self.spaces.fixate {
            return Decision::pending();
        }
        let rewards = &self.config.rewards;
        if view.in_period("fixation") {
            return Decision::abort(rewards.abort, self.config.abort_ends_trial);
        }
        if !view.in_period("production") {
            return Decision::pending();
        }
        let (Ok(production), Some(elapsed)) = (
            view.fields().float("production"),
            view.time_since_start_of("set"),
        ) else {
            return Decision::pending();
        };
        let error = (elapsed - production).abs();
        match self.graded_reward(error, production) {
            Some(reward) => Decision::correct(reward, action),
            None => Decision::incorrect(rewards.fail, action),
        }
    }
}
