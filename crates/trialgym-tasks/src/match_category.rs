//! Delayed match-to-category.
//!
//! A sample direction is shown, followed by a delay and a test direction.
//! Directions in the upper half-plane belong to category 0, the lower
//! half to category 1. The agent reports during the test period whether
//! the test shares the sample's category.
//!
//! Channels: `[fixation, cos θ, sin θ]`. Actions: `{fixate, match,
//! non-match}`. The fixation cue stays on for the whole trial.

use std::f64::consts::PI;

use trialgym_core::{ConfigError, DurationSpec};
use trialgym_engine::{
    Decision, ResponsePolicy, RewardConfig, Spaces, StepView, Task, TrialContext,
};
use trialgym_epoch::{ChannelSelector, ObservationLayout, Periods, Trial};

use crate::{check_sigma, noise_std};

/// Report that sample and test match.
pub const MATCH: usize = 1;
/// Report that sample and test differ.
pub const NON_MATCH: usize = 2;

/// Period durations, in the same unit as `dt`.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCategoryTiming {
    /// Default: 500.
    pub fixation: DurationSpec,
    /// Default: 650.
    pub sample: DurationSpec,
    /// Default: 1000.
    pub first_delay: DurationSpec,
    /// Default: 650.
    pub test: DurationSpec,
}

impl Default for MatchCategoryTiming {
    fn default() -> Self {
        Self {
            fixation: DurationSpec::constant(500.0),
            sample: DurationSpec::constant(650.0),
            first_delay: DurationSpec::constant(1000.0),
            test: DurationSpec::constant(650.0),
        }
    }
}

/// Configuration for [`DelayedMatchCategory`].
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCategoryConfig {
    /// Timestep size. Default: 100.
    pub dt: f64,
    /// Noise scale; per-timestep std is `sigma / sqrt(dt)`. Default: 1.5.
    pub sigma: f64,
    /// Period durations.
    pub timing: MatchCategoryTiming,
    /// Default: abort -0.1, correct 1, fail 0, miss 0.
    pub rewards: RewardConfig,
    /// Whether responding during fixation ends the trial. Default: false.
    pub abort_ends_trial: bool,
}

impl Default for MatchCategoryConfig {
    fn default() -> Self {
        Self {
            dt: 100.0,
            sigma: 1.5,
            timing: MatchCategoryTiming::default(),
            rewards: RewardConfig::default(),
            abort_ends_trial: false,
        }
    }
}

/// Delayed match-to-category task.
#[derive(Debug)]
pub struct DelayedMatchCategory {
    config: MatchCategoryConfig,
    spaces: Spaces,
    policy: ResponsePolicy,
}

impl DelayedMatchCategory {
    /// Validate `config` and resolve its durations at `config.dt`.
    pub fn new(config: MatchCategoryConfig) -> Result<Self, ConfigError> {
        let dt = config.dt;
        let t = &config.timing;
        let timing = MatchCategoryTiming {
            fixation: t.fixation.resolve(dt)?,
            sample: t.sample.resolve(dt)?,
            first_delay: t.first_delay.resolve(dt)?,
            test: t.test.resolve(dt)?,
        };
        config.rewards.validate()?;
        check_sigma(config.sigma)?;
        let policy = ResponsePolicy::new(0, config.rewards.clone())
            .abort_during(&["fixation"])
            .decide_during(&["test"])
            .abort_ends_trial(config.abort_ends_trial);
        tracing::debug!(dt, "match-to-category task configured");
        Ok(Self {
            config: MatchCategoryConfig { timing, ..config },
            spaces: Spaces {
                layout: ObservationLayout::new()
                    .group("fixation", 1)
                    .group("stimulus", 2),
                actions: 3,
                fixate: 0,
            },
            policy,
        })
    }

    /// The validated configuration, with resolved durations.
    pub fn config(&self) -> &MatchCategoryConfig {
        &self.config
    }
}

/// `[cos θ, sin θ]` for a category and a position within it.
fn direction(category: i64, offset: f64) -> ([f32; 2], f64) {
    let theta = (category as f64 + offset) * PI;
    ([theta.cos() as f32, theta.sin() as f32], theta)
}

impl Task for DelayedMatchCategory {
    fn name(&self) -> &str {
        "delayed_match_category"
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
        let fixation = ctx.duration("fixation", &timing.fixation)?;
        let sample = ctx.duration("sample", &timing.sample)?;
        let first_delay = ctx.duration("first_delay", &timing.first_delay)?;
        let test = ctx.duration("test", &timing.test)?;
        let label = ctx.choose_int("ground_truth", &[MATCH as i64, NON_MATCH as i64])?;
        let sample_category = ctx.choose_int("sample_category", &[0, 1])?;
        if !(0..=1).contains(&sample_category) {
            return Err(ConfigError::InvalidParameter {
                reason: format!("sample_category {sample_category} is not 0 or 1"),
            });
        }
        let target = match label {
            1 => MATCH,
            2 => NON_MATCH,
            other => {
                return Err(ConfigError::InvalidParameter {
                    reason: format!("ground_truth {other} is not 1 or 2"),
                })
            }
        };
        let test_category = if target == NON_MATCH {
            1 - sample_category
        } else {
            sample_category
        };
        let (stim_sample, sample_theta) =
            direction(sample_category, ctx.uniform("sample_offset")?);
        let (stim_test, test_theta) = direction(test_category, ctx.uniform("test_offset")?);

        let timeline = ctx
            .timeline()?
            .periods(&[
                ("fixation", fixation),
                ("sample", sample),
                ("first_delay", first_delay),
                ("test", test),
            ])
            .build()?;
        let mut trial = ctx.trial(timeline);
        let fields = trial.fields_mut();
        fields.set("ground_truth", label);
        fields.set("sample_category", sample_category);
        fields.set("test_category", test_category);
        fields.set("sample_theta", sample_theta);
        fields.set("test_theta", test_theta);

        trial.add_value(1.0f32, Periods::All, "fixation")?;
        trial.add_value(stim_sample, "sample", "stimulus")?;
        trial.add_value(stim_test, "test", "stimulus")?;
        let std = noise_std(self.config.sigma, self.config.dt);
        trial.add_noise(ctx.rng(), 0.0, std, ["sample", "test"], ChannelSelector::All)?;
        trial.set_ground_truth(target, "test")?;
        Ok(trial)
    }

    fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision {
        self.policy.classify(view, action)
    }
}
