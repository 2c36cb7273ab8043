//! N-alternative perceptual decision making.
//!
//! Generalises the two-alternative task to `n` stimulus channels, one of
//! which carries more evidence than the rest. Responding during fixation
//! is penalised but, by default, does not end the trial.
//!
//! Channels: `fixation` then `n` stimulus channels. Actions: fixate, or
//! choose stimulus `1..=n`.

use smallvec::SmallVec;
use trialgym_core::{ConfigError, DurationSpec};
use trialgym_engine::{
    Decision, ResponsePolicy, RewardConfig, Spaces, StepView, Task, TrialContext,
};
use trialgym_epoch::{ChannelSelector, ObservationLayout, Trial};

use crate::{check_sigma, noise_std, scale, COHERENCES};

/// Period durations, in the same unit as `dt`.
#[derive(Clone, Debug, PartialEq)]
pub struct NAlternativeTiming {
    /// Default: 500.
    pub fixation: DurationSpec,
    /// Default: truncated exponential, mean 330, bounds `[80, 1500]`.
    pub stimulus: DurationSpec,
    /// Default: 500.
    pub decision: DurationSpec,
}

impl Default for NAlternativeTiming {
    fn default() -> Self {
        Self {
            fixation: DurationSpec::constant(500.0),
            stimulus: DurationSpec::truncated_exponential(330.0, 80.0, 1500.0),
            decision: DurationSpec::constant(500.0),
        }
    }
}

/// Configuration for [`NAlternativeChoice`].
#[derive(Clone, Debug, PartialEq)]
pub struct NAlternativeConfig {
    /// Timestep size. Default: 100.
    pub dt: f64,
    /// Number of alternatives, at least 2. Default: 3.
    pub choices: usize,
    /// Multiplies every coherence level. Default: 1.
    pub stim_scale: f64,
    /// Noise scale; per-timestep std is `sigma / sqrt(dt)`. Default: 1.5.
    pub sigma: f64,
    /// Period durations.
    pub timing: NAlternativeTiming,
    /// Default: abort -0.1, correct 1, fail 0, miss 0.
    pub rewards: RewardConfig,
    /// Whether responding during fixation ends the trial. Default: false.
    pub abort_ends_trial: bool,
}

impl Default for NAlternativeConfig {
    fn default() -> Self {
        Self {
            dt: 100.0,
            choices: 3,
            stim_scale: 1.0,
            sigma: 1.5,
            timing: NAlternativeTiming::default(),
            rewards: RewardConfig::default(),
            abort_ends_trial: false,
        }
    }
}

/// N-alternative forced choice task.
#[derive(Debug)]
pub struct NAlternativeChoice {
    config: NAlternativeConfig,
    cohs: SmallVec<[f64; 8]>,
    labels: SmallVec<[i64; 8]>,
    spaces: Spaces,
    policy: ResponsePolicy,
}

impl NAlternativeChoice {
    /// Validate `config` and resolve its durations at `config.dt`.
    pub fn new(config: NAlternativeConfig) -> Result<Self, ConfigError> {
        let dt = config.dt;
        let timing = NAlternativeTiming {
            fixation: config.timing.fixation.resolve(dt)?,
            stimulus: config.timing.stimulus.resolve(dt)?,
            decision: config.timing.decision.resolve(dt)?,
        };
        config.rewards.validate()?;
        check_sigma(config.sigma)?;
        if config.choices < 2 {
            return Err(ConfigError::InvalidParameter {
                reason: format!("need at least 2 choices, got {}", config.choices),
            });
        }
        if !config.stim_scale.is_finite() {
            return Err(ConfigError::InvalidParameter {
                reason: format!("stim_scale {} is not finite", config.stim_scale),
            });
        }
        let n = config.choices;
        let policy = ResponsePolicy::new(0, config.rewards.clone())
            .abort_during(&["fixation"])
            .decide_during(&["decision"])
            .abort_ends_trial(config.abort_ends_trial);
        tracing::debug!(dt, choices = n, "n-alternative task configured");
        Ok(Self {
            cohs: COHERENCES.iter().map(|c| c * config.stim_scale).collect(),
            labels: (1..=n as i64).collect(),
            spaces: Spaces {
                layout: ObservationLayout::new()
                    .group("fixation", 1)
                    .group("stimulus", n),
                actions: n + 1,
                fixate: 0,
            },
            policy,
            config: NAlternativeConfig { timing, ..config },
        })
    }

    /// The validated configuration, with resolved durations.
    pub fn config(&self) -> &NAlternativeConfig {
        &self.config
    }
}

impl Task for NAlternativeChoice {
    fn name(&self) -> &str {
        "n_alternative_choice"
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
        let stimulus = ctx.duration("stimulus", &timing.stimulus)?;
        let decision = ctx.duration("decision", &timing.decision)?;
        let label = ctx.choose_int("ground_truth", &self.labels)?;
        let coh = ctx.choose_float("coh", &self.cohs)?;
        let n = self.config.choices;
        let target = usize::try_from(label)
            .ok()
            .filter(|l| (1..=n).contains(l))
            .ok_or_else(|| ConfigError::InvalidParameter {
                reason: format!("ground_truth {label} outside 1..={n}"),
            })?;

        let timeline = ctx
            .timeline()?
            .periods(&[
                ("fixation", fixation),
                ("stimulus", stimulus),
                ("decision", decision),
            ])
            .build()?;
        let mut trial = ctx.trial(timeline);
        let fields = trial.fields_mut();
        fields.set("fixation", fixation);
        fields.set("stimulus", stimulus);
        fields.set("decision", decision);
        fields.set("ground_truth", label);
        fields.set("coh", coh);

        let mut stim = vec![scale(-coh); n];
        stim[target - 1] = scale(coh);
        trial.add_value(1.0f32, "fixation", "fixation")?;
        trial.add_value(stim, "stimulus", "stimulus")?;
        let std = noise_std(self.config.sigma, self.config.dt);
        trial.add_noise(ctx.rng(), 0.0, std, "stimulus", ChannelSelector::All)?;
        trial.set_ground_truth(target, "decision")?;
        Ok(trial)
    }

    fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision {
        self.policy.classify(view, action)
    }
}
