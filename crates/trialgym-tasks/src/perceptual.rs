//! Two-alternative perceptual decision making (random-dot motion).
//!
//! After a fixation period, two noisy stimulus channels show evidence for
//! left and right. The stronger side depends on the trial's `left_right`
//! field and the gap between the channels on its coherence. The agent
//! must keep fixating through the stimulus and report the stronger side
//! during the decision period. Any earlier response aborts the trial.
//!
//! Channels: `[fixation, left, right]`. Actions: `{fixate, left, right}`.

use smallvec::SmallVec;
use trialgym_core::{ConfigError, DurationSpec};
use trialgym_engine::{
    Decision, ResponsePolicy, RewardConfig, Spaces, StepView, Task, TrialContext,
};
use trialgym_epoch::{ObservationLayout, Trial};

use crate::{check_coherences, check_sigma, noise_std, scale, COHERENCES};

/// Choose the left stimulus.
pub const LEFT: usize = 1;
/// Choose the right stimulus.
pub const RIGHT: usize = 2;

/// Period durations, in the same unit as `dt`.
#[derive(Clone, Debug, PartialEq)]
pub struct PerceptualTiming {
    /// Default: 750.
    pub fixation: DurationSpec,
    /// Default: truncated exponential, mean 330, bounds `[80, 1500]`.
    pub stimulus: DurationSpec,
    /// Default: 500.
    pub decision: DurationSpec,
}

impl Default for PerceptualTiming {
    fn default() -> Self {
        Self {
            fixation: DurationSpec::constant(750.0),
            stimulus: DurationSpec::truncated_exponential(330.0, 80.0, 1500.0),
            decision: DurationSpec::constant(500.0),
        }
    }
}

impl PerceptualTiming {
    fn resolve(&self, dt: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            fixation: self.fixation.resolve(dt)?,
            stimulus: self.stimulus.resolve(dt)?,
            decision: self.decision.resolve(dt)?,
        })
    }
}

/// Configuration for [`PerceptualDecisionMaking`].
#[derive(Clone, Debug, PartialEq)]
pub struct PerceptualConfig {
    /// Timestep size. Default: 100.
    pub dt: f64,
    /// Period durations.
    pub timing: PerceptualTiming,
    /// Default: abort -1, correct 1, fail 0, miss 0.
    pub rewards: RewardConfig,
    /// Coherence levels to draw from. Default: [`COHERENCES`].
    pub cohs: SmallVec<[f64; 8]>,
    /// Noise scale; per-timestep std is `sigma / sqrt(dt)`.
    /// Default: `sqrt(2)`.
    pub sigma: f64,
    /// Whether responding before the decision period ends the trial.
    /// Default: true.
    pub abort_ends_trial: bool,
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self {
            dt: 100.0,
            timing: PerceptualTiming::default(),
            rewards: RewardConfig {
                abort: -1.0,
                correct: 1.0,
                fail: 0.0,
                miss: 0.0,
            },
            cohs: SmallVec::from_slice(&COHERENCES),
            sigma: std::f64::consts::SQRT_2,
            abort_ends_trial: true,
        }
    }
}

/// Two-alternative perceptual decision task.
#[derive(Debug)]
pub struct PerceptualDecisionMaking {
    config: PerceptualConfig,
    spaces: Spaces,
    policy: ResponsePolicy,
}

impl PerceptualDecisionMaking {
    /// Validate `config` and resolve its durations at `config.dt`.
    pub fn new(config: PerceptualConfig) -> Result<Self, ConfigError> {
        let timing = config.timing.resolve(config.dt)?;
        config.rewards.validate()?;
        check_coherences(&config.cohs)?;
        check_sigma(config.sigma)?;
        let policy = ResponsePolicy::new(0, config.rewards.clone())
            .abort_during(&["fixation", "stimulus"])
            .decide_during(&["decision"])
            .abort_ends_trial(config.abort_ends_trial);
        tracing::debug!(dt = config.dt, "perceptual decision task configured");
        Ok(Self {
            config: PerceptualConfig { timing, ..config },
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
    pub fn config(&self) -> &PerceptualConfig {
        &self.config
    }
}

impl Task for PerceptualDecisionMaking {
    fn name(&self) -> &str {
        "perceptual_decision_making"
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
        let left_right = ctx.choose_int("left_right", &[-1, 1])?;
        let coh = ctx.choose_float("coh", &self.config.cohs)?;

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
        fields.set("left_right", left_right);
        fields.set("coh", coh);

        let (high, low) = (scale(coh), scale(-coh));
        let (stim, target) = if left_right < 0 {
            ([high, low], LEFT)
        } else {
            ([low, high], RIGHT)
        };
        trial.add_value(1.0f32, ["fixation", "stimulus"], "fixation")?;
        trial.add_value(stim, "stimulus", "stimulus")?;
        let std = noise_std(self.config.sigma, self.config.dt);
        trial.add_noise(ctx.rng(), 0.0, std, "stimulus", "stimulus")?;
        trial.set_ground_truth(target, "decision")?;
        Ok(trial)
    }

    fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision {
        self.policy.classify(view, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialgym_core::{seeded_rng, TrialId};
    use trialgym_engine::OutcomeKind;
    use trialgym_epoch::TrialFields;

    fn build(task: &PerceptualDecisionMaking, overrides: &TrialFields, seed: u64) -> Trial {
        let mut rng = seeded_rng(seed);
        let mut ctx = TrialContext::new(&mut rng, task.dt(), TrialId(0), task.spaces(), overrides);
        task.build_trial(&mut ctx).unwrap()
    }

    fn task() -> PerceptualDecisionMaking {
        PerceptualDecisionMaking::new(PerceptualConfig::default()).unwrap()
    }

    #[test]
    fn stimulus_minimum_is_raised_to_dt() {
        let t = task();
        assert_eq!(
            t.config().timing.stimulus,
            DurationSpec::truncated_exponential(330.0, 100.0, 1500.0)
        );
    }

    #[test]
    fn period_boundaries_follow_durations() {
        let overrides = TrialFields::new().with("stimulus", 330.0).with("left_right", 1);
        let tr = build(&task(), &overrides, 0);
        let tl = tr.timeline();
        assert_eq!(tl.get("fixation").unwrap().range(), 0..8);
        assert_eq!(tl.get("stimulus").unwrap().range(), 8..11);
        assert_eq!(tl.get("decision").unwrap().range(), 11..16);
        assert_eq!(tr.len(), 16);
    }

    #[test]
    fn ground_truth_points_at_stronger_side() {
        let left = TrialFields::new().with("left_right", -1);
        let tr = build(&task(), &left, 1);
        let d = tr.timeline().get("decision").unwrap().range();
        assert!(d.clone().all(|t| tr.ground_truth(t) == LEFT));
        assert!((0..d.start).all(|t| tr.ground_truth(t) == 0));

        let right = TrialFields::new().with("left_right", 1);
        let tr = build(&task(), &right, 1);
        let d = tr.timeline().get("decision").unwrap().range();
        assert!(d.clone().all(|t| tr.ground_truth(t) == RIGHT));
    }

    #[test]
    fn noiseless_observation_matches_coherence() {
        let config = PerceptualConfig {
            sigma: 0.0,
            ..PerceptualConfig::default()
        };
        let task = PerceptualDecisionMaking::new(config).unwrap();
        let overrides = TrialFields::new()
            .with("left_right", 1)
            .with("coh", 51.2)
            .with("stimulus", 300.0);
        let tr = build(&task, &overrides, 2);
        assert_eq!(tr.observation(0), &[1.0, 0.0, 0.0]);
        let s = tr.timeline().get("stimulus").unwrap().start;
        let row = tr.observation(s);
        assert_eq!(row[0], 1.0);
        assert!((row[1] - 0.244).abs() < 1e-6);
        assert!((row[2] - 0.756).abs() < 1e-6);
        let d = tr.timeline().get("decision").unwrap().start;
        assert_eq!(tr.observation(d), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn responding_before_decision_aborts() {
        let task = task();
        let tr = build(&task, &TrialFields::new(), 3);
        let s = tr.timeline().get("stimulus").unwrap().start;
        for t in [0, s] {
            let d = task.classify_step(&StepView::new(&tr, t), LEFT);
            assert_eq!(d.kind(), Some(OutcomeKind::Abort));
            assert_eq!(d.reward(), -1.0);
            assert!(d.ends_trial());
        }
    }

    #[test]
    fn abort_can_be_made_non_terminating() {
        let task = PerceptualDecisionMaking::new(PerceptualConfig {
            abort_ends_trial: false,
            ..PerceptualConfig::default()
        })
        .unwrap();
        let tr = build(&task, &TrialFields::new(), 3);
        let d = task.classify_step(&StepView::new(&tr, 0), RIGHT);
        assert_eq!(d.kind(), Some(OutcomeKind::Abort));
        assert!(!d.ends_trial());
    }

    #[test]
    fn fields_record_drawn_conditions() {
        let tr = build(&task(), &TrialFields::new(), 4);
        let f = tr.fields();
        assert!([-1, 1].contains(&f.int("left_right").unwrap()));
        assert!(COHERENCES.contains(&f.float("coh").unwrap()));
        let stim = f.float("stimulus").unwrap();
        assert!((100.0..=1500.0).contains(&stim));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad_dt = PerceptualConfig {
            dt: 0.0,
            ..PerceptualConfig::default()
        };
        assert!(matches!(
            PerceptualDecisionMaking::new(bad_dt),
            Err(ConfigError::NonPositiveDt { .. })
        ));
        let no_cohs = PerceptualConfig {
            cohs: SmallVec::new(),
            ..PerceptualConfig::default()
        };
        assert!(PerceptualDecisionMaking::new(no_cohs).is_err());
    }
}
