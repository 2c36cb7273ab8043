//! Reusable task fixtures.
//!
//! - [`ScriptedTask`]: fixation then decision with fixed durations, a
//!   constant target, and a per-trial cue channel carrying the trial ID.
//! - [`FailingTask`]: builds a fixed number of trials, then fails,
//!   optionally recovering after a number of refused builds.

use std::sync::atomic::{AtomicUsize, Ordering};

use trialgym_core::ConfigError;
use trialgym_engine::{
    Decision, ResponsePolicy, RewardConfig, Spaces, StepView, Task, TrialContext,
};
use trialgym_epoch::{ObservationLayout, Periods, Trial};

/// Fixation followed by a decision period.
///
/// Layout is `fixation` (1 channel) then `cue` (1 channel). The cue holds
/// the trial ID on every timestep so tests can tell trials apart. The
/// target is `target` throughout the decision period. Action 0 fixates.
pub struct ScriptedTask {
    pub dt: f64,
    pub fixation: f64,
    pub decision: f64,
    pub target: usize,
    spaces: Spaces,
    policy: ResponsePolicy,
}

impl ScriptedTask {
    /// `fixation` and `decision` are physical durations at `dt`.
    pub fn new(dt: f64, fixation: f64, decision: f64, actions: usize, target: usize) -> Self {
        let rewards = RewardConfig {
            abort: -0.1,
            correct: 1.0,
            fail: -1.0,
            miss: -0.5,
        };
        Self {
            dt,
            fixation,
            decision,
            target,
            spaces: Spaces {
                layout: ObservationLayout::new().group("fixation", 1).group("cue", 1),
                actions,
                fixate: 0,
            },
            policy: ResponsePolicy::new(0, rewards)
                .abort_during(&["fixation"])
                .decide_during(&["decision"])
                .abort_ends_trial(true),
        }
    }

    /// Five fixation steps, three decision steps, three actions, target 1.
    pub fn standard() -> Self {
        Self::new(10.0, 50.0, 30.0, 3, 1)
    }

    /// Replace the reward table.
    pub fn with_rewards(mut self, rewards: RewardConfig) -> Self {
        self.policy.rewards = rewards;
        self
    }

    /// Whether aborts end the trial.
    pub fn abort_ends_trial(mut self, ends: bool) -> Self {
        self.policy.abort_ends_trial = ends;
        self
    }
}

impl Task for ScriptedTask {
    fn name(&self) -> &str {
        "scripted"
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn spaces(&self) -> &Spaces {
        &self.spaces
    }

    fn rewards(&self) -> &RewardConfig {
        &self.policy.rewards
    }

    fn build_trial(&self, ctx: &mut TrialContext<'_>) -> Result<Trial, ConfigError> {
        let timeline = ctx
            .timeline()?
            .period("fixation", self.fixation)
            .period("decision", self.decision)
            .build()?;
        let mut trial = ctx.trial(timeline);
        trial.add_value(1.0f32, "fixation", "fixation")?;
        trial.add_value(ctx.id().0 as f32, Periods::All, "cue")?;
        trial.set_ground_truth(self.target, "decision")?;
        Ok(trial)
    }

    fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision {
        self.policy.classify(view, action)
    }
}

/// Wraps a [`ScriptedTask`] and fails trial construction after
/// `succeed_count` successful builds.
pub struct FailingTask {
    inner: ScriptedTask,
    succeed_count: usize,
    failures: usize,
    builds: AtomicUsize,
}

impl FailingTask {
    pub fn new(succeed_count: usize) -> Self {
        Self::flaky(succeed_count, usize::MAX)
    }

    /// Refuse `failures` builds after the first `succeed_count`, then
    /// build normally again.
    pub fn flaky(succeed_count: usize, failures: usize) -> Self {
        Self {
            inner: ScriptedTask::standard(),
            succeed_count,
            failures,
            builds: AtomicUsize::new(0),
        }
    }

    /// Number of `build_trial` calls so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl Task for FailingTask {
    fn name(&self) -> &str {
        "failing"
    }

    fn dt(&self) -> f64 {
        self.inner.dt()
    }

    fn spaces(&self) -> &Spaces {
        self.inner.spaces()
    }

    fn rewards(&self) -> &RewardConfig {
        self.inner.rewards()
    }

    fn build_trial(&self, ctx: &mut TrialContext<'_>) -> Result<Trial, ConfigError> {
        let n = self.builds.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count && n - self.succeed_count < self.failures {
            return Err(ConfigError::InvalidParameter {
                reason: format!("trial {} refused after {n} builds", ctx.id()),
            });
        }
        self.inner.build_trial(ctx)
    }

    fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision {
        self.inner.classify_step(view, action)
    }
}
