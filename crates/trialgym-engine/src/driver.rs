//! The step driver: one external step simulates one trial timestep.
//!
//! [`StepDriver`] owns a boxed [`Task`], the seeded [`TrialRng`] and the
//! current [`Trial`]. Per trial it runs a small state machine:
//!
//! - **Running**: each step shows the action to the task at timestep `t`.
//!   If the task ends the trial, or `t` is the timeline's last index
//!   (forced miss), the trial terminates. Otherwise `t` advances.
//! - **Terminating**: with the configured continuation probability (and
//!   only for eligible outcome kinds) the driver enters **Holding**, in
//!   which each step repeats the terminal observation and pays the miss
//!   reward. Otherwise, or once a hold draw fails, a new trial is built
//!   and `t` resets to 0 while the external step counter keeps counting.
//! - **Pending**: the replacement build failed. The terminated trial is
//!   never judged again; each later step retries the build first and
//!   returns the error, without advancing anything, until it succeeds.
//!
//! # Ownership model
//!
//! The driver is the only owner of the trial. Tasks see it through a
//! borrowed [`StepView`] for exactly one call, so no reference to a trial
//! can outlive its replacement.

use std::error::Error;
use std::fmt;

use rand::Rng;
use trialgym_core::{seeded_rng, ConfigError, StepId, TrialId, TrialRng};
use trialgym_epoch::{Trial, TrialFields};

use crate::config::DriverConfig;
use crate::policy::{Outcome, OutcomeKind};
use crate::stats::TrialStats;
use crate::task::{Spaces, StepView, Task, TrialContext};

// ── StepError ──────────────────────────────────────────────────────

/// Errors from [`StepDriver::step()`].
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// The action is outside the task's action space.
    InvalidAction {
        /// The submitted action.
        action: usize,
        /// Size of the action space.
        actions: usize,
    },
    /// Building the replacement trial failed.
    Trial(ConfigError),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAction { action, actions } => {
                write!(f, "action {action} outside action space of size {actions}")
            }
            Self::Trial(e) => write!(f, "trial construction failed: {e}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Trial(e) => Some(e),
            Self::InvalidAction { .. } => None,
        }
    }
}

impl From<ConfigError> for StepError {
    fn from(e: ConfigError) -> Self {
        Self::Trial(e)
    }
}

// ── StepResult ─────────────────────────────────────────────────────

/// Auxiliary information about one step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepInfo {
    /// A fresh trial was constructed after this step.
    pub new_trial: bool,
    /// The trial that was running ended at this step.
    pub trial_ended: bool,
    /// Whether this step was a held step after a terminated trial.
    pub held: bool,
    /// Ground-truth label for this step.
    pub ground_truth: usize,
    /// Classification of this step's action, if any.
    pub outcome: Option<Outcome>,
    /// External step counter, starting at 1 for the first step.
    pub step: StepId,
    /// The trial this step belonged to.
    pub trial: TrialId,
    /// Trial timestep this step simulated.
    pub t: usize,
}

/// Everything one step returns.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// Observation row for this step.
    pub observation: Vec<f32>,
    /// Reward for this step.
    pub reward: f32,
    /// Episodic boundary. Independent of trial boundaries.
    pub done: bool,
    /// Auxiliary information.
    pub info: StepInfo,
}

// ── StepDriver ─────────────────────────────────────────────────────

enum DriverState {
    Running,
    Holding { observation: Vec<f32> },
    Pending,
}

/// Single-threaded driver for one task instance.
///
/// Created from a task and a [`DriverConfig`] via
/// [`new()`](StepDriver::new), which builds the first trial eagerly.
///
/// # Example
///
/// ```ignore
/// let mut driver = StepDriver::new(Box::new(task), DriverConfig::seeded(42))?;
/// let mut obs = driver.observation().to_vec();
/// loop {
///     let result = driver.step(policy(&obs))?;
///     obs = result.observation;
/// }
/// ```
pub struct StepDriver {
    task: Box<dyn Task>,
    config: DriverConfig,
    rng: TrialRng,
    trial: Trial,
    t: usize,
    state: DriverState,
    step: StepId,
    stats: TrialStats,
}

impl StepDriver {
    /// Validate the configuration, seed the RNG and build the first trial.
    pub fn new(task: Box<dyn Task>, config: DriverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        task.spaces().validate()?;
        task.rewards().validate()?;
        let mut rng = seeded_rng(config.seed);
        let trial = build(task.as_ref(), &mut rng, TrialId(0), &TrialFields::new())?;
        Ok(Self {
            task,
            config,
            rng,
            trial,
            t: 0,
            state: DriverState::Running,
            step: StepId(0),
            stats: TrialStats::new(),
        })
    }

    /// Advance simulated time by one timestep.
    ///
    /// Returns the observation and ground-truth row for the timestep the
    /// action was judged at, the reward, the episodic `done` flag, and
    /// the step info.
    ///
    /// # Errors
    ///
    /// [`StepError::InvalidAction`] if `action` is outside the action
    /// space (nothing advances), or [`StepError::Trial`] if the task
    /// fails to build the next trial. After a build failure the step's
    /// outcome has been counted; later steps retry the build before
    /// judging their action.
    pub fn step(&mut self, action: usize) -> Result<StepResult, StepError> {
        let actions = self.task.spaces().actions;
        if action >= actions {
            return Err(StepError::InvalidAction { action, actions });
        }
        if matches!(self.state, DriverState::Pending) {
            self.replace_trial(&TrialFields::new())?;
        }
        self.step = StepId(self.step.0 + 1);
        let done = self
            .config
            .episode_steps
            .is_some_and(|n| self.step.0 % n == 0);

        if let DriverState::Holding { observation } = &self.state {
            let observation = observation.clone();
            let result = self.held_step(observation, done)?;
            return Ok(result);
        }

        let t = self.t;
        let trial_id = self.trial.id();
        let observation = self.trial.observation(t).to_vec();
        let ground_truth = self.trial.ground_truth(t);
        let decision = self
            .task
            .classify_step(&StepView::new(&self.trial, t), action);

        let mut reward = decision.reward();
        let mut outcome = decision.kind().map(|kind| Outcome {
            kind,
            reward,
            choice: decision.choice(),
            decision_t: t,
            ended_trial: decision.ends_trial(),
        });
        if !decision.ends_trial() && t + 1 >= self.trial.len() {
            reward = self.task.rewards().miss;
            outcome = Some(Outcome {
                kind: OutcomeKind::Miss,
                reward,
                choice: None,
                decision_t: t,
                ended_trial: true,
            });
        }
        self.stats.add_reward(reward);
        if let Some(o) = &outcome {
            self.stats.record(o);
        }

        let trial_ended = outcome.as_ref().is_some_and(|o| o.ended_trial);
        let mut new_trial = false;
        match outcome.as_ref().filter(|o| o.ended_trial) {
            Some(o) => {
                let hold = self.draw_hold(o.kind);
                tracing::debug!(
                    task = self.task.name(),
                    trial = %trial_id,
                    t,
                    outcome = ?o.kind,
                    reward = o.reward,
                    hold,
                    "trial ended"
                );
                if hold {
                    self.state = DriverState::Holding {
                        observation: observation.clone(),
                    };
                } else {
                    self.state = DriverState::Pending;
                    self.replace_trial(&TrialFields::new())?;
                    new_trial = true;
                }
            }
            None => self.t += 1,
        }
        tracing::trace!(step = %self.step, trial = %trial_id, t, action, reward, "step");

        Ok(StepResult {
            observation,
            reward,
            done,
            info: StepInfo {
                new_trial,
                trial_ended,
                held: false,
                ground_truth,
                outcome,
                step: self.step,
                trial: trial_id,
                t,
            },
        })
    }

    fn held_step(&mut self, observation: Vec<f32>, done: bool) -> Result<StepResult, StepError> {
        let trial_id = self.trial.id();
        let t = self.t;
        let reward = self.task.rewards().miss;
        self.stats.add_reward(reward);
        let keep = self.rng.random::<f64>() < self.config.hold.probability;
        if !keep {
            self.state = DriverState::Pending;
            self.replace_trial(&TrialFields::new())?;
        }
        tracing::trace!(step = %self.step, trial = %trial_id, keep, "held step");
        Ok(StepResult {
            observation,
            reward,
            done,
            info: StepInfo {
                new_trial: !keep,
                trial_ended: false,
                held: true,
                ground_truth: self.task.spaces().fixate,
                outcome: None,
                step: self.step,
                trial: trial_id,
                t,
            },
        })
    }

    fn draw_hold(&mut self, kind: OutcomeKind) -> bool {
        let hold = &self.config.hold;
        hold.applies_to(kind) && self.rng.random::<f64>() < hold.probability
    }

    fn replace_trial(&mut self, overrides: &TrialFields) -> Result<(), ConfigError> {
        let id = self.trial.id().next();
        match build(self.task.as_ref(), &mut self.rng, id, overrides) {
            Ok(trial) => self.trial = trial,
            Err(e) => {
                tracing::warn!(
                    task = self.task.name(),
                    trial = %id,
                    error = %e,
                    "trial construction failed"
                );
                return Err(e);
            }
        }
        self.t = 0;
        self.state = DriverState::Running;
        Ok(())
    }

    /// Discard the current trial and build a new one with forced fields.
    ///
    /// The new trial starts at `t = 0`. Fields not in `overrides` are
    /// drawn as usual.
    pub fn new_trial_with(&mut self, overrides: TrialFields) -> Result<(), ConfigError> {
        self.replace_trial(&overrides)
    }

    /// Reseed and start over: counters cleared, first trial rebuilt.
    ///
    /// Returns the first observation row of the new trial.
    pub fn reset(&mut self, seed: u64) -> Result<&[f32], ConfigError> {
        self.rng = seeded_rng(seed);
        self.config.seed = seed;
        self.trial = build(self.task.as_ref(), &mut self.rng, TrialId(0), &TrialFields::new())?;
        self.t = 0;
        self.state = DriverState::Running;
        self.step = StepId(0);
        self.stats = TrialStats::new();
        Ok(self.trial.observation(0))
    }

    /// The observation the next step will return.
    ///
    /// While a replacement build is pending this is the terminated
    /// trial's last row.
    pub fn observation(&self) -> &[f32] {
        match &self.state {
            DriverState::Running | DriverState::Pending => self.trial.observation(self.t),
            DriverState::Holding { observation } => observation,
        }
    }

    /// The current trial.
    pub fn trial(&self) -> &Trial {
        &self.trial
    }

    /// Timestep the next step will simulate.
    pub fn t(&self) -> usize {
        self.t
    }

    /// Whether the driver is holding a terminated trial's observation.
    pub fn is_holding(&self) -> bool {
        matches!(self.state, DriverState::Holding { .. })
    }

    /// Whether the last replacement build failed and will be retried.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, DriverState::Pending)
    }

    /// Steps taken since construction or the last reset.
    pub fn step_count(&self) -> StepId {
        self.step
    }

    /// Observation and action spaces.
    pub fn spaces(&self) -> &Spaces {
        self.task.spaces()
    }

    /// The task's name.
    pub fn task_name(&self) -> &str {
        self.task.name()
    }

    /// Running performance counters.
    pub fn stats(&self) -> &TrialStats {
        &self.stats
    }

    /// The driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }
}

impl fmt::Debug for StepDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDriver")
            .field("task", &self.task.name())
            .field("trial", &self.trial.id())
            .field("t", &self.t)
            .field("step", &self.step)
            .field("holding", &self.is_holding())
            .field("pending", &self.is_pending())
            .finish()
    }
}

fn build(
    task: &dyn Task,
    rng: &mut TrialRng,
    id: TrialId,
    overrides: &TrialFields,
) -> Result<Trial, ConfigError> {
    let spaces = task.spaces();
    let mut ctx = TrialContext::new(rng, task.dt(), id, spaces, overrides);
    let trial = task.build_trial(&mut ctx)?;
    if trial.width() != spaces.observation_width() {
        return Err(ConfigError::WidthMismatch {
            expected: spaces.observation_width(),
            actual: trial.width(),
        });
    }
    tracing::debug!(
        task = task.name(),
        trial = %id,
        len = trial.len(),
        duration = trial.timeline().total_duration(),
        "trial constructed"
    );
    Ok(trial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HoldConfig, RewardConfig};
    use crate::policy::{Decision, ResponsePolicy};
    use trialgym_epoch::ObservationLayout;

    /// fixation (3 steps) then decision (2 steps); target is action 1.
    struct Fixed {
        spaces: Spaces,
        policy: ResponsePolicy,
    }

    impl Fixed {
        fn new() -> Self {
            let rewards = RewardConfig {
                abort: -1.0,
                correct: 1.0,
                fail: -0.5,
                miss: -0.25,
            };
            Self {
                spaces: Spaces {
                    layout: ObservationLayout::new().group("fixation", 1).group("cue", 1),
                    actions: 3,
                    fixate: 0,
                },
                policy: ResponsePolicy::new(0, rewards)
                    .abort_during(&["fixation"])
                    .decide_during(&["decision"])
                    .abort_ends_trial(true),
            }
        }
    }

    impl Task for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn dt(&self) -> f64 {
            10.0
        }
        fn spaces(&self) -> &Spaces {
            &self.spaces
        }
        fn rewards(&self) -> &RewardConfig {
            &self.policy.rewards
        }
        fn build_trial(&self, ctx: &mut TrialContext<'_>) -> Result<Trial, ConfigError> {
            let tl = ctx
                .timeline()?
                .periods(&[("fixation", 30.0), ("decision", 20.0)])
                .build()?;
            let mut trial = ctx.trial(tl);
            trial.add_value(1.0f32, "fixation", "fixation")?;
            trial.add_value(ctx.id().0 as f32, trialgym_epoch::Periods::All, "cue")?;
            trial.set_ground_truth(1, "decision")?;
            Ok(trial)
        }
        fn classify_step(&self, view: &StepView<'_>, action: usize) -> Decision {
            self.policy.classify(view, action)
        }
    }

    fn driver(config: DriverConfig) -> StepDriver {
        StepDriver::new(Box::new(Fixed::new()), config).unwrap()
    }

    #[test]
    fn first_trial_is_built_eagerly() {
        let d = driver(DriverConfig::default());
        assert_eq!(d.trial().id(), TrialId(0));
        assert_eq!(d.trial().len(), 5);
        assert_eq!(d.observation(), &[1.0, 0.0]);
        assert_eq!(d.step_count(), StepId(0));
    }

    #[test]
    fn correct_response_starts_new_trial() {
        let mut d = driver(DriverConfig::default());
        for t in 0..3 {
            let r = d.step(0).unwrap();
            assert_eq!(r.info.t, t);
            assert_eq!(r.reward, 0.0);
            assert!(!r.info.new_trial);
        }
        let r = d.step(1).unwrap();
        assert_eq!(r.reward, 1.0);
        assert!(r.info.new_trial);
        assert!(r.info.trial_ended);
        assert_eq!(r.info.ground_truth, 1);
        assert_eq!(r.info.outcome.as_ref().map(|o| o.kind), Some(OutcomeKind::Correct));
        assert_eq!(d.trial().id(), TrialId(1));
        assert_eq!(d.t(), 0);
        assert_eq!(d.observation(), &[1.0, 1.0]);
    }

    #[test]
    fn abort_ends_trial_with_penalty() {
        let mut d = driver(DriverConfig::default());
        let r = d.step(2).unwrap();
        assert_eq!(r.reward, -1.0);
        assert!(r.info.new_trial);
        assert_eq!(r.info.outcome.unwrap().kind, OutcomeKind::Abort);
        assert_eq!(d.stats().aborted, 1);
    }

    #[test]
    fn last_step_of_decision_still_counts() {
        let mut d = driver(DriverConfig::default());
        for _ in 0..4 {
            d.step(0).unwrap();
        }
        let r = d.step(2).unwrap();
        assert_eq!(r.info.t, 4);
        assert_eq!(r.info.outcome.unwrap().kind, OutcomeKind::Incorrect);
        assert_eq!(r.reward, -0.5);
    }

    #[test]
    fn fixating_to_the_end_is_a_miss() {
        let mut d = driver(DriverConfig::default());
        let rewards: Vec<f32> = (0..5).map(|_| d.step(0).unwrap().reward).collect();
        assert_eq!(rewards, vec![0.0, 0.0, 0.0, 0.0, -0.25]);
        assert_eq!(d.stats().missed, 1);
        assert_eq!(d.trial().id(), TrialId(1));
    }

    #[test]
    fn invalid_action_does_not_advance() {
        let mut d = driver(DriverConfig::default());
        assert_eq!(
            d.step(3),
            Err(StepError::InvalidAction {
                action: 3,
                actions: 3
            })
        );
        assert_eq!(d.step_count(), StepId(0));
        assert_eq!(d.t(), 0);
    }

    #[test]
    fn episode_steps_sets_done() {
        let mut d = driver(DriverConfig {
            episode_steps: Some(3),
            ..DriverConfig::default()
        });
        let done: Vec<bool> = (0..6).map(|_| d.step(0).unwrap().done).collect();
        assert_eq!(done, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn hold_repeats_terminal_observation() {
        let mut d = driver(DriverConfig {
            seed: 1,
            hold: HoldConfig::with_probability(0.9),
            episode_steps: None,
        });
        let first = d.step(2).unwrap();
        assert!(first.info.trial_ended);
        // Keep stepping until the driver leaves the hold state.
        let mut held = 0;
        let mut last_new_trial = !d.is_holding();
        while d.is_holding() {
            let r = d.step(0).unwrap();
            assert!(r.info.held);
            assert_eq!(r.observation, first.observation);
            assert_eq!(r.reward, -0.25);
            last_new_trial = r.info.new_trial;
            held += 1;
            assert!(held < 10_000);
        }
        assert!(last_new_trial);
        assert_eq!(d.trial().id(), TrialId(1));
    }

    #[test]
    fn new_trial_with_replaces_current_trial() {
        let mut d = driver(DriverConfig::default());
        d.step(0).unwrap();
        d.new_trial_with(TrialFields::new()).unwrap();
        assert_eq!(d.t(), 0);
        assert_eq!(d.trial().id(), TrialId(1));
    }

    #[test]
    fn reset_restarts_counters() {
        let mut d = driver(DriverConfig::default());
        d.step(2).unwrap();
        let obs = d.reset(9).unwrap().to_vec();
        assert_eq!(obs, vec![1.0, 0.0]);
        assert_eq!(d.step_count(), StepId(0));
        assert_eq!(d.trial().id(), TrialId(0));
        assert_eq!(d.stats(), &TrialStats::new());
        assert_eq!(d.config().seed, 9);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = StepDriver::new(
            Box::new(Fixed::new()),
            DriverConfig {
                hold: HoldConfig::with_probability(1.5),
                ..DriverConfig::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProbability { .. }));
    }
}
