//! Per-step decisions, trial outcomes, and the shared response policy.
//!
//! Tasks return a [`Decision`] from
//! [`classify_step`](crate::Task::classify_step). Outcome classification
//! (abort, correct, incorrect, miss) is never an error; it travels to the
//! caller through the reward and the step info only.

use smallvec::SmallVec;

use crate::config::RewardConfig;
use crate::task::StepView;

/// Classification of a judged action or of a trial's end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Premature non-fixate action.
    Abort,
    /// Response matched the ground truth.
    Correct,
    /// Response did not match the ground truth.
    Incorrect,
    /// No response before the trial's last timestep.
    Miss,
}

impl OutcomeKind {
    /// All four kinds.
    pub const ALL: [OutcomeKind; 4] = [
        OutcomeKind::Abort,
        OutcomeKind::Correct,
        OutcomeKind::Incorrect,
        OutcomeKind::Miss,
    ];
}

/// A task's verdict on one action at one timestep.
///
/// Constructed only through the named constructors, which guarantees
/// that a decision ending the trial always carries a classification.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    reward: f32,
    kind: Option<OutcomeKind>,
    ends_trial: bool,
    choice: Option<usize>,
}

impl Decision {
    /// Nothing happened; the trial continues with zero reward.
    pub fn pending() -> Self {
        Self {
            reward: 0.0,
            kind: None,
            ends_trial: false,
            choice: None,
        }
    }

    /// Premature response. Ends the trial only if `ends_trial`.
    pub fn abort(reward: f32, ends_trial: bool) -> Self {
        Self {
            reward,
            kind: Some(OutcomeKind::Abort),
            ends_trial,
            choice: None,
        }
    }

    /// Correct response; ends the trial.
    pub fn correct(reward: f32, choice: usize) -> Self {
        Self {
            reward,
            kind: Some(OutcomeKind::Correct),
            ends_trial: true,
            choice: Some(choice),
        }
    }

    /// Wrong response; ends the trial.
    pub fn incorrect(reward: f32, choice: usize) -> Self {
        Self {
            reward,
            kind: Some(OutcomeKind::Incorrect),
            ends_trial: true,
            choice: Some(choice),
        }
    }

    /// Reward for this step.
    pub fn reward(&self) -> f32 {
        self.reward
    }

    /// Classification, if the action was judged.
    pub fn kind(&self) -> Option<OutcomeKind> {
        self.kind
    }

    /// Whether this decision ends the trial.
    pub fn ends_trial(&self) -> bool {
        self.ends_trial
    }

    /// The response action, for correct/incorrect decisions.
    pub fn choice(&self) -> Option<usize> {
        self.choice
    }
}

/// Record of a classified step, reported in the step info.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Classification.
    pub kind: OutcomeKind,
    /// Reward paid for this step.
    pub reward: f32,
    /// The response action, if any.
    pub choice: Option<usize>,
    /// Trial timestep at which the classification happened.
    pub decision_t: usize,
    /// Whether the trial ended here.
    pub ended_trial: bool,
}

/// The universal fixate-then-respond rules, shared by most tasks.
///
/// - Fixating is always neutral.
/// - A non-fixate action during any abort period is an abort, paying
///   `rewards.abort`; it ends the trial only if `abort_ends_trial`.
/// - A non-fixate action during any decision period ends the trial,
///   paying `rewards.correct` if it equals the ground truth at that
///   timestep, else `rewards.fail`.
/// - A non-fixate action anywhere else is ignored.
///
/// Running out of time is handled by the driver, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponsePolicy {
    /// The fixate action.
    pub fixate: usize,
    /// Periods in which responding aborts.
    pub abort_periods: SmallVec<[String; 4]>,
    /// Periods in which responding is judged.
    pub decision_periods: SmallVec<[String; 2]>,
    /// Whether an abort ends the trial.
    pub abort_ends_trial: bool,
    /// Reward values.
    pub rewards: RewardConfig,
}

impl ResponsePolicy {
    /// A policy with no abort or decision periods yet.
    pub fn new(fixate: usize, rewards: RewardConfig) -> Self {
        Self {
            fixate,
            abort_periods: SmallVec::new(),
            decision_periods: SmallVec::new(),
            abort_ends_trial: false,
            rewards,
        }
    }

    /// Responding during these periods aborts.
    pub fn abort_during(mut self, periods: &[&str]) -> Self {
        self.abort_periods = periods.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Responding during these periods is judged against ground truth.
    pub fn decide_during(mut self, periods: &[&str]) -> Self {
        self.decision_periods = periods.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Whether aborts end the trial.
    pub fn abort_ends_trial(mut self, ends: bool) -> Self {
        self.abort_ends_trial = ends;
        self
    }

    /// Judge `action` at the view's timestep.
    pub fn classify(&self, view: &StepView<'_>, action: usize) -> Decision {
        if action == self.fixate {
            return Decision::pending();
        }
        if self.abort_periods.iter().any(|p| view.in_period(p)) {
            return Decision::abort(self.rewards.abort, self.abort_ends_trial);
        }
        if self.decision_periods.iter().any(|p| view.in_period(p)) {
            return if action == view.ground_truth() {
                Decision::correct(self.rewards.correct, action)
            } else {
                Decision::incorrect(self.rewards.fail, action)
            };
        }
        Decision::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialgym_core::TrialId;
    use trialgym_epoch::{ObservationLayout, TimelineBuilder, Trial};

    fn trial() -> Trial {
        let tl = TimelineBuilder::new(100.0)
            .unwrap()
            .periods(&[("fixation", 200.0), ("delay", 100.0), ("decision", 200.0)])
            .build()
            .unwrap();
        let layout = ObservationLayout::new().group("fixation", 1).group("stimulus", 2);
        let mut tr = Trial::new(TrialId(0), tl, &layout, 0);
        tr.set_ground_truth(2, "decision").unwrap();
        tr
    }

    fn policy() -> ResponsePolicy {
        ResponsePolicy::new(0, RewardConfig::default())
            .abort_during(&["fixation"])
            .decide_during(&["decision"])
            .abort_ends_trial(true)
    }

    #[test]
    fn fixating_is_neutral_everywhere() {
        let tr = trial();
        for t in 0..tr.len() {
            let d = policy().classify(&StepView::new(&tr, t), 0);
            assert_eq!(d, Decision::pending());
        }
    }

    #[test]
    fn responding_during_fixation_aborts() {
        let tr = trial();
        let d = policy().classify(&StepView::new(&tr, 1), 1);
        assert_eq!(d.kind(), Some(OutcomeKind::Abort));
        assert_eq!(d.reward(), -0.1);
        assert!(d.ends_trial());
    }

    #[test]
    fn non_terminating_abort_keeps_trial() {
        let tr = trial();
        let d = policy()
            .abort_ends_trial(false)
            .classify(&StepView::new(&tr, 0), 2);
        assert_eq!(d.kind(), Some(OutcomeKind::Abort));
        assert!(!d.ends_trial());
    }

    #[test]
    fn responding_in_unlisted_period_is_ignored() {
        let tr = trial();
        let d = policy().classify(&StepView::new(&tr, 2), 1);
        assert_eq!(d, Decision::pending());
    }

    #[test]
    fn decision_matches_ground_truth() {
        let tr = trial();
        let right = policy().classify(&StepView::new(&tr, 3), 2);
        assert_eq!(right.kind(), Some(OutcomeKind::Correct));
        assert_eq!(right.reward(), 1.0);
        assert_eq!(right.choice(), Some(2));
        let wrong = policy().classify(&StepView::new(&tr, 4), 1);
        assert_eq!(wrong.kind(), Some(OutcomeKind::Incorrect));
        assert_eq!(wrong.reward(), 0.0);
        assert!(wrong.ends_trial());
    }
}
