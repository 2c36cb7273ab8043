//! Running performance counters.
//!
//! [`TrialStats`] is updated by the driver on every classified step and
//! never influences stepping; it exists for logging and for learning
//! criteria such as the two-alternative "decides almost always and is
//! right most of the time" check.

use crate::policy::{Outcome, OutcomeKind};

/// Per-driver trial counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrialStats {
    /// Completed trials.
    pub trials: u64,
    /// Trials ended by a correct response.
    pub correct: u64,
    /// Trials ended by a wrong response.
    pub incorrect: u64,
    /// Trials ended by an abort.
    pub aborted: u64,
    /// Trials ended without a response.
    pub missed: u64,
    /// Aborts that did not end their trial.
    pub penalties: u64,
    /// Sum of every reward paid, held steps included.
    pub total_reward: f64,
}

impl TrialStats {
    /// Empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one classified step.
    pub fn record(&mut self, outcome: &Outcome) {
        if !outcome.ended_trial {
            if outcome.kind == OutcomeKind::Abort {
                self.penalties += 1;
            }
            return;
        }
        self.trials += 1;
        match outcome.kind {
            OutcomeKind::Correct => self.correct += 1,
            OutcomeKind::Incorrect => self.incorrect += 1,
            OutcomeKind::Abort => self.aborted += 1,
            OutcomeKind::Miss => self.missed += 1,
        }
    }

    /// Accumulate a step reward.
    pub fn add_reward(&mut self, reward: f32) {
        self.total_reward += f64::from(reward);
    }

    /// Fraction of completed trials that ended in a response.
    pub fn decision_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        (self.correct + self.incorrect) as f64 / self.trials as f64
    }

    /// Fraction of responses that were correct.
    pub fn accuracy(&self) -> f64 {
        let decided = self.correct + self.incorrect;
        if decided == 0 {
            return 0.0;
        }
        self.correct as f64 / decided as f64
    }

    /// Whether both rates reach their thresholds.
    ///
    /// The conventional two-alternative criterion is
    /// `meets_criterion(0.99, 0.8)`.
    pub fn meets_criterion(&self, min_decision_rate: f64, min_accuracy: f64) -> bool {
        self.decision_rate() >= min_decision_rate && self.accuracy() >= min_accuracy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ended(kind: OutcomeKind) -> Outcome {
        Outcome {
            kind,
            reward: 0.0,
            choice: None,
            decision_t: 0,
            ended_trial: true,
        }
    }

    #[test]
    fn empty_stats_report_zero_rates() {
        let s = TrialStats::new();
        assert_eq!(s.decision_rate(), 0.0);
        assert_eq!(s.accuracy(), 0.0);
        assert!(!s.meets_criterion(0.99, 0.8));
    }

    #[test]
    fn outcomes_are_tallied() {
        let mut s = TrialStats::new();
        for kind in [
            OutcomeKind::Correct,
            OutcomeKind::Correct,
            OutcomeKind::Correct,
            OutcomeKind::Incorrect,
            OutcomeKind::Miss,
            OutcomeKind::Abort,
        ] {
            s.record(&ended(kind));
        }
        assert_eq!(s.trials, 6);
        assert_eq!(s.correct, 3);
        assert_eq!(s.incorrect, 1);
        assert_eq!(s.missed, 1);
        assert_eq!(s.aborted, 1);
        assert!((s.decision_rate() - 4.0 / 6.0).abs() < 1e-12);
        assert!((s.accuracy() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn non_terminating_abort_is_a_penalty_not_a_trial() {
        let mut s = TrialStats::new();
        s.record(&Outcome {
            ended_trial: false,
            ..ended(OutcomeKind::Abort)
        });
        assert_eq!(s.trials, 0);
        assert_eq!(s.penalties, 1);
    }

    #[test]
    fn criterion_requires_both_rates() {
        let mut s = TrialStats::new();
        for _ in 0..9 {
            s.record(&ended(OutcomeKind::Correct));
        }
        s.record(&ended(OutcomeKind::Incorrect));
        assert!(s.meets_criterion(0.99, 0.8));
        s.record(&ended(OutcomeKind::Miss));
        assert!(!s.meets_criterion(0.99, 0.8));
    }

    #[test]
    fn rewards_accumulate() {
        let mut s = TrialStats::new();
        s.add_reward(1.0);
        s.add_reward(-0.5);
        assert_eq!(s.total_reward, 0.5);
    }
}
