//! Driver, reward, and continuation configuration.
//!
//! All configuration is plain data with explicit defaults, validated
//! once when a task or driver is constructed and never mutated after.

use smallvec::SmallVec;
use trialgym_core::ConfigError;

use crate::policy::OutcomeKind;

// ── RewardConfig ───────────────────────────────────────────────────

/// Reward paid for each outcome kind.
#[derive(Clone, Debug, PartialEq)]
pub struct RewardConfig {
    /// Premature response. Default: -0.1.
    pub abort: f32,
    /// Correct response. Default: 1.0.
    pub correct: f32,
    /// Wrong response. Default: 0.0.
    pub fail: f32,
    /// No response in time, and every held step. Default: 0.0.
    pub miss: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            abort: -0.1,
            correct: 1.0,
            fail: 0.0,
            miss: 0.0,
        }
    }
}

impl RewardConfig {
    /// Every reward must be finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("abort", self.abort),
            ("correct", self.correct),
            ("fail", self.fail),
            ("miss", self.miss),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidReward { name, value });
            }
        }
        Ok(())
    }
}

// ── HoldConfig ─────────────────────────────────────────────────────

/// Stochastic continuation after a trial ends.
///
/// When a trial ends with an outcome listed in `outcomes`, the driver
/// holds the terminal observation with probability `probability` instead
/// of starting the next trial. Each held step pays the miss reward and
/// holds again with the same probability, so hold lengths are geometric.
/// This models variable inter-trial intervals without simulating them.
#[derive(Clone, Debug, PartialEq)]
pub struct HoldConfig {
    /// Probability of holding. Default: 0.0 (never hold).
    pub probability: f64,
    /// Outcome kinds eligible for holding. Default: all four.
    pub outcomes: SmallVec<[OutcomeKind; 4]>,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            probability: 0.0,
            outcomes: OutcomeKind::ALL.into_iter().collect(),
        }
    }
}

impl HoldConfig {
    /// Hold after any outcome with the given probability.
    pub fn with_probability(probability: f64) -> Self {
        Self {
            probability,
            ..Self::default()
        }
    }

    /// `probability` must lie in `[0, 1)`; at 1.0 the driver would never
    /// leave the hold state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.probability;
        if !p.is_finite() || !(0.0..1.0).contains(&p) {
            return Err(ConfigError::InvalidProbability {
                name: "hold probability",
                value: p,
            });
        }
        Ok(())
    }

    /// Whether trials ending with `kind` may be held.
    pub fn applies_to(&self, kind: OutcomeKind) -> bool {
        self.probability > 0.0 && self.outcomes.contains(&kind)
    }
}

// ── DriverConfig ───────────────────────────────────────────────────

/// Configuration for a [`StepDriver`](crate::StepDriver).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DriverConfig {
    /// RNG seed. Default: 0.
    pub seed: u64,
    /// Stochastic continuation. Default: never hold.
    pub hold: HoldConfig,
    /// If set, `done` is reported on every step whose external step
    /// count is a multiple of this value. Default: `None` (never done).
    pub episode_steps: Option<u64>,
}

impl DriverConfig {
    /// Default configuration with the given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hold.validate()?;
        if self.episode_steps == Some(0) {
            return Err(ConfigError::InvalidParameter {
                reason: "episode_steps must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
