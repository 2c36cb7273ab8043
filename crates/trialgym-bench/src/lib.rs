//! Benchmark profiles for trialgym.
//!
//! - [`task_profile`]: one bundled task with default configuration
//! - [`driver_profile`]: a seeded [`StepDriver`] over a [`Profile`]
//! - [`action_script`]: a deterministic fixate-mostly action sequence

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::Rng;
use trialgym_core::{seeded_rng, ConfigError};
use trialgym_engine::{DriverConfig, HoldConfig, StepDriver, Task};
use trialgym_tasks::{
    DelayedMatchCategory, MatchCategoryConfig, NAlternativeChoice, NAlternativeConfig,
    PerceptualConfig, PerceptualDecisionMaking, ReadySetGo, ReadySetGoConfig,
};

/// Bundled tasks available as benchmark profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Two-alternative perceptual decision making.
    Perceptual,
    /// N-alternative choice with the given number of alternatives.
    NAlternative(usize),
    /// Delayed match-to-category.
    MatchCategory,
    /// Ready-set-go.
    ReadySetGo,
}

impl Profile {
    /// Every profile, with the default n-alternative width.
    pub const ALL: [Profile; 4] = [
        Profile::Perceptual,
        Profile::NAlternative(3),
        Profile::MatchCategory,
        Profile::ReadySetGo,
    ];

    /// Short name for benchmark IDs.
    pub fn name(self) -> String {
        match self {
            Profile::Perceptual => "perceptual".to_string(),
            Profile::NAlternative(n) => format!("nalt_{n}"),
            Profile::MatchCategory => "match_category".to_string(),
            Profile::ReadySetGo => "ready_set_go".to_string(),
        }
    }
}

/// Build the task for `profile` with default configuration.
pub fn task_profile(profile: Profile) -> Result<Box<dyn Task>, ConfigError> {
    Ok(match profile {
        Profile::Perceptual => Box::new(PerceptualDecisionMaking::new(PerceptualConfig::default())?),
        Profile::NAlternative(choices) => Box::new(NAlternativeChoice::new(NAlternativeConfig {
            choices,
            ..NAlternativeConfig::default()
        })?),
        Profile::MatchCategory => {
            Box::new(DelayedMatchCategory::new(MatchCategoryConfig::default())?)
        }
        Profile::ReadySetGo => Box::new(ReadySetGo::new(ReadySetGoConfig::default())?),
    })
}

/// A seeded driver for `profile`, holding after trials with probability
/// `hold`.
pub fn driver_profile(profile: Profile, seed: u64, hold: f64) -> Result<StepDriver, ConfigError> {
    let config = DriverConfig {
        hold: HoldConfig::with_probability(hold),
        ..DriverConfig::seeded(seed)
    };
    StepDriver::new(task_profile(profile)?, config)
}

/// `len` actions in `0..actions`, fixating with probability `p_fixate`.
pub fn action_script(len: usize, actions: usize, p_fixate: f64, seed: u64) -> Vec<usize> {
    let mut rng = seeded_rng(seed);
    (0..len)
        .map(|_| {
            if actions < 2 || rng.random::<f64>() < p_fixate {
                0
            } else {
                rng.random_range(1..actions)
            }
        })
        .collect()
}
