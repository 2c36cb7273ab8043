//! Behavioural task implementations for trialgym.
//!
//! Each task is a [`Task`](trialgym_engine::Task) built from a validated
//! configuration struct with explicit defaults:
//!
//! | Task | Config | Decision |
//! |------|--------|----------|
//! | [`PerceptualDecisionMaking`] | [`PerceptualConfig`] | which side has the stronger noisy stimulus |
//! | [`NAlternativeChoice`] | [`NAlternativeConfig`] | which of `n` noisy stimuli is strongest |
//! | [`DelayedMatchCategory`] | [`MatchCategoryConfig`] | whether sample and test share a category |
//! | [`ReadySetGo`] | [`ReadySetGoConfig`] | when to reproduce a measured interval |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod match_category;
pub mod nalt;
pub mod perceptual;
pub mod ready_set_go;

pub use match_category::{DelayedMatchCategory, MatchCategoryConfig, MatchCategoryTiming};
pub use nalt::{NAlternativeChoice, NAlternativeConfig, NAlternativeTiming};
pub use perceptual::{PerceptualConfig, PerceptualDecisionMaking, PerceptualTiming};
pub use ready_set_go::{ReadySetGo, ReadySetGoConfig, ReadySetGoTiming};

use trialgym_core::ConfigError;

/// Coherence levels shared by the perceptual tasks, in percent.
pub const COHERENCES: [f64; 5] = [0.0, 6.4, 12.8, 25.6, 51.2];

/// Per-timestep noise std for a task-level noise scale.
pub(crate) fn noise_std(sigma: f64, dt: f64) -> f64 {
    sigma / dt.sqrt()
}

pub(crate) fn check_sigma(sigma: f64) -> Result<(), ConfigError> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ConfigError::InvalidParameter {
            reason: format!("noise scale must be finite and >= 0, got {sigma}"),
        });
    }
    Ok(())
}

pub(crate) fn check_coherences(cohs: &[f64]) -> Result<(), ConfigError> {
    if cohs.is_empty() {
        return Err(ConfigError::InvalidParameter {
            reason: "no coherence levels configured".to_string(),
        });
    }
    if let Some(c) = cohs.iter().find(|c| !c.is_finite()) {
        return Err(ConfigError::InvalidParameter {
            reason: format!("coherence {c} is not finite"),
        });
    }
    Ok(())
}

/// Stimulus strength for a signed coherence: `(1 + coh/100) / 2`.
pub(crate) fn scale(coh: f64) -> f32 {
    ((1.0 + coh / 100.0) / 2.0) as f32
}
