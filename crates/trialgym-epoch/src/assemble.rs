//! Period-scoped writes into a trial's observation and ground-truth buffers.
//!
//! Task code describes observations declaratively ("add 1.0 to the
//! fixation channel during fixation and stimulus") instead of indexing
//! buffers by hand. All observation writes are additive onto a zeroed
//! buffer, so the final buffer is the superposition of every call and
//! does not depend on call order (noise draws aside). Each call validates
//! every period name and channel before touching the buffer; a failed
//! call leaves the trial unchanged.

use std::ops::Range;

use rand::Rng;
use smallvec::SmallVec;
use trialgym_core::random::normal;
use trialgym_core::ConfigError;

use crate::layout::{ChannelSelector, Channels};
use crate::trial::Trial;

/// A value written into observation channels.
#[derive(Clone, Debug, PartialEq)]
pub enum Stimulus {
    /// Broadcast to every selected channel.
    Scalar(f32),
    /// One entry per selected channel, in selector order.
    Vector(SmallVec<[f32; 8]>),
}

impl From<f32> for Stimulus {
    fn from(v: f32) -> Self {
        Self::Scalar(v)
    }
}

impl From<f64> for Stimulus {
    fn from(v: f64) -> Self {
        Self::Scalar(v as f32)
    }
}

impl From<&[f32]> for Stimulus {
    fn from(v: &[f32]) -> Self {
        Self::Vector(v.iter().copied().collect())
    }
}

impl<const N: usize> From<[f32; N]> for Stimulus {
    fn from(v: [f32; N]) -> Self {
        Self::Vector(v.into_iter().collect())
    }
}

impl From<Vec<f32>> for Stimulus {
    fn from(v: Vec<f32>) -> Self {
        Self::Vector(v.into_iter().collect())
    }
}

/// Which periods a write covers.
#[derive(Clone, Debug, PartialEq)]
pub enum Periods<'a> {
    /// Every timestep of the trial.
    All,
    /// The named periods, in order.
    Named(SmallVec<[&'a str; 4]>),
}

impl<'a> From<&'a str> for Periods<'a> {
    fn from(name: &'a str) -> Self {
        let mut names = SmallVec::new();
        names.push(name);
        Self::Named(names)
    }
}

impl<'a> From<&[&'a str]> for Periods<'a> {
    fn from(names: &[&'a str]) -> Self {
        Self::Named(names.iter().copied().collect())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for Periods<'a> {
    fn from(names: [&'a str; N]) -> Self {
        Self::Named(names.into_iter().collect())
    }
}

impl Trial {
    /// Add `value` to the selected channels at every timestep of `periods`.
    ///
    /// A scalar is broadcast; a vector must have one entry per selected
    /// channel.
    pub fn add_value<'p>(
        &mut self,
        value: impl Into<Stimulus>,
        periods: impl Into<Periods<'p>>,
        channels: impl Into<ChannelSelector>,
    ) -> Result<(), ConfigError> {
        let ranges = self.resolve_periods(&periods.into())?;
        let channels = channels.into().resolve(self.layout())?;
        let value = value.into();
        if let Stimulus::Vector(v) = &value {
            if v.len() != channels.len() {
                return Err(ConfigError::WidthMismatch {
                    expected: channels.len(),
                    actual: v.len(),
                });
            }
        }
        let w = self.width();
        for range in ranges {
            for t in range {
                let row = &mut self.observations[t * w..(t + 1) * w];
                for (k, &c) in channels.iter().enumerate() {
                    row[c] += match &value {
                        Stimulus::Scalar(s) => *s,
                        Stimulus::Vector(v) => v[k],
                    };
                }
            }
        }
        Ok(())
    }

    /// Add i.i.d. N(mean, std²) samples, one per (timestep, channel) in
    /// scope.
    ///
    /// Draw order is periods as given, then timesteps ascending, then
    /// channels in selector order, so a fixed seed reproduces the buffer.
    pub fn add_noise<'p, R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        mean: f64,
        std: f64,
        periods: impl Into<Periods<'p>>,
        channels: impl Into<ChannelSelector>,
    ) -> Result<(), ConfigError> {
        if !mean.is_finite() || !std.is_finite() || std < 0.0 {
            return Err(ConfigError::InvalidParameter {
                reason: format!("noise needs finite mean and std >= 0, got {mean}, {std}"),
            });
        }
        let ranges = self.resolve_periods(&periods.into())?;
        let channels: Channels = channels.into().resolve(self.layout())?;
        let w = self.width();
        for range in ranges {
            for t in range {
                for &c in &channels {
                    self.observations[t * w + c] += normal(rng, mean, std) as f32;
                }
            }
        }
        Ok(())
    }

    /// Set the ground-truth label at every timestep of `periods`.
    ///
    /// Unlike observation writes this overwrites; the last call wins.
    pub fn set_ground_truth<'p>(
        &mut self,
        label: usize,
        periods: impl Into<Periods<'p>>,
    ) -> Result<(), ConfigError> {
        for range in self.resolve_periods(&periods.into())? {
            self.ground_truth[range].fill(label);
        }
        Ok(())
    }

    /// Set the ground-truth label at a single timestep.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()`.
    pub fn set_ground_truth_at(&mut self, label: usize, t: usize) {
        self.check(t);
        self.ground_truth[t] = label;
    }

    fn resolve_periods(
        &self,
        periods: &Periods<'_>,
    ) -> Result<SmallVec<[Range<usize>; 4]>, ConfigError> {
        let tl = self.timeline();
        match periods {
            Periods::All => {
                let mut all = SmallVec::new();
                all.push(0..tl.len());
                Ok(all)
            }
            Periods::Named(names) => names
                .iter()
                .map(|name| tl.id(name).map(|id| tl.period(id).range()))
                .collect(),
        }
    }
}
