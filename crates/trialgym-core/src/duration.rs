//! Period duration distributions and the sampler that draws from them.
//!
//! A [`DurationSpec`] is declared once in a task's timing configuration,
//! passed through [`resolve()`](DurationSpec::resolve) at setup time to
//! apply the one-timestep minimum, and then sampled once per trial with
//! the driver's RNG. Durations are in the same physical unit as `dt`
//! (milliseconds in every bundled task).

use rand::Rng;
use smallvec::SmallVec;

use crate::error::ConfigError;
use crate::random::choose;

/// Resample attempts for a truncated exponential before clamping.
///
/// The acceptance rate is only poor for windows far in the tail of the
/// distribution; clamping the final draw keeps the draw count bounded.
const MAX_RESAMPLES: usize = 64;

/// Declared distribution of a period's duration.
#[derive(Clone, Debug, PartialEq)]
pub enum DurationSpec {
    /// Always the given value.
    Constant(f64),
    /// Exponential with the given mean, resampled until it lies in
    /// `[min, max]`.
    TruncatedExponential {
        /// Mean of the untruncated exponential.
        mean: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// Uniform on `[min, max]`.
    Uniform {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// One of the listed values, chosen uniformly.
    Choice(SmallVec<[f64; 8]>),
}

impl DurationSpec {
    /// Shorthand for [`DurationSpec::Constant`].
    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    /// Shorthand for [`DurationSpec::TruncatedExponential`].
    pub fn truncated_exponential(mean: f64, min: f64, max: f64) -> Self {
        Self::TruncatedExponential { mean, min, max }
    }

    /// Shorthand for [`DurationSpec::Choice`].
    pub fn choice(values: &[f64]) -> Self {
        Self::Choice(values.iter().copied().collect())
    }

    /// Check that every value is finite and non-negative and that bounds
    /// are ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Constant(v) => check_value("constant", *v),
            Self::TruncatedExponential { mean, min, max } => {
                check_value("mean", *mean)?;
                check_value("min", *min)?;
                check_value("max", *max)?;
                if *mean <= 0.0 {
                    return Err(ConfigError::InvalidDuration {
                        reason: format!("exponential mean must be positive, got {mean}"),
                    });
                }
                check_bounds(*min, *max)
            }
            Self::Uniform { min, max } => {
                check_value("min", *min)?;
                check_value("max", *max)?;
                check_bounds(*min, *max)
            }
            Self::Choice(values) => {
                if values.is_empty() {
                    return Err(ConfigError::EmptyChoice);
                }
                values.iter().try_for_each(|v| check_value("choice", *v))
            }
        }
    }

    /// Validate against a timestep size and apply the setup-time
    /// adjustment `min = max(min, dt)` to truncated exponentials.
    ///
    /// This is the only coercion trialgym performs on configuration; a
    /// bound pair that becomes inconsistent after the adjustment is an
    /// error, not clamped.
    pub fn resolve(&self, dt: f64) -> Result<Self, ConfigError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::NonPositiveDt { value: dt });
        }
        let resolved = match self {
            Self::TruncatedExponential { mean, min, max } => Self::TruncatedExponential {
                mean: *mean,
                min: min.max(dt),
                max: *max,
            },
            other => other.clone(),
        };
        resolved.validate()?;
        Ok(resolved)
    }

    /// Draw one duration.
    ///
    /// Deterministic in the RNG state: the same spec and the same
    /// generator state always yield the same value. Assumes `self` has
    /// been validated.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::TruncatedExponential { mean, min, max } => {
                let mut x = *min;
                for _ in 0..MAX_RESAMPLES {
                    // 1 - u lies in (0, 1], so ln never sees zero.
                    let u: f64 = rng.random();
                    x = -mean * (1.0 - u).ln();
                    if x >= *min && x <= *max {
                        return x;
                    }
                }
                x.clamp(*min, *max)
            }
            Self::Uniform { min, max } => {
                let u: f64 = rng.random();
                (min + u * (max - min)).min(*max)
            }
            Self::Choice(values) => choose(rng, values).copied().unwrap_or(0.0),
        }
    }

    /// The smallest value this spec can produce.
    pub fn lower_bound(&self) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::TruncatedExponential { min, .. } | Self::Uniform { min, .. } => *min,
            Self::Choice(values) => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    /// The largest value this spec can produce.
    pub fn upper_bound(&self) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::TruncatedExponential { max, .. } | Self::Uniform { max, .. } => *max,
            Self::Choice(values) => values.iter().copied().fold(0.0, f64::max),
        }
    }
}

impl From<f64> for DurationSpec {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

fn check_value(what: &str, v: f64) -> Result<(), ConfigError> {
    if !v.is_finite() || v < 0.0 {
        return Err(ConfigError::InvalidDuration {
            reason: format!("{what} must be finite and >= 0, got {v}"),
        });
    }
    Ok(())
}

fn check_bounds(min: f64, max: f64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::DurationBounds { min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;
    use proptest::prelude::*;

    #[test]
    fn constant_ignores_rng() {
        let mut rng = seeded_rng(1);
        let spec = DurationSpec::constant(750.0);
        assert_eq!(spec.sample(&mut rng), 750.0);
        assert_eq!(spec.sample(&mut rng), 750.0);
    }

    #[test]
    fn resolve_raises_min_to_dt() {
        let spec = DurationSpec::truncated_exponential(330.0, 80.0, 1500.0);
        let resolved = spec.resolve(100.0).unwrap();
        assert_eq!(
            resolved,
            DurationSpec::TruncatedExponential {
                mean: 330.0,
                min: 100.0,
                max: 1500.0
            }
        );
    }

    #[test]
    fn resolve_keeps_min_above_dt() {
        let spec = DurationSpec::truncated_exponential(330.0, 80.0, 1500.0);
        let resolved = spec.resolve(20.0).unwrap();
        assert!(matches!(
            resolved,
            DurationSpec::TruncatedExponential { min, .. } if min == 80.0
        ));
    }

    #[test]
    fn resolve_rejects_bounds_inverted_by_dt() {
        let spec = DurationSpec::truncated_exponential(50.0, 10.0, 60.0);
        assert_eq!(
            spec.resolve(100.0),
            Err(ConfigError::DurationBounds {
                min: 100.0,
                max: 60.0
            })
        );
    }

    #[test]
    fn resolve_rejects_bad_dt() {
        let spec = DurationSpec::constant(100.0);
        assert!(matches!(
            spec.resolve(0.0),
            Err(ConfigError::NonPositiveDt { .. })
        ));
        assert!(matches!(
            spec.resolve(f64::NAN),
            Err(ConfigError::NonPositiveDt { .. })
        ));
    }

    #[test]
    fn validate_rejects_min_above_max() {
        let spec = DurationSpec::Uniform {
            min: 10.0,
            max: 5.0,
        };
        assert_eq!(
            spec.validate(),
            Err(ConfigError::DurationBounds { min: 10.0, max: 5.0 })
        );
    }

    #[test]
    fn validate_rejects_negative_and_nan() {
        assert!(DurationSpec::constant(-1.0).validate().is_err());
        assert!(DurationSpec::constant(f64::NAN).validate().is_err());
        assert!(DurationSpec::truncated_exponential(0.0, 0.0, 10.0)
            .validate()
            .is_err());
    }

    #[test]
    fn validate_rejects_empty_choice() {
        assert_eq!(
            DurationSpec::choice(&[]).validate(),
            Err(ConfigError::EmptyChoice)
        );
    }

    #[test]
    fn zero_constant_is_legal() {
        assert!(DurationSpec::constant(0.0).validate().is_ok());
    }

    #[test]
    fn choice_only_returns_listed_values() {
        let values = [500.0, 580.0, 660.0];
        let spec = DurationSpec::choice(&values);
        let mut rng = seeded_rng(11);
        for _ in 0..50 {
            let v = spec.sample(&mut rng);
            assert!(values.contains(&v));
        }
        assert_eq!(spec.upper_bound(), 660.0);
        assert_eq!(spec.lower_bound(), 500.0);
    }

    #[test]
    fn lower_bound_follows_resolved_minimum() {
        let spec = DurationSpec::truncated_exponential(330.0, 80.0, 1500.0);
        assert_eq!(spec.lower_bound(), 80.0);
        assert_eq!(spec.resolve(100.0).unwrap().lower_bound(), 100.0);
        assert_eq!(DurationSpec::constant(83.0).lower_bound(), 83.0);
    }

    #[test]
    fn identical_rng_state_reproduces_durations() {
        let spec = DurationSpec::truncated_exponential(330.0, 100.0, 1500.0);
        let mut a = seeded_rng(5);
        let mut b = seeded_rng(5);
        let xs: Vec<f64> = (0..20).map(|_| spec.sample(&mut a)).collect();
        let ys: Vec<f64> = (0..20).map(|_| spec.sample(&mut b)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn narrow_tail_window_still_terminates_in_bounds() {
        let spec = DurationSpec::truncated_exponential(1.0, 500.0, 501.0);
        let mut rng = seeded_rng(0);
        let x = spec.sample(&mut rng);
        assert!((500.0..=501.0).contains(&x));
    }

    proptest! {
        #[test]
        fn truncated_exponential_stays_in_bounds(
            mean in 1.0f64..2000.0,
            min in 0.0f64..1000.0,
            span in 0.0f64..2000.0,
            seed in any::<u64>(),
        ) {
            let max = min + span;
            let spec = DurationSpec::truncated_exponential(mean, min, max);
            prop_assert!(spec.validate().is_ok());
            let mut rng = seeded_rng(seed);
            for _ in 0..16 {
                let x = spec.sample(&mut rng);
                prop_assert!(x >= min && x <= max, "{} not in [{}, {}]", x, min, max);
            }
        }

        #[test]
        fn uniform_stays_in_bounds(
            min in 0.0f64..1000.0,
            span in 0.0f64..1000.0,
            seed in any::<u64>(),
        ) {
            let max = min + span;
            let spec = DurationSpec::Uniform { min, max };
            let mut rng = seeded_rng(seed);
            let x = spec.sample(&mut rng);
            prop_assert!(x >= min && x <= max);
        }
    }
}
