//! Task-declared per-trial fields.

use indexmap::IndexMap;
use trialgym_core::ConfigError;

/// One task-declared trial field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Integer value, e.g. a chosen category or ground-truth label.
    Int(i64),
    /// Real value, e.g. a coherence or sampled duration.
    Float(f64),
    /// Boolean value.
    Flag(bool),
    /// Vector value, e.g. a stimulus direction.
    Vector(Vec<f64>),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Vector(v)
    }
}

/// Named fields attached to a trial, in insertion order.
///
/// Also used as the override set a caller passes to force the next
/// trial's conditions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrialFields {
    values: IndexMap<String, FieldValue>,
}

impl TrialFields {
    /// No fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a field.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Raw access.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Whether a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Integer field. Flags read as 0/1.
    pub fn int(&self, name: &str) -> Result<i64, ConfigError> {
        match self.require(name)? {
            FieldValue::Int(v) => Ok(*v),
            FieldValue::Flag(b) => Ok(i64::from(*b)),
            other => Err(mismatch(name, "integer", other)),
        }
    }

    /// Real field. Integers widen.
    pub fn float(&self, name: &str) -> Result<f64, ConfigError> {
        match self.require(name)? {
            FieldValue::Float(v) => Ok(*v),
            FieldValue::Int(v) => Ok(*v as f64),
            other => Err(mismatch(name, "real", other)),
        }
    }

    /// Boolean field.
    pub fn flag(&self, name: &str) -> Result<bool, ConfigError> {
        match self.require(name)? {
            FieldValue::Flag(b) => Ok(*b),
            other => Err(mismatch(name, "boolean", other)),
        }
    }

    /// Vector field.
    pub fn vector(&self, name: &str) -> Result<&[f64], ConfigError> {
        match self.require(name)? {
            FieldValue::Vector(v) => Ok(v),
            other => Err(mismatch(name, "vector", other)),
        }
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> Result<&FieldValue, ConfigError> {
        self.values.get(name).ok_or_else(|| ConfigError::FieldMissing {
            name: name.to_string(),
        })
    }
}

fn mismatch(name: &str, wanted: &str, got: &FieldValue) -> ConfigError {
    ConfigError::InvalidParameter {
        reason: format!("trial field '{name}' is not {wanted}: {got:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_round_trip() {
        let f = TrialFields::new()
            .with("left_right", -1)
            .with("coh", 12.8)
            .with("matched", true)
            .with("stim", vec![0.5, -0.5]);
        assert_eq!(f.int("left_right").unwrap(), -1);
        assert_eq!(f.float("coh").unwrap(), 12.8);
        assert!(f.flag("matched").unwrap());
        assert_eq!(f.vector("stim").unwrap(), &[0.5, -0.5]);
        assert_eq!(f.len(), 4);
    }

    #[test]
    fn int_widens_to_float() {
        let f = TrialFields::new().with("measure", 660);
        assert_eq!(f.float("measure").unwrap(), 660.0);
    }

    #[test]
    fn missing_field_is_reported() {
        let f = TrialFields::new();
        assert_eq!(
            f.float("coh"),
            Err(ConfigError::FieldMissing { name: "coh".into() })
        );
    }

    #[test]
    fn wrong_type_is_reported() {
        let f = TrialFields::new().with("coh", 6.4);
        assert!(matches!(
            f.int("coh"),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn set_replaces_but_keeps_order() {
        let mut f = TrialFields::new().with("a", 1).with("b", 2);
        f.set("a", 3);
        let names: Vec<&str> = f.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(f.int("a").unwrap(), 3);
    }
}
