//! Dependency condition evaluation.
//!
//! A [`Condition`] decides whether a dependent field is active given the
//! current value of one controller field. Conditions come from schema JSON
//! (booleans, value sets) or are installed programmatically as predicates.
//! Evaluation is fail-closed: a panicking predicate is caught, logged, and
//! treated as inactive.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

/// A host-supplied predicate over a controller value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Condition attached to a dependency edge.
#[derive(Clone, Default)]
pub enum Condition {
    /// Active while the controller value is truthy (absent condition).
    #[default]
    Truthy,
    /// Active while the controller value loosely equals the expected value.
    Equals(Value),
    /// Active while the controller value loosely equals any member of the
    /// set. A `null` member matches an absent controller value.
    AnyOf(Vec<Value>),
    /// Active while the predicate returns `true`.
    Predicate(Predicate),
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truthy => write!(f, "Truthy"),
            Self::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Self::AnyOf(set) => f.debug_tuple("AnyOf").field(set).finish(),
            Self::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl Condition {
    /// Parse a condition from its schema JSON form.
    ///
    /// Booleans become equality checks, arrays become membership checks.
    /// Anything else degrades to [`Condition::Truthy`] with a warning pushed
    /// onto `warnings` (fail-closed tolerance for authoring mistakes).
    pub fn from_schema(raw: &Value, warnings: &mut Vec<String>) -> Self {
        match raw {
            Value::Bool(_) | Value::String(_) | Value::Number(_) => Self::Equals(raw.clone()),
            Value::Array(set) => Self::AnyOf(set.clone()),
            other => {
                warnings.push(format!("invalid dependency condition: {other}"));
                Self::Truthy
            }
        }
    }

    /// Evaluate against a controller value.
    ///
    /// `value` is `None` when the controller has no committed value, which
    /// only `null` members of a value set (and falsy truthiness) match.
    #[must_use]
    pub fn evaluate(&self, value: Option<&Value>) -> bool {
        let resolved = value.unwrap_or(&Value::Null);
        match self {
            Self::Truthy => is_truthy(resolved),
            Self::Equals(expected) => loose_eq(resolved, expected),
            Self::AnyOf(set) => set.iter().any(|member| loose_eq(resolved, member)),
            Self::Predicate(predicate) => {
                let guarded = AssertUnwindSafe(|| predicate(resolved));
                match catch_unwind(guarded) {
                    Ok(active) => active,
                    Err(_) => {
                        tracing::warn!("dependency predicate panicked; treating as inactive");
                        false
                    }
                }
            }
        }
    }
}

/// JavaScript-style truthiness for JSON values.
///
/// `null`, `false`, `0`, `NaN`, and `""` are falsy; arrays and objects are
/// always truthy (even when empty).
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Loose equality between a committed value and a condition member.
///
/// Same-type comparisons are exact. The one cross-type case supported is a
/// numeric string against a number, which schema authors commonly mix.
/// Booleans never equate to strings or numbers.
#[must_use]
pub fn loose_eq(value: &Value, expected: &Value) -> bool {
    match (value, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.parse::<f64>().ok() == n.as_f64()
        }
        _ => value == expected,
    }
}
