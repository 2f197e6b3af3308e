//! Reusable value-constraint predicates.

use crate::value::Value;

/// Numeric and strictly positive.
pub fn is_positive(value: &Value) -> bool {
    value.as_number().is_some_and(|x| x > 0.0)
}

/// Numeric and not negative.
pub fn is_non_negative(value: &Value) -> bool {
    value.as_number().is_some_and(|x| x >= 0.0)
}

/// Null, or satisfying the wrapped predicate. Useful for options where
/// null means "unset".
pub fn is_null_or(check: impl Fn(&Value) -> bool) -> impl Fn(&Value) -> bool {
    move |value| value.is_null() || check(value)
}
