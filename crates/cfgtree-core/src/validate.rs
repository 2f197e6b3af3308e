//! Constraint application
//!
//! Runs at two points: eagerly on `set`, and lazily on the first
//! resolution of an option (explicit override, literal, reference, or
//! expression result alike). The caller decides what to do with the
//! value; this module only judges it.

use crate::error::{Error, Result};
use crate::option::OptionSpec;
use crate::value::Value;

pub(crate) fn validate(value: &Value, spec: &OptionSpec, path: &str) -> Result<()> {
    let kinds = spec.permitted_kinds();
    if !kinds.is_empty() && !kinds.contains(&value.kind()) {
        return Err(Error::TypeMismatch {
            path: path.to_string(),
            expected: kinds.to_vec(),
            value: value.clone(),
        });
    }

    let allowed = spec.allowed_values();
    if !allowed.is_empty() && !allowed.contains(value) {
        return Err(Error::NotAllowed {
            path: path.to_string(),
            value: value.clone(),
            allowed: allowed.to_vec(),
        });
    }

    if !spec.check_all_predicates().iter().all(|check| check(value)) {
        return Err(Error::CheckAllFailed {
            path: path.to_string(),
            value: value.clone(),
        });
    }

    let any = spec.check_any_predicates();
    if !any.is_empty() && !any.iter().any(|check| check(value)) {
        return Err(Error::CheckAnyFailed {
            path: path.to_string(),
            value: value.clone(),
        });
    }

    Ok(())
}
