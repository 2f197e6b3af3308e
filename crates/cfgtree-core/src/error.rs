//! Error types for cfgtree-core
//!
//! One enum, three groups: definition errors surface while a spec tree is
//! being built; resolution errors surface at `create()` or on the read that
//! triggers them; validation errors surface the first time the offending
//! option is resolved, which may be after `create()` returns.

use crate::value::{Value, ValueKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // --- definition ---
    #[error("option {path} combines `allowed` with `check_all`/`check_any`")]
    ConflictingConstraints { path: String },

    #[error("duplicate name {name} in section {section}")]
    DuplicateName { section: String, name: String },

    #[error(
        "cannot replace existing entry {path} with a whole section or spec; \
         update it with nested declarations instead"
    )]
    SectionReplaced { path: String },

    // --- resolution ---
    #[error("unknown option {path}")]
    UnknownOption { path: String },

    #[error("{path} is a section, not an option")]
    NotAnOption { path: String },

    #[error("{path} is an option, not a section")]
    NotASection { path: String },

    #[error("option {path} has no default and was not set")]
    Required { path: String },

    #[error(
        "circular default definition: {}; at least one of these options must be set explicitly",
        .chain.join(" -> ")
    )]
    Cycle { chain: Vec<String> },

    #[error("the root section has no parent")]
    NoParent,

    #[error("unknown value kind: {kind}")]
    UnknownKind { kind: String },

    // --- validation ---
    #[error(
        "{path}: {value} is not of type {}",
        join_kinds(.expected)
    )]
    TypeMismatch {
        path: String,
        expected: Vec<ValueKind>,
        value: Value,
    },

    #[error(
        "{path}: {value} is not one of the allowed values [{}]",
        join_values(.allowed)
    )]
    NotAllowed {
        path: String,
        value: Value,
        allowed: Vec<Value>,
    },

    #[error("{path}: {value} failed a check_all predicate")]
    CheckAllFailed { path: String, value: Value },

    #[error("{path}: {value} failed every check_any predicate")]
    CheckAnyFailed { path: String, value: Value },

    #[error("{path}: default expression failed: {message}")]
    ExprFailed { path: String, message: String },
}

impl Error {
    /// True for errors raised while building a spec tree.
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            Error::ConflictingConstraints { .. }
                | Error::DuplicateName { .. }
                | Error::SectionReplaced { .. }
        )
    }

    /// True for errors raised while constructing or navigating a resolved tree.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Error::UnknownOption { .. }
                | Error::NotAnOption { .. }
                | Error::NotASection { .. }
                | Error::Required { .. }
                | Error::Cycle { .. }
                | Error::NoParent
                | Error::UnknownKind { .. }
        )
    }

    /// True for errors raised by constraint checks on a resolved value.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. }
                | Error::NotAllowed { .. }
                | Error::CheckAllFailed { .. }
                | Error::CheckAnyFailed { .. }
                | Error::ExprFailed { .. }
        )
    }
}

fn join_kinds(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
