//! Leaf option declarations
//!
//! An [`OptionSpec`] couples a default (literal, derived expression, or
//! reference to another option) with optional metadata: a documentation
//! string, a permitted-type set, and value constraints.

use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::options::Scope;
use crate::value::{Value, ValueKind};

/// A default expression: evaluated against the node the option lives on in
/// the resolved tree, so it can read sibling, parent, and subsection values.
pub type Expr = Rc<dyn Fn(&Scope<'_>) -> Result<Value>>;

/// A value-constraint predicate.
pub type Predicate = Rc<dyn Fn(&Value) -> bool>;

/// How an option obtains its value when no explicit override is supplied.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value.
    Literal(Value),
    /// A function of the resolution-time scope.
    Expr(Expr),
    /// The resolved value of another option, looked up through the scope.
    /// Participates in dependency tracking and cycle detection like an
    /// expression that reads the named option.
    Reference(String),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => write!(f, "Literal({v})"),
            DefaultValue::Expr(_) => write!(f, "Expr(..)"),
            DefaultValue::Reference(name) => write!(f, "Reference({name})"),
        }
    }
}

/// Declaration of a single named option.
///
/// Built with the chainable constructors and refiners:
///
/// ```
/// use cfgtree_core::{OptionSpec, ValueKind};
///
/// let spec = OptionSpec::literal(8080)
///     .doc("port to listen on")
///     .value_type(ValueKind::Int)
///     .check_all(|v| v.as_int().is_some_and(|p| p > 0));
/// ```
///
/// `allowed` and `check_all`/`check_any` are mutually exclusive; the
/// conflict is reported when the spec is inserted into a section.
#[derive(Clone)]
pub struct OptionSpec {
    default: Option<DefaultValue>,
    doc: Option<String>,
    value_type: Vec<ValueKind>,
    allowed: Vec<Value>,
    check_all: Vec<Predicate>,
    check_any: Vec<Predicate>,
}

impl OptionSpec {
    fn with_default(default: Option<DefaultValue>) -> Self {
        Self {
            default,
            doc: None,
            value_type: Vec::new(),
            allowed: Vec::new(),
            check_all: Vec::new(),
            check_any: Vec::new(),
        }
    }

    /// An option defaulting to a fixed value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::with_default(Some(DefaultValue::Literal(value.into())))
    }

    /// An option whose default is computed from the scope it resolves in.
    pub fn expr(f: impl Fn(&Scope<'_>) -> Result<Value> + 'static) -> Self {
        Self::with_default(Some(DefaultValue::Expr(Rc::new(f))))
    }

    /// An option defaulting to the value of another option.
    pub fn reference(target: impl Into<String>) -> Self {
        Self::with_default(Some(DefaultValue::Reference(target.into())))
    }

    /// An option with no default: it must be supplied explicitly, and
    /// resolving it without an override fails.
    pub fn required() -> Self {
        Self::with_default(None)
    }

    /// A bare-default declaration: an option carrying the given default and
    /// no metadata.
    pub(crate) fn from_default(default: DefaultValue) -> Self {
        Self::with_default(Some(default))
    }

    /// Attach a documentation string.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Permit a runtime type. May be called repeatedly to permit several;
    /// an option with no permitted set accepts any type.
    pub fn value_type(mut self, kind: ValueKind) -> Self {
        if !self.value_type.contains(&kind) {
            self.value_type.push(kind);
        }
        self
    }

    /// Restrict the option to a fixed set of values.
    pub fn allowed(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed.extend(values);
        self
    }

    /// Add a predicate that every resolved value must satisfy.
    pub fn check_all(mut self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.check_all.push(Rc::new(f));
        self
    }

    /// Add a predicate to the any-set: at least one must be satisfied.
    pub fn check_any(mut self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.check_any.push(Rc::new(f));
        self
    }

    /// Replace only the default, keeping doc/type/constraints. This is what
    /// a bare value or expression in a declaration set does to an existing
    /// option.
    pub(crate) fn replace_default(&self, default: DefaultValue) -> Self {
        let mut spec = self.clone();
        spec.default = Some(default);
        spec
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn doc_str(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn permitted_kinds(&self) -> &[ValueKind] {
        &self.value_type
    }

    pub fn allowed_values(&self) -> &[Value] {
        &self.allowed
    }

    pub(crate) fn check_all_predicates(&self) -> &[Predicate] {
        &self.check_all
    }

    pub(crate) fn check_any_predicates(&self) -> &[Predicate] {
        &self.check_any
    }

    /// Definition-time consistency check, run when the spec is inserted
    /// into a section.
    pub(crate) fn validate_definition(&self, path: &str) -> Result<()> {
        if !self.allowed.is_empty() && (!self.check_all.is_empty() || !self.check_any.is_empty()) {
            return Err(Error::ConflictingConstraints {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("default", &self.default)
            .field("doc", &self.doc)
            .field("value_type", &self.value_type)
            .field("allowed", &self.allowed)
            .field("check_all", &self.check_all.len())
            .field("check_any", &self.check_any.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_constraints_rejected() {
        let spec = OptionSpec::literal(1)
            .allowed([Value::Int(1), Value::Int(2)])
            .check_all(|v| v.as_int().is_some());

        let err = spec.validate_definition("a").unwrap_err();
        assert!(matches!(err, Error::ConflictingConstraints { path } if path == "a"));
    }

    #[test]
    fn test_allowed_alone_is_fine() {
        let spec = OptionSpec::literal(1).allowed([Value::Int(1)]);
        assert!(spec.validate_definition("a").is_ok());
    }

    #[test]
    fn test_replace_default_keeps_metadata() {
        let spec = OptionSpec::literal(1)
            .doc("an option")
            .value_type(ValueKind::Int);
        let replaced = spec.replace_default(DefaultValue::Literal(Value::Int(5)));

        assert_eq!(replaced.doc_str(), Some("an option"));
        assert_eq!(replaced.permitted_kinds(), &[ValueKind::Int]);
        assert!(matches!(
            replaced.default(),
            Some(DefaultValue::Literal(Value::Int(5)))
        ));
    }
}
