//! Section declarations and composition
//!
//! A [`SectionSpec`] is an ordered tree of named options and nested
//! sections. Sections are built once, from a [`SectionBuilder`], and are
//! immutable afterwards; composition (`extend`, multi-source union) always
//! produces a new spec. Nested sections are reference-counted so that
//! unchanged subtrees are shared between composed specs.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::option::{DefaultValue, Expr, OptionSpec};
use crate::options::Scope;
use crate::value::Value;

/// One child of a section: a leaf option or a nested section.
#[derive(Debug, Clone)]
pub enum SpecEntry {
    Option(OptionSpec),
    Section(Rc<SectionSpec>),
}

/// An ordered, named tree of option declarations.
#[derive(Debug, Clone, Default)]
pub struct SectionSpec {
    entries: Vec<(String, SpecEntry)>,
}

impl SectionSpec {
    pub fn builder() -> SectionBuilder {
        SectionBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&SpecEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, e)| e)
    }

    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        match self.get(name) {
            Some(SpecEntry::Option(spec)) => Some(spec),
            _ => None,
        }
    }

    pub fn section(&self, name: &str) -> Option<&Rc<SectionSpec>> {
        match self.get(name) {
            Some(SpecEntry::Section(section)) => Some(section),
            _ => None,
        }
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpecEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Names of leaf options, in declaration order.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(k, e)| match e {
            SpecEntry::Option(_) => Some(k.as_str()),
            SpecEntry::Section(_) => None,
        })
    }

    /// Names of nested sections, in declaration order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(k, e)| match e {
            SpecEntry::Section(_) => Some(k.as_str()),
            SpecEntry::Option(_) => None,
        })
    }

    fn insert(&mut self, name: String, entry: SpecEntry) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = entry;
        } else {
            self.entries.push((name, entry));
        }
    }

    /// Apply a declaration set, producing a new spec.
    ///
    /// Bare defaults (value, expression, reference) on an existing option
    /// replace only its default and keep doc/type/constraints; a full
    /// [`OptionSpec`] replaces the option wholesale; nested declaration
    /// sets recurse into existing sections. New names create new entries.
    /// Replacing an existing entry with a whole section (or turning a
    /// section into an option) is a definition error.
    pub fn extend(&self, decls: &DeclSet) -> Result<SectionSpec> {
        self.extend_at(decls, "")
    }

    fn extend_at(&self, decls: &DeclSet, prefix: &str) -> Result<SectionSpec> {
        decls.check_duplicates(prefix)?;

        let mut spec = self.clone();
        for (name, decl) in &decls.entries {
            let path = join_path(prefix, name);
            let existing = spec.get(name).cloned();
            let entry = match (existing, decl) {
                (None, Decl::Default(default)) => {
                    SpecEntry::Option(OptionSpec::from_default(default.clone()))
                }
                (None, Decl::Spec(option)) => {
                    option.validate_definition(&path)?;
                    SpecEntry::Option(option.clone())
                }
                (None, Decl::Section(section)) => SpecEntry::Section(Rc::new(section.clone())),
                (None, Decl::Nested(nested)) => SpecEntry::Section(Rc::new(
                    SectionSpec::default().extend_at(nested, &path)?,
                )),
                (Some(SpecEntry::Option(option)), Decl::Default(default)) => {
                    SpecEntry::Option(option.replace_default(default.clone()))
                }
                (Some(SpecEntry::Option(_)), Decl::Spec(option)) => {
                    option.validate_definition(&path)?;
                    SpecEntry::Option(option.clone())
                }
                (Some(SpecEntry::Section(section)), Decl::Nested(nested)) => {
                    SpecEntry::Section(Rc::new(section.extend_at(nested, &path)?))
                }
                // A whole section can never silently displace an existing
                // entry, and an option declaration can never displace a
                // section: either would discard metadata the caller did not
                // mention.
                (Some(_), Decl::Section(_))
                | (Some(SpecEntry::Section(_)), Decl::Default(_))
                | (Some(SpecEntry::Section(_)), Decl::Spec(_)) => {
                    return Err(Error::SectionReplaced { path });
                }
                (Some(SpecEntry::Option(_)), Decl::Nested(_)) => {
                    return Err(Error::NotASection { path });
                }
            };
            spec.insert(name.clone(), entry);
        }
        Ok(spec)
    }

    /// Union several sections: entries of later sources replace same-named
    /// entries of earlier ones wholesale. Documented policy, not an error.
    pub fn union<'a>(sources: impl IntoIterator<Item = &'a SectionSpec>) -> SectionSpec {
        let mut spec = SectionSpec::default();
        for source in sources {
            for (name, entry) in &source.entries {
                spec.insert(name.clone(), entry.clone());
            }
        }
        spec
    }
}

/// A single named declaration inside a [`DeclSet`].
#[derive(Clone)]
enum Decl {
    /// A bare default: replaces only the default of an existing option.
    Default(DefaultValue),
    /// A full spec: replaces an existing option including its metadata.
    Spec(OptionSpec),
    /// A new nested section.
    Section(SectionSpec),
    /// Declarations applied inside an existing (or new) nested section.
    Nested(DeclSet),
}

/// An ordered set of named declarations, used to build sections and to
/// extend factories.
#[derive(Clone, Default)]
pub struct DeclSet {
    entries: Vec<(String, Decl)>,
}

impl DeclSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declare an option with a literal default.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((
            name.into(),
            Decl::Default(DefaultValue::Literal(value.into())),
        ));
        self
    }

    /// Declare an option with an expression default.
    pub fn expr(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Scope<'_>) -> Result<Value> + 'static,
    ) -> Self {
        self.entries.push((
            name.into(),
            Decl::Default(DefaultValue::Expr(Rc::new(f) as Expr)),
        ));
        self
    }

    /// Declare an option defaulting to another option's value.
    pub fn reference(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries.push((
            name.into(),
            Decl::Default(DefaultValue::Reference(target.into())),
        ));
        self
    }

    /// Declare an option with full metadata.
    pub fn option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.entries.push((name.into(), Decl::Spec(spec)));
        self
    }

    /// Declare a new nested section.
    pub fn section(mut self, name: impl Into<String>, section: SectionSpec) -> Self {
        self.entries.push((name.into(), Decl::Section(section)));
        self
    }

    /// Declare updates applied inside a nested section (created if absent).
    pub fn update(mut self, name: impl Into<String>, decls: DeclSet) -> Self {
        self.entries.push((name.into(), Decl::Nested(decls)));
        self
    }

    fn check_duplicates(&self, prefix: &str) -> Result<()> {
        for (i, (name, _)) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|(k, _)| k == name) {
                return Err(Error::DuplicateName {
                    section: if prefix.is_empty() {
                        "<root>".to_string()
                    } else {
                        prefix.to_string()
                    },
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Builds a [`SectionSpec`] from merge sources and explicit declarations.
///
/// Sources are unioned first, in order, with later sources winning on name
/// collision. Explicit declarations are applied on top with the same rules
/// as [`SectionSpec::extend`], so a bare value declared over a sourced
/// option keeps the sourced metadata.
#[derive(Clone, Default)]
pub struct SectionBuilder {
    sources: Vec<SectionSpec>,
    decls: DeclSet,
}

impl SectionBuilder {
    /// Add a merge source. Later sources win on name collision.
    pub fn source(mut self, section: &SectionSpec) -> Self {
        self.sources.push(section.clone());
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.decls = self.decls.value(name, value);
        self
    }

    pub fn expr(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Scope<'_>) -> Result<Value> + 'static,
    ) -> Self {
        self.decls = self.decls.expr(name, f);
        self
    }

    pub fn reference(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.decls = self.decls.reference(name, target);
        self
    }

    pub fn option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.decls = self.decls.option(name, spec);
        self
    }

    pub fn section(mut self, name: impl Into<String>, section: SectionSpec) -> Self {
        self.decls = self.decls.section(name, section);
        self
    }

    pub fn update(mut self, name: impl Into<String>, decls: DeclSet) -> Self {
        self.decls = self.decls.update(name, decls);
        self
    }

    pub fn build(self) -> Result<SectionSpec> {
        SectionSpec::union(self.sources.iter()).extend(&self.decls)
    }
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
