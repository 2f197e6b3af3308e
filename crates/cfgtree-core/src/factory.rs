//! Factory: entry point wrapping a root section spec
//!
//! A factory is built once and reused; every `create*` call produces an
//! independent resolved tree against the same spec. `add` derives a more
//! specific factory without touching the original.

use std::rc::Rc;

use crate::error::Result;
use crate::option::OptionSpec;
use crate::options::{MutableOptions, Options, Scope};
use crate::section::{DeclSet, SectionBuilder, SectionSpec};
use crate::table;
use crate::tree::{ROOT, Tree};
use crate::value::{Value, ValueMap};

/// Factory for resolved configuration trees.
#[derive(Debug, Clone)]
pub struct Factory {
    root: Rc<SectionSpec>,
}

impl Factory {
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::default()
    }

    /// Wrap an already-built section spec.
    pub fn from_section(spec: SectionSpec) -> Self {
        Self {
            root: Rc::new(spec),
        }
    }

    /// The root section spec this factory resolves against.
    pub fn root(&self) -> &SectionSpec {
        &self.root
    }

    pub fn contains(&self, name: &str) -> bool {
        self.root.contains(name)
    }

    /// Documentation for a top-level option.
    pub fn doc(&self, name: &str) -> Option<&str> {
        self.root.option(name)?.doc_str()
    }

    /// Derive a new factory with the declarations applied on top: bare
    /// defaults keep existing metadata, full specs replace it, nested sets
    /// recurse into sections, and new names add options or sections.
    pub fn add(&self, decls: DeclSet) -> Result<Factory> {
        Ok(Factory::from_section(self.root.extend(&decls)?))
    }

    /// Create an immutable resolved tree. Unknown override keys fail.
    pub fn create(&self, overrides: &ValueMap) -> Result<Options> {
        let tree = Tree::build(Rc::clone(&self.root), overrides, false)?;
        Ok(Options::new(Rc::new(tree), ROOT))
    }

    /// Create an immutable resolved tree, silently ignoring unknown
    /// override keys. For re-parsing a wider tree's values with a
    /// narrower factory.
    pub fn create_embedded(&self, overrides: &ValueMap) -> Result<Options> {
        let tree = Tree::build(Rc::clone(&self.root), overrides, true)?;
        Ok(Options::new(Rc::new(tree), ROOT))
    }

    /// Create a mutable resolved tree. Unknown override keys fail.
    pub fn create_mutable(&self, overrides: &ValueMap) -> Result<MutableOptions> {
        let tree = Tree::build(Rc::clone(&self.root), overrides, false)?;
        Ok(MutableOptions::new(Rc::new(tree), ROOT))
    }

    /// Create a mutable resolved tree, silently ignoring unknown override
    /// keys.
    pub fn create_mutable_embedded(&self, overrides: &ValueMap) -> Result<MutableOptions> {
        let tree = Tree::build(Rc::clone(&self.root), overrides, true)?;
        Ok(MutableOptions::new(Rc::new(tree), ROOT))
    }

    /// Documentation table of every option with its evaluated default.
    /// Defaults that cannot be evaluated standalone show as `(required)`.
    pub fn help_table(&self) -> String {
        match Tree::build(Rc::clone(&self.root), &ValueMap::new(), false) {
            Ok(tree) => table::help_table(&tree),
            Err(_) => String::new(),
        }
    }
}

/// Builds a [`Factory`] from merge sources and named declarations; see
/// [`SectionSpec::builder`] for the underlying rules.
#[derive(Clone, Default)]
pub struct FactoryBuilder {
    inner: SectionBuilder,
}

impl FactoryBuilder {
    /// Merge in an existing section spec; later sources win on collision.
    pub fn source(mut self, section: &SectionSpec) -> Self {
        self.inner = self.inner.source(section);
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner = self.inner.value(name, value);
        self
    }

    pub fn expr(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Scope<'_>) -> Result<Value> + 'static,
    ) -> Self {
        self.inner = self.inner.expr(name, f);
        self
    }

    pub fn reference(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.inner = self.inner.reference(name, target);
        self
    }

    pub fn option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.inner = self.inner.option(name, spec);
        self
    }

    pub fn section(mut self, name: impl Into<String>, section: SectionSpec) -> Self {
        self.inner = self.inner.section(name, section);
        self
    }

    pub fn update(mut self, name: impl Into<String>, decls: DeclSet) -> Self {
        self.inner = self.inner.update(name, decls);
        self
    }

    pub fn build(self) -> Result<Factory> {
        Ok(Factory::from_section(self.inner.build()?))
    }
}
