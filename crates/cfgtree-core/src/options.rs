//! Public read/write surface over a resolved tree
//!
//! Three views share the same arena:
//!
//! - [`Scope`] — borrowed view handed to default expressions; navigation
//!   plus reads, with reads recorded as dependency edges.
//! - [`Options`] — owning immutable view; reads only, so a cached value
//!   never changes once computed.
//! - [`MutableOptions`] — owning view adding `set`/`delete` with
//!   tree-wide, dependency-driven cache invalidation.
//!
//! All lookups are case-sensitive. Values resolve lazily on first read.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::section::{SpecEntry, join_path};
use crate::table;
use crate::tree::{NodeId, Tree};
use crate::value::{Value, ValueKind, ValueMap};

/// Which values an export includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Every option, resolving defaults as needed.
    WithDefaults,
    /// Only explicitly-set values; subsections with none are pruned.
    ExplicitOnly,
}

/// The node a default expression is evaluated against: the option's
/// position in the *current* tree, not where its spec was declared.
pub struct Scope<'a> {
    tree: &'a Tree,
    node: NodeId,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(tree: &'a Tree, node: NodeId) -> Self {
        Self { tree, node }
    }

    /// Resolve an option on this node, recording a dependency edge.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.tree.resolve(self.node, name)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        expect_bool(&self.path_of(name), self.get(name)?)
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        expect_int(&self.path_of(name), self.get(name)?)
    }

    pub fn get_float(&self, name: &str) -> Result<f64> {
        expect_float(&self.path_of(name), self.get(name)?)
    }

    /// Numeric read: accepts `Int` or `Float`, widening to `f64`.
    pub fn get_number(&self, name: &str) -> Result<f64> {
        expect_number(&self.path_of(name), self.get(name)?)
    }

    pub fn get_str(&self, name: &str) -> Result<String> {
        expect_str(&self.path_of(name), self.get(name)?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tree.node(self.node).spec.contains(name)
    }

    /// Enter a subsection of this node.
    pub fn section(&self, name: &str) -> Result<Scope<'a>> {
        section_id(self.tree, self.node, name).map(|node| Scope::new(self.tree, node))
    }

    /// The enclosing node; fails at the root.
    pub fn parent(&self) -> Result<Scope<'a>> {
        match self.tree.node(self.node).parent {
            Some(parent) => Ok(Scope::new(self.tree, parent)),
            None => Err(Error::NoParent),
        }
    }

    fn path_of(&self, name: &str) -> String {
        join_path(&self.tree.node(self.node).path, name)
    }
}

/// Immutable resolved configuration tree.
///
/// Produced by `Factory::create`. Reads resolve lazily and are memoized;
/// there is no mutation surface, so a value observed once is stable for
/// the life of the tree.
pub struct Options {
    tree: Rc<Tree>,
    node: NodeId,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options").field("node", &self.node).finish()
    }
}

impl Options {
    pub(crate) fn new(tree: Rc<Tree>, node: NodeId) -> Self {
        Self { tree, node }
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.tree.resolve(self.node, name)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        expect_bool(&self.path_of(name), self.get(name)?)
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        expect_int(&self.path_of(name), self.get(name)?)
    }

    pub fn get_float(&self, name: &str) -> Result<f64> {
        expect_float(&self.path_of(name), self.get(name)?)
    }

    pub fn get_number(&self, name: &str) -> Result<f64> {
        expect_number(&self.path_of(name), self.get(name)?)
    }

    pub fn get_str(&self, name: &str) -> Result<String> {
        expect_str(&self.path_of(name), self.get(name)?)
    }

    /// Whether `name` is a declared option or subsection of this node.
    pub fn contains(&self, name: &str) -> bool {
        self.tree.node(self.node).spec.contains(name)
    }

    /// Number of declared entries (options and subsections).
    pub fn len(&self) -> usize {
        self.tree.node(self.node).spec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.node(self.node).spec.is_empty()
    }

    /// Declared names, options and subsections, in declaration order.
    pub fn keys<'a>(&'a self) -> impl Iterator<Item = &'a str> + 'a {
        self.tree.node(self.node).spec.iter().map(|(name, _)| name)
    }

    /// Iterate this node's options in declaration order, resolving each.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a str, Result<Value>)> + 'a {
        let tree = &*self.tree;
        let node = self.node;
        tree.node(node)
            .spec
            .option_names()
            .map(move |name| (name, tree.resolve(node, name)))
    }

    /// Iterate this node's subsections in declaration order.
    pub fn sections<'a>(&'a self) -> impl Iterator<Item = (&'a str, Options)> + 'a {
        let tree = Rc::clone(&self.tree);
        self.tree
            .node(self.node)
            .children
            .iter()
            .map(move |(name, id)| (name.as_str(), Options::new(Rc::clone(&tree), *id)))
    }

    pub fn section(&self, name: &str) -> Result<Options> {
        section_id(&self.tree, self.node, name)
            .map(|node| Options::new(Rc::clone(&self.tree), node))
    }

    pub fn parent(&self) -> Option<Options> {
        self.tree
            .node(self.node)
            .parent
            .map(|parent| Options::new(Rc::clone(&self.tree), parent))
    }

    /// Documentation for an option of this node, if any.
    pub fn doc(&self, name: &str) -> Option<&str> {
        self.tree.node(self.node).spec.option(name)?.doc_str()
    }

    /// Documentation view over this node's options, in declaration order.
    pub fn docs<'a>(&'a self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> + 'a {
        let spec = &self.tree.node(self.node).spec;
        spec.iter().filter_map(|(name, entry)| match entry {
            SpecEntry::Option(option) => Some((name, option.doc_str())),
            SpecEntry::Section(_) => None,
        })
    }

    /// Whether the option's value comes from its spec default rather than
    /// an explicit override. Resolves the option first, so a constraint
    /// failure surfaces here too.
    pub fn is_default(&self, name: &str) -> Result<bool> {
        is_default(&self.tree, self.node, name)
    }

    /// Force evaluation of every option in this subtree.
    pub fn resolve_all(&self) -> Result<()> {
        resolve_subtree(&self.tree, self.node)
    }

    /// Export this subtree as a nested mapping.
    pub fn to_map(&self, mode: ExportMode) -> Result<ValueMap> {
        export(&self.tree, self.node, mode)
    }

    /// Plain-text table of this subtree's options and values.
    pub fn render_table(&self) -> Result<String> {
        table::options_table(&self.tree, self.node)
    }

    fn path_of(&self, name: &str) -> String {
        join_path(&self.tree.node(self.node).path, name)
    }
}

/// Mutable resolved configuration tree.
///
/// Produced by `Factory::create_mutable`. Adds `set`/`delete`; a write
/// invalidates the written option's cached value and, transitively, every
/// cached value computed from it anywhere in the tree.
pub struct MutableOptions {
    tree: Rc<Tree>,
    node: NodeId,
}

impl MutableOptions {
    pub(crate) fn new(tree: Rc<Tree>, node: NodeId) -> Self {
        Self { tree, node }
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.tree.resolve(self.node, name)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        expect_bool(&self.path_of(name), self.get(name)?)
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        expect_int(&self.path_of(name), self.get(name)?)
    }

    pub fn get_float(&self, name: &str) -> Result<f64> {
        expect_float(&self.path_of(name), self.get(name)?)
    }

    pub fn get_number(&self, name: &str) -> Result<f64> {
        expect_number(&self.path_of(name), self.get(name)?)
    }

    pub fn get_str(&self, name: &str) -> Result<String> {
        expect_str(&self.path_of(name), self.get(name)?)
    }

    /// Validate eagerly, then store an explicit override and invalidate
    /// the option along with everything computed from it. A failed
    /// validation leaves raw values and caches untouched.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.tree.set_raw(self.node, name, value.into())
    }

    /// Remove an explicit override, reverting the option to its spec
    /// default, with the same invalidation cascade as [`set`](Self::set).
    /// Deleting a never-set option is a no-op.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.tree.delete_raw(self.node, name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tree.node(self.node).spec.contains(name)
    }

    pub fn len(&self) -> usize {
        self.tree.node(self.node).spec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.node(self.node).spec.is_empty()
    }

    pub fn keys<'a>(&'a self) -> impl Iterator<Item = &'a str> + 'a {
        self.tree.node(self.node).spec.iter().map(|(name, _)| name)
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a str, Result<Value>)> + 'a {
        let tree = &*self.tree;
        let node = self.node;
        tree.node(node)
            .spec
            .option_names()
            .map(move |name| (name, tree.resolve(node, name)))
    }

    pub fn section(&self, name: &str) -> Result<MutableOptions> {
        section_id(&self.tree, self.node, name)
            .map(|node| MutableOptions::new(Rc::clone(&self.tree), node))
    }

    pub fn parent(&self) -> Option<MutableOptions> {
        self.tree
            .node(self.node)
            .parent
            .map(|parent| MutableOptions::new(Rc::clone(&self.tree), parent))
    }

    pub fn doc(&self, name: &str) -> Option<&str> {
        self.tree.node(self.node).spec.option(name)?.doc_str()
    }

    pub fn is_default(&self, name: &str) -> Result<bool> {
        is_default(&self.tree, self.node, name)
    }

    pub fn resolve_all(&self) -> Result<()> {
        resolve_subtree(&self.tree, self.node)
    }

    pub fn to_map(&self, mode: ExportMode) -> Result<ValueMap> {
        export(&self.tree, self.node, mode)
    }

    pub fn render_table(&self) -> Result<String> {
        table::options_table(&self.tree, self.node)
    }

    fn path_of(&self, name: &str) -> String {
        join_path(&self.tree.node(self.node).path, name)
    }
}

fn section_id(tree: &Tree, node: NodeId, name: &str) -> Result<NodeId> {
    let data = tree.node(node);
    let path = join_path(&data.path, name);
    match data.spec.get(name) {
        None => Err(Error::UnknownOption { path }),
        Some(SpecEntry::Option(_)) => Err(Error::NotASection { path }),
        Some(SpecEntry::Section(_)) => tree
            .child(node, name)
            .ok_or(Error::UnknownOption { path }),
    }
}

fn is_default(tree: &Tree, node: NodeId, name: &str) -> Result<bool> {
    tree.resolve(node, name)?;
    Ok(!tree.node(node).raw.borrow().contains_key(name))
}

fn resolve_subtree(tree: &Tree, node: NodeId) -> Result<()> {
    let data = tree.node(node);
    for name in data.spec.option_names() {
        tree.resolve(node, name)?;
    }
    for (_, child) in &data.children {
        resolve_subtree(tree, *child)?;
    }
    Ok(())
}

fn export(tree: &Tree, node: NodeId, mode: ExportMode) -> Result<ValueMap> {
    let mut map = ValueMap::new();
    let data = tree.node(node);
    for (name, entry) in data.spec.iter() {
        match entry {
            SpecEntry::Option(_) => {
                let explicit = data.raw.borrow().contains_key(name);
                if mode == ExportMode::WithDefaults || explicit {
                    map.insert(name, tree.resolve(node, name)?);
                }
            }
            SpecEntry::Section(_) => {
                let Some(child) = tree.child(node, name) else {
                    continue;
                };
                let sub = export(tree, child, mode)?;
                if mode == ExportMode::WithDefaults || !sub.is_empty() {
                    map.insert(name, sub);
                }
            }
        }
    }
    Ok(map)
}

pub(crate) fn expect_bool(path: &str, value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(mismatch(path, ValueKind::Bool, other)),
    }
}

pub(crate) fn expect_int(path: &str, value: Value) -> Result<i64> {
    match value {
        Value::Int(i) => Ok(i),
        other => Err(mismatch(path, ValueKind::Int, other)),
    }
}

pub(crate) fn expect_float(path: &str, value: Value) -> Result<f64> {
    match value {
        Value::Float(x) => Ok(x),
        other => Err(mismatch(path, ValueKind::Float, other)),
    }
}

pub(crate) fn expect_number(path: &str, value: Value) -> Result<f64> {
    match value {
        Value::Int(i) => Ok(i as f64),
        Value::Float(x) => Ok(x),
        other => Err(Error::TypeMismatch {
            path: path.to_string(),
            expected: vec![ValueKind::Int, ValueKind::Float],
            value: other,
        }),
    }
}

pub(crate) fn expect_str(path: &str, value: Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(mismatch(path, ValueKind::Str, other)),
    }
}

fn mismatch(path: &str, expected: ValueKind, value: Value) -> Error {
    Error::TypeMismatch {
        path: path.to_string(),
        expected: vec![expected],
        value,
    }
}
