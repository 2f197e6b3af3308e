//! Resolved-tree storage
//!
//! A resolved tree is a flat arena of nodes mirroring the spec tree 1:1.
//! The root owns every node; parent links are non-owning indices, so the
//! parent/child cycle that a pointer-based tree would create never exists.
//! The full skeleton is built before anything is evaluated, which lets
//! default expressions navigate the whole tree from the start.
//!
//! Per-node caches live behind `RefCell`s: resolution is lazy and memoizes
//! through shared references, and mutation invalidates through the
//! dependency graph owned by [`EvalState`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::section::{SectionSpec, SpecEntry, join_path};
use crate::validate::validate;
use crate::value::{MapValue, Value, ValueMap};

pub(crate) type NodeId = usize;

/// Identifies one option slot in the tree: (owning node, option name).
pub(crate) type Key = (NodeId, String);

pub(crate) struct NodeData {
    pub(crate) spec: Rc<SectionSpec>,
    pub(crate) parent: Option<NodeId>,
    /// Dotted path of this node from the root; empty for the root itself.
    pub(crate) path: String,
    /// Child subsections, in declaration order.
    pub(crate) children: Vec<(String, NodeId)>,
    /// Explicit user-supplied values for this node's options.
    pub(crate) raw: RefCell<HashMap<String, Value>>,
    /// Lazily resolved values. A failing value is never stored here.
    pub(crate) cache: RefCell<HashMap<String, Value>>,
}

/// Evaluation context owned by the tree root: the in-progress stack used
/// for cycle detection, and the dependency graph used for invalidation.
#[derive(Default)]
pub(crate) struct EvalState {
    /// (node, option) pairs currently mid-evaluation, outermost first.
    pub(crate) stack: Vec<Key>,
    /// dependency -> options whose cached value was computed by reading it.
    pub(crate) dependents: HashMap<Key, HashSet<Key>>,
    /// consumer -> options it read while its value was being computed.
    pub(crate) dependencies: HashMap<Key, HashSet<Key>>,
}

impl EvalState {
    /// Record a read performed while an evaluation frame is active.
    /// Called on every option read, cache hit or miss, so edges exist for
    /// whatever mix of raw, literal, and derived values produced a result.
    pub(crate) fn record_read(&mut self, key: &Key) {
        if let Some(consumer) = self.stack.last() {
            if consumer == key {
                return;
            }
            self.dependents
                .entry(key.clone())
                .or_default()
                .insert(consumer.clone());
            self.dependencies
                .entry(consumer.clone())
                .or_default()
                .insert(key.clone());
        }
    }
}

pub(crate) struct Tree {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) eval: RefCell<EvalState>,
}

pub(crate) const ROOT: NodeId = 0;

impl Tree {
    /// Build the full node skeleton and store raw overrides, evaluating
    /// nothing. Unknown override keys fail unless `embedded`; overrides
    /// whose shape disagrees with the spec (a mapping for an option, a
    /// scalar for a section) fail in both modes.
    pub(crate) fn build(
        spec: Rc<SectionSpec>,
        overrides: &ValueMap,
        embedded: bool,
    ) -> Result<Tree> {
        let mut tree = Tree {
            nodes: Vec::new(),
            eval: RefCell::new(EvalState::default()),
        };
        tree.build_node(spec, None, String::new(), Some(overrides), embedded)?;
        tracing::debug!(nodes = tree.nodes.len(), "built resolved-tree skeleton");
        Ok(tree)
    }

    fn build_node(
        &mut self,
        spec: Rc<SectionSpec>,
        parent: Option<NodeId>,
        path: String,
        overrides: Option<&ValueMap>,
        embedded: bool,
    ) -> Result<NodeId> {
        let mut raw = HashMap::new();
        if let Some(overrides) = overrides {
            for (key, entry) in overrides.iter() {
                let child_path = join_path(&path, key);
                match (spec.get(key), entry) {
                    (None, _) => {
                        if embedded {
                            tracing::debug!(
                                key = %child_path,
                                "ignoring unknown override key (embedded mode)"
                            );
                        } else {
                            return Err(Error::UnknownOption { path: child_path });
                        }
                    }
                    (Some(SpecEntry::Option(_)), MapValue::Value(value)) => {
                        raw.insert(key.to_string(), value.clone());
                    }
                    (Some(SpecEntry::Option(_)), MapValue::Map(_)) => {
                        return Err(Error::NotASection { path: child_path });
                    }
                    (Some(SpecEntry::Section(_)), MapValue::Value(_)) => {
                        return Err(Error::NotAnOption { path: child_path });
                    }
                    // Section overrides are handled in the recursion below.
                    (Some(SpecEntry::Section(_)), MapValue::Map(_)) => {}
                }
            }
        }

        let id = self.nodes.len();
        self.nodes.push(NodeData {
            spec: spec.clone(),
            parent,
            path: path.clone(),
            children: Vec::new(),
            raw: RefCell::new(raw),
            cache: RefCell::new(HashMap::new()),
        });

        let mut children = Vec::new();
        for (name, entry) in spec.iter() {
            if let SpecEntry::Section(child_spec) = entry {
                let child_overrides = overrides.and_then(|o| match o.get(name) {
                    Some(MapValue::Map(map)) => Some(map),
                    _ => None,
                });
                let child_id = self.build_node(
                    child_spec.clone(),
                    Some(id),
                    join_path(&path, name),
                    child_overrides,
                    embedded,
                )?;
                children.push((name.to_string(), child_id));
            }
        }
        self.nodes[id].children = children;
        Ok(id)
    }

    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }

    pub(crate) fn key_path(&self, key: &Key) -> String {
        join_path(&self.nodes[key.0].path, &key.1)
    }

    pub(crate) fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, c)| *c)
    }

    /// Replace the raw override for an option, after eager validation.
    /// Nothing changes when validation fails.
    pub(crate) fn set_raw(&self, node: NodeId, name: &str, value: Value) -> Result<()> {
        let data = self.node(node);
        let path = join_path(&data.path, name);
        let spec = match data.spec.get(name) {
            None => return Err(Error::UnknownOption { path }),
            Some(SpecEntry::Section(_)) => return Err(Error::NotAnOption { path }),
            Some(SpecEntry::Option(spec)) => spec,
        };
        validate(&value, spec, &path)?;
        tracing::debug!(path = %path, value = %value, "set option override");
        data.raw.borrow_mut().insert(name.to_string(), value);
        self.invalidate((node, name.to_string()));
        Ok(())
    }

    /// Remove the raw override for an option, reverting it to its default.
    /// Deleting a declared but never-set option changes nothing.
    pub(crate) fn delete_raw(&self, node: NodeId, name: &str) -> Result<()> {
        let data = self.node(node);
        let path = join_path(&data.path, name);
        match data.spec.get(name) {
            None => return Err(Error::UnknownOption { path }),
            Some(SpecEntry::Section(_)) => return Err(Error::NotAnOption { path }),
            Some(SpecEntry::Option(_)) => {}
        }
        if data.raw.borrow_mut().remove(name).is_some() {
            tracing::debug!(path = %path, "cleared option override");
            self.invalidate((node, name.to_string()));
        }
        Ok(())
    }

    /// Clear the cached value for `start` and, transitively, for every
    /// option whose cached value was computed by reading it — anywhere in
    /// the tree, since expressions can read through `parent` into sibling
    /// subtrees. Cleared entries drop their recorded dependency edges; the
    /// edges are re-recorded when the entries are next evaluated.
    pub(crate) fn invalidate(&self, start: Key) {
        let mut queue = vec![start];
        let mut seen: HashSet<Key> = HashSet::new();
        let mut cleared = 0usize;
        while let Some(key) = queue.pop() {
            if !seen.insert(key.clone()) {
                continue;
            }
            if self.nodes[key.0].cache.borrow_mut().remove(&key.1).is_some() {
                cleared += 1;
            }
            let mut eval = self.eval.borrow_mut();
            if let Some(consumers) = eval.dependents.remove(&key) {
                queue.extend(consumers);
            }
            if let Some(deps) = eval.dependencies.remove(&key) {
                for dep in deps {
                    if let Some(consumers) = eval.dependents.get_mut(&dep) {
                        consumers.remove(&key);
                    }
                }
            }
        }
        tracing::debug!(cleared, "invalidated cached option values");
    }
}
