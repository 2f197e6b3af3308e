//! Hierarchical configuration resolution for cfgtree
//!
//! This crate provides the declaration and resolution engine:
//!
//! - **Declaration**: [`OptionSpec`] leaves (default, type/value
//!   constraints, documentation) arranged in [`SectionSpec`] trees, with
//!   merge and extension composition.
//! - **Resolution**: a [`Factory`] turns a nested override mapping into a
//!   resolved tree. Defaults may be expressions over a [`Scope`], reading
//!   sibling, parent, and subsection values; evaluation is lazy, memoized,
//!   and cycle-checked.
//! - **Mutation**: [`MutableOptions`] trees accept `set`/`delete`, with
//!   dependency-tracked invalidation of every value computed from the
//!   changed option, anywhere in the tree.
//!
//! ```text
//!   Factory ── create ──> Options / MutableOptions
//!      |                        |
//!  SectionSpec             resolved tree (arena)
//!      |                        |
//!  OptionSpec   <── reads ──  Scope (expression evaluation)
//! ```
//!
//! Resolved trees are single-threaded by design (`!Sync`); use
//! `resolve_all` plus `to_map` to hand plain data across threads.
//!
//! # Example
//!
//! ```
//! use cfgtree_core::{Factory, Value, ValueMap};
//!
//! let factory = Factory::builder()
//!     .value("a", 1)
//!     .expr("b", |scope| Ok(Value::Int(scope.get_int("a")? + 5)))
//!     .build()?;
//!
//! let opts = factory.create(&ValueMap::new())?;
//! assert_eq!(opts.get_int("b")?, 6);
//!
//! let opts = factory.create(&ValueMap::new().with("b", 2))?;
//! assert_eq!(opts.get_int("b")?, 2);
//! # Ok::<(), cfgtree_core::Error>(())
//! ```

pub mod checks;
pub mod error;
pub mod factory;
pub mod option;
pub mod options;
pub mod section;
pub mod value;

mod eval;
mod table;
mod tree;
mod validate;

pub use error::{Error, Result};
pub use factory::{Factory, FactoryBuilder};
pub use option::{DefaultValue, Expr, OptionSpec, Predicate};
pub use options::{ExportMode, MutableOptions, Options, Scope};
pub use section::{DeclSet, SectionBuilder, SectionSpec, SpecEntry};
pub use value::{MapValue, Value, ValueKind, ValueMap};
