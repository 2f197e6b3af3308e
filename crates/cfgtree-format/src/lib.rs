//! Text-format collaborators for cfgtree
//!
//! Thin I/O wrappers around the core's mapping-based contract: parse
//! TOML/YAML/JSON text into the nested override mapping that
//! `Factory::create` consumes, and serialize exported mappings back to
//! text. No resolution logic lives here.
//!
//! # Example
//!
//! ```
//! use cfgtree_core::{Factory, Value, ValueMap};
//! use cfgtree_format::{from_toml_str, to_toml_string};
//!
//! let factory = Factory::builder()
//!     .value("workers", 4)
//!     .expr("burst", |scope| Ok(Value::Int(scope.get_int("workers")? * 2)))
//!     .build()?;
//!
//! let overrides = from_toml_str("workers = 8\n")?;
//! let opts = factory.create(&overrides)?;
//! assert_eq!(opts.get_int("burst")?, 16);
//!
//! let saved = to_toml_string(&opts.to_map(cfgtree_core::ExportMode::ExplicitOnly)?)?;
//! assert_eq!(saved.trim(), "workers = 8");
//! # Ok::<(), cfgtree_format::Error>(())
//! ```

pub mod error;
pub mod format;
pub mod load;
pub mod save;

pub use error::{Error, Result};
pub use format::Format;
pub use load::{from_json_str, from_toml_str, from_yaml_str, load_path};
pub use save::{save_path, to_json_string, to_toml_string, to_yaml_string};

use std::path::Path;

use cfgtree_core::{Factory, MutableOptions, Options};

/// Create an immutable resolved tree from a configuration file.
pub fn create_from_path(factory: &Factory, path: impl AsRef<Path>) -> Result<Options> {
    Ok(factory.create(&load_path(path)?)?)
}

/// Create a mutable resolved tree from a configuration file.
pub fn create_mutable_from_path(
    factory: &Factory,
    path: impl AsRef<Path>,
) -> Result<MutableOptions> {
    Ok(factory.create_mutable(&load_path(path)?)?)
}
