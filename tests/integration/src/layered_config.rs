//! Layered configuration: several override files applied in order onto one
//! mutable tree, later layers winning, derived values tracking the result.

use cfgtree_core::{MapValue, MutableOptions, SectionSpec, Value, ValueMap};
use cfgtree_format::load_path;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Apply one layer of overrides onto an existing tree, recursing into
/// subsections. Later layers override earlier ones; untouched options keep
/// whatever the earlier layers (or defaults) gave them.
fn apply_layer(opts: &mut MutableOptions, layer: &ValueMap) {
    for (name, entry) in layer.iter() {
        match entry {
            MapValue::Value(value) => opts.set(name, value.clone()).unwrap(),
            MapValue::Map(nested) => {
                let mut section = opts.section(name).unwrap();
                apply_layer(&mut section, nested);
            }
        }
    }
}

fn layered_factory() -> cfgtree_core::Factory {
    cfgtree_core::Factory::builder()
        .value("mode", "standard")
        .section(
            "cache",
            SectionSpec::builder()
                .value("size_mb", 64)
                .expr("shard_mb", |scope| {
                    Ok(Value::Int(scope.get_int("size_mb")? / 4))
                })
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

#[test]
fn test_later_layers_override_earlier_ones() {
    let dir = TempDir::new().unwrap();

    let base = dir.path().join("base.toml");
    std::fs::write(
        &base,
        r#"
mode = "standard"

[cache]
size_mb = 128
"#,
    )
    .unwrap();

    let local = dir.path().join("local.toml");
    std::fs::write(
        &local,
        r#"
[cache]
size_mb = 256
"#,
    )
    .unwrap();

    let factory = layered_factory();
    let mut opts = factory.create_mutable(&ValueMap::new()).unwrap();

    for path in [&base, &local] {
        let layer = load_path(path).unwrap();
        apply_layer(&mut opts, &layer);
    }

    // the local layer wins for the value it names
    let cache = opts.section("cache").unwrap();
    assert_eq!(cache.get_int("size_mb").unwrap(), 256);
    // the derived shard size follows the final layer
    assert_eq!(cache.get_int("shard_mb").unwrap(), 64);
    // options only the base layer set survive
    assert_eq!(opts.get_str("mode").unwrap(), "standard");
}

#[test]
fn test_missing_layers_are_skipped() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("base.toml");
    std::fs::write(&base, "[cache]\nsize_mb = 32\n").unwrap();

    let factory = layered_factory();
    let mut opts = factory.create_mutable(&ValueMap::new()).unwrap();

    let candidates = [base, dir.path().join("absent.toml")];
    for path in &candidates {
        if !path.is_file() {
            continue;
        }
        let layer = load_path(path).unwrap();
        apply_layer(&mut opts, &layer);
    }

    let cache = opts.section("cache").unwrap();
    assert_eq!(cache.get_int("shard_mb").unwrap(), 8);
}
