//! End-to-end flows across declaration, file loading, resolution,
//! mutation, and export.

use cfgtree_core::{
    DeclSet, ExportMode, Factory, OptionSpec, SectionSpec, Value, ValueKind, ValueMap,
};
use cfgtree_format::{create_from_path, load_path, save_path};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A small service configuration: a server section whose URL derives from
/// its own host/port, and top-level limits derived from the server section.
fn service_factory() -> Factory {
    let server = SectionSpec::builder()
        .option(
            "host",
            OptionSpec::literal("localhost")
                .doc("bind address")
                .value_type(ValueKind::Str),
        )
        .option(
            "port",
            OptionSpec::literal(8080)
                .doc("bind port")
                .value_type(ValueKind::Int)
                .check_all(cfgtree_core::checks::is_positive),
        )
        .expr("url", |scope| {
            Ok(Value::Str(format!(
                "http://{}:{}",
                scope.get_str("host")?,
                scope.get_int("port")?
            )))
        })
        .build()
        .unwrap();

    Factory::builder()
        .section("server", server)
        .option(
            "workers",
            OptionSpec::literal(4)
                .doc("worker thread count")
                .value_type(ValueKind::Int)
                .check_all(cfgtree_core::checks::is_positive),
        )
        .expr("queue_depth", |scope| {
            Ok(Value::Int(scope.get_int("workers")? * 16))
        })
        .build()
        .unwrap()
}

#[test]
fn test_file_to_resolved_tree() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("service.toml");
    std::fs::write(
        &path,
        r#"
workers = 8

[server]
port = 9000
"#,
    )
    .unwrap();

    let opts = create_from_path(&service_factory(), &path).unwrap();

    assert_eq!(opts.get_int("workers").unwrap(), 8);
    assert_eq!(opts.get_int("queue_depth").unwrap(), 128);

    let server = opts.section("server").unwrap();
    assert_eq!(server.get_str("host").unwrap(), "localhost");
    assert_eq!(server.get_int("port").unwrap(), 9000);
    assert_eq!(server.get_str("url").unwrap(), "http://localhost:9000");
}

#[test]
fn test_mutate_then_save_then_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("service.yaml");

    let factory = service_factory();
    let opts = factory.create_mutable(&ValueMap::new()).unwrap();

    let mut server = opts.section("server").unwrap();
    server.set("host", "0.0.0.0").unwrap();
    server.set("port", 443).unwrap();
    assert_eq!(server.get_str("url").unwrap(), "http://0.0.0.0:443");

    save_path(&path, &opts.to_map(ExportMode::ExplicitOnly).unwrap()).unwrap();

    let reloaded = create_from_path(&factory, &path).unwrap();
    let server = reloaded.section("server").unwrap();
    assert_eq!(server.get_str("url").unwrap(), "http://0.0.0.0:443");
    // only the server writes were persisted; workers stayed default
    let map = load_path(&path).unwrap();
    assert_eq!(map.len(), 1);
    assert!(map.get("workers").is_none());
    assert!(reloaded.is_default("workers").unwrap());
}

#[test]
fn test_extended_factory_resolves_same_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("service.json");
    std::fs::write(&path, r#"{"workers": 2, "burst": 10}"#).unwrap();

    let base = service_factory();
    // the base factory does not know "burst"
    assert!(create_from_path(&base, &path).is_err());

    let extended = base
        .add(
            DeclSet::new().option(
                "burst",
                OptionSpec::literal(0)
                    .doc("burst allowance")
                    .value_type(ValueKind::Int),
            ),
        )
        .unwrap();

    let opts = create_from_path(&extended, &path).unwrap();
    assert_eq!(opts.get_int("burst").unwrap(), 10);
    assert_eq!(opts.get_int("queue_depth").unwrap(), 32);
}

#[test]
fn test_wider_export_feeds_narrower_factory_embedded() {
    let wide = service_factory();
    let opts = wide
        .create(&ValueMap::new().with("workers", 6))
        .unwrap();
    let full = opts.to_map(ExportMode::WithDefaults).unwrap();

    // a narrower factory that only understands the server section
    let narrow = Factory::builder()
        .section(
            "server",
            SectionSpec::builder()
                .value("host", "localhost")
                .value("port", 8080)
                .value("url", "")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    assert!(narrow.create(&full).is_err());
    let embedded = narrow.create_embedded(&full).unwrap();
    assert_eq!(
        embedded.section("server").unwrap().get_int("port").unwrap(),
        8080
    );
}

#[test]
fn test_help_table_covers_nested_options() {
    let table = service_factory().help_table();
    assert!(table.contains("server.port"), "got: {table}");
    assert!(table.contains("bind port"), "got: {table}");
    assert!(table.contains("worker thread count"), "got: {table}");
}
