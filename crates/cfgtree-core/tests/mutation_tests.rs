//! Tests for mutable trees: set/delete and dependency-driven invalidation

use std::cell::Cell;
use std::rc::Rc;

use cfgtree_core::{Error, Factory, OptionSpec, SectionSpec, Value, ValueKind, ValueMap};
use pretty_assertions::assert_eq;

fn scenario_factory() -> Factory {
    Factory::builder()
        .value("a", 1)
        .expr("b", |scope| Ok(Value::Int(scope.get_int("a")? + 5)))
        .build()
        .unwrap()
}

/// Opt into log output with e.g. RUST_LOG=cfgtree_core=debug.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn test_set_updates_dependent_expression() {
    let mut opts = scenario_factory().create_mutable(&ValueMap::new()).unwrap();

    assert_eq!(opts.get_int("b").unwrap(), 6);
    opts.set("a", 10).unwrap();
    assert_eq!(opts.get_int("a").unwrap(), 10);
    assert_eq!(opts.get_int("b").unwrap(), 15);
}

#[test]
fn test_delete_reverts_to_default_with_cascade() {
    let mut opts = scenario_factory().create_mutable(&ValueMap::new()).unwrap();

    opts.set("a", 10).unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 15);

    opts.delete("a").unwrap();
    assert_eq!(opts.get_int("a").unwrap(), 1);
    assert_eq!(opts.get_int("b").unwrap(), 6);
    assert!(opts.is_default("a").unwrap());
}

#[test]
fn test_delete_restores_expression_derived_value() {
    let mut opts = scenario_factory().create_mutable(&ValueMap::new()).unwrap();

    opts.set("b", 100).unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 100);
    assert!(!opts.is_default("b").unwrap());

    opts.delete("b").unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 6);
    assert!(opts.is_default("b").unwrap());
}

#[test]
fn test_delete_of_never_set_option_is_noop() {
    let mut opts = scenario_factory().create_mutable(&ValueMap::new()).unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 6);
    opts.delete("b").unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 6);
}

#[test]
fn test_set_and_delete_reject_unknown_and_section_names() {
    let factory = Factory::builder()
        .value("a", 1)
        .section("sub", SectionSpec::builder().value("x", 2).build().unwrap())
        .build()
        .unwrap();
    let mut opts = factory.create_mutable(&ValueMap::new()).unwrap();

    assert!(matches!(
        opts.set("zz", 1).unwrap_err(),
        Error::UnknownOption { .. }
    ));
    assert!(matches!(
        opts.set("sub", 1).unwrap_err(),
        Error::NotAnOption { .. }
    ));
    assert!(matches!(
        opts.delete("zz").unwrap_err(),
        Error::UnknownOption { .. }
    ));
}

#[test]
fn test_invalidation_is_dependency_scoped() {
    init_tracing();

    // Counters observe recomputation: only consumers of the written
    // option lose their cached values.
    let b_calls = Rc::new(Cell::new(0usize));
    let c_calls = Rc::new(Cell::new(0usize));

    let b_counter = Rc::clone(&b_calls);
    let c_counter = Rc::clone(&c_calls);
    let factory = Factory::builder()
        .value("a", 1)
        .value("u", 100)
        .expr("b", move |scope| {
            b_counter.set(b_counter.get() + 1);
            Ok(Value::Int(scope.get_int("a")? + 5))
        })
        .expr("c", move |scope| {
            c_counter.set(c_counter.get() + 1);
            Ok(Value::Int(scope.get_int("u")? * 2))
        })
        .build()
        .unwrap();

    let mut opts = factory.create_mutable(&ValueMap::new()).unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 6);
    assert_eq!(opts.get_int("c").unwrap(), 200);
    assert_eq!((b_calls.get(), c_calls.get()), (1, 1));

    // cached reads evaluate nothing
    assert_eq!(opts.get_int("b").unwrap(), 6);
    assert_eq!(opts.get_int("c").unwrap(), 200);
    assert_eq!((b_calls.get(), c_calls.get()), (1, 1));

    // writing `a` invalidates only `b`
    opts.set("a", 10).unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 15);
    assert_eq!(opts.get_int("c").unwrap(), 200);
    assert_eq!((b_calls.get(), c_calls.get()), (2, 1));

    // writing `u` leaves `b` cached and recomputes only `c`
    opts.set("u", 100).unwrap();
    assert_eq!(opts.get_int("b").unwrap(), 15);
    assert_eq!((b_calls.get(), c_calls.get()), (2, 1));
    assert_eq!(opts.get_int("c").unwrap(), 200);
    assert_eq!((b_calls.get(), c_calls.get()), (2, 2));
}

#[test]
fn test_invalidation_follows_transitive_dependencies() {
    let factory = Factory::builder()
        .value("a", 1)
        .expr("b", |scope| Ok(Value::Int(scope.get_int("a")? * 10)))
        .expr("c", |scope| Ok(Value::Int(scope.get_int("b")? + 1)))
        .build()
        .unwrap();

    let mut opts = factory.create_mutable(&ValueMap::new()).unwrap();
    assert_eq!(opts.get_int("c").unwrap(), 11);

    opts.set("a", 2).unwrap();
    assert_eq!(opts.get_int("c").unwrap(), 21);
}

#[test]
fn test_invalidation_crosses_subtree_boundaries() {
    // An expression under one subsection reads through `parent` into a
    // sibling subtree; writing there must reach it.
    let factory = Factory::builder()
        .section(
            "source",
            SectionSpec::builder().value("x", 3).build().unwrap(),
        )
        .section(
            "sink",
            SectionSpec::builder()
                .expr("y", |scope| scope.parent()?.section("source")?.get("x"))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let opts = factory.create_mutable(&ValueMap::new()).unwrap();
    assert_eq!(opts.section("sink").unwrap().get_int("y").unwrap(), 3);

    let mut source = opts.section("source").unwrap();
    source.set("x", 42).unwrap();
    assert_eq!(opts.section("sink").unwrap().get_int("y").unwrap(), 42);
}

#[test]
fn test_parent_writes_reach_subsection_readers() {
    let factory = Factory::builder()
        .value("x", 7)
        .section(
            "sub",
            SectionSpec::builder()
                .expr("y", |scope| scope.parent()?.get("x"))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let mut opts = factory.create_mutable(&ValueMap::new()).unwrap();
    assert_eq!(opts.section("sub").unwrap().get_int("y").unwrap(), 7);

    opts.set("x", 8).unwrap();
    assert_eq!(opts.section("sub").unwrap().get_int("y").unwrap(), 8);
}

#[test]
fn test_failed_set_leaves_state_untouched() {
    let factory = Factory::builder()
        .option(
            "f",
            OptionSpec::literal(2.0)
                .value_type(ValueKind::Float)
                .allowed([Value::Float(2.0), Value::Float(3.0)]),
        )
        .expr("g", |scope| scope.get("f"))
        .build()
        .unwrap();

    let mut opts = factory.create_mutable(&ValueMap::new()).unwrap();
    assert_eq!(opts.get_float("g").unwrap(), 2.0);

    // not allowed: rejected eagerly, prior value and caches stay
    assert!(matches!(
        opts.set("f", 2.5).unwrap_err(),
        Error::NotAllowed { .. }
    ));
    assert_eq!(opts.get_float("f").unwrap(), 2.0);
    assert_eq!(opts.get_float("g").unwrap(), 2.0);
    assert!(opts.is_default("f").unwrap());

    // wrong type: same
    assert!(matches!(
        opts.set("f", 2).unwrap_err(),
        Error::TypeMismatch { .. }
    ));
    assert_eq!(opts.get_float("f").unwrap(), 2.0);

    // a valid write still goes through afterwards
    opts.set("f", 3.0).unwrap();
    assert_eq!(opts.get_float("g").unwrap(), 3.0);
}

#[test]
fn test_cycle_reappears_after_deleting_the_breaking_value() {
    let factory = Factory::builder()
        .expr("a", |scope| scope.get("b"))
        .expr("b", |scope| scope.get("a"))
        .build()
        .unwrap();

    let mut opts = factory
        .create_mutable(&ValueMap::new().with("b", 3))
        .unwrap();
    assert_eq!(opts.get_int("a").unwrap(), 3);
    assert_eq!(opts.get_int("b").unwrap(), 3);

    opts.delete("b").unwrap();
    assert!(matches!(opts.get("b").unwrap_err(), Error::Cycle { .. }));
}

#[test]
fn test_mutable_tree_resolves_lazily_like_immutable() {
    let factory = Factory::builder()
        .expr("a", |scope| scope.get("b"))
        .expr("b", |scope| scope.get("a"))
        .build()
        .unwrap();

    // creation succeeds; the cycle only surfaces on read
    let opts = factory.create_mutable(&ValueMap::new()).unwrap();
    assert!(matches!(opts.get("a").unwrap_err(), Error::Cycle { .. }));
}

#[test]
fn test_set_then_read_repeatedly_is_stable() {
    let mut opts = scenario_factory().create_mutable(&ValueMap::new()).unwrap();

    for round in 1..=5i64 {
        opts.set("a", round).unwrap();
        assert_eq!(opts.get_int("b").unwrap(), round + 5);
        assert_eq!(opts.get_int("b").unwrap(), round + 5);
    }
}

#[test]
fn test_export_reflects_mutations() {
    use cfgtree_core::ExportMode;

    let mut opts = scenario_factory().create_mutable(&ValueMap::new()).unwrap();
    opts.set("a", 9).unwrap();

    let explicit = opts.to_map(ExportMode::ExplicitOnly).unwrap();
    let keys: Vec<_> = explicit.keys().collect();
    assert_eq!(keys, vec!["a"]);

    opts.delete("a").unwrap();
    let explicit = opts.to_map(ExportMode::ExplicitOnly).unwrap();
    assert!(explicit.is_empty());
}
