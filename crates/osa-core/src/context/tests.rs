use super::*;
use crate::error::{ErrorKind, BINDING_NOT_FOUND};

#[test]
fn set_and_get_binding_roundtrips_every_value_kind() {
    let context = ExecutionContext::new();
    let mut record = BTreeMap::new();
    record.insert("name".to_string(), OsaValue::from("Finder"));
    let values = vec![
        ("nothing", OsaValue::Null),
        ("flag", OsaValue::Bool(true)),
        ("count", OsaValue::Integer(-42)),
        ("ratio", OsaValue::Real(0.25)),
        ("title", OsaValue::from("hello")),
        ("items", OsaValue::List(vec![OsaValue::Integer(1), OsaValue::from("two")])),
        ("props", OsaValue::Record(record)),
    ];

    for (name, value) in &values {
        context
            .set_binding(Scope::Engine, *name, value.clone())
            .expect("set should pass");
    }
    for (name, value) in &values {
        let stored = context
            .get_binding(Scope::Engine, name)
            .expect("get should pass");
        assert_eq!(&stored, value);
    }
}

#[test]
fn set_binding_does_not_coerce_types() {
    let context = ExecutionContext::new();
    context
        .set_binding(Scope::Engine, "n", OsaValue::Real(3.0))
        .expect("set should pass");
    assert_eq!(
        context.get_binding(Scope::Engine, "n").expect("get"),
        OsaValue::Real(3.0)
    );
    assert_ne!(
        context.get_binding(Scope::Engine, "n").expect("get"),
        OsaValue::Integer(3)
    );
}

#[test]
fn missing_binding_is_not_found_rather_than_default() {
    let context = ExecutionContext::new();
    let error = context
        .get_binding(Scope::Global, "missing")
        .expect_err("missing should fail");
    assert_eq!(error.kind, ErrorKind::Binding);
    assert_eq!(error.code, BINDING_NOT_FOUND);
    assert!(error.is_not_found());
    assert!(!context.contains_binding(Scope::Global, "missing"));
    assert!(context.resolve("missing").is_err());
}

#[test]
fn resolve_prefers_engine_scope_over_global() {
    let context = ExecutionContext::new();
    context
        .set_binding(Scope::Global, "who", "global")
        .expect("set global");
    assert_eq!(context.resolve("who").expect("resolve"), OsaValue::from("global"));
    assert_eq!(context.scope_of("who"), Some(Scope::Global));

    context
        .set_binding(Scope::Engine, "who", "engine")
        .expect("set engine");
    assert_eq!(context.resolve("who").expect("resolve"), OsaValue::from("engine"));
    assert_eq!(context.scope_of("who"), Some(Scope::Engine));
    assert_eq!(
        context.namespace().get("who"),
        Some(&OsaValue::from("engine"))
    );
}

#[test]
fn bindings_handle_is_a_live_view() {
    let context = ExecutionContext::new();
    let view = context.bindings(Scope::Engine);
    view.insert("x", 1).expect("insert");
    assert!(context.contains_binding(Scope::Engine, "x"));

    context.set_binding(Scope::Engine, "y", 2).expect("set");
    assert_eq!(view.get("y"), Some(OsaValue::Integer(2)));
    assert!(view.same_table(&context.bindings(Scope::Engine)));
}

#[test]
fn shared_global_bindings_are_visible_across_contexts() {
    let global = Bindings::new();
    let first = ExecutionContext::with_global(global.clone());
    let second = ExecutionContext::with_global(global);
    first
        .set_binding(Scope::Global, "shared", true)
        .expect("set");
    assert_eq!(
        second.get_binding(Scope::Global, "shared").expect("get"),
        OsaValue::Bool(true)
    );
    first.set_binding(Scope::Engine, "local", 1).expect("set");
    assert!(!second.contains_binding(Scope::Engine, "local"));
}

#[test]
fn empty_binding_name_is_rejected() {
    let context = ExecutionContext::new();
    let error = context
        .set_binding(Scope::Engine, "", 1)
        .expect_err("empty name should fail");
    assert_eq!(error.code, crate::error::BINDING_INVALID_NAME);
}

#[test]
fn remove_binding_reports_missing_names() {
    let context = ExecutionContext::new();
    context.set_binding(Scope::Engine, "gone", 1).expect("set");
    assert_eq!(
        context.remove_binding(Scope::Engine, "gone").expect("remove"),
        OsaValue::Integer(1)
    );
    assert!(context
        .remove_binding(Scope::Engine, "gone")
        .expect_err("second remove fails")
        .is_not_found());
}

#[test]
fn scopes_are_ordered_engine_first() {
    assert_eq!(Scope::ORDERED, [Scope::Engine, Scope::Global]);
    assert!(Scope::Engine.id() < Scope::Global.id());
    assert_eq!(Scope::Engine.to_string(), "engine");
}
