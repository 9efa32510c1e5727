use super::*;
use osa_api::BackendConfig;
use osa_core::{ErrorKind, OsaValue};

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("osa-cli-{}-{}", name, nanos))
}

fn runtime_args(runtime: Option<RuntimeKind>, library: Option<&str>) -> RuntimeArgs {
    RuntimeArgs {
        runtime,
        library: library.map(PathBuf::from),
    }
}

#[test]
fn runtime_flags_select_backend() {
    let embedded = resolve_runtime_config(&runtime_args(Some(RuntimeKind::Embedded), None))
        .expect("embedded");
    assert_eq!(embedded.backend, BackendConfig::Embedded);

    let library = resolve_runtime_config(&runtime_args(None, Some("/opt/osa/libbridge.dylib")))
        .expect("library");
    assert_eq!(
        library.backend,
        BackendConfig::Library {
            path: PathBuf::from("/opt/osa/libbridge.dylib")
        }
    );

    let default_library =
        resolve_runtime_config(&runtime_args(Some(RuntimeKind::Library), None)).expect("library");
    assert_eq!(default_library.describe(), "library:libAppleScriptEngine.dylib");
}

#[test]
fn embedded_runtime_rejects_library_path() {
    let error = resolve_runtime_config(&runtime_args(Some(RuntimeKind::Embedded), Some("x.dylib")))
        .expect_err("conflicting flags");
    assert_eq!(error.code, "CLI_ARG_INVALID");
    assert_eq!(error.kind, ErrorKind::Cli);
}

#[test]
fn bindings_decode_json_or_fall_back_to_text() {
    assert_eq!(
        source_loader::parse_binding("x=20").expect("integer"),
        ("x".to_string(), OsaValue::Integer(20))
    );
    assert_eq!(
        source_loader::parse_binding("flag=true").expect("bool"),
        ("flag".to_string(), OsaValue::Bool(true))
    );
    assert_eq!(
        source_loader::parse_binding("items=[1,\"a\"]").expect("list"),
        (
            "items".to_string(),
            OsaValue::List(vec![OsaValue::Integer(1), OsaValue::from("a")])
        )
    );
    assert_eq!(
        source_loader::parse_binding("who=Finder").expect("text"),
        ("who".to_string(), OsaValue::from("Finder"))
    );
    assert_eq!(
        source_loader::parse_binding("eq=a=b").expect("text with equals"),
        ("eq".to_string(), OsaValue::from("a=b"))
    );
}

#[test]
fn malformed_bindings_are_argument_errors() {
    for raw in ["novalue", "=1", "  =x"] {
        let error = source_loader::parse_binding(raw).expect_err("malformed");
        assert_eq!(error.code, "CLI_ARG_INVALID");
    }
}

#[test]
fn program_source_comes_from_expr_or_file() {
    assert_eq!(
        load_program(Some("1 + 1"), None).expect("expr"),
        "1 + 1".to_string()
    );

    let path = temp_path("program.txt");
    fs::write(&path, "40 + 2").expect("program should be written");
    assert_eq!(load_program(None, Some(&path)).expect("file"), "40 + 2");
    let _ = fs::remove_file(&path);

    let missing = load_program(None, Some(&temp_path("missing.txt"))).expect_err("missing");
    assert_eq!(missing.code, "CLI_SOURCE_READ");

    let neither = load_program(None, None).expect_err("no source");
    assert_eq!(neither.code, "CLI_ARG_INVALID");
}

#[test]
fn engine_info_reports_descriptor_and_runtime() {
    let registry = default_registry(RuntimeConfig::embedded());
    let factory = registry.factory_by_name(ENGINE_NAME).expect("factory");
    let info = engine_info(factory.as_ref(), "embedded".to_string()).expect("info");
    assert_eq!(info.engine_name, "AppleScriptEngine");
    assert_eq!(info.engine_version, "1.1");
    assert_eq!(info.language_name, "AppleScript");
    assert_eq!(info.language_version, "2.8");
    assert_eq!(info.extensions, vec!["scpt", "applescript", "app"]);
    assert_eq!(info.runtime, "embedded");
}

#[test]
fn run_cli_returns_exit_codes() {
    assert_eq!(
        run_cli_from_args(["osa-cli", "eval", "--runtime", "embedded", "--expr", "1 + 1"]),
        0
    );
    assert_eq!(
        run_cli_from_args(["osa-cli", "eval", "--runtime", "embedded", "--expr", "let = ;"]),
        1
    );
    assert_eq!(
        run_cli_from_args(["osa-cli", "eval", "--runtime", "embedded", "--bind", "bad"]),
        1
    );
    assert_eq!(run_cli_from_args(["osa-cli", "info", "--runtime", "embedded"]), 0);
    assert_ne!(run_cli_from_args(["osa-cli", "unknown"]), 0);
}
