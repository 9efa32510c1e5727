mod cli_args;
mod error_map;
mod logging;
mod models;
mod source_loader;

use std::ffi::OsString;

use clap::Parser;
use osa_api::factory::ENGINE_NAME;
use osa_api::{
    default_registry, EngineRegistry, RuntimeConfig, Scope, ScriptEngine, ScriptEngineFactory,
};
use osa_core::OsaError;

use crate::cli_args::{Cli, EvalArgs, InfoArgs, Mode, RuntimeArgs, RuntimeKind};
use crate::error_map::{cli_arg_invalid, emit_error, map_cli_output};
use crate::models::EngineInfo;
use crate::source_loader::{load_program, parse_bindings};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    logging::init_logging();
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, OsaError> {
    match cli.command {
        Mode::Info(args) => run_info(args),
        Mode::Eval(args) => run_eval(args),
    }
}

/// Flags win over `OSA_RUNTIME` / `OSA_ENGINE_LIBRARY`.
fn resolve_runtime_config(args: &RuntimeArgs) -> Result<RuntimeConfig, OsaError> {
    match (args.runtime, &args.library) {
        (Some(RuntimeKind::Embedded), Some(_)) => Err(cli_arg_invalid(
            "--library cannot be combined with --runtime embedded.",
        )),
        (Some(RuntimeKind::Embedded), None) => Ok(RuntimeConfig::embedded()),
        (Some(RuntimeKind::Library) | None, Some(path)) => Ok(RuntimeConfig::library(path)),
        (Some(RuntimeKind::Library), None) => Ok(RuntimeConfig::library(
            osa_runtime::config::DEFAULT_LIBRARY_NAME,
        )),
        (None, None) => RuntimeConfig::from_env(),
    }
}

fn registry_for(args: &RuntimeArgs) -> Result<EngineRegistry, OsaError> {
    let config = resolve_runtime_config(args)?;
    tracing::debug!(runtime = %config.describe(), "runtime selected");
    Ok(default_registry(config))
}

fn run_info(args: InfoArgs) -> Result<i32, OsaError> {
    let config = resolve_runtime_config(&args.runtime)?;
    let runtime = config.describe();
    let registry = default_registry(config);
    let factory = registry
        .factory_by_name(ENGINE_NAME)
        .ok_or_else(|| cli_arg_invalid(format!("No engine registered as {}.", ENGINE_NAME)))?;

    let info = engine_info(factory.as_ref(), runtime)?;
    println!("RESULT:OK");
    println!(
        "INFO_JSON:{}",
        serde_json::to_string(&info).map_err(map_cli_output)?
    );
    Ok(0)
}

fn engine_info(factory: &dyn ScriptEngineFactory, runtime: String) -> Result<EngineInfo, OsaError> {
    let owned = |items: &[&str]| items.iter().map(|item| item.to_string()).collect::<Vec<_>>();
    Ok(EngineInfo {
        engine_name: factory.engine_name().to_string(),
        engine_version: factory.engine_version().to_string(),
        language_name: factory.language_name().to_string(),
        language_version: factory.language_version()?,
        extensions: owned(factory.extensions()),
        mime_types: owned(factory.mime_types()),
        names: owned(factory.names()),
        runtime,
    })
}

fn run_eval(args: EvalArgs) -> Result<i32, OsaError> {
    let program = load_program(args.expr.as_deref(), args.file.as_deref())?;
    let engine_bindings = parse_bindings(&args.bind)?;
    let global_bindings = parse_bindings(&args.global)?;

    let registry = registry_for(&args.runtime)?;
    for (name, value) in global_bindings {
        registry.global_bindings().insert(name, value)?;
    }
    let engine = registry
        .engine_by_name(ENGINE_NAME)?
        .ok_or_else(|| cli_arg_invalid(format!("No engine registered as {}.", ENGINE_NAME)))?;
    for (name, value) in engine_bindings {
        engine.context().set_binding(Scope::Engine, name, value)?;
    }

    let value = engine.eval(&program)?;
    println!("RESULT:OK");
    println!(
        "VALUE_JSON:{}",
        serde_json::to_string(&value).map_err(map_cli_output)?
    );
    Ok(0)
}

#[cfg(test)]
mod tests;
