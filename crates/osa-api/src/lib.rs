//! Script-engine contract for the OSA runtime: a factory that describes the
//! engine, engines that evaluate program text against scoped bindings, and a
//! registry that finds factories by name, extension or mime type.

pub mod contract;
pub mod engine;
pub mod factory;
pub mod registry;

pub use contract::{ScriptEngine, ScriptEngineFactory};
pub use engine::AppleScriptEngine;
pub use factory::AppleScriptEngineFactory;
pub use osa_core::{Bindings, ErrorKind, ExecutionContext, OsaError, OsaValue, Scope};
pub use osa_runtime::{BackendConfig, RuntimeConfig};
pub use registry::EngineRegistry;

/// A registry with the AppleScript factory registered under `config`.
pub fn default_registry(config: RuntimeConfig) -> EngineRegistry {
    let mut registry = EngineRegistry::new();
    registry.register(std::sync::Arc::new(AppleScriptEngineFactory::with_config(
        config,
    )));
    registry
}
