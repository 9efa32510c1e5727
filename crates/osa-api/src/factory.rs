use std::sync::Arc;

use osa_core::{OsaError, OsaValue, Scope};
use osa_runtime::RuntimeConfig;

use crate::contract::{ScriptEngine, ScriptEngineFactory};
use crate::engine::AppleScriptEngine;

pub const ENGINE_NAME: &str = "AppleScriptEngine";
pub const ENGINE_VERSION: &str = "1.1";
pub const ENGINE_SHORT_NAME: &str = ENGINE_NAME;
pub const LANGUAGE: &str = "AppleScript";

pub const EXTENSIONS: &[&str] = &["scpt", "applescript", "app"];
pub const MIME_TYPES: &[&str] = &[
    "application/x-applescript",
    "text/plain",
    "text/applescript",
];
pub const NAMES: &[&str] = &[ENGINE_SHORT_NAME, LANGUAGE, "OSA"];

/// Describes the AppleScript engine and builds engines for it.
///
/// Cloning is cheap; clones share the runtime config.
#[derive(Debug, Clone)]
pub struct AppleScriptEngineFactory {
    runtime_config: Arc<RuntimeConfig>,
}

impl Default for AppleScriptEngineFactory {
    fn default() -> Self {
        Self::with_config(RuntimeConfig::default())
    }
}

impl AppleScriptEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, OsaError> {
        RuntimeConfig::from_env().map(Self::with_config)
    }

    pub fn with_config(runtime_config: RuntimeConfig) -> Self {
        tracing::trace!(backend = %runtime_config.describe(), "factory created");
        Self {
            runtime_config: Arc::new(runtime_config),
        }
    }

    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// Same as [`ScriptEngineFactory::script_engine`] without the boxing.
    pub fn new_engine(&self) -> Result<AppleScriptEngine, OsaError> {
        AppleScriptEngine::new(self.clone())
    }
}

impl ScriptEngineFactory for AppleScriptEngineFactory {
    fn engine_name(&self) -> &str {
        tracing::trace!("engine_name()");
        ENGINE_NAME
    }

    fn engine_version(&self) -> &str {
        tracing::trace!("engine_version()");
        ENGINE_VERSION
    }

    fn language_name(&self) -> &str {
        tracing::trace!("language_name()");
        LANGUAGE
    }

    /// Builds a throwaway engine just to ask the live runtime. Not cached: the
    /// runtime on the host can change independently of this crate.
    fn language_version(&self) -> Result<String, OsaError> {
        tracing::trace!("language_version()");
        self.new_engine()?.language_version()
    }

    fn extensions(&self) -> &[&str] {
        tracing::trace!("extensions()");
        EXTENSIONS
    }

    fn mime_types(&self) -> &[&str] {
        tracing::trace!("mime_types()");
        MIME_TYPES
    }

    fn names(&self) -> &[&str] {
        tracing::trace!("names()");
        NAMES
    }

    /// AppleScript has no receiver objects to call methods on.
    fn method_call_syntax(
        &self,
        _receiver: Option<&str>,
        _function: &str,
        _args: &[&str],
    ) -> Option<String> {
        None
    }

    fn output_statement(&self, text: &str) -> Option<String> {
        self.method_call_syntax(None, "print", &[text])
    }

    /// Looks `key` up in a throwaway engine's engine scope.
    fn parameter(&self, key: &str) -> Result<Option<OsaValue>, OsaError> {
        tracing::trace!(%key, "parameter()");
        let engine = self.new_engine()?;
        Ok(engine.context().bindings(Scope::Engine).get(key))
    }

    fn program(&self, statements: &[&str]) -> String {
        tracing::trace!(statements = statements.len(), "program()");
        let mut program = String::new();
        for statement in statements {
            program.push_str(statement);
            program.push('\n');
        }
        program
    }

    fn script_engine(&self) -> Result<Box<dyn ScriptEngine>, OsaError> {
        Ok(Box::new(self.new_engine()?))
    }
}
