use osa_core::{Bindings, ExecutionContext, OsaError, OsaValue, Scope};

/// Capability metadata plus the ability to build engines for one language.
pub trait ScriptEngineFactory: Send + Sync {
    fn engine_name(&self) -> &str;

    fn engine_version(&self) -> &str;

    fn language_name(&self) -> &str;

    /// Asks the runtime actually present on this host. May build an engine.
    fn language_version(&self) -> Result<String, OsaError>;

    fn extensions(&self) -> &[&str];

    fn mime_types(&self) -> &[&str];

    fn names(&self) -> &[&str];

    /// Source text that calls `function` with `args`, or `None` when the
    /// language has no such call form.
    fn method_call_syntax(
        &self,
        receiver: Option<&str>,
        function: &str,
        args: &[&str],
    ) -> Option<String>;

    fn output_statement(&self, text: &str) -> Option<String>;

    /// Engine-scope parameter of a freshly built engine.
    fn parameter(&self, key: &str) -> Result<Option<OsaValue>, OsaError>;

    fn program(&self, statements: &[&str]) -> String;

    fn script_engine(&self) -> Result<Box<dyn ScriptEngine>, OsaError>;
}

/// One evaluation session with its own bindings.
pub trait ScriptEngine: Send + Sync {
    fn eval(&self, program: &str) -> Result<OsaValue, OsaError>;

    /// Evaluates against `context` instead of the engine's own.
    fn eval_with_context(
        &self,
        program: &str,
        context: &ExecutionContext,
    ) -> Result<OsaValue, OsaError>;

    fn context(&self) -> &ExecutionContext;

    fn set_context(&mut self, context: ExecutionContext);

    fn language_version(&self) -> Result<String, OsaError>;

    fn factory(&self) -> &dyn ScriptEngineFactory;

    /// Live view; writes show up in later evaluations.
    fn bindings(&self, scope: Scope) -> Bindings {
        self.context().bindings(scope)
    }

    fn set_bindings(&mut self, scope: Scope, bindings: Bindings);

    fn create_bindings(&self) -> Bindings {
        Bindings::new()
    }

    fn put(&self, name: &str, value: OsaValue) -> Result<Option<OsaValue>, OsaError> {
        self.context().set_binding(Scope::Engine, name, value)
    }

    fn get(&self, name: &str) -> Option<OsaValue> {
        self.context().bindings(Scope::Engine).get(name)
    }
}
