use osa_core::{Bindings, ExecutionContext, OsaError, OsaValue, Scope};
use osa_runtime::{NativeRuntime, ScopedNamespace};
use parking_lot::Mutex;

use crate::contract::{ScriptEngine, ScriptEngineFactory};
use crate::factory::{
    AppleScriptEngineFactory, ENGINE_NAME, ENGINE_SHORT_NAME, ENGINE_VERSION, LANGUAGE,
};

/// Engine-scope parameter keys seeded into every new engine.
pub const ENGINE: &str = "script.engine";
pub const ENGINE_VERSION_KEY: &str = "script.engine_version";
pub const NAME: &str = "script.name";
pub const LANGUAGE_KEY: &str = "script.language";
pub const LANGUAGE_VERSION_KEY: &str = "script.language_version";

pub struct AppleScriptEngine {
    factory: AppleScriptEngineFactory,
    runtime: &'static NativeRuntime,
    context: ExecutionContext,
    // Held from snapshot through write-back.
    eval_lock: Mutex<()>,
}

impl AppleScriptEngine {
    /// Brings up the process-wide runtime on first use, then seeds the
    /// engine-scope parameters. Seeding queries the runtime's version.
    pub(crate) fn new(factory: AppleScriptEngineFactory) -> Result<Self, OsaError> {
        let runtime = osa_runtime::initialize(factory.runtime_config())?;
        let engine = Self {
            factory,
            runtime,
            context: ExecutionContext::new(),
            eval_lock: Mutex::new(()),
        };
        engine.seed_parameters()?;
        tracing::trace!("engine created");
        Ok(engine)
    }

    fn seed_parameters(&self) -> Result<(), OsaError> {
        let scope = self.context.bindings(Scope::Engine);
        scope.insert(ENGINE, ENGINE_NAME)?;
        scope.insert(ENGINE_VERSION_KEY, ENGINE_VERSION)?;
        scope.insert(NAME, ENGINE_SHORT_NAME)?;
        scope.insert(LANGUAGE_KEY, LANGUAGE)?;
        scope.insert(LANGUAGE_VERSION_KEY, self.language_version()?)?;
        Ok(())
    }

    fn evaluate_in(&self, program: &str, context: &ExecutionContext) -> Result<OsaValue, OsaError> {
        let _serial = self.eval_lock.lock();
        let before = ScopedNamespace::from_scopes(
            context.bindings(Scope::Engine).snapshot(),
            context.bindings(Scope::Global).snapshot(),
        );
        let evaluation = self.runtime.evaluate(program, before.clone())?;
        write_back(context, &before, evaluation.variables)?;
        Ok(evaluation.value)
    }
}

/// Copies changed or new variables back into `context`, each into the scope
/// the runtime reported it under.
fn write_back(
    context: &ExecutionContext,
    before: &ScopedNamespace,
    after: ScopedNamespace,
) -> Result<(), OsaError> {
    for scope in Scope::ORDERED {
        for (name, value) in after.scope(scope) {
            if before.get(scope, name) == Some(value) {
                continue;
            }
            tracing::trace!(%name, %scope, "binding updated by script");
            context.set_binding(scope, name.as_str(), value.clone())?;
        }
    }
    Ok(())
}

impl ScriptEngine for AppleScriptEngine {
    fn eval(&self, program: &str) -> Result<OsaValue, OsaError> {
        self.evaluate_in(program, &self.context)
    }

    fn eval_with_context(
        &self,
        program: &str,
        context: &ExecutionContext,
    ) -> Result<OsaValue, OsaError> {
        self.evaluate_in(program, context)
    }

    fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn set_context(&mut self, context: ExecutionContext) {
        self.context = context;
    }

    fn language_version(&self) -> Result<String, OsaError> {
        self.runtime.language_version()
    }

    fn factory(&self) -> &dyn ScriptEngineFactory {
        &self.factory
    }

    fn set_bindings(&mut self, scope: Scope, bindings: Bindings) {
        self.context.set_bindings(scope, bindings);
    }
}

impl std::fmt::Debug for AppleScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppleScriptEngine")
            .field("runtime", &self.runtime.description())
            .field("context", &self.context)
            .finish()
    }
}
