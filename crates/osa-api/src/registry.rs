use std::sync::Arc;

use osa_core::{Bindings, OsaError, Scope};

use crate::contract::{ScriptEngine, ScriptEngineFactory};

/// Finds factories by short name, file extension or mime type and hands out
/// engines that share one global scope.
#[derive(Default)]
pub struct EngineRegistry {
    factories: Vec<Arc<dyn ScriptEngineFactory>>,
    global: Bindings,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn ScriptEngineFactory>) {
        tracing::debug!(engine = factory.engine_name(), "registered script engine factory");
        self.factories.push(factory);
    }

    pub fn factories(&self) -> &[Arc<dyn ScriptEngineFactory>] {
        &self.factories
    }

    pub fn global_bindings(&self) -> Bindings {
        self.global.clone()
    }

    pub fn set_global_bindings(&mut self, bindings: Bindings) {
        self.global = bindings;
    }

    pub fn factory_by_name(&self, name: &str) -> Option<Arc<dyn ScriptEngineFactory>> {
        self.find(|factory| factory.names().iter().any(|candidate| *candidate == name))
    }

    /// Accepts `scpt` as well as `.scpt`; case-insensitive.
    pub fn factory_by_extension(&self, extension: &str) -> Option<Arc<dyn ScriptEngineFactory>> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        self.find(|factory| {
            factory
                .extensions()
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(extension))
        })
    }

    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn factory_by_mime_type(&self, mime_type: &str) -> Option<Arc<dyn ScriptEngineFactory>> {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.find(|factory| {
            factory
                .mime_types()
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(essence))
        })
    }

    pub fn engine_by_name(&self, name: &str) -> Result<Option<Box<dyn ScriptEngine>>, OsaError> {
        self.factory_by_name(name)
            .map(|factory| self.attach(factory.as_ref()))
            .transpose()
    }

    pub fn engine_by_extension(
        &self,
        extension: &str,
    ) -> Result<Option<Box<dyn ScriptEngine>>, OsaError> {
        self.factory_by_extension(extension)
            .map(|factory| self.attach(factory.as_ref()))
            .transpose()
    }

    pub fn engine_by_mime_type(
        &self,
        mime_type: &str,
    ) -> Result<Option<Box<dyn ScriptEngine>>, OsaError> {
        self.factory_by_mime_type(mime_type)
            .map(|factory| self.attach(factory.as_ref()))
            .transpose()
    }

    fn find<P>(&self, predicate: P) -> Option<Arc<dyn ScriptEngineFactory>>
    where
        P: Fn(&dyn ScriptEngineFactory) -> bool,
    {
        self.factories
            .iter()
            .find(|factory| predicate(factory.as_ref()))
            .cloned()
    }

    fn attach(&self, factory: &dyn ScriptEngineFactory) -> Result<Box<dyn ScriptEngine>, OsaError> {
        let mut engine = factory.script_engine()?;
        engine.set_bindings(Scope::Global, self.global.clone());
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{AppleScriptEngineFactory, EXTENSIONS, MIME_TYPES, NAMES};
    use osa_core::OsaValue;
    use osa_runtime::RuntimeConfig;

    fn registry() -> EngineRegistry {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(AppleScriptEngineFactory::with_config(
            RuntimeConfig::embedded(),
        )));
        registry
    }

    #[test]
    fn every_declared_key_finds_a_working_engine() {
        let registry = registry();
        for name in NAMES {
            let engine = registry
                .engine_by_name(name)
                .expect("engine should build")
                .expect("name should resolve");
            assert_eq!(engine.factory().engine_name(), "AppleScriptEngine");
        }
        for extension in EXTENSIONS {
            assert!(registry
                .engine_by_extension(extension)
                .expect("engine should build")
                .is_some());
        }
        for mime_type in MIME_TYPES {
            assert!(registry
                .engine_by_mime_type(mime_type)
                .expect("engine should build")
                .is_some());
        }
    }

    #[test]
    fn lookups_normalize_extension_and_mime_parameters() {
        let registry = registry();
        assert!(registry.factory_by_extension(".SCPT").is_some());
        assert!(registry
            .factory_by_mime_type("Text/AppleScript; charset=utf-8")
            .is_some());
    }

    #[test]
    fn unknown_keys_resolve_to_none() {
        let registry = registry();
        assert!(registry.factory_by_name("osa").is_none());
        assert!(registry.factory_by_extension("js").is_none());
        assert!(registry
            .engine_by_mime_type("application/javascript")
            .expect("lookup should not fail")
            .is_none());
    }

    #[test]
    fn engines_share_the_registry_global_scope() {
        let registry = registry();
        let first = registry
            .engine_by_name("OSA")
            .expect("build")
            .expect("resolve");
        let second = registry
            .engine_by_name("AppleScript")
            .expect("build")
            .expect("resolve");

        first
            .bindings(Scope::Global)
            .insert("shared", 5)
            .expect("insert");
        assert_eq!(
            second.bindings(Scope::Global).get("shared"),
            Some(OsaValue::Integer(5))
        );
        assert_eq!(
            registry.global_bindings().get("shared"),
            Some(OsaValue::Integer(5))
        );

        first.put("local", OsaValue::Bool(true)).expect("put");
        assert!(second.get("local").is_none());
    }
}
