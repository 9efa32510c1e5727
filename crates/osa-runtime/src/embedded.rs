use osa_core::error::{EVAL_PARSE, EVAL_RUNTIME};
use osa_core::{OsaError, OsaValue, Scope};
use rhai::{Dynamic, Engine, Scope as RhaiScope};

use crate::backend::{NativeBackend, VariableFrame};
use crate::marshal::{dynamic_to_value, value_to_dynamic};

/// In-process stand-in for the OSA runtime, used where the bridge library is
/// not available. Program text is Rhai.
pub struct EmbeddedBackend {
    engine: Engine,
    language_version: String,
    variables: VariableFrame<Dynamic>,
}

impl EmbeddedBackend {
    pub fn new(language_version: impl Into<String>) -> Self {
        let mut engine = Engine::new();
        engine.set_strict_variables(true);
        engine.on_print(|text| tracing::info!(target: "osa_runtime::script", "{}", text));
        engine.on_debug(|text, _source, position| {
            tracing::debug!(target: "osa_runtime::script", %position, "{}", text)
        });
        Self {
            engine,
            language_version: language_version.into(),
            variables: VariableFrame::new(),
        }
    }
}

impl NativeBackend for EmbeddedBackend {
    fn describe(&self) -> String {
        format!("embedded rhai (reports {})", self.language_version)
    }

    fn reset_variables(&mut self) {
        self.variables.clear();
    }

    fn bind_variable(
        &mut self,
        scope: Scope,
        name: &str,
        value: &OsaValue,
    ) -> Result<(), OsaError> {
        let dynamic = value_to_dynamic(value)?;
        self.variables.insert(scope, name, dynamic);
        Ok(())
    }

    fn lookup_variable(&mut self, scope: Scope, name: &str) -> Result<OsaValue, OsaError> {
        let value = self
            .variables
            .get(scope, name)
            .cloned()
            .ok_or_else(|| OsaError::not_found(name))?;
        dynamic_to_value(value).map_err(|error| {
            OsaError::marshal(format!("Variable \"{}\": {}", name, error.message))
        })
    }

    fn variable_names(&self) -> Vec<(Scope, String)> {
        self.variables.names()
    }

    fn evaluate(&mut self, program: &str) -> Result<OsaValue, OsaError> {
        let mut scope = RhaiScope::new();
        for (name, value) in self.variables.layered() {
            scope.push_dynamic(name.clone(), value.clone());
        }

        let ast = self
            .engine
            .compile_with_scope(&scope, program)
            .map_err(|error| OsaError::evaluation(EVAL_PARSE, error.to_string()))?;
        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|error| OsaError::evaluation(EVAL_RUNTIME, error.to_string()))?;

        // Scope order is push order, so a script-level `let` of a bound name
        // is absorbed last and wins.
        for (name, _is_constant, value) in scope.iter() {
            self.variables.absorb(name, value);
        }

        dynamic_to_value(result)
    }

    fn language_version(&mut self) -> Result<String, OsaError> {
        Ok(self.language_version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScopedNamespace;
    use crate::runtime::run_evaluation;
    use osa_core::error::BINDING_NOT_FOUND;

    fn backend() -> EmbeddedBackend {
        EmbeddedBackend::new("2.8")
    }

    fn frame(entries: &[(Scope, &str, OsaValue)]) -> ScopedNamespace {
        let mut frame = ScopedNamespace::new();
        for (scope, name, value) in entries {
            frame.insert(*scope, *name, value.clone());
        }
        frame
    }

    #[test]
    fn evaluate_reads_bound_variables() {
        let mut backend = backend();
        backend
            .bind_variable(Scope::Engine, "x", &OsaValue::Integer(40))
            .expect("bind");
        assert_eq!(backend.evaluate("x + 2").expect("eval"), OsaValue::Integer(42));
    }

    #[test]
    fn lookup_variable_reads_back_what_was_bound() {
        let mut backend = backend();
        backend
            .bind_variable(Scope::Global, "who", &OsaValue::from("Finder"))
            .expect("bind");
        assert_eq!(
            backend.lookup_variable(Scope::Global, "who").expect("lookup"),
            OsaValue::from("Finder")
        );
        let missing = backend
            .lookup_variable(Scope::Engine, "who")
            .expect_err("wrong scope");
        assert_eq!(missing.code, BINDING_NOT_FOUND);

        backend.reset_variables();
        assert!(backend.variable_names().is_empty());
    }

    #[test]
    fn evaluation_reports_assignments_in_their_home_scope() {
        let evaluation = run_evaluation(
            &mut backend(),
            "x = x + 1; counter += 1; let y = \"made\";",
            &frame(&[
                (Scope::Engine, "x", OsaValue::Integer(1)),
                (Scope::Global, "counter", OsaValue::Integer(10)),
            ]),
        )
        .expect("eval");

        let variables = &evaluation.variables;
        assert_eq!(variables.get(Scope::Engine, "x"), Some(&OsaValue::Integer(2)));
        assert_eq!(
            variables.get(Scope::Global, "counter"),
            Some(&OsaValue::Integer(11))
        );
        assert!(!variables.contains(Scope::Engine, "counter"));
        assert_eq!(
            variables.get(Scope::Engine, "y"),
            Some(&OsaValue::from("made"))
        );
        assert_eq!(evaluation.value, OsaValue::Null);
    }

    #[test]
    fn engine_variables_shadow_global_ones() {
        let evaluation = run_evaluation(
            &mut backend(),
            "who",
            &frame(&[
                (Scope::Global, "who", OsaValue::from("global")),
                (Scope::Engine, "who", OsaValue::from("engine")),
            ]),
        )
        .expect("eval");
        assert_eq!(evaluation.value, OsaValue::from("engine"));
    }

    #[test]
    fn undefined_variables_fail_at_parse_time() {
        let error = backend().evaluate("missing + 1").expect_err("strict variables");
        assert_eq!(error.code, EVAL_PARSE);
    }

    #[test]
    fn runtime_faults_are_runtime_errors() {
        let error = backend().evaluate("throw \"boom\"").expect_err("throw");
        assert_eq!(error.code, EVAL_RUNTIME);
        assert!(error.message.contains("boom"));
    }

    #[test]
    fn language_version_comes_from_the_backend() {
        assert_eq!(
            EmbeddedBackend::new("9.9").language_version().expect("version"),
            "9.9"
        );
    }
}
