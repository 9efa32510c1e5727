use std::collections::BTreeMap;

use osa_core::{OsaError, OsaValue, Scope};

/// Variables keyed by scope, as bound into (or read back out of) a runtime.
///
/// `V` is whatever form the runtime holds a value in: canonical values on the
/// caller side, Rhai `Dynamic`s or JSON on the native side.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableFrame<V> {
    engine: BTreeMap<String, V>,
    global: BTreeMap<String, V>,
}

/// Canonical values per scope. What an evaluation takes in and hands back.
pub type ScopedNamespace = VariableFrame<OsaValue>;

impl<V> Default for VariableFrame<V> {
    fn default() -> Self {
        Self {
            engine: BTreeMap::new(),
            global: BTreeMap::new(),
        }
    }
}

impl<V> VariableFrame<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scopes(engine: BTreeMap<String, V>, global: BTreeMap<String, V>) -> Self {
        Self { engine, global }
    }

    pub fn insert(&mut self, scope: Scope, name: impl Into<String>, value: V) -> Option<V> {
        self.scope_mut(scope).insert(name.into(), value)
    }

    pub fn get(&self, scope: Scope, name: &str) -> Option<&V> {
        self.scope(scope).get(name)
    }

    pub fn contains(&self, scope: Scope, name: &str) -> bool {
        self.scope(scope).contains_key(name)
    }

    pub fn scope(&self, scope: Scope) -> &BTreeMap<String, V> {
        match scope {
            Scope::Engine => &self.engine,
            Scope::Global => &self.global,
        }
    }

    pub fn clear(&mut self) {
        self.engine.clear();
        self.global.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty() && self.global.is_empty()
    }

    pub fn len(&self) -> usize {
        self.engine.len() + self.global.len()
    }

    /// Global entries first, then engine entries. Feeding a runtime in this
    /// order lets engine names shadow global ones.
    pub fn layered(&self) -> impl Iterator<Item = (&String, &V)> {
        self.global.iter().chain(self.engine.iter())
    }

    /// Every `(scope, name)` held, in layered order.
    pub fn names(&self) -> Vec<(Scope, String)> {
        self.global
            .keys()
            .map(|name| (Scope::Global, name.clone()))
            .chain(self.engine.keys().map(|name| (Scope::Engine, name.clone())))
            .collect()
    }

    /// Scope a variable the script left behind belongs to: the global scope
    /// only when it was bound there and not shadowed by the engine scope.
    pub fn home_of(&self, name: &str) -> Scope {
        if self.global.contains_key(name) && !self.engine.contains_key(name) {
            Scope::Global
        } else {
            Scope::Engine
        }
    }

    /// Stores a post-evaluation value under its home scope.
    pub fn absorb(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        let scope = self.home_of(&name);
        self.insert(scope, name, value);
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut BTreeMap<String, V> {
        match scope {
            Scope::Engine => &mut self.engine,
            Scope::Global => &mut self.global,
        }
    }
}

/// What one evaluation produced: its value and the variables, per scope, that
/// the runtime held afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: OsaValue,
    pub variables: ScopedNamespace,
}

/// The narrow surface every native runtime implementation exposes.
///
/// A backend is created on, and only ever called from, the runtime thread, so
/// it does not need to be `Send` or reentrant. One evaluation is driven as
/// `reset_variables`, `bind_variable` per variable, `evaluate`, then
/// `lookup_variable` per name in `variable_names`.
pub trait NativeBackend {
    fn describe(&self) -> String;

    /// Forgets every variable bound since the last reset.
    fn reset_variables(&mut self);

    /// Marshals `value` into the runtime's representation under `scope`.
    fn bind_variable(
        &mut self,
        scope: Scope,
        name: &str,
        value: &OsaValue,
    ) -> Result<(), OsaError>;

    /// Marshals a variable back out. `BINDING_NOT_FOUND` when absent.
    fn lookup_variable(&mut self, scope: Scope, name: &str) -> Result<OsaValue, OsaError>;

    /// Every variable the runtime holds, after any evaluation has re-homed the
    /// names the script assigned or created.
    fn variable_names(&self) -> Vec<(Scope, String)>;

    /// Runs `program` against the bound variables and returns its value.
    fn evaluate(&mut self, program: &str) -> Result<OsaValue, OsaError>;

    fn language_version(&mut self) -> Result<String, OsaError>;
}
