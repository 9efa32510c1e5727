use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{OsaError, BINDING_INVALID_NAME};
use crate::value::OsaValue;

/// Binding scopes in resolution order. Lower ids shadow higher ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Engine,
    Global,
}

impl Scope {
    pub const ORDERED: [Scope; 2] = [Scope::Engine, Scope::Global];

    pub fn id(self) -> i32 {
        match self {
            Self::Engine => 100,
            Self::Global => 200,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine => f.write_str("engine"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// A shared, live name→value table.
///
/// Clones point at the same table: a handle returned by
/// `ExecutionContext::bindings` sees and makes the same writes as the context.
#[derive(Clone, Default)]
pub struct Bindings {
    inner: Arc<RwLock<BTreeMap<String, OsaValue>>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, OsaValue>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(values)),
        }
    }

    pub fn insert(
        &self,
        name: impl Into<String>,
        value: impl Into<OsaValue>,
    ) -> Result<Option<OsaValue>, OsaError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(self.inner.write().insert(name, value.into()))
    }

    pub fn get(&self, name: &str) -> Option<OsaValue> {
        self.inner.read().get(name).cloned()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<OsaValue> {
        self.inner.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Point-in-time copy, detached from later writes.
    pub fn snapshot(&self) -> BTreeMap<String, OsaValue> {
        self.inner.read().clone()
    }

    /// True when both handles refer to the same table.
    pub fn same_table(&self, other: &Bindings) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.read().iter()).finish()
    }
}

fn validate_name(name: &str) -> Result<(), OsaError> {
    if name.is_empty() {
        return Err(OsaError::binding(
            BINDING_INVALID_NAME,
            "Binding name must not be empty.",
        ));
    }
    Ok(())
}

/// The variable environment an evaluation reads from and writes back into.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    engine: Bindings,
    global: Bindings,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(global: Bindings) -> Self {
        Self {
            engine: Bindings::new(),
            global,
        }
    }

    pub fn bindings(&self, scope: Scope) -> Bindings {
        self.scope_ref(scope).clone()
    }

    pub fn set_bindings(&mut self, scope: Scope, bindings: Bindings) {
        match scope {
            Scope::Engine => self.engine = bindings,
            Scope::Global => self.global = bindings,
        }
    }

    pub fn set_binding(
        &self,
        scope: Scope,
        name: impl Into<String>,
        value: impl Into<OsaValue>,
    ) -> Result<Option<OsaValue>, OsaError> {
        self.scope_ref(scope).insert(name, value)
    }

    pub fn get_binding(&self, scope: Scope, name: &str) -> Result<OsaValue, OsaError> {
        self.scope_ref(scope)
            .get(name)
            .ok_or_else(|| OsaError::not_found(name))
    }

    pub fn contains_binding(&self, scope: Scope, name: &str) -> bool {
        self.scope_ref(scope).contains_key(name)
    }

    pub fn remove_binding(&self, scope: Scope, name: &str) -> Result<OsaValue, OsaError> {
        self.scope_ref(scope)
            .remove(name)
            .ok_or_else(|| OsaError::not_found(name))
    }

    /// Looks `name` up through the scopes in order and returns the first hit.
    pub fn resolve(&self, name: &str) -> Result<OsaValue, OsaError> {
        Scope::ORDERED
            .iter()
            .find_map(|scope| self.scope_ref(*scope).get(name))
            .ok_or_else(|| OsaError::not_found(name))
    }

    pub fn scope_of(&self, name: &str) -> Option<Scope> {
        Scope::ORDERED
            .into_iter()
            .find(|scope| self.scope_ref(*scope).contains_key(name))
    }

    /// Flattened view with engine entries shadowing global ones.
    pub fn namespace(&self) -> BTreeMap<String, OsaValue> {
        let mut merged = self.global.snapshot();
        merged.extend(self.engine.snapshot());
        merged
    }

    fn scope_ref(&self, scope: Scope) -> &Bindings {
        match scope {
            Scope::Engine => &self.engine,
            Scope::Global => &self.global,
        }
    }
}

#[cfg(test)]
mod tests;
