use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value that can sit in a binding scope or come back from an evaluation.
///
/// The context stores values exactly as written. Any narrowing happens when a
/// value crosses into the native runtime (see `osa_runtime::marshal`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OsaValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    List(Vec<OsaValue>),
    Record(BTreeMap<String, OsaValue>),
}

impl OsaValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to `f64`; magnitudes above 2^53 lose precision.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }
}

impl From<bool> for OsaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OsaValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for OsaValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for OsaValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for OsaValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OsaValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<OsaValue>> for OsaValue {
    fn from(value: Vec<OsaValue>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<OsaValue>> From<Option<T>> for OsaValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}
