use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad failure class. The `code` on [`OsaError`] narrows it further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The native runtime could not be loaded or set up. Cached for the process.
    Initialization,
    /// Program text failed to parse or faulted while running.
    Evaluation,
    /// A binding was missing, badly named, or could not be marshalled.
    Binding,
    /// Host-side argument or IO failure in the command line front end.
    Cli,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct OsaError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl OsaError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn initialization(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Initialization, code, message)
    }

    pub fn evaluation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Evaluation, code, message)
    }

    pub fn binding(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Binding, code, message)
    }

    pub fn cli(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cli, code, message)
    }

    pub fn not_found(name: &str) -> Self {
        Self::binding(
            BINDING_NOT_FOUND,
            format!("Binding \"{}\" is not defined.", name),
        )
    }

    pub fn marshal(message: impl Into<String>) -> Self {
        Self::binding(BINDING_MARSHAL, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::Binding && self.code == BINDING_NOT_FOUND
    }
}

pub const INIT_LIBRARY_LOAD: &str = "INIT_LIBRARY_LOAD";
pub const INIT_SYMBOL_MISSING: &str = "INIT_SYMBOL_MISSING";
pub const INIT_HOST_PRECONDITION: &str = "INIT_HOST_PRECONDITION";
pub const INIT_NATIVE_FAILED: &str = "INIT_NATIVE_FAILED";
pub const INIT_WORKER: &str = "INIT_WORKER";
pub const INIT_CONFIG_INVALID: &str = "INIT_CONFIG_INVALID";

pub const EVAL_PARSE: &str = "EVAL_PARSE";
pub const EVAL_RUNTIME: &str = "EVAL_RUNTIME";
pub const EVAL_NATIVE_CALL: &str = "EVAL_NATIVE_CALL";
pub const EVAL_RUNTIME_UNAVAILABLE: &str = "EVAL_RUNTIME_UNAVAILABLE";

pub const BINDING_NOT_FOUND: &str = "BINDING_NOT_FOUND";
pub const BINDING_MARSHAL: &str = "BINDING_MARSHAL";
pub const BINDING_INVALID_NAME: &str = "BINDING_INVALID_NAME";
