use std::path::PathBuf;

use osa_core::error::INIT_CONFIG_INVALID;
use osa_core::OsaError;
use serde::{Deserialize, Serialize};

pub const ENV_RUNTIME: &str = "OSA_RUNTIME";
pub const ENV_LIBRARY: &str = "OSA_ENGINE_LIBRARY";
pub const DEFAULT_LIBRARY_NAME: &str = "libAppleScriptEngine.dylib";
pub const DEFAULT_EMBEDDED_LANGUAGE_VERSION: &str = "2.8";

/// Which implementation sits behind the native boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// The OSA bridge library, loaded from `path`.
    Library { path: PathBuf },
    /// The in-process Rhai stand-in.
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub backend: BackendConfig,
    /// Version string the embedded runtime reports when queried.
    pub embedded_language_version: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::library(DEFAULT_LIBRARY_NAME)
        } else {
            Self::embedded()
        }
    }
}

impl RuntimeConfig {
    pub fn embedded() -> Self {
        Self {
            backend: BackendConfig::Embedded,
            embedded_language_version: DEFAULT_EMBEDDED_LANGUAGE_VERSION.to_string(),
        }
    }

    pub fn library(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::Library { path: path.into() },
            embedded_language_version: DEFAULT_EMBEDDED_LANGUAGE_VERSION.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, OsaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `OSA_RUNTIME` / `OSA_ENGINE_LIBRARY` style keys.
    ///
    /// A library path alone selects the library backend.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OsaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let library = lookup(ENV_LIBRARY).filter(|path| !path.trim().is_empty());
        let runtime = lookup(ENV_RUNTIME).map(|value| value.trim().to_ascii_lowercase());

        match (runtime.as_deref(), library) {
            (None | Some(""), None) => Ok(Self::default()),
            (None | Some("") | Some("library"), Some(path)) => Ok(Self::library(path)),
            (Some("library"), None) => Ok(Self::library(DEFAULT_LIBRARY_NAME)),
            (Some("embedded"), _) => Ok(Self::embedded()),
            (Some(other), _) => Err(OsaError::initialization(
                INIT_CONFIG_INVALID,
                format!(
                    "{} must be \"library\" or \"embedded\", got \"{}\".",
                    ENV_RUNTIME, other
                ),
            )),
        }
    }

    pub fn describe(&self) -> String {
        match &self.backend {
            BackendConfig::Library { path } => format!("library:{}", path.display()),
            BackendConfig::Embedded => "embedded".to_string(),
        }
    }
}
