//! The native side of the adapter: one runtime per process, reached only
//! through [`NativeRuntime`].

pub mod backend;
pub mod config;
pub mod embedded;
pub mod library;
pub mod marshal;
pub mod runtime;

pub use backend::{Evaluation, NativeBackend, ScopedNamespace, VariableFrame};
pub use config::{BackendConfig, RuntimeConfig};
pub use marshal::Namespace;
pub use runtime::{initialize, process_runtime, NativeRuntime, RuntimeCell};
