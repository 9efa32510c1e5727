pub mod context;
pub mod error;
pub mod value;

pub use context::{Bindings, ExecutionContext, Scope};
pub use error::{ErrorKind, OsaError};
pub use value::OsaValue;
