use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use osa_core::error::{EVAL_NATIVE_CALL, EVAL_RUNTIME_UNAVAILABLE, INIT_NATIVE_FAILED, INIT_WORKER};
use osa_core::{ErrorKind, OsaError, Scope};

use crate::backend::{Evaluation, NativeBackend, ScopedNamespace};
use crate::config::{BackendConfig, RuntimeConfig};
use crate::embedded::EmbeddedBackend;
use crate::library::LibraryBackend;
use crate::marshal::validate_namespace;

const RUNTIME_THREAD_NAME: &str = "osa-runtime";

enum Request {
    Evaluate {
        program: String,
        variables: ScopedNamespace,
        reply: Sender<Result<Evaluation, OsaError>>,
    },
    LanguageVersion {
        reply: Sender<Result<String, OsaError>>,
    },
}

/// Handle to a native runtime confined to its own thread.
///
/// Every call is queued to that thread and answered in order, so calls from
/// any number of engines never interleave inside the backend.
pub struct NativeRuntime {
    requests: Sender<Request>,
    config: Option<RuntimeConfig>,
    description: String,
}

impl NativeRuntime {
    /// Spawns the runtime thread and builds the backend on it.
    ///
    /// Returns only after `loader` has finished; a failed loader leaves no
    /// thread behind.
    pub fn start<F>(loader: F) -> Result<Self, OsaError>
    where
        F: FnOnce() -> Result<Box<dyn NativeBackend>, OsaError> + Send + 'static,
    {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<Request>();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<String, OsaError>>(1);

        thread::Builder::new()
            .name(RUNTIME_THREAD_NAME.to_string())
            .spawn(move || {
                let backend = match guard(loader, init_panic) {
                    Ok(backend) => backend,
                    Err(error) => {
                        let _ = ready_tx.send(Err(error));
                        return;
                    }
                };
                if ready_tx.send(Ok(backend.describe())).is_err() {
                    return;
                }
                serve(backend, request_rx);
            })
            .map_err(|error| {
                OsaError::initialization(
                    INIT_WORKER,
                    format!("Cannot spawn runtime thread: {}", error),
                )
            })?;

        let description = ready_rx.recv().map_err(|_| {
            OsaError::initialization(INIT_WORKER, "Runtime thread exited during initialization.")
        })??;
        tracing::debug!(runtime = %description, "native runtime ready");

        Ok(Self {
            requests: request_tx,
            config: None,
            description,
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, OsaError> {
        let mut runtime = match &config.backend {
            BackendConfig::Library { path } => {
                let path = path.clone();
                Self::start(move || {
                    LibraryBackend::load(&path)
                        .map(|backend| Box::new(backend) as Box<dyn NativeBackend>)
                })?
            }
            BackendConfig::Embedded => {
                let version = config.embedded_language_version.clone();
                Self::start(move || {
                    Ok(Box::new(EmbeddedBackend::new(version)) as Box<dyn NativeBackend>)
                })?
            }
        };
        runtime.config = Some(config.clone());
        Ok(runtime)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn config(&self) -> Option<&RuntimeConfig> {
        self.config.as_ref()
    }

    /// Binds `variables`, runs `program` and reads the variables back, all as
    /// one request. Blocks until the runtime answers.
    pub fn evaluate(
        &self,
        program: &str,
        variables: ScopedNamespace,
    ) -> Result<Evaluation, OsaError> {
        for scope in Scope::ORDERED {
            validate_namespace(variables.scope(scope))?;
        }
        let (reply, answer) = crossbeam_channel::bounded(1);
        self.submit(Request::Evaluate {
            program: program.to_string(),
            variables,
            reply,
        })?;
        answer.recv().map_err(|_| unavailable())?
    }

    /// Asks the runtime for its version. Never cached.
    pub fn language_version(&self) -> Result<String, OsaError> {
        let (reply, answer) = crossbeam_channel::bounded(1);
        self.submit(Request::LanguageVersion { reply })?;
        answer.recv().map_err(|_| unavailable())?
    }

    fn submit(&self, request: Request) -> Result<(), OsaError> {
        self.requests.send(request).map_err(|_| unavailable())
    }
}

impl std::fmt::Debug for NativeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeRuntime")
            .field("description", &self.description)
            .finish()
    }
}

fn serve(mut backend: Box<dyn NativeBackend>, requests: Receiver<Request>) {
    for request in requests.iter() {
        match request {
            Request::Evaluate {
                program,
                variables,
                reply,
            } => {
                tracing::trace!(bytes = program.len(), bindings = variables.len(), "evaluate");
                let result = guard(
                    || run_evaluation(backend.as_mut(), &program, &variables),
                    call_panic,
                );
                let _ = reply.send(result);
            }
            Request::LanguageVersion { reply } => {
                let result = guard(|| backend.language_version(), call_panic);
                let _ = reply.send(result);
            }
        }
    }
    tracing::debug!("native runtime thread stopping");
}

/// One evaluation round trip against `backend`, leaving no variables bound
/// behind it.
pub(crate) fn run_evaluation(
    backend: &mut dyn NativeBackend,
    program: &str,
    variables: &ScopedNamespace,
) -> Result<Evaluation, OsaError> {
    backend.reset_variables();
    let outcome = bind_and_evaluate(backend, program, variables);
    backend.reset_variables();
    outcome
}

fn bind_and_evaluate(
    backend: &mut dyn NativeBackend,
    program: &str,
    bound: &ScopedNamespace,
) -> Result<Evaluation, OsaError> {
    for scope in [Scope::Global, Scope::Engine] {
        for (name, value) in bound.scope(scope) {
            backend.bind_variable(scope, name, value)?;
        }
    }

    let value = backend.evaluate(program)?;

    let mut variables = ScopedNamespace::new();
    for (scope, name) in backend.variable_names() {
        match backend.lookup_variable(scope, &name) {
            Ok(found) => {
                variables.insert(scope, name, found);
            }
            // Script-local temporaries such as closures have no canonical form.
            Err(error) if error.kind == ErrorKind::Binding && !bound.contains(scope, &name) => {
                tracing::trace!(%scope, %name, %error, "skipping unmappable script variable");
            }
            Err(error) => return Err(error),
        }
    }

    Ok(Evaluation { value, variables })
}

fn guard<T>(
    call: impl FnOnce() -> Result<T, OsaError>,
    on_panic: fn(String) -> OsaError,
) -> Result<T, OsaError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(on_panic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}

fn init_panic(message: String) -> OsaError {
    OsaError::initialization(
        INIT_NATIVE_FAILED,
        format!("Runtime initialization panicked: {}", message),
    )
}

fn call_panic(message: String) -> OsaError {
    OsaError::evaluation(
        EVAL_NATIVE_CALL,
        format!("Native call panicked: {}", message),
    )
}

fn unavailable() -> OsaError {
    OsaError::evaluation(
        EVAL_RUNTIME_UNAVAILABLE,
        "Native runtime thread is no longer running.",
    )
}

/// One-time initialization barrier for a [`NativeRuntime`].
///
/// The first caller runs setup; concurrent callers wait for it. The outcome,
/// success or failure, is kept and handed to every later caller.
pub struct RuntimeCell {
    slot: OnceLock<Result<NativeRuntime, OsaError>>,
}

impl RuntimeCell {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    pub fn get_or_start<F>(&self, start: F) -> Result<&NativeRuntime, OsaError>
    where
        F: FnOnce() -> Result<NativeRuntime, OsaError>,
    {
        self.slot.get_or_init(start).as_ref().map_err(Clone::clone)
    }

    /// `None` until setup has run.
    pub fn get(&self) -> Option<Result<&NativeRuntime, OsaError>> {
        self.slot
            .get()
            .map(|outcome| outcome.as_ref().map_err(Clone::clone))
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }
}

impl Default for RuntimeCell {
    fn default() -> Self {
        Self::new()
    }
}

static PROCESS_RUNTIME: RuntimeCell = RuntimeCell::new();

/// Initializes the process-wide runtime from `config`, or returns the one
/// already set up. Only the first call's config is used.
pub fn initialize(config: &RuntimeConfig) -> Result<&'static NativeRuntime, OsaError> {
    let runtime = PROCESS_RUNTIME.get_or_start(|| {
        tracing::debug!(backend = %config.describe(), "initializing native runtime");
        NativeRuntime::from_config(config)
    });
    match &runtime {
        Ok(active) if active.config() != Some(config) => {
            tracing::warn!(
                requested = %config.describe(),
                active = %active.description(),
                "native runtime already initialized with a different config"
            );
        }
        Err(error) => tracing::trace!(%error, "native runtime unavailable"),
        _ => {}
    }
    runtime
}

/// The process-wide runtime, if `initialize` has run.
pub fn process_runtime() -> Option<Result<&'static NativeRuntime, OsaError>> {
    PROCESS_RUNTIME.get()
}
