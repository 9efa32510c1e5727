//! Backend that talks to the OSA bridge library over its C ABI.
//!
//! ```c
//! int32_t ase_prepare_host(void);                  /* optional */
//! int32_t ase_init(void);
//! int32_t ase_language_version(char **out);
//! int32_t ase_eval(const char *program, const char *bindings_json,
//!                  char **out_json, char **out_error);
//! void    ase_free(char *ptr);
//! ```
//!
//! Every string the library hands back is owned by the library and released
//! through `ase_free`. `ase_eval` answers `{"result": <value>, "bindings": {..}}`.

use std::ffi::{c_char, c_int, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;
use osa_core::error::{
    EVAL_NATIVE_CALL, EVAL_PARSE, EVAL_RUNTIME, INIT_HOST_PRECONDITION, INIT_LIBRARY_LOAD,
    INIT_NATIVE_FAILED, INIT_SYMBOL_MISSING,
};
use osa_core::{OsaError, OsaValue, Scope};
use serde::Deserialize;
use serde_json::Value;

use crate::backend::{NativeBackend, VariableFrame};
use crate::marshal::{value_from_json, value_to_json};

type PrepareHostFn = unsafe extern "C" fn() -> c_int;
type InitFn = unsafe extern "C" fn() -> c_int;
type VersionFn = unsafe extern "C" fn(out: *mut *mut c_char) -> c_int;
type EvalFn = unsafe extern "C" fn(
    program: *const c_char,
    bindings_json: *const c_char,
    out_json: *mut *mut c_char,
    out_error: *mut *mut c_char,
) -> c_int;
type FreeFn = unsafe extern "C" fn(ptr: *mut c_char);

pub const STATUS_OK: c_int = 0;
pub const STATUS_PARSE_ERROR: c_int = 1;
pub const STATUS_RUNTIME_ERROR: c_int = 2;

pub struct LibraryBackend {
    path: PathBuf,
    language_version: VersionFn,
    eval: EvalFn,
    free: FreeFn,
    variables: VariableFrame<Value>,
    // Keeps the symbols above valid.
    _library: Library,
}

impl LibraryBackend {
    /// Loads the library, runs the host precondition hook if exported, then
    /// the library's one-time init.
    pub fn load(path: &Path) -> Result<Self, OsaError> {
        tracing::debug!(path = %path.display(), "loading OSA bridge library");
        let library = unsafe { Library::new(path) }.map_err(|error| {
            OsaError::initialization(
                INIT_LIBRARY_LOAD,
                format!("Cannot load \"{}\": {}", path.display(), error),
            )
        })?;

        let prepare_host = unsafe { library.get::<PrepareHostFn>(b"ase_prepare_host\0") }
            .ok()
            .map(|symbol| *symbol);
        let init = required_symbol::<InitFn>(&library, "ase_init")?;
        let language_version = required_symbol::<VersionFn>(&library, "ase_language_version")?;
        let eval = required_symbol::<EvalFn>(&library, "ase_eval")?;
        let free = required_symbol::<FreeFn>(&library, "ase_free")?;

        if let Some(prepare_host) = prepare_host {
            let status = unsafe { prepare_host() };
            if status != STATUS_OK {
                return Err(OsaError::initialization(
                    INIT_HOST_PRECONDITION,
                    format!("ase_prepare_host returned status {}.", status),
                ));
            }
        }

        let status = unsafe { init() };
        if status != STATUS_OK {
            return Err(OsaError::initialization(
                INIT_NATIVE_FAILED,
                format!("ase_init returned status {}.", status),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            language_version,
            eval,
            free,
            variables: VariableFrame::new(),
            _library: library,
        })
    }

    fn adopt(&self, ptr: *mut c_char) -> NativeString {
        NativeString {
            ptr,
            free: self.free,
        }
    }
}

impl NativeBackend for LibraryBackend {
    fn describe(&self) -> String {
        format!("library {}", self.path.display())
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
        let wire = value_to_json(value)?;
        self.variables.insert(scope, name, wire);
        Ok(())
    }

    fn lookup_variable(&mut self, scope: Scope, name: &str) -> Result<OsaValue, OsaError> {
        let wire = self
            .variables
            .get(scope, name)
            .cloned()
            .ok_or_else(|| OsaError::not_found(name))?;
        value_from_json(wire)
    }

    fn variable_names(&self) -> Vec<(Scope, String)> {
        self.variables.names()
    }

    fn evaluate(&mut self, program: &str) -> Result<OsaValue, OsaError> {
        let program = to_c_string(program, "Program text")?;
        let mut document = serde_json::Map::new();
        for (name, value) in self.variables.layered() {
            document.insert(name.clone(), value.clone());
        }
        let document = serde_json::to_string(&Value::Object(document))
            .map_err(|error| OsaError::marshal(format!("Binding document: {}", error)))?;
        let bindings = to_c_string(&document, "Binding document")?;

        let mut out_json: *mut c_char = ptr::null_mut();
        let mut out_error: *mut c_char = ptr::null_mut();
        let status = unsafe {
            (self.eval)(
                program.as_ptr(),
                bindings.as_ptr(),
                &mut out_json,
                &mut out_error,
            )
        };
        let answer = finish_eval(status, self.adopt(out_json), self.adopt(out_error))?;

        for (name, value) in answer.bindings {
            self.variables.absorb(name, value);
        }
        value_from_json(answer.result)
    }

    fn language_version(&mut self) -> Result<String, OsaError> {
        let mut out: *mut c_char = ptr::null_mut();
        let status = unsafe { (self.language_version)(&mut out) };
        let out = self.adopt(out);
        if status != STATUS_OK {
            return Err(OsaError::evaluation(
                EVAL_NATIVE_CALL,
                format!("ase_language_version returned status {}.", status),
            ));
        }
        out.to_text()?.ok_or_else(|| {
            OsaError::evaluation(
                EVAL_NATIVE_CALL,
                "ase_language_version returned no string.",
            )
        })
    }
}

/// A library-owned C string, released through `ase_free` when dropped.
struct NativeString {
    ptr: *mut c_char,
    free: FreeFn,
}

impl NativeString {
    fn to_text(&self) -> Result<Option<String>, OsaError> {
        if self.ptr.is_null() {
            return Ok(None);
        }
        let text = unsafe { CStr::from_ptr(self.ptr) };
        text.to_str()
            .map(|text| Some(text.to_string()))
            .map_err(|error| OsaError::marshal(format!("Native string is not UTF-8: {}", error)))
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.free)(self.ptr) };
        }
    }
}

fn required_symbol<T: Copy>(library: &Library, name: &str) -> Result<T, OsaError> {
    let mut symbol = name.as_bytes().to_vec();
    symbol.push(0);
    unsafe { library.get::<T>(&symbol) }
        .map(|symbol| *symbol)
        .map_err(|error| {
            OsaError::initialization(
                INIT_SYMBOL_MISSING,
                format!("Symbol \"{}\" is missing: {}", name, error),
            )
        })
}

fn to_c_string(text: &str, what: &str) -> Result<CString, OsaError> {
    CString::new(text)
        .map_err(|_| OsaError::marshal(format!("{} contains an interior NUL byte.", what)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvalDocument {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    bindings: serde_json::Map<String, Value>,
}

/// Turns an `ase_eval` answer into a document or a typed error. Takes both
/// out-strings so they are released on every branch.
fn finish_eval(
    status: c_int,
    out_json: NativeString,
    out_error: NativeString,
) -> Result<EvalDocument, OsaError> {
    if status == STATUS_OK {
        return decode_document(&out_json.to_text()?.unwrap_or_default());
    }
    Err(status_error(status, out_error.to_text().ok().flatten()))
}

pub(crate) fn status_error(status: c_int, diagnostic: Option<String>) -> OsaError {
    let diagnostic = diagnostic.filter(|text| !text.is_empty());
    match status {
        STATUS_PARSE_ERROR => OsaError::evaluation(
            EVAL_PARSE,
            diagnostic.unwrap_or_else(|| "Script could not be compiled.".to_string()),
        ),
        STATUS_RUNTIME_ERROR => OsaError::evaluation(
            EVAL_RUNTIME,
            diagnostic.unwrap_or_else(|| "Script raised an error.".to_string()),
        ),
        other => OsaError::evaluation(
            EVAL_NATIVE_CALL,
            format!(
                "ase_eval returned status {}: {}",
                other,
                diagnostic.as_deref().unwrap_or("no diagnostic")
            ),
        ),
    }
}

pub(crate) fn decode_document(text: &str) -> Result<EvalDocument, OsaError> {
    if text.trim().is_empty() {
        return Ok(EvalDocument {
            result: Value::Null,
            bindings: serde_json::Map::new(),
        });
    }
    serde_json::from_str(text)
        .map_err(|error| OsaError::marshal(format!("Malformed evaluation document: {}", error)))
}
