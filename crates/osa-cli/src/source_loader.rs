use std::fs;
use std::path::Path;

use osa_core::OsaValue;
use osa_core::OsaError;

use crate::error_map::{cli_arg_invalid, map_cli_source_read};

pub(crate) fn load_program(
    expr: Option<&str>,
    file: Option<&Path>,
) -> Result<String, OsaError> {
    match (expr, file) {
        (Some(expr), None) => Ok(expr.to_string()),
        (None, Some(path)) => fs::read_to_string(path).map_err(map_cli_source_read),
        (Some(_), Some(_)) => Err(cli_arg_invalid("Use either --expr or --file, not both.")),
        (None, None) => Err(cli_arg_invalid("eval requires --expr or --file.")),
    }
}

/// Parses `name=value`. The value is decoded as JSON when it parses, else kept as text.
pub(crate) fn parse_binding(raw: &str) -> Result<(String, OsaValue), OsaError> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(cli_arg_invalid(format!(
            "Binding \"{}\" must look like name=value.",
            raw
        )));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(cli_arg_invalid(format!("Binding \"{}\" has no name.", raw)));
    }
    let value = serde_json::from_str::<OsaValue>(value)
        .unwrap_or_else(|_| OsaValue::String(value.to_string()));
    Ok((name.to_string(), value))
}

pub(crate) fn parse_bindings(raw: &[String]) -> Result<Vec<(String, OsaValue)>, OsaError> {
    raw.iter().map(|entry| parse_binding(entry)).collect()
}
