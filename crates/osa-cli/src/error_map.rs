use osa_core::OsaError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> OsaError {
    OsaError::cli(code, error.to_string())
}

pub(crate) fn emit_error(error: OsaError) -> i32 {
    tracing::debug!(code = %error.code, kind = ?error.kind, "command failed");
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"\"".to_string())
    );
    1
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> OsaError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_output(error: serde_json::Error) -> OsaError {
    map_error("CLI_OUTPUT", error)
}

pub(crate) fn cli_arg_invalid(message: impl Display) -> OsaError {
    map_error("CLI_ARG_INVALID", message)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;
    use osa_core::ErrorKind;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(OsaError::cli("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        let read = map_cli_source_read(std::io::Error::other("read"));
        assert_eq!(read.code, "CLI_SOURCE_READ");
        assert_eq!(read.kind, ErrorKind::Cli);

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert_eq!(map_cli_output(invalid).code, "CLI_OUTPUT");

        assert_eq!(cli_arg_invalid("bad").code, "CLI_ARG_INVALID");
    }
}
