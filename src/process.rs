//! Helpers for running external tools and mapping their failures.

use std::process::{Command, Output};

use crate::error::ExtractError;

/// Run a command to completion and return its stdout as (lossy) UTF-8.
///
/// A missing binary maps to [`ExtractError::ToolNotFound`]; a non-zero exit
/// maps to whatever `on_failure` builds from the tool's stderr.
pub(crate) fn run_capture(
    cmd: &mut Command,
    tool_name: &str,
    on_failure: impl FnOnce(String) -> ExtractError,
) -> Result<String, ExtractError> {
    handle_output(cmd.output(), tool_name, on_failure)
}

fn handle_output(
    result: std::io::Result<Output>,
    tool_name: &str,
    on_failure: impl FnOnce(String) -> ExtractError,
) -> Result<String, ExtractError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(on_failure(format!(
                "{} exited with {}: {}",
                tool_name,
                output.status,
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_tool_not_found() {
        let err = run_capture(
            &mut Command::new("lens-definitely-not-installed"),
            "lens-definitely-not-installed",
            ExtractError::Converter,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_uses_failure_mapping() {
        let err = run_capture(&mut Command::new("false"), "false", ExtractError::Converter)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Converter(_)));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let out = run_capture(
            Command::new("echo").arg("clause 4.2"),
            "echo",
            ExtractError::Converter,
        )
        .unwrap();
        assert_eq!(out.trim(), "clause 4.2");
    }
}
