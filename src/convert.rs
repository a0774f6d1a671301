//! Conversion of legacy binary word-processor files (`.doc`) to text.
//!
//! Parsing the OLE2 `.doc` format is left to an external converter. The
//! default is `catdoc`, which prints the document text to stdout.

use std::path::Path;
use std::process::Command;

use crate::config::ConverterConfig;
use crate::error::ExtractError;
use crate::process::run_capture;

/// Turns a document file into plain text.
pub trait DocConverter: Send + Sync {
    fn convert(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Runs `<command> <args..> <path>` and captures stdout.
pub struct CommandConverter {
    command: String,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

impl DocConverter for CommandConverter {
    fn convert(&self, path: &Path) -> Result<String, ExtractError> {
        run_capture(
            Command::new(&self.command).args(&self.args).arg(path),
            &self.command,
            ExtractError::Converter,
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_converter_stdout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let doc = tmp.path().join("lease.doc");
        std::fs::write(&doc, "The tenant shall pay rent monthly.").unwrap();

        // `cat` stands in for catdoc: it prints the file to stdout.
        let converter = CommandConverter::new(&ConverterConfig {
            command: "cat".to_string(),
            args: Vec::new(),
        });
        let text = converter.convert(&doc).unwrap();
        assert_eq!(text, "The tenant shall pay rent monthly.");
    }

    #[test]
    fn failing_converter_is_an_error() {
        let converter = CommandConverter::new(&ConverterConfig {
            command: "false".to_string(),
            args: Vec::new(),
        });
        let err = converter.convert(Path::new("whatever.doc")).unwrap_err();
        assert!(matches!(err, ExtractError::Converter(_)));
    }
}
