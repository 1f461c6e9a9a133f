//! Error types for the pdf2md-bridge library.
//!
//! Every failure is a distinct [`ConversionError`] variant so callers can
//! branch on what went wrong: a missing input file calls for a different
//! remedy than a converter crash or malformed JSON.
//!
//! Nothing here is retried. The external converter is assumed to be
//! deterministic for a given input, so a failure is reported the first time
//! it happens.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2md-bridge library.
#[derive(Debug, Error)]
pub enum ConversionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path. Raised before any
    /// process is spawned or temporary file allocated.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but is a directory or another non-regular file.
    #[error("Input '{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    // ── Converter process errors ──────────────────────────────────────────
    /// The converter ran and exited non-zero (or was killed by a signal,
    /// in which case `exit_code` is `None`). `stderr` is kept verbatim.
    #[error("Conversion failed (exit code {}): {}\nCommand: {command}", display_code(.exit_code), .stderr.trim_end())]
    ProcessFailure {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The converter did not finish within the configured timeout and was killed.
    #[error("Converter timed out after {secs}s\nCommand: {command}")]
    Timeout { command: String, secs: u64 },

    /// The runtime could not be launched at all.
    #[error("Failed to launch converter: {source}\nCommand: {command}\nIs the runtime installed?")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The converter's JSON output is malformed or has an unexpected shape.
    #[error("Failed to decode converter JSON output: {detail}")]
    DecodeFailure { detail: String },

    /// Reading the converter's output back into memory failed.
    #[error("Failed to read converter output '{path}': {source}")]
    OutputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A temporary output file could not be allocated.
    #[error("Failed to create temporary output file: {0}")]
    TempFile(#[source] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// The runtime or the converter entry point could not be resolved.
    #[error(
        "Converter not available: {0}\n\n\
Install Node.js and the converter script, then either:\n\
  • pass --converter /path/to/pdf-to-md.js, or\n\
  • set PDF2MD_CONVERTER_SCRIPT=/path/to/pdf-to-md.js\n"
    )]
    ConverterNotLocated(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none, terminated by signal".to_string(),
    }
}

impl From<converter_locate::LocateError> for ConversionError {
    fn from(e: converter_locate::LocateError) -> Self {
        ConversionError::ConverterNotLocated(e.to_string())
    }
}
