//! Request, outcome and the port through which the converter is invoked.
//!
//! [`ExternalConverterPort`] is the seam between orchestration and process
//! mechanics. The orchestrator only ever sees a [`ConversionRequest`] going
//! in and an [`ExternalProcessOutcome`] coming out, so a different
//! converter (another script, a container, an in-process implementation)
//! can be dropped in without touching [`crate::convert`].

use crate::error::ConversionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output encoding requested from the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One UTF-8 Markdown document for the whole PDF. (default)
    #[default]
    Markdown,
    /// A JSON array of `{ "page": n, "content": "…" }` records.
    Json,
}

impl OutputFormat {
    /// Map the converter's `--json` flag to a format.
    pub fn from_json_flag(as_json: bool) -> Self {
        if as_json {
            OutputFormat::Json
        } else {
            OutputFormat::Markdown
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }

    /// Suffix used for temporary output files of this format.
    pub fn file_suffix(self) -> &'static str {
        match self {
            OutputFormat::Markdown => ".md",
            OutputFormat::Json => ".json",
        }
    }
}

/// One conversion call: read `input`, have the converter write `output`.
///
/// Built per call and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            format,
        }
    }
}

/// What a finished converter process left behind.
///
/// Used only to classify success or failure; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProcessOutcome {
    /// Human-readable rendering of the invoked command line.
    pub command: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub stdout: String,
}

impl ExternalProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the external converter for one request.
///
/// Implementations return `Ok` whenever the converter ran to completion,
/// whatever its exit code; the orchestrator decides what a non-zero code
/// means. `Err` is reserved for failures where no outcome exists: the
/// program could not be launched, or it was killed on timeout.
#[async_trait]
pub trait ExternalConverterPort: Send + Sync {
    async fn run(&self, request: &ConversionRequest) -> Result<ExternalProcessOutcome, ConversionError>;
}
