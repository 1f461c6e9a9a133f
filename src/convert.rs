//! The conversion orchestrator.
//!
//! [`ConversionOrchestrator`] validates the input, hands a
//! [`ConversionRequest`] to its [`ExternalConverterPort`] and turns the
//! outcome into `Ok` or a [`ConversionError`]. It holds no per-call state,
//! so one instance can be cloned and shared freely.
//!
//! Two entry points:
//!
//! * [`convert`](ConversionOrchestrator::convert) — the converter writes
//!   the caller's output file.
//! * [`convert_to_value`](ConversionOrchestrator::convert_to_value) — the
//!   converter writes a temporary file, which is read back, decoded if JSON
//!   was requested, and deleted on every exit path.

use crate::config::ConverterConfig;
use crate::error::ConversionError;
use crate::output::{decode_pages, ConversionValue, PageRecord};
use crate::process::ScriptConverter;
use crate::progress::ProgressCallback;
use crate::request::{ConversionRequest, ExternalConverterPort, OutputFormat};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempPath;
use tracing::{debug, info, warn};

/// Prefix of temporary output files on the value path.
const TEMP_PREFIX: &str = "pdf2md-";

/// Drives the external converter for each conversion call.
#[derive(Clone)]
pub struct ConversionOrchestrator {
    port: Arc<dyn ExternalConverterPort>,
    temp_dir: Option<PathBuf>,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ConversionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionOrchestrator")
            .field("port", &"<dyn ExternalConverterPort>")
            .field("temp_dir", &self.temp_dir)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl ConversionOrchestrator {
    /// Orchestrate the script converter described by `config`.
    pub fn new(config: ConverterConfig) -> Self {
        let temp_dir = config.temp_dir.clone();
        let progress_callback = config.progress_callback.clone();
        Self {
            port: Arc::new(ScriptConverter::new(config)),
            temp_dir,
            progress_callback,
        }
    }

    /// Resolve `node` and the converter script from their default locations.
    pub fn from_default_location() -> Result<Self, ConversionError> {
        Ok(Self::new(ConverterConfig::builder().build()?))
    }

    /// Orchestrate any converter implementation.
    pub fn with_port(port: Arc<dyn ExternalConverterPort>) -> Self {
        Self {
            port,
            temp_dir: None,
            progress_callback: None,
        }
    }

    /// Allocate temporary output files in `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Convert `input` and have the converter write the result to `output`.
    ///
    /// # Errors
    /// - [`ConversionError::NotFound`] if `input` does not exist; nothing
    ///   is spawned and `output` is untouched.
    /// - [`ConversionError::ProcessFailure`] if the converter exits non-zero,
    ///   carrying its stderr, exit code and command line.
    /// - [`ConversionError::Timeout`] / [`ConversionError::SpawnFailed`]
    ///   from the port.
    ///
    /// Whether `output`'s parent directory must exist is up to the converter.
    pub async fn convert(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        format: OutputFormat,
    ) -> Result<(), ConversionError> {
        let input = input.as_ref();
        validate_input(input)?;

        let request = ConversionRequest::new(input, output.as_ref(), format);
        self.observed(input, format, self.execute(&request)).await?;
        info!("Wrote {}", request.output.display());
        Ok(())
    }

    /// Convert `input` and return the result in memory.
    ///
    /// Returns [`ConversionValue::Markdown`] for [`OutputFormat::Markdown`]
    /// and [`ConversionValue::Pages`] for [`OutputFormat::Json`]. Malformed
    /// JSON is a [`ConversionError::DecodeFailure`]. The temporary file is
    /// removed whether the call succeeds or fails.
    pub async fn convert_to_value(
        &self,
        input: impl AsRef<Path>,
        format: OutputFormat,
    ) -> Result<ConversionValue, ConversionError> {
        let input = input.as_ref();
        validate_input(input)?;

        self.observed(input, format, async {
            // Dropping `temp` deletes the file, including on the `?` paths.
            let temp = self.allocate_temp(format)?;
            let request = ConversionRequest::new(input, temp.to_path_buf(), format);
            self.execute(&request).await?;
            read_output(&temp, format).await
        })
        .await
    }

    /// [`convert_to_value`](Self::convert_to_value) as Markdown text.
    pub async fn convert_to_markdown(&self, input: impl AsRef<Path>) -> Result<String, ConversionError> {
        match self.convert_to_value(input, OutputFormat::Markdown).await? {
            ConversionValue::Markdown(md) => Ok(md),
            ConversionValue::Pages(_) => Err(ConversionError::Internal(
                "Markdown conversion produced page records".into(),
            )),
        }
    }

    /// [`convert_to_value`](Self::convert_to_value) as page records.
    pub async fn convert_to_pages(
        &self,
        input: impl AsRef<Path>,
    ) -> Result<Vec<PageRecord>, ConversionError> {
        match self.convert_to_value(input, OutputFormat::Json).await? {
            ConversionValue::Pages(pages) => Ok(pages),
            ConversionValue::Markdown(_) => Err(ConversionError::Internal(
                "JSON conversion produced Markdown text".into(),
            )),
        }
    }

    /// Blocking wrapper around [`convert`](Self::convert).
    ///
    /// Creates a temporary tokio runtime internally; do not call from
    /// inside an async context.
    pub fn convert_sync(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        format: OutputFormat,
    ) -> Result<(), ConversionError> {
        blocking_runtime()?.block_on(self.convert(input, output, format))
    }

    /// Blocking wrapper around [`convert_to_value`](Self::convert_to_value).
    pub fn convert_to_value_sync(
        &self,
        input: impl AsRef<Path>,
        format: OutputFormat,
    ) -> Result<ConversionValue, ConversionError> {
        blocking_runtime()?.block_on(self.convert_to_value(input, format))
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Run the port and classify its outcome.
    async fn execute(&self, request: &ConversionRequest) -> Result<(), ConversionError> {
        let outcome = self.port.run(request).await?;
        if !outcome.success() {
            return Err(ConversionError::ProcessFailure {
                command: outcome.command,
                exit_code: outcome.exit_code,
                stderr: outcome.stderr,
            });
        }
        Ok(())
    }

    /// Wrap one conversion with timing, logging and progress events.
    async fn observed<T, F>(
        &self,
        input: &Path,
        format: OutputFormat,
        work: F,
    ) -> Result<T, ConversionError>
    where
        F: Future<Output = Result<T, ConversionError>>,
    {
        let start = Instant::now();
        info!("Starting conversion: {} ({:?})", input.display(), format);
        if let Some(ref cb) = self.progress_callback {
            cb.on_conversion_start(input, format);
        }

        let result = work.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => {
                info!("Converted {} in {}ms", input.display(), elapsed_ms);
                if let Some(ref cb) = self.progress_callback {
                    cb.on_conversion_complete(input, elapsed_ms);
                }
            }
            Err(e) => {
                warn!("Conversion of {} failed: {}", input.display(), e);
                if let Some(ref cb) = self.progress_callback {
                    cb.on_conversion_error(input, &e.to_string());
                }
            }
        }
        result
    }

    fn allocate_temp(&self, format: OutputFormat) -> Result<TempPath, ConversionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(format.file_suffix());
        let file = match self.temp_dir {
            Some(ref dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(ConversionError::TempFile)?;

        // Close our handle so the converter can replace the file freely.
        let path = file.into_temp_path();
        debug!("Temporary output: {}", path.display());
        Ok(path)
    }
}

/// Check that `path` names an existing, readable regular file.
fn validate_input(path: &Path) -> Result<(), ConversionError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConversionError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ConversionError::NotFound {
                path: path.to_path_buf(),
            });
        }
    };

    if !metadata.is_file() {
        return Err(ConversionError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ConversionError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(ConversionError::NotFound {
            path: path.to_path_buf(),
        }),
    }
}

async fn read_output(path: &Path, format: OutputFormat) -> Result<ConversionValue, ConversionError> {
    let read_failed = |source| ConversionError::OutputReadFailed {
        path: path.to_path_buf(),
        source,
    };

    match format {
        OutputFormat::Markdown => tokio::fs::read_to_string(path)
            .await
            .map(ConversionValue::Markdown)
            .map_err(read_failed),
        OutputFormat::Json => {
            let bytes = tokio::fs::read(path).await.map_err(read_failed)?;
            Ok(ConversionValue::Pages(decode_pages(&bytes)?))
        }
    }
}

fn blocking_runtime() -> Result<tokio::runtime::Runtime, ConversionError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConversionError::Internal(format!("Failed to create tokio runtime: {}", e)))
}
