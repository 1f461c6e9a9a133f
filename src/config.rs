//! Configuration for the external converter.
//!
//! [`ConverterConfig`] answers one question: how is the converter launched?
//! It is produced once by [`ConverterConfigBuilder::build`], which resolves
//! the runtime and the entry-point script up front, and is never mutated
//! afterwards. Every conversion made through an orchestrator built from it
//! uses the same resolved paths.

use crate::error::ConversionError;
use crate::progress::ProgressCallback;
use converter_locate::{DEFAULT_INSTALLER, DEFAULT_RUNTIME};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Resolved, immutable converter configuration.
///
/// Built via [`ConverterConfig::builder()`].
///
/// # Example
/// ```rust,no_run
/// use pdf2md_bridge::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .runtime("node")
///     .entry_point("js/pdf-to-md.js")
///     .timeout_secs(120)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Absolute path of the runtime program (e.g. `/usr/bin/node`).
    pub runtime: PathBuf,

    /// Absolute path of the converter script passed to the runtime.
    pub entry_point: PathBuf,

    /// Extra arguments placed between the runtime and the entry point,
    /// e.g. `--max-old-space-size=4096`.
    pub runtime_args: Vec<String>,

    /// Kill the converter and fail with a timeout after this many seconds.
    /// `None` waits for as long as the converter runs. Default: `None`.
    pub timeout_secs: Option<u64>,

    /// Directory for temporary output files on the value path.
    /// `None` uses the system temp directory.
    pub temp_dir: Option<PathBuf>,

    /// Lifecycle events for each conversion.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("runtime", &self.runtime)
            .field("entry_point", &self.entry_point)
            .field("runtime_args", &self.runtime_args)
            .field("timeout_secs", &self.timeout_secs)
            .field("temp_dir", &self.temp_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }
}

/// Builder for [`ConverterConfig`].
///
/// Holds the unresolved inputs; nothing touches the filesystem until
/// [`build`](Self::build).
pub struct ConverterConfigBuilder {
    runtime: String,
    entry_point: Option<PathBuf>,
    runtime_args: Vec<String>,
    timeout_secs: Option<u64>,
    temp_dir: Option<PathBuf>,
    install_dependencies: bool,
    progress_callback: Option<ProgressCallback>,
}

impl Default for ConverterConfigBuilder {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            entry_point: None,
            runtime_args: Vec::new(),
            timeout_secs: None,
            temp_dir: None,
            install_dependencies: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfigBuilder")
            .field("runtime", &self.runtime)
            .field("entry_point", &self.entry_point)
            .field("runtime_args", &self.runtime_args)
            .field("timeout_secs", &self.timeout_secs)
            .field("temp_dir", &self.temp_dir)
            .field("install_dependencies", &self.install_dependencies)
            .finish()
    }
}

impl ConverterConfigBuilder {
    /// Runtime program name or path. Default: `node`.
    pub fn runtime(mut self, program: impl Into<String>) -> Self {
        self.runtime = program.into();
        self
    }

    /// Explicit converter script. When unset, the standard search order of
    /// [`converter_locate::locate_entry_point`] applies.
    pub fn entry_point(mut self, path: impl Into<PathBuf>) -> Self {
        self.entry_point = Some(path.into());
        self
    }

    pub fn runtime_arg(mut self, arg: impl Into<String>) -> Self {
        self.runtime_args.push(arg.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Run `npm install` next to the entry point if its dependencies are
    /// missing. Default: false.
    pub fn install_dependencies(mut self, v: bool) -> Self {
        self.install_dependencies = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Validate the settings and resolve the runtime and entry point.
    pub fn build(self) -> Result<ConverterConfig, ConversionError> {
        if self.timeout_secs == Some(0) {
            return Err(ConversionError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref dir) = self.temp_dir {
            if !dir.is_dir() {
                return Err(ConversionError::InvalidConfig(format!(
                    "Temp directory '{}' does not exist or is not a directory",
                    dir.display()
                )));
            }
        }

        let runtime = converter_locate::resolve_runtime(&self.runtime)?;
        let entry_point = converter_locate::locate_entry_point(self.entry_point.as_deref())?;
        debug!(
            "Resolved converter: {} {}",
            runtime.display(),
            entry_point.display()
        );

        if self.install_dependencies
            && converter_locate::ensure_dependencies(&entry_point, DEFAULT_INSTALLER)?
        {
            info!(
                "Installed converter dependencies next to {}",
                entry_point.display()
            );
        }

        Ok(ConverterConfig {
            runtime,
            entry_point,
            runtime_args: self.runtime_args,
            timeout_secs: self.timeout_secs,
            temp_dir: self.temp_dir,
            progress_callback: self.progress_callback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_script(dir: &tempfile::TempDir) -> PathBuf {
        let script = dir.path().join("convert.sh");
        std::fs::write(&script, "exit 0\n").unwrap();
        script
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ConverterConfig::builder().timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, ConversionError::InvalidConfig(_)));
    }

    #[test]
    fn missing_temp_dir_rejected() {
        let err = ConverterConfig::builder()
            .temp_dir("/definitely/not/a/dir")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidConfig(_)));
    }

    #[test]
    fn missing_entry_point_is_not_located() {
        let err = ConverterConfig::builder()
            .runtime(std::env::current_exe().unwrap().to_string_lossy().to_string())
            .entry_point("/no/such/pdf-to-md.js")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConversionError::ConverterNotLocated(_)));
    }

    #[test]
    fn missing_runtime_is_not_located() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConverterConfig::builder()
            .runtime("/definitely/not/node")
            .entry_point(stub_script(&dir))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConversionError::ConverterNotLocated(_)));
    }

    #[cfg(unix)]
    #[test]
    fn build_resolves_runtime_and_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_script(&dir);

        let config = ConverterConfig::builder()
            .runtime("sh")
            .entry_point(&script)
            .runtime_arg("-e")
            .timeout_secs(5)
            .temp_dir(dir.path())
            .build()
            .expect("valid config");

        assert!(config.runtime.is_absolute());
        assert_eq!(config.entry_point, script);
        assert_eq!(config.runtime_args, vec!["-e".to_string()]);
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(config.temp_dir.as_deref(), Some(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn debug_hides_callback() {
        use crate::progress::NoopProgressCallback;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let config = ConverterConfig::builder()
            .runtime("sh")
            .entry_point(stub_script(&dir))
            .progress_callback(Arc::new(NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(dbg.contains("<dyn ConversionProgressCallback>"), "got: {dbg}");
    }
}
