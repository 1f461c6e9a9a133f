//! The default [`ExternalConverterPort`]: run a script under a runtime.
//!
//! The command line is
//!
//! ```text
//! <runtime> [runtime_args…] <entry_point> [--json] <input> <output>
//! ```
//!
//! The converter writes `output` itself; we only capture its exit status
//! and streams. stdin is closed so a converter that unexpectedly prompts
//! fails instead of hanging.

use crate::config::ConverterConfig;
use crate::error::ConversionError;
use crate::request::{ConversionRequest, ExternalConverterPort, ExternalProcessOutcome};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Flag that switches the converter to per-page JSON output.
pub const JSON_FLAG: &str = "--json";

/// Runs the converter described by a [`ConverterConfig`].
#[derive(Debug, Clone)]
pub struct ScriptConverter {
    config: ConverterConfig,
}

impl ScriptConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }
}

/// Arguments passed to the runtime for `request`, in order.
pub fn converter_args(config: &ConverterConfig, request: &ConversionRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = config.runtime_args.iter().map(OsString::from).collect();
    args.push(config.entry_point.clone().into_os_string());
    if request.format.is_json() {
        args.push(OsString::from(JSON_FLAG));
    }
    args.push(request.input.clone().into_os_string());
    args.push(request.output.clone().into_os_string());
    args
}

/// Space-joined rendering of the command line, for logs and errors only.
pub fn render_command(runtime: &Path, args: &[OsString]) -> String {
    std::iter::once(runtime.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl ExternalConverterPort for ScriptConverter {
    async fn run(&self, request: &ConversionRequest) -> Result<ExternalProcessOutcome, ConversionError> {
        let args = converter_args(&self.config, request);
        let command = render_command(&self.config.runtime, &args);
        debug!("Running converter: {}", command);

        let mut cmd = Command::new(&self.config.runtime);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Dropping the output future on timeout drops the child, and
        // kill_on_drop makes that a kill.
        let result = match self.config.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), cmd.output()).await {
                Ok(r) => r,
                Err(_) => {
                    warn!("Converter exceeded {}s, killed: {}", secs, command);
                    return Err(ConversionError::Timeout { command, secs });
                }
            },
            None => cmd.output().await,
        };

        let output = result.map_err(|source| ConversionError::SpawnFailed {
            command: command.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        if !stdout.is_empty() {
            debug!("Converter stdout: {}", stdout);
        }

        Ok(ExternalProcessOutcome {
            command,
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            stdout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::OutputFormat;
    use std::path::PathBuf;

    fn config() -> ConverterConfig {
        ConverterConfig {
            runtime: PathBuf::from("/usr/bin/node"),
            entry_point: PathBuf::from("/opt/pdf2md/js/pdf-to-md.js"),
            runtime_args: Vec::new(),
            timeout_secs: None,
            temp_dir: None,
            progress_callback: None,
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn markdown_args_have_no_json_flag() {
        let req = ConversionRequest::new("in.pdf", "out.md", OutputFormat::Markdown);
        assert_eq!(
            strings(&converter_args(&config(), &req)),
            vec!["/opt/pdf2md/js/pdf-to-md.js", "in.pdf", "out.md"]
        );
    }

    #[test]
    fn json_flag_precedes_positionals() {
        let req = ConversionRequest::new("in.pdf", "out.json", OutputFormat::Json);
        assert_eq!(
            strings(&converter_args(&config(), &req)),
            vec!["/opt/pdf2md/js/pdf-to-md.js", "--json", "in.pdf", "out.json"]
        );
    }

    #[test]
    fn runtime_args_come_before_entry_point() {
        let mut cfg = config();
        cfg.runtime_args = vec!["--max-old-space-size=4096".into()];
        let req = ConversionRequest::new("a.pdf", "b.md", OutputFormat::Markdown);
        let args = strings(&converter_args(&cfg, &req));
        assert_eq!(args[0], "--max-old-space-size=4096");
        assert_eq!(args[1], "/opt/pdf2md/js/pdf-to-md.js");
    }

    #[test]
    fn rendered_command_is_space_joined() {
        let cfg = config();
        let req = ConversionRequest::new("in.pdf", "out.json", OutputFormat::Json);
        let rendered = render_command(&cfg.runtime, &converter_args(&cfg, &req));
        assert_eq!(
            rendered,
            "/usr/bin/node /opt/pdf2md/js/pdf-to-md.js --json in.pdf out.json"
        );
    }

    #[tokio::test]
    async fn missing_runtime_is_spawn_failure() {
        let mut cfg = config();
        cfg.runtime = PathBuf::from("/definitely/not/a/runtime");
        let converter = ScriptConverter::new(cfg);
        let req = ConversionRequest::new("in.pdf", "out.md", OutputFormat::Markdown);

        let err = converter.run(&req).await.unwrap_err();
        assert!(matches!(err, ConversionError::SpawnFailed { .. }), "got: {err:?}");
    }
}
