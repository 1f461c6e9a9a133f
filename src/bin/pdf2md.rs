//! CLI binary for pdf2md-bridge.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConverterConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2md_bridge::{
    ConversionOrchestrator, ConversionProgressCallback, ConversionValue, ConverterConfig,
    OutputFormat, ProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner shown on stderr while the converter runs.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let spinner_style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Converting");
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &Path, format: OutputFormat) {
        let target = if format.is_json() { "JSON" } else { "Markdown" };
        self.bar.set_message(format!("{} → {target}", input.display()));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_conversion_complete(&self, input: &Path, elapsed_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&input.display().to_string()),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        );
    }

    fn on_conversion_error(&self, input: &Path, _error: &str) {
        // The error itself is printed by main() with full context.
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), bold(&input.display().to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (stdout)
  pdf2md document.pdf

  # Convert to file
  pdf2md document.pdf -o output.md

  # Per-page JSON records
  pdf2md --json document.pdf > pages.json

  # Use a specific converter script and runtime
  pdf2md --runtime /usr/local/bin/node --converter ./js/pdf-to-md.js document.pdf

  # Give up on slow documents
  pdf2md --timeout 120 big.pdf -o big.md

CONVERTER LOOKUP (first match wins):
  1. --converter / PDF2MD_CONVERTER_SCRIPT
  2. ./js/pdf-to-md.js
  3. <pdf2md dir>/js/pdf-to-md.js
  4. <pdf2md dir>/../share/pdf2md/js/pdf-to-md.js
  5. ~/.local/share/pdf2md/js/pdf-to-md.js  (platform data dir)

SETUP:
  1. Install Node.js so that `node` is on PATH.
  2. Place pdf-to-md.js and its package.json in one of the locations above.
  3. Run once with --install-deps to fetch its node_modules.
"#;

/// Convert PDF files to Markdown through an external converter script.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md",
    version,
    about = "Convert PDF files to Markdown through an external converter script",
    long_about = "Convert PDF documents to Markdown (or per-page JSON) by running an external \
converter script under Node.js. The converter does the PDF work; pdf2md locates it, runs it, \
and reports its failures.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "PDF2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Produce per-page JSON records instead of one Markdown document.
    #[arg(long, env = "PDF2MD_JSON")]
    json: bool,

    /// Runtime that executes the converter script.
    #[arg(long, env = "PDF2MD_RUNTIME", default_value = "node")]
    runtime: String,

    /// Extra argument for the runtime, placed before the script (repeatable).
    #[arg(long = "runtime-arg", value_name = "ARG", allow_hyphen_values = true)]
    runtime_args: Vec<String>,

    /// Path to the converter entry-point script.
    #[arg(long, env = "PDF2MD_CONVERTER_SCRIPT")]
    converter: Option<PathBuf>,

    /// Kill the converter after this many seconds.
    #[arg(long, env = "PDF2MD_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Directory for temporary output files.
    #[arg(long, env = "PDF2MD_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Run `npm install` next to the converter if node_modules is missing.
    #[arg(long)]
    install_deps: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDF2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters, so library INFO logs
    // are hidden while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    // `install_deps` may run npm, which blocks.
    let config = tokio::task::block_in_place(|| build_config(&cli, progress_cb))?;
    let orchestrator = ConversionOrchestrator::new(config);
    let format = OutputFormat::from_json_flag(cli.json);

    // ── Run conversion ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        orchestrator
            .convert(&cli.input, output_path, format)
            .await
            .context("Conversion failed")?;

        if !cli.quiet && !show_progress {
            eprintln!(
                "{}  {}  →  {}",
                green("✔"),
                cli.input.display(),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let value = orchestrator
            .convert_to_value(&cli.input, format)
            .await
            .context("Conversion failed")?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        match value {
            ConversionValue::Markdown(markdown) => {
                handle
                    .write_all(markdown.as_bytes())
                    .context("Failed to write to stdout")?;
                // Ensure a trailing newline on stdout.
                if !markdown.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
            ConversionValue::Pages(pages) => {
                let json =
                    serde_json::to_string_pretty(&pages).context("Failed to serialise pages")?;
                writeln!(handle, "{json}").context("Failed to write to stdout")?;
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ConverterConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder()
        .runtime(cli.runtime.clone())
        .install_dependencies(cli.install_deps);

    if let Some(ref path) = cli.converter {
        builder = builder.entry_point(path);
    }
    for arg in &cli.runtime_args {
        builder = builder.runtime_arg(arg.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid converter configuration")
}
