//! # pdf2md-bridge
//!
//! Convert PDF documents to Markdown, or to per-page JSON records, by
//! driving an external converter script.
//!
//! This crate does no PDF parsing of its own. It locates the converter once,
//! launches it per call with the right arguments, and turns the result into
//! a file on disk, a `String`, or a `Vec<PageRecord>`, with a distinct
//! error for every way that can fail.
//!
//! ## Flow
//!
//! ```text
//! caller
//!  │
//!  ├─ 1. Validate  input must be an existing, readable file (no spawn otherwise)
//!  ├─ 2. Invoke    <runtime> <entry_point> [--json] <input> <output>
//!  ├─ 3. Classify  exit 0 → Ok, otherwise ProcessFailure with stderr
//!  └─ 4. Read back (value path only) temp file → text or page records, then delete
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_bridge::{ConversionOrchestrator, ConverterConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConverterConfig::builder()
//!         .entry_point("js/pdf-to-md.js")
//!         .build()?;
//!     let orchestrator = ConversionOrchestrator::new(config);
//!
//!     orchestrator.convert("paper.pdf", "paper.md", OutputFormat::Markdown).await?;
//!
//!     for page in orchestrator.convert_to_pages("paper.pdf").await? {
//!         println!("page {}: {} bytes", page.page, page.content.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2md-bridge = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod process;
pub mod progress;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use convert::ConversionOrchestrator;
pub use error::ConversionError;
pub use output::{decode_pages, ConversionValue, PageRecord};
pub use process::ScriptConverter;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{ConversionRequest, ExternalConverterPort, ExternalProcessOutcome, OutputFormat};
