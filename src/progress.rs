//! Progress-callback trait for conversion lifecycle events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to hear when
//! the converter is launched and how it ended. The CLI uses this to drive
//! its spinner; a service might forward the events to its own metrics.
//!
//! # Example
//!
//! ```rust
//! use pdf2md_bridge::{ConversionProgressCallback, OutputFormat};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_conversion_complete(&self, input: &Path, elapsed_ms: u64) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} done in {}ms", input.display(), elapsed_ms);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { finished: AtomicUsize::new(0) });
//! cb.on_conversion_start(Path::new("a.pdf"), OutputFormat::Markdown);
//! ```

use crate::request::OutputFormat;
use std::path::Path;
use std::sync::Arc;

/// Called by the orchestrator around each converter invocation.
///
/// Implementations must be `Send + Sync`: one orchestrator may be shared by
/// several tasks converting different files at once. All methods default to
/// no-ops so callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called after input validation, just before the converter is launched.
    fn on_conversion_start(&self, input: &Path, format: OutputFormat) {
        let _ = (input, format);
    }

    /// Called when the converter exited successfully (and, on the value
    /// path, its output was read back).
    fn on_conversion_complete(&self, input: &Path, elapsed_ms: u64) {
        let _ = (input, elapsed_ms);
    }

    /// Called once for any failure after the start event.
    ///
    /// # Arguments
    /// * `input` — the PDF being converted
    /// * `error` — human-readable error description
    fn on_conversion_error(&self, input: &Path, error: &str) {
        let _ = (input, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, _input: &Path, _format: OutputFormat) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _input: &Path, _elapsed_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_error(&self, _input: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(Path::new("a.pdf"), OutputFormat::Json);
        cb.on_conversion_complete(Path::new("a.pdf"), 12);
        cb.on_conversion_error(Path::new("a.pdf"), "boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let input = Path::new("report.pdf");

        tracker.on_conversion_start(input, OutputFormat::Markdown);
        tracker.on_conversion_complete(input, 40);
        tracker.on_conversion_start(input, OutputFormat::Json);
        tracker.on_conversion_error(input, "exit code 1");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}
