//! Progress-callback trait and the transient status-line reporter.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::ProcessConfigBuilder::progress_callback`] to receive
//! events as the orchestrator advances through targets.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a host application's status bar, a terminal
//! progress bar, or a log file without the library knowing how the host
//! communicates. The trait is `Send + Sync` so the same callback also works
//! from the streaming API.
//!
//! [`StatusLineReporter`] is the built-in implementation of the host-facing
//! contract: it drives a [`StatusSink`] with a per-target
//! `"Processing image <i> of <n>"` line, a final
//! `"Finished processing <N> images, total time: <T> seconds"` summary, and
//! removes the indicator five seconds after completion.

use crate::report::Outcome;
use std::sync::Arc;
use std::time::Duration;

/// Delay between the final summary appearing and the indicator vanishing.
pub const DISMISS_DELAY: Duration = Duration::from_secs(5);

/// Called by the orchestrator as it processes each target.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The per-target loop is strictly sequential, so
/// calls arrive in order, but implementations must still be `Send + Sync`
/// to cross the async boundary.
pub trait RunProgressCallback: Send + Sync {
    /// Called once before the first target, with the fixed total for the
    /// run (the reference-set size at scan time).
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a target's sequence begins.
    ///
    /// `index` is 1-based and counts every attempted target, skips
    /// included.
    fn on_target_start(&self, index: usize, total: usize, path: &str) {
        let _ = (index, total, path);
    }

    /// Called after a target's sequence ends, whatever the outcome.
    fn on_target_done(&self, index: usize, total: usize, path: &str, outcome: &Outcome) {
        let _ = (index, total, path, outcome);
    }

    /// Called in addition to [`Self::on_target_done`] when the outcome was
    /// an error skip.
    fn on_target_error(&self, index: usize, total: usize, path: &str, error: &str) {
        let _ = (index, total, path, error);
    }

    /// Called once after the last target.
    ///
    /// `processed` counts only targets that were actually converted
    /// (skipped targets are excluded); `elapsed_secs` is wall-clock time
    /// for the whole run.
    fn on_run_complete(&self, processed: usize, elapsed_secs: f64) {
        let _ = (processed, elapsed_secs);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::ProcessConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

/// The transient status surface a host exposes: one mutable text line that
/// can be removed when the run's display is dismissed.
pub trait StatusSink: Send + Sync {
    fn set_text(&self, text: &str);
    fn remove(&self);
}

/// Drives a [`StatusSink`] with the run's human-readable status display.
///
/// After the final summary the indicator stays visible for
/// [`DISMISS_DELAY`], then is removed from a spawned task. Construct with
/// [`StatusLineReporter::with_dismiss_delay`] in tests to avoid the wait.
pub struct StatusLineReporter {
    sink: Arc<dyn StatusSink>,
    dismiss_after: Duration,
}

impl StatusLineReporter {
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self {
            sink,
            dismiss_after: DISMISS_DELAY,
        }
    }

    pub fn with_dismiss_delay(sink: Arc<dyn StatusSink>, dismiss_after: Duration) -> Self {
        Self {
            sink,
            dismiss_after,
        }
    }
}

impl RunProgressCallback for StatusLineReporter {
    fn on_run_start(&self, total: usize) {
        self.sink.set_text(&format!("Processing image 0 of {total}"));
    }

    fn on_target_done(&self, index: usize, total: usize, _path: &str, _outcome: &Outcome) {
        self.sink
            .set_text(&format!("Processing image {index} of {total}"));
    }

    fn on_run_complete(&self, processed: usize, elapsed_secs: f64) {
        self.sink.set_text(&format!(
            "Finished processing {processed} images, total time: {elapsed_secs:.1} seconds"
        ));
        let sink = Arc::clone(&self.sink);
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.remove();
        });
    }
}
