//! Result types for a processing run.
//!
//! A run never fails because one image failed; instead every target gets a
//! [`TargetReport`] recording what happened to it, and [`RunStats`] sums the
//! outcomes. Callers decide their own tolerance: ignore skips, log them, or
//! treat any skip as an error in their own layer.

use crate::error::TargetError;
use serde::{Deserialize, Serialize};

/// Why the eligibility filter excluded a target before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The extension is on the configured skip list.
    ListedFormat,
    /// The extension already matches the conversion target format and
    /// `skip_if_target_format` is set.
    AlreadyTargetFormat,
    /// The processor's own format-support check rejected the extension.
    UnsupportedFormat,
}

/// What happened to one unique image target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Processed, and the file now lives under a new name.
    Converted,
    /// Processed in place; the output format implied no extension change.
    ConvertedInPlace,
    /// Excluded by the eligibility filter before any I/O.
    SkippedByFilter(SkipReason),
    /// Excluded after an I/O or transform failure, with state rolled back
    /// to its pre-attempt condition.
    SkippedByError,
}

impl Outcome {
    /// True for the outcomes that count towards the final processed total.
    pub fn is_processed(&self) -> bool {
        matches!(self, Outcome::Converted | Outcome::ConvertedInPlace)
    }
}

/// Per-target record filled in by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    /// Vault-relative path the target had when the run started.
    pub source_path: String,
    /// Path the file ends the run under. Equal to `source_path` unless the
    /// target was renamed (and stayed renamed).
    pub final_path: String,
    pub outcome: Outcome,
    /// Total mention count across referring documents, informational only.
    pub mentions: usize,
    /// Documents whose content was rewritten for this target.
    pub documents_rewritten: usize,
    /// Literal link occurrences replaced across those documents.
    pub links_rewritten: usize,
    /// The non-fatal error behind `SkippedByError`, when applicable.
    pub error: Option<TargetError>,
}

impl TargetReport {
    /// A report for a target that never got past the eligibility filter.
    pub(crate) fn skipped(path: &str, mentions: usize, reason: SkipReason) -> Self {
        Self {
            source_path: path.to_string(),
            final_path: path.to_string(),
            outcome: Outcome::SkippedByFilter(reason),
            mentions,
            documents_rewritten: 0,
            links_rewritten: 0,
            error: None,
        }
    }

    /// A report for a target that failed mid-sequence. `final_path` is
    /// wherever the failure left the file (the original path unless a
    /// rename survived).
    pub(crate) fn failed(path: &str, final_path: &str, mentions: usize, error: TargetError) -> Self {
        Self {
            source_path: path.to_string(),
            final_path: final_path.to_string(),
            outcome: Outcome::SkippedByError,
            mentions,
            documents_rewritten: 0,
            links_rewritten: 0,
            error: Some(error),
        }
    }
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Unique targets in the reference set at scan time.
    pub total_targets: usize,
    /// Targets that ended `Converted` or `ConvertedInPlace`.
    pub processed: usize,
    /// Subset of `processed` that changed path.
    pub renamed: usize,
    pub skipped_by_filter: usize,
    pub skipped_by_error: usize,
    /// Documents rewritten across all targets.
    pub documents_rewritten: usize,
    /// Literal link occurrences replaced across all targets.
    pub links_rewritten: usize,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

impl RunStats {
    pub(crate) fn record(&mut self, report: &TargetReport) {
        match &report.outcome {
            Outcome::Converted => {
                self.processed += 1;
                self.renamed += 1;
            }
            Outcome::ConvertedInPlace => self.processed += 1,
            Outcome::SkippedByFilter(_) => self.skipped_by_filter += 1,
            Outcome::SkippedByError => self.skipped_by_error += 1,
        }
        self.documents_rewritten += report.documents_rewritten;
        self.links_rewritten += report.links_rewritten;
    }
}

/// Everything a run produced: one report per unique target, in processing
/// order, plus the aggregate stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub targets: Vec<TargetReport>,
    pub stats: RunStats,
}

impl RunReport {
    /// An empty report for runs that short-circuited (the early no-op law).
    pub(crate) fn empty() -> Self {
        Self {
            targets: Vec::new(),
            stats: RunStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_accumulate_outcomes() {
        let mut stats = RunStats::default();
        let mut converted = TargetReport::skipped("a.png", 1, SkipReason::ListedFormat);
        converted.outcome = Outcome::Converted;
        converted.documents_rewritten = 2;
        converted.links_rewritten = 3;
        stats.record(&converted);
        stats.record(&TargetReport::skipped("b.gif", 1, SkipReason::ListedFormat));
        stats.record(&TargetReport::failed(
            "c.jpg",
            "c.jpg",
            1,
            crate::error::TargetError::Read {
                path: "c.jpg".into(),
                detail: "gone".into(),
            },
        ));

        assert_eq!(stats.processed, 1);
        assert_eq!(stats.renamed, 1);
        assert_eq!(stats.skipped_by_filter, 1);
        assert_eq!(stats.skipped_by_error, 1);
        assert_eq!(stats.documents_rewritten, 2);
        assert_eq!(stats.links_rewritten, 3);
    }

    #[test]
    fn processed_outcomes() {
        assert!(Outcome::Converted.is_processed());
        assert!(Outcome::ConvertedInPlace.is_processed());
        assert!(!Outcome::SkippedByError.is_processed());
        assert!(!Outcome::SkippedByFilter(SkipReason::ListedFormat).is_processed());
    }
}
