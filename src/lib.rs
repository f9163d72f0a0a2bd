//! # vault-imgsync
//!
//! Batch image conversion for note vaults, with link rewriting.
//!
//! ## Why this crate?
//!
//! Converting an image that notes embed is the easy part; the hard part is
//! everything around it — finding every unique image a note, folder, or
//! whole vault references, converting each underlying file exactly once,
//! renaming without collisions, and updating every document that mentions
//! the old path, all while one corrupt file or a full disk must never take
//! down the rest of the batch. This crate is that orchestration layer.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scope (note / folder / collection)
//!  │
//!  ├─ 1. Scan     dedup references into a ReferenceSet
//!  ├─ 2. Filter   skip lists, already-in-target-format, support check
//!  ├─ 3. Process  read → transform → rename → write, one target at a time
//!  │              (write failure rolls the rename back)
//!  ├─ 4. Rewrite  literal path replacement in every referring document
//!  └─ 5. Report   per-target outcomes + run stats, live progress line
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vault_imgsync::{
//!     process, DefaultImageProcessor, FsVault, OutputFormat, ProcessConfig, Scope,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = FsVault::new("/path/to/vault");
//!     let config = ProcessConfig::builder()
//!         .format(OutputFormat::Webp)
//!         .quality(0.8)
//!         .build()?;
//!     let report = process(&vault, &DefaultImageProcessor, &Scope::Collection, &config).await?;
//!     println!(
//!         "{} processed, {} skipped",
//!         report.stats.processed,
//!         report.stats.skipped_by_filter + report.stats.skipped_by_error
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! * **Dedup** — however many documents mention a path, its file is read,
//!   transformed, and written exactly once per run.
//! * **Sequential** — one target at a time; no interleaved document writes,
//!   no renames racing a host file index.
//! * **Failure isolation** — per-target errors become skips in the report;
//!   a failed write after a rename rolls the rename back. Only setup errors
//!   (bad config, missing scope root) abort a run, and they fire before any
//!   file is touched.
//! * **Stable order** — identical vault state produces an identical
//!   processing sequence.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imgsync` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! vault-imgsync = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod processor;
pub mod progress;
pub mod report;
pub mod stream;
pub mod vault;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    parse_skip_list, ConflictMode, OutputFormat, ProcessConfig, ProcessConfigBuilder, Profiles,
    ResizeMode, ScalePolicy, Scope,
};
pub use error::{ImgSyncError, TargetError, TransformError};
pub use pipeline::rename::ConflictResolver;
pub use pipeline::scan::{scan, DocMention, ImageTarget, ReferenceSet};
pub use process::process;
pub use processor::{DefaultImageProcessor, ImageProcessor, TransformedImage};
pub use progress::{
    NoopProgressCallback, ProgressCallback, RunProgressCallback, StatusLineReporter, StatusSink,
};
pub use report::{Outcome, RunReport, RunStats, SkipReason, TargetReport};
pub use stream::process_stream;
pub use vault::{
    extract_canvas_links, extract_note_links, DocKind, DocumentId, FileRef, FsVault, Vault,
};
