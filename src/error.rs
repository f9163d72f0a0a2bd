//! Error types for the vault-imgsync library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ImgSyncError`] — **Fatal**: the run cannot start at all (invalid
//!   configuration, the scoped note or folder does not exist). Returned as
//!   `Err(ImgSyncError)` from the top-level `process*` functions before any
//!   image has been touched.
//!
//! * [`TargetError`] — **Non-fatal**: a single image failed (decode error,
//!   disk full, a rename race) but every other image is fine. Stored inside
//!   [`crate::report::TargetReport`] so callers can inspect partial success
//!   rather than losing the whole run to one bad file.
//!
//! The separation encodes the run's failure-isolation contract: once the
//! per-target loop has started, nothing thrown inside it escapes the loop.

use thiserror::Error;

/// All fatal errors returned by the vault-imgsync library.
///
/// Per-image failures use [`TargetError`] and are stored in
/// [`crate::report::TargetReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ImgSyncError {
    // ── Scope errors ──────────────────────────────────────────────────────
    /// The note named by a document-scope run does not exist in the vault.
    #[error("Note not found in vault: '{path}'")]
    NoteNotFound { path: String },

    /// The folder named by a folder-scope run does not exist in the vault.
    #[error("Folder not found in vault: '{path}'")]
    FolderNotFound { path: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O before the loop ───────────────────────────────────────────────
    /// The vault could not be listed or opened while setting up the run.
    #[error("Vault I/O error during setup: {detail}")]
    Vault { detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image target.
///
/// Stored in [`crate::report::TargetReport`] when a target fails. The run
/// continues with the next target; no partial state is left behind for the
/// failed one (see the `rolled_back` flag on [`TargetError::Write`]).
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum TargetError {
    /// The image bytes could not be read.
    #[error("'{path}': read failed: {detail}")]
    Read { path: String, detail: String },

    /// The processor could not decode, resize, or encode the image.
    #[error("'{path}': {source}")]
    Transform {
        path: String,
        #[source]
        source: TransformError,
    },

    /// The rename itself failed; the file still sits at its original path.
    #[error("'{path}': rename to '{new_path}' failed: {detail}")]
    Rename {
        path: String,
        new_path: String,
        detail: String,
    },

    /// The file was renamed but could not be re-resolved under its new path.
    /// The rename's side effects are left as-is; no bytes were written and
    /// no links were rewritten.
    #[error("'{path}': renamed to '{new_path}' but the file vanished before writing")]
    RenameVanished { path: String, new_path: String },

    /// Writing the transformed bytes failed. When a rename had already
    /// happened, `rolled_back` records whether the file was moved back to
    /// its original path.
    #[error("'{path}': write failed: {detail}")]
    Write {
        path: String,
        detail: String,
        rolled_back: bool,
    },
}

/// Failure inside an [`crate::processor::ImageProcessor`] implementation.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum TransformError {
    /// The input bytes are not a decodable image.
    #[error("decode failed: {detail}")]
    Decode { detail: String },

    /// The transformed image could not be encoded to the requested format.
    #[error("encode failed: {detail}")]
    Encode { detail: String },

    /// The processor does not handle this input format.
    #[error("unsupported source format: '{ext}'")]
    Unsupported { ext: String },
}
