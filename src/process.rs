//! The sequential processing orchestrator.
//!
//! ## Why strictly sequential?
//!
//! The per-target loop is deliberately one-at-a-time: target *i+1* never
//! starts until target *i*'s entire sequence, including any rollback, has
//! completed. Several images often live in the same document, and the host
//! may index renames asynchronously; sequencing avoids interleaved writes
//! to one document and overlapping renames racing the host's own file
//! index. A batch over a vault is disk-bound anyway, so the simplicity is
//! nearly free.
//!
//! ## Failure isolation
//!
//! Every per-target failure is caught at the innermost point and becomes a
//! skip recorded in the report; it never aborts the run and never leaves
//! partial state for that target (a failed write after a rename rolls the
//! rename back first). Only setup errors — invalid configuration, a
//! missing scope root — propagate, and they do so before any file has been
//! touched.

use crate::config::{ProcessConfig, Scope};
use crate::error::{ImgSyncError, TargetError};
use crate::pipeline::rename::ConflictResolver;
use crate::pipeline::scan::{self, ImageTarget};
use crate::pipeline::{filter, rewrite};
use crate::processor::ImageProcessor;
use crate::report::{Outcome, RunReport, RunStats, TargetReport};
use crate::vault::{self, Vault};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run a batch image-processing pass over `scope`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(RunReport)` on success, even if individual targets failed (check
/// `report.stats.skipped_by_error`).
///
/// # Errors
/// Returns `Err(ImgSyncError)` only for fatal setup errors:
/// - the note or folder named by the scope does not exist
/// - the vault cannot be listed at all
pub async fn process<V: Vault, P: ImageProcessor>(
    vault: &V,
    processor: &P,
    scope: &Scope,
    config: &ProcessConfig,
) -> Result<RunReport, ImgSyncError> {
    let started = Instant::now();
    info!("starting image-processing run: {scope:?}");

    // The early no-op law: nothing could change, so don't even scan.
    if config.is_noop() {
        info!("configuration is a no-op (no conversion, quality 1.0, no resize)");
        if let Some(cb) = &config.progress_callback {
            cb.on_run_start(0);
            cb.on_run_complete(0, started.elapsed().as_secs_f64());
        }
        return Ok(RunReport::empty());
    }

    let refs = scan::scan(vault, scope).await?;
    let total = refs.len();
    info!("{total} unique image target(s) in scope");

    if let Some(cb) = &config.progress_callback {
        cb.on_run_start(total);
    }

    let mut resolver = ConflictResolver::new(config.conflict_mode);
    let mut stats = RunStats {
        total_targets: total,
        ..RunStats::default()
    };
    let mut reports = Vec::with_capacity(total);

    for (idx, target) in refs.into_targets().into_iter().enumerate() {
        let attempt = idx + 1;
        if let Some(cb) = &config.progress_callback {
            cb.on_target_start(attempt, total, &target.path);
        }

        let report = process_target(vault, processor, &mut resolver, &target, config).await;

        stats.record(&report);
        if let Some(cb) = &config.progress_callback {
            if let Some(error) = &report.error {
                cb.on_target_error(attempt, total, &report.source_path, &error.to_string());
            }
            cb.on_target_done(attempt, total, &report.source_path, &report.outcome);
        }
        reports.push(report);
    }

    stats.duration_ms = started.elapsed().as_millis() as u64;
    info!(
        "run complete: {}/{} processed ({} renamed), {} filter skip(s), {} error skip(s), {}ms",
        stats.processed,
        total,
        stats.renamed,
        stats.skipped_by_filter,
        stats.skipped_by_error,
        stats.duration_ms
    );

    if let Some(cb) = &config.progress_callback {
        cb.on_run_complete(stats.processed, started.elapsed().as_secs_f64());
    }

    Ok(RunReport {
        targets: reports,
        stats,
    })
}

/// One target's full sequence: filter, read, transform, name, rename,
/// write (with rollback), rewrite links. Infallible by construction; every
/// failure ends up inside the returned report.
pub(crate) async fn process_target<V: Vault, P: ImageProcessor>(
    vault: &V,
    processor: &P,
    resolver: &mut ConflictResolver,
    target: &ImageTarget,
    config: &ProcessConfig,
) -> TargetReport {
    let mentions = target.mention_count();

    if let Some(reason) = filter::skip_reason(target, processor, config) {
        debug!("skipping '{}': {reason:?}", target.path);
        return TargetReport::skipped(&target.path, mentions, reason);
    }

    // ── Step 1: Read ─────────────────────────────────────────────────────
    let bytes = match vault.read_file(&target.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("read failed for '{}': {e}", target.path);
            return TargetReport::failed(
                &target.path,
                &target.path,
                mentions,
                TargetError::Read {
                    path: target.path.clone(),
                    detail: e.to_string(),
                },
            );
        }
    };

    // ── Step 2: Transform ────────────────────────────────────────────────
    let transformed = match processor.transform(bytes, config).await {
        Ok(t) => t,
        Err(source) => {
            warn!("transform failed for '{}': {source}", target.path);
            return TargetReport::failed(
                &target.path,
                &target.path,
                mentions,
                TargetError::Transform {
                    path: target.path.clone(),
                    source,
                },
            );
        }
    };

    // ── Step 3: Destination name ─────────────────────────────────────────
    let ext = target.extension();
    let new_ext = match config.format.extension() {
        Some(new_ext) if !config.format.matches_extension(ext) => Some(new_ext),
        _ => None,
    };

    let Some(new_ext) = new_ext else {
        // No extension change: write in place, nothing to rewrite.
        if let Err(e) = vault.write_file(&target.path, &transformed.bytes).await {
            warn!("in-place write failed for '{}': {e}", target.path);
            return TargetReport::failed(
                &target.path,
                &target.path,
                mentions,
                TargetError::Write {
                    path: target.path.clone(),
                    detail: e.to_string(),
                    rolled_back: false,
                },
            );
        }
        debug!("processed '{}' in place", target.path);
        return TargetReport {
            source_path: target.path.clone(),
            final_path: target.path.clone(),
            outcome: Outcome::ConvertedInPlace,
            mentions,
            documents_rewritten: 0,
            links_rewritten: 0,
            error: None,
        };
    };

    // ── Step 4: Conflict-safe rename ─────────────────────────────────────
    let dir = vault::parent_dir(&target.path);
    let name = vault::file_name(&target.path);
    let stem = &name[..name.len() - ext.len() - 1];
    let desired = format!("{stem}.{new_ext}");
    let final_name = resolver.resolve(vault, dir, &desired).await;
    let new_path = vault::join(dir, &final_name);

    if let Err(e) = vault.rename_file(&target.path, &new_path).await {
        warn!("rename failed for '{}': {e}", target.path);
        return TargetReport::failed(
            &target.path,
            &target.path,
            mentions,
            TargetError::Rename {
                path: target.path.clone(),
                new_path,
                detail: e.to_string(),
            },
        );
    }

    // Re-resolve under the new path; the host's index may lag a rename.
    // On failure the rename's side effects stay as-is: no write, no
    // rewrite, next target.
    if vault.resolve(&new_path).await.is_none() {
        warn!(
            "'{}' vanished after rename to '{new_path}', leaving as-is",
            target.path
        );
        return TargetReport::failed(
            &target.path,
            &new_path,
            mentions,
            TargetError::RenameVanished {
                path: target.path.clone(),
                new_path: new_path.clone(),
            },
        );
    }

    // ── Step 5: Write, rolling the rename back on failure ────────────────
    if let Err(e) = vault.write_file(&new_path, &transformed.bytes).await {
        let rolled_back = match vault.rename_file(&new_path, &target.path).await {
            Ok(()) => true,
            Err(rollback_err) => {
                warn!("rollback of '{new_path}' failed: {rollback_err}");
                false
            }
        };
        warn!(
            "write failed for '{new_path}' (rolled back: {rolled_back}): {e}"
        );
        let final_path = if rolled_back { &target.path } else { &new_path };
        return TargetReport::failed(
            &target.path,
            final_path,
            mentions,
            TargetError::Write {
                path: new_path.clone(),
                detail: e.to_string(),
                rolled_back,
            },
        );
    }

    // ── Step 6: Rewrite links ────────────────────────────────────────────
    // Only now that the write fully succeeded; a document is never updated
    // to reference a path whose content write failed.
    let rewritten = rewrite::rewrite_mentions(vault, &target.mentions, &target.path, &new_path).await;

    debug!(
        "processed '{}' -> '{new_path}' ({}x{}, {} link(s) in {} doc(s))",
        target.path, transformed.width, transformed.height, rewritten.links, rewritten.documents
    );
    TargetReport {
        source_path: target.path.clone(),
        final_path: new_path,
        outcome: Outcome::Converted,
        mentions,
        documents_rewritten: rewritten.documents,
        links_rewritten: rewritten.links,
        error: None,
    }
}
