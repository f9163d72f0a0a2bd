//! Streaming API: yield per-target reports as the run advances.
//!
//! ## Why stream?
//!
//! A collection-wide run over a large vault takes a while. The streams
//! API lets callers render results incrementally or stop consuming early,
//! instead of waiting for the full [`crate::report::RunReport`]. The
//! stream itself is the progress signal, so configured progress callbacks
//! are not fired here.
//!
//! Targets are processed with exactly the same strictly sequential
//! semantics as [`crate::process::process`]: pulling the next item drives
//! the next target's full sequence, and reports arrive in the scanner's
//! stable order.

use crate::config::{ProcessConfig, Scope};
use crate::error::ImgSyncError;
use crate::pipeline::rename::ConflictResolver;
use crate::pipeline::scan::{self, ImageTarget};
use crate::process::process_target;
use crate::processor::ImageProcessor;
use crate::report::TargetReport;
use crate::vault::Vault;
use futures::stream;
use std::collections::VecDeque;
use tokio_stream::Stream;
use tracing::info;

struct StreamState {
    queue: VecDeque<ImageTarget>,
    resolver: ConflictResolver,
}

/// Process a scope, yielding one [`TargetReport`] per unique target.
///
/// # Returns
/// - `Ok(impl Stream)` — one report per target, in processing order;
///   empty when the configuration is a no-op
/// - `Err(ImgSyncError)` — fatal setup error (missing scope root etc.)
pub async fn process_stream<'a, V, P>(
    vault: &'a V,
    processor: &'a P,
    scope: &Scope,
    config: &'a ProcessConfig,
) -> Result<impl Stream<Item = TargetReport> + 'a, ImgSyncError>
where
    V: Vault,
    P: ImageProcessor,
{
    let targets: VecDeque<ImageTarget> = if config.is_noop() {
        info!("configuration is a no-op; empty stream");
        VecDeque::new()
    } else {
        VecDeque::from(scan::scan(vault, scope).await?.into_targets())
    };
    info!("streaming run: {} target(s)", targets.len());

    let state = StreamState {
        queue: targets,
        resolver: ConflictResolver::new(config.conflict_mode),
    };

    Ok(stream::unfold(state, move |mut state| async move {
        let target = state.queue.pop_front()?;
        let report = process_target(vault, processor, &mut state.resolver, &target, config).await;
        Some((report, state))
    }))
}
