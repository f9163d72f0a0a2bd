//! Per-target eligibility, decided before any I/O.
//!
//! Rules run in a fixed order: the user's skip list wins over everything,
//! then the already-in-target-format shortcut, then the processor's own
//! format-support check. The global early no-op exit lives in
//! [`crate::config::ProcessConfig::is_noop`] and is checked before
//! scanning, not here.

use crate::config::ProcessConfig;
use crate::pipeline::scan::ImageTarget;
use crate::processor::ImageProcessor;
use crate::report::SkipReason;

/// Decide whether a target is excluded, and why. `None` means eligible.
pub fn skip_reason<P: ImageProcessor>(
    target: &ImageTarget,
    processor: &P,
    config: &ProcessConfig,
) -> Option<SkipReason> {
    let ext = target.extension();
    if config
        .skip_formats
        .iter()
        .any(|skip| skip.eq_ignore_ascii_case(ext))
    {
        return Some(SkipReason::ListedFormat);
    }
    if config.skip_if_target_format && config.format.matches_extension(ext) {
        return Some(SkipReason::AlreadyTargetFormat);
    }
    if !processor.supports(ext) {
        return Some(SkipReason::UnsupportedFormat);
    }
    None
}
