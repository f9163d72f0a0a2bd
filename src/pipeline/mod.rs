//! Pipeline stages for a batch image-processing run.
//!
//! Each submodule implements exactly one stage. Keeping stages separate
//! makes each independently testable and lets us swap implementations
//! (e.g. a different conflict strategy) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! scan ──▶ filter ──▶ (per target) rename ──▶ rewrite
//! (scope)  (skip      (conflict-safe          (link
//!  dedup)   rules)     destination name)       replacement)
//! ```
//!
//! 1. [`scan`]    — walk the scope, dedup references into a [`scan::ReferenceSet`]
//! 2. [`filter`]  — per-target eligibility, before any I/O
//! 3. [`rename`]  — turn a desired filename into a collision-free one
//! 4. [`rewrite`] — replace old path text in every referring document
//!
//! The read/transform/write steps between rename and rewrite live in
//! [`crate::process`], which owns ordering and failure isolation.

pub mod filter;
pub mod rename;
pub mod rewrite;
pub mod scan;
