//! Conflict-safe destination naming.
//!
//! The orchestrator asks for a desired filename and gets back one that is
//! safe to rename onto, per the configured [`ConflictMode`]:
//!
//! * `Reuse` — the desired name comes back unchanged; an existing
//!   same-named file is overwritten by the rename, so the processed bytes
//!   end up occupying that name.
//! * `Increment` — existence is probed repeatedly (`name-1.ext`,
//!   `name-2.ext`, …) until a free name is found.
//!
//! Probe counters are an explicit per-folder map owned by the resolver,
//! with lifecycle = one run: a batch renaming many files into the same
//! folder continues counting where the previous target left off instead of
//! re-probing from 1 every time.

use crate::config::ConflictMode;
use crate::vault::{join, Vault};
use std::collections::HashMap;

/// Resolves desired destination names against the vault. One per run.
#[derive(Debug)]
pub struct ConflictResolver {
    mode: ConflictMode,
    counters: HashMap<String, u32>,
}

impl ConflictResolver {
    pub fn new(mode: ConflictMode) -> Self {
        Self {
            mode,
            counters: HashMap::new(),
        }
    }

    /// Turn `desired` into a final filename that is safe to rename onto in
    /// `dir`.
    pub async fn resolve<V: Vault>(&mut self, vault: &V, dir: &str, desired: &str) -> String {
        match self.mode {
            ConflictMode::Reuse => desired.to_string(),
            ConflictMode::Increment => {
                if vault.resolve(&join(dir, desired)).await.is_none() {
                    return desired.to_string();
                }
                let (stem, ext) = split_name(desired);
                let counter = self.counters.entry(dir.to_string()).or_insert(0);
                loop {
                    *counter += 1;
                    let candidate = match ext {
                        Some(ext) => format!("{stem}-{counter}.{ext}"),
                        None => format!("{stem}-{counter}"),
                    };
                    if vault.resolve(&join(dir, &candidate)).await.is_none() {
                        return candidate;
                    }
                }
            }
        }
    }
}

/// Split a filename into stem and extension.
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_cases() {
        assert_eq!(split_name("a.webp"), ("a", Some("webp")));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_name("noext"), ("noext", None));
        assert_eq!(split_name(".hidden"), (".hidden", None));
    }
}
