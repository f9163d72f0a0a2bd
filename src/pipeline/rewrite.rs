//! Link rewriting: keep referring documents in sync after a rename.
//!
//! The rewriter is deliberately generic over document shape. It never
//! parses markdown or canvas JSON; it performs literal substring
//! replacement on whatever serialized form the vault hands back, so prose
//! notes and graph documents go through the same code path.
//!
//! A rename only ever changes the final filename, so every recorded raw
//! link text that ends with the old filename gets its tail swapped.
//! Replacements apply longest-first: the full-path spelling is fixed
//! before a bare-filename spelling can touch its substring.

use crate::pipeline::scan::DocMention;
use crate::vault::{file_name, Vault};
use tracing::{debug, warn};

/// What the rewrite step changed across a target's referring documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct RewriteOutcome {
    /// Documents whose content was updated and persisted.
    pub documents: usize,
    /// Literal link occurrences replaced across those documents.
    pub links: usize,
}

/// Rewrite every referring document of a renamed target. Per-document
/// failures are logged and skipped; the target itself has already
/// succeeded at this point.
pub async fn rewrite_mentions<V: Vault>(
    vault: &V,
    mentions: &[DocMention],
    old_path: &str,
    new_path: &str,
) -> RewriteOutcome {
    let pairs = replacement_pairs(mentions, old_path, new_path);
    let mut outcome = RewriteOutcome::default();

    for mention in mentions {
        let content = match vault.read_document(&mention.doc).await {
            Ok(content) => content,
            Err(e) => {
                warn!("cannot read '{}' for link rewrite: {e}", mention.doc.path);
                continue;
            }
        };
        let (updated, replaced) = apply_replacements(&content, &pairs);
        if replaced == 0 {
            continue;
        }
        match vault.write_document(&mention.doc, &updated).await {
            Ok(()) => {
                debug!(
                    "rewrote {replaced} link(s) in '{}': {old_path} -> {new_path}",
                    mention.doc.path
                );
                outcome.documents += 1;
                outcome.links += replaced;
            }
            Err(e) => warn!("cannot persist rewrite of '{}': {e}", mention.doc.path),
        }
    }
    outcome
}

/// Build the (old, new) replacement pairs for a rename, longest old text
/// first. Always includes the full vault path; adds every distinct raw
/// spelling whose tail is the old filename.
fn replacement_pairs(
    mentions: &[DocMention],
    old_path: &str,
    new_path: &str,
) -> Vec<(String, String)> {
    let old_name = file_name(old_path);
    let new_name = file_name(new_path);

    let mut pairs = vec![(old_path.to_string(), new_path.to_string())];
    for mention in mentions {
        for raw in &mention.raw_links {
            if raw == old_path || !raw.ends_with(old_name) {
                continue;
            }
            let prefix = &raw[..raw.len() - old_name.len()];
            let replacement = format!("{prefix}{new_name}");
            if !pairs.iter().any(|(old, _)| old == raw) {
                pairs.push((raw.clone(), replacement));
            }
        }
    }
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    pairs
}

/// Apply the pairs in order, counting replaced occurrences.
fn apply_replacements(content: &str, pairs: &[(String, String)]) -> (String, usize) {
    let mut updated = content.to_string();
    let mut replaced = 0;
    for (old, new) in pairs {
        let hits = updated.matches(old.as_str()).count();
        if hits > 0 {
            updated = updated.replace(old.as_str(), new);
            replaced += hits;
        }
    }
    (updated, replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::DocumentId;

    fn mention(raws: &[&str]) -> DocMention {
        DocMention {
            doc: DocumentId::note("n.md"),
            count: raws.len(),
            raw_links: raws.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn full_path_pair_always_present() {
        let pairs = replacement_pairs(&[], "img/a.png", "img/a.webp");
        assert_eq!(pairs, vec![("img/a.png".into(), "img/a.webp".into())]);
    }

    #[test]
    fn raw_spellings_get_their_tail_swapped() {
        let mentions = [mention(&["a.png", "./a.png"])];
        let pairs = replacement_pairs(&mentions, "img/a.png", "img/a-1.webp");
        // Longest first; each raw keeps its prefix.
        assert_eq!(
            pairs,
            vec![
                ("img/a.png".to_string(), "img/a-1.webp".to_string()),
                ("./a.png".to_string(), "./a-1.webp".to_string()),
                ("a.png".to_string(), "a-1.webp".to_string()),
            ]
        );
    }

    #[test]
    fn longest_first_protects_full_paths() {
        let mentions = [mention(&["img/a.png", "a.png"])];
        let pairs = replacement_pairs(&mentions, "img/a.png", "img/a.webp");
        let content = "![[img/a.png]] and ![[a.png]]";
        let (updated, replaced) = apply_replacements(content, &pairs);
        assert_eq!(updated, "![[img/a.webp]] and ![[a.webp]]");
        assert_eq!(replaced, 2);
    }

    #[test]
    fn replacement_counts_every_occurrence() {
        let pairs = replacement_pairs(&[mention(&["a.png"])], "a.png", "a.webp");
        let (updated, replaced) = apply_replacements("![[a.png]] ![[a.png]]", &pairs);
        assert_eq!(updated, "![[a.webp]] ![[a.webp]]");
        assert_eq!(replaced, 2);
    }

    #[test]
    fn unrelated_content_untouched() {
        let pairs = replacement_pairs(&[], "a.png", "a.webp");
        let (updated, replaced) = apply_replacements("nothing here", &pairs);
        assert_eq!(updated, "nothing here");
        assert_eq!(replaced, 0);
    }
}
