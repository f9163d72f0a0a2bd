//! Reference scanning: turn a scope into a deduplicated set of image
//! targets with back-references to every document that mentions them.
//!
//! The scanner owns the [`ReferenceSet`] it builds and hands it read-only
//! to the orchestrator. Dedup happens here and nowhere else: however many
//! documents (or repeats within one document) mention a path, it appears
//! exactly once as a target, so the transform/write sequence runs exactly
//! once per underlying file.
//!
//! Scan-time read failures on individual documents are logged and skipped;
//! only a missing scope root (the named note or folder) is fatal, since at
//! that point no work has been done at all.

use crate::config::Scope;
use crate::error::ImgSyncError;
use crate::vault::{self, DocumentId, FileRef, Vault};
use std::collections::HashMap;
use std::io;
use tracing::{debug, warn};

/// Extensions the scanner considers image files. Formats the processor
/// cannot decode still enter the set and surface as filter skips.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff", "avif", "heic", "svg",
];

/// One referring document: its identity, how many times it mentions the
/// target, and the distinct raw link texts it used. The count is
/// informational only and never causes repeated processing.
#[derive(Debug, Clone)]
pub struct DocMention {
    pub doc: DocumentId,
    pub count: usize,
    pub raw_links: Vec<String>,
}

/// A unique, path-identified image file considered for processing.
#[derive(Debug, Clone)]
pub struct ImageTarget {
    /// Normalized vault-relative path, the target's identity.
    pub path: String,
    /// Byte size at resolve time.
    pub size: u64,
    /// Every document that mentions this path. Empty for folder scope.
    pub mentions: Vec<DocMention>,
}

impl ImageTarget {
    /// The current extension, original case.
    pub fn extension(&self) -> &str {
        vault::extension(&self.path)
    }

    /// Total mention count across all referring documents.
    pub fn mention_count(&self) -> usize {
        self.mentions.iter().map(|m| m.count).sum()
    }
}

/// The deduplicated scan result, in first-mention order.
///
/// Iteration order is the processing order, and it is deterministic:
/// identical input state produces an identical sequence.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    targets: Vec<ImageTarget>,
    index: HashMap<String, usize>,
}

impl ReferenceSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> &[ImageTarget] {
        &self.targets
    }

    pub fn into_targets(self) -> Vec<ImageTarget> {
        self.targets
    }

    fn entry(&mut self, file: &FileRef) -> &mut ImageTarget {
        let idx = match self.index.get(&file.path) {
            Some(&idx) => idx,
            None => {
                self.targets.push(ImageTarget {
                    path: file.path.clone(),
                    size: file.size,
                    mentions: Vec::new(),
                });
                self.index.insert(file.path.clone(), self.targets.len() - 1);
                self.targets.len() - 1
            }
        };
        &mut self.targets[idx]
    }

    /// Record a file found by folder listing; carries no document.
    fn add_file(&mut self, file: &FileRef) {
        self.entry(file);
    }

    /// Record one mention of `file` by `doc` via the literal link text
    /// `raw`. Repeats bump the count; distinct raw spellings accumulate.
    fn add_reference(&mut self, file: &FileRef, doc: &DocumentId, raw: &str) {
        let target = self.entry(file);
        if let Some(mention) = target.mentions.iter_mut().find(|m| m.doc == *doc) {
            mention.count += 1;
            if !mention.raw_links.iter().any(|r| r == raw) {
                mention.raw_links.push(raw.to_string());
            }
        } else {
            target.mentions.push(DocMention {
                doc: doc.clone(),
                count: 1,
                raw_links: vec![raw.to_string()],
            });
        }
    }
}

/// Build the [`ReferenceSet`] for a scope.
pub async fn scan<V: Vault>(vault: &V, scope: &Scope) -> Result<ReferenceSet, ImgSyncError> {
    match scope {
        Scope::Note(path) => scan_document(vault, &DocumentId::from_path(path.clone())).await,
        Scope::Folder { path, recursive } => scan_folder(vault, path, *recursive).await,
        Scope::Collection => scan_collection(vault).await,
    }
}

async fn scan_document<V: Vault>(
    vault: &V,
    doc: &DocumentId,
) -> Result<ReferenceSet, ImgSyncError> {
    let links = vault
        .document_links(doc)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ImgSyncError::NoteNotFound {
                path: doc.path.clone(),
            },
            _ => ImgSyncError::Vault {
                detail: e.to_string(),
            },
        })?;

    let mut set = ReferenceSet::default();
    collect_links(vault, doc, links, &mut set).await;
    debug!(
        "scanned '{}': {} unique image target(s)",
        doc.path,
        set.len()
    );
    Ok(set)
}

async fn scan_folder<V: Vault>(
    vault: &V,
    folder: &str,
    recursive: bool,
) -> Result<ReferenceSet, ImgSyncError> {
    let files = vault
        .list_files(folder, recursive)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ImgSyncError::FolderNotFound {
                path: folder.to_string(),
            },
            _ => ImgSyncError::Vault {
                detail: e.to_string(),
            },
        })?;

    let mut set = ReferenceSet::default();
    for path in files {
        if !is_image_path(&path) {
            continue;
        }
        if let Some(file) = vault.resolve(&path).await {
            set.add_file(&file);
        }
    }
    debug!(
        "scanned folder '{}' (recursive: {recursive}): {} image file(s)",
        folder,
        set.len()
    );
    Ok(set)
}

async fn scan_collection<V: Vault>(vault: &V) -> Result<ReferenceSet, ImgSyncError> {
    let to_setup_err = |e: io::Error| ImgSyncError::Vault {
        detail: e.to_string(),
    };
    let notes = vault.list_notes().await.map_err(to_setup_err)?;
    let canvases = vault.list_canvases().await.map_err(to_setup_err)?;

    let mut set = ReferenceSet::default();
    for doc in notes.iter().chain(canvases.iter()) {
        match vault.document_links(doc).await {
            Ok(links) => collect_links(vault, doc, links, &mut set).await,
            Err(e) => warn!("skipping unreadable document '{}': {e}", doc.path),
        }
    }
    debug!(
        "scanned collection: {} note(s), {} canvas(es), {} unique image target(s)",
        notes.len(),
        canvases.len(),
        set.len()
    );
    Ok(set)
}

/// Resolve each raw link target and fold it into the set. External URLs
/// and unresolved targets are dropped silently.
async fn collect_links<V: Vault>(
    vault: &V,
    doc: &DocumentId,
    links: Vec<String>,
    set: &mut ReferenceSet,
) {
    for raw in links {
        if is_external(&raw) || !is_image_path(&raw) {
            continue;
        }
        let Some(file) = resolve_link(vault, doc, &raw).await else {
            continue;
        };
        set.add_reference(&file, doc, &raw);
    }
}

/// Resolve a raw link target: vault-root relative first, then relative to
/// the document's own folder.
async fn resolve_link<V: Vault>(vault: &V, doc: &DocumentId, raw: &str) -> Option<FileRef> {
    let from_root = vault::resolve_relative("", raw);
    if let Some(file) = vault.resolve(&from_root).await {
        return Some(file);
    }
    let from_doc = vault::resolve_relative(vault::parent_dir(&doc.path), raw);
    if from_doc != from_root {
        return vault.resolve(&from_doc).await;
    }
    None
}

/// External URLs never enter the reference set.
fn is_external(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

fn is_image_path(path: &str) -> bool {
    let ext = vault::extension(path).to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}
