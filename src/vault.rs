//! The vault seam: the document/file store the orchestrator works against.
//!
//! Everything the pipeline needs from the host is behind the [`Vault`]
//! trait — resolve/read/write/rename files, list documents, and extract the
//! raw link targets a document mentions. The orchestrator stays agnostic to
//! whether documents live on disk, in a host application's index, or in an
//! in-memory test double.
//!
//! [`FsVault`] is the shipped implementation over a plain directory tree:
//! notes are `.md` files, canvas documents are `.canvas` JSON files, and
//! all paths exchanged through the trait are vault-relative with `/`
//! separators. Listings are sorted, which is what gives collection-wide
//! runs their stable, reproducible processing order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A resolved file: its vault-relative path and byte size at resolve time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: String,
    pub size: u64,
}

/// The two document shapes a vault holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    /// Prose note; links are embedded in markdown syntax.
    Note,
    /// Graph document; links are `"type": "file"` nodes in its JSON form.
    Canvas,
}

/// Identity of a referring document: vault-relative path plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId {
    pub path: String,
    pub kind: DocKind,
}

impl DocumentId {
    pub fn note(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: DocKind::Note,
        }
    }

    pub fn canvas(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: DocKind::Canvas,
        }
    }

    /// Classify a document path by extension.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        if extension(&path).eq_ignore_ascii_case("canvas") {
            Self::canvas(path)
        } else {
            Self::note(path)
        }
    }
}

/// The document/file store capability consumed by the pipeline.
///
/// All paths are vault-relative with `/` separators. Implementations must
/// keep listings stable across calls when the underlying state has not
/// changed; the collection-wide scanner's ordering guarantee rests on it.
#[allow(async_fn_in_trait)]
pub trait Vault {
    /// Look up an existing file. `None` when nothing exists at `path`.
    async fn resolve(&self, path: &str) -> Option<FileRef>;

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;

    async fn write_file(&self, path: &str, bytes: &[u8]) -> io::Result<()>;

    /// Rename a file. An existing file at `to` is replaced.
    async fn rename_file(&self, from: &str, to: &str) -> io::Result<()>;

    /// List files under `folder` (`""` for the vault root), sorted.
    async fn list_files(&self, folder: &str, recursive: bool) -> io::Result<Vec<String>>;

    /// All prose notes in the vault, sorted by path.
    async fn list_notes(&self) -> io::Result<Vec<DocumentId>>;

    /// All canvas documents in the vault, sorted by path.
    async fn list_canvases(&self) -> io::Result<Vec<DocumentId>>;

    /// The raw link targets a document mentions, in document order, repeats
    /// included. Targets are returned exactly as written; resolution is the
    /// scanner's concern.
    async fn document_links(&self, doc: &DocumentId) -> io::Result<Vec<String>>;

    /// A document's serialized form: markdown text for notes, JSON text for
    /// canvases.
    async fn read_document(&self, doc: &DocumentId) -> io::Result<String>;

    async fn write_document(&self, doc: &DocumentId, content: &str) -> io::Result<()>;
}

// ── Link extraction ──────────────────────────────────────────────────────

static RE_EMBED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"!\[\[([^\]|#]+)(?:[|#][^\]]*)?\]\]",
        r#"|!\[[^\]]*\]\(\s*([^)\s]+?)(?:\s+"[^"]*")?\s*\)"#
    ))
    .unwrap()
});

/// Extract raw image-link targets from a note's markdown body, in document
/// order, repeats included.
///
/// Handles wikilink embeds (`![[img.png]]`, with `|size` and `#block`
/// suffixes stripped) and markdown images (`![alt](img.png)`, optional
/// title dropped). The returned strings are the literal path text as
/// written, which is also what the rewriter later replaces.
pub fn extract_note_links(body: &str) -> Vec<String> {
    RE_EMBED
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

#[derive(Deserialize)]
struct CanvasData {
    #[serde(default)]
    nodes: Vec<CanvasNode>,
}

#[derive(Deserialize)]
struct CanvasNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    file: Option<String>,
}

/// Extract file-reference targets from a canvas document's JSON form.
///
/// A canvas that fails to parse yields no links; the scanner treats that
/// the same as any other unreadable document.
pub fn extract_canvas_links(json: &str) -> Vec<String> {
    let Ok(data) = serde_json::from_str::<CanvasData>(json) else {
        return Vec::new();
    };
    data.nodes
        .into_iter()
        .filter(|n| n.kind == "file")
        .filter_map(|n| n.file)
        .collect()
}

// ── Path helpers (vault-relative string paths) ───────────────────────────

/// The folder part of a vault-relative path, `""` at the root.
pub(crate) fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// The final path segment.
pub(crate) fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// The extension without its dot, `""` when absent. Original case.
pub(crate) fn extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => "",
    }
}

/// Join a folder and a name without introducing a leading slash.
pub(crate) fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Resolve `target` relative to `dir`, folding `.` and `..` segments.
pub(crate) fn resolve_relative(dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in target.split('/') {
        match part {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

// ── Filesystem-backed vault ──────────────────────────────────────────────

/// A vault rooted at a directory on disk.
///
/// Hidden entries (dot-prefixed, e.g. `.obsidian/`, `.trash/`) are ignored
/// by every listing.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn rel(&self, abs: &Path) -> String {
        abs.strip_prefix(&self.root)
            .unwrap_or(abs)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Walk `folder`, collecting vault-relative file paths. Iterative so
    /// recursion depth never matters.
    async fn walk(&self, folder: &str, recursive: bool) -> io::Result<Vec<String>> {
        let mut files = Vec::new();
        let mut pending = vec![self.abs(folder)];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') {
                    continue;
                }
                let ty = entry.file_type().await?;
                if ty.is_dir() {
                    if recursive {
                        pending.push(entry.path());
                    }
                } else if ty.is_file() {
                    files.push(self.rel(&entry.path()));
                }
            }
        }
        files.sort();
        Ok(files)
    }

    async fn documents_with_extension(&self, ext: &str) -> io::Result<Vec<DocumentId>> {
        let docs = self
            .walk("", true)
            .await?
            .into_iter()
            .filter(|p| extension(p).eq_ignore_ascii_case(ext))
            .map(DocumentId::from_path)
            .collect();
        Ok(docs)
    }
}

impl Vault for FsVault {
    async fn resolve(&self, path: &str) -> Option<FileRef> {
        let meta = tokio::fs::metadata(self.abs(path)).await.ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(FileRef {
            path: path.to_string(),
            size: meta.len(),
        })
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.abs(path)).await
    }

    async fn write_file(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.abs(path), bytes).await
    }

    async fn rename_file(&self, from: &str, to: &str) -> io::Result<()> {
        debug!("rename: {from} -> {to}");
        tokio::fs::rename(self.abs(from), self.abs(to)).await
    }

    async fn list_files(&self, folder: &str, recursive: bool) -> io::Result<Vec<String>> {
        self.walk(folder, recursive).await
    }

    async fn list_notes(&self) -> io::Result<Vec<DocumentId>> {
        self.documents_with_extension("md").await
    }

    async fn list_canvases(&self) -> io::Result<Vec<DocumentId>> {
        self.documents_with_extension("canvas").await
    }

    async fn document_links(&self, doc: &DocumentId) -> io::Result<Vec<String>> {
        let body = self.read_document(doc).await?;
        Ok(match doc.kind {
            DocKind::Note => extract_note_links(&body),
            DocKind::Canvas => extract_canvas_links(&body),
        })
    }

    async fn read_document(&self, doc: &DocumentId) -> io::Result<String> {
        tokio::fs::read_to_string(self.abs(&doc.path)).await
    }

    async fn write_document(&self, doc: &DocumentId, content: &str) -> io::Result<()> {
        tokio::fs::write(self.abs(&doc.path), content).await
    }
}
