//! Shared test fixtures: an instrumented in-memory vault and tiny image
//! fixtures.
//!
//! `MemVault` implements the `Vault` trait over a `BTreeMap`, which gives
//! the same sorted, deterministic listings as the filesystem
//! implementation, plus the instrumentation the orchestrator properties
//! need: a read counter (the early no-op law asserts zero reads) and
//! failure injection for reads, writes, and the rename/re-resolve race.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use vault_imgsync::{
    extract_canvas_links, extract_note_links, DocKind, DocumentId, FileRef, OutputFormat,
    ProcessConfig, Vault,
};

#[derive(Default)]
pub struct MemVault {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    reads: AtomicUsize,
    fail_reads: Mutex<HashSet<String>>,
    fail_writes: Mutex<HashSet<String>>,
    vanished: Mutex<HashSet<String>>,
}

impl MemVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(path.to_string(), bytes);
    }

    pub fn insert_text(&self, path: &str, text: &str) {
        self.insert(path, text.as_bytes().to_vec());
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.bytes(path)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    /// Number of `read_file` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every `read_file` of `path` fail.
    pub fn fail_read_on(&self, path: &str) {
        self.fail_reads.lock().unwrap().insert(path.to_string());
    }

    /// Make every `write_file` of `path` fail.
    pub fn fail_write_on(&self, path: &str) {
        self.fail_writes.lock().unwrap().insert(path.to_string());
    }

    /// Make `resolve` of `path` come back empty even after a rename lands
    /// there, simulating a lagging host file index.
    pub fn vanish_at(&self, path: &str) {
        self.vanished.lock().unwrap().insert(path.to_string());
    }
}

impl Vault for MemVault {
    async fn resolve(&self, path: &str) -> Option<FileRef> {
        if self.vanished.lock().unwrap().contains(path) {
            return None;
        }
        let files = self.files.lock().unwrap();
        files.get(path).map(|bytes| FileRef {
            path: path.to_string(),
            size: bytes.len() as u64,
        })
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.lock().unwrap().contains(path) {
            return Err(io::Error::other("injected read failure"));
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    async fn write_file(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes.lock().unwrap().contains(path) {
            return Err(io::Error::other("injected write failure"));
        }
        self.insert(path, bytes.to_vec());
        Ok(())
    }

    async fn rename_file(&self, from: &str, to: &str) -> io::Result<()> {
        let mut files = self.files.lock().unwrap();
        let bytes = files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, from.to_string()))?;
        files.insert(to.to_string(), bytes);
        Ok(())
    }

    async fn list_files(&self, folder: &str, recursive: bool) -> io::Result<Vec<String>> {
        let files = self.files.lock().unwrap();
        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{folder}/")
        };
        if !folder.is_empty() && !files.keys().any(|k| k.starts_with(&prefix)) {
            return Err(io::Error::new(io::ErrorKind::NotFound, folder.to_string()));
        }
        Ok(files
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .filter(|k| recursive || !k[prefix.len()..].contains('/'))
            .cloned()
            .collect())
    }

    async fn list_notes(&self) -> io::Result<Vec<DocumentId>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.ends_with(".md"))
            .map(|k| DocumentId::note(k.clone()))
            .collect())
    }

    async fn list_canvases(&self) -> io::Result<Vec<DocumentId>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.ends_with(".canvas"))
            .map(|k| DocumentId::canvas(k.clone()))
            .collect())
    }

    async fn document_links(&self, doc: &DocumentId) -> io::Result<Vec<String>> {
        let body = self.read_document(doc).await?;
        Ok(match doc.kind {
            DocKind::Note => extract_note_links(&body),
            DocKind::Canvas => extract_canvas_links(&body),
        })
    }

    async fn read_document(&self, doc: &DocumentId) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(&doc.path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, doc.path.clone()))
    }

    async fn write_document(&self, doc: &DocumentId, content: &str) -> io::Result<()> {
        self.insert(&doc.path, content.as_bytes().to_vec());
        Ok(())
    }
}

// ── Image fixtures ───────────────────────────────────────────────────────

use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([90, 120, 30, 255]),
    ))
}

pub fn tiny_png() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    solid_image(6, 4).write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn tiny_jpg() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(solid_image(6, 4).to_rgb8())
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

pub fn is_webp(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok_and(|f| f == ImageFormat::WebP)
}

/// The standard conversion config the property tests run with.
pub fn webp_config() -> ProcessConfig {
    ProcessConfig::builder()
        .format(OutputFormat::Webp)
        .build()
        .unwrap()
}
