//! Thin in-memory archive layer over the zip container.
//!
//! The pipeline treats an archive as a flat list of path → byte-buffer
//! entries; directories are not stored. All paths use forward slashes.

use crate::error::Result;
use serde_json::Value;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// UUID used when a pack carries no readable `manifest.json`.
pub const PLACEHOLDER_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// One file inside an archive, unique by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Read every file entry of a zip archive into memory, in archive order.
/// Directory entries are dropped; backslash paths are normalized.
pub fn read_archive(bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let path = file.name().replace('\\', "/");
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        entries.push(ArchiveEntry { path, bytes: buf });
    }
    Ok(entries)
}

/// Serialize entries into a deflate-compressed zip archive.
pub fn write_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in entries {
        zip.start_file(entry.path.as_str(), options)?;
        zip.write_all(&entry.bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Extract the pack UUID from its `manifest.json`.
///
/// When several manifests exist (sub-packs carry their own) the shallowest,
/// shortest path wins. Any read or parse failure falls back to the all-zero
/// placeholder; an encrypted pack must not fail over a cosmetic field.
pub fn pack_uuid(entries: &[ArchiveEntry]) -> String {
    let mut candidates: Vec<&ArchiveEntry> = entries
        .iter()
        .filter(|e| e.path.ends_with("manifest.json"))
        .collect();
    candidates.sort_by_key(|e| (e.path.matches('/').count(), e.path.len()));

    candidates
        .first()
        .and_then(|entry| serde_json::from_slice::<Value>(&entry.bytes).ok())
        .and_then(|value| {
            value
                .get("header")
                .and_then(|h| h.get("uuid"))
                .and_then(|u| u.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| PLACEHOLDER_UUID.to_string())
}
