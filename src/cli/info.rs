use crate::archive::{read_archive, ArchiveEntry};
use crate::error::Result;
use crate::manifest::{
    decode_header, header_is_valid, read_manifest, HEADER_SIZE, MANIFEST_NAME,
};
use std::path::Path;

/// Inspect an encrypted pack (or a raw manifest file) without modifying it.
///
/// Lists every manifest with its header state, UUID and body size. With a
/// key, also decrypts each manifest and summarizes its records.
pub fn show_info(path: &Path, key: Option<&str>) -> Result<String> {
    let bytes = std::fs::read(path)?;

    // A zip archive, or a bare contents.json passed directly.
    let manifests: Vec<ArchiveEntry> = match read_archive(&bytes) {
        Ok(entries) => entries
            .into_iter()
            .filter(|e| e.path.ends_with(MANIFEST_NAME))
            .collect(),
        Err(_) => vec![ArchiveEntry::new(
            path.to_string_lossy().into_owned(),
            bytes,
        )],
    };

    let mut output = String::new();
    output.push_str("Packlock Manifest Inspector\n");
    output.push_str("===========================\n\n");
    output.push_str(&format!("File: {}\n", path.display()));
    output.push_str(&format!("Manifests found: {}\n", manifests.len()));

    for manifest in &manifests {
        output.push_str(&format!("\n{}\n", manifest.path));
        if manifest.bytes.len() < HEADER_SIZE {
            output.push_str(&format!(
                "  Truncated: {} bytes, header needs {}\n",
                manifest.bytes.len(),
                HEADER_SIZE
            ));
            continue;
        }

        output.push_str(&format!(
            "  Magic: {} ({})\n",
            hex::encode_upper(&manifest.bytes[4..8]),
            if header_is_valid(&manifest.bytes) {
                "ok"
            } else {
                "MISMATCH"
            }
        ));
        match decode_header(&manifest.bytes) {
            Ok(uuid) => output.push_str(&format!("  UUID: {}\n", uuid)),
            Err(e) => output.push_str(&format!("  Header: {}\n", e)),
        }
        output.push_str(&format!(
            "  Encrypted body: {} bytes\n",
            manifest.bytes.len() - HEADER_SIZE
        ));

        if let Some(key) = key {
            match read_manifest(&manifest.bytes, key) {
                Ok(records) => {
                    output.push_str(&format!("  Records: {}\n", records.len()));
                    for record in &records {
                        let scheme = if record.key.is_some() {
                            "per-file key"
                        } else {
                            "master key"
                        };
                        output.push_str(&format!("    {} ({})\n", record.path, scheme));
                    }
                }
                Err(e) => output.push_str(&format!("  Decrypt failed: {}\n", e)),
            }
        }
    }

    Ok(output)
}
