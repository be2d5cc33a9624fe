use crate::archive::{pack_uuid, ArchiveEntry};
use crate::cipher;
use crate::error::{PacklockError, Result};
use crate::key::{random_key, validate_key};
use crate::manifest::{write_manifest, KeyScheme, ManifestRecord};
use crate::partition::partition_paths;
use crate::selection::SelectionTree;
use std::collections::HashMap;

/// Options for the encryption pipeline.
#[derive(Debug, Clone)]
pub struct EncryptOptions {
    /// Master key; generated randomly when absent.
    pub master_key: Option<String>,
    /// Per-file random keys (scheme A) or master key everywhere (scheme B).
    pub scheme: KeyScheme,
    /// Files processed between progress callbacks.
    pub progress_every: usize,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            master_key: None,
            scheme: KeyScheme::default(),
            progress_every: 10,
        }
    }
}

/// Result of encrypting a pack.
#[derive(Debug)]
pub struct EncryptOutcome {
    /// Output archive entries: transformed files plus one manifest per group.
    pub entries: Vec<ArchiveEntry>,
    /// The single secret to distribute. Always encrypts the manifests, and
    /// under scheme B every file as well.
    pub master_key: String,
    /// Pack UUID embedded in every manifest header.
    pub uuid: String,
    pub encrypted_files: usize,
    pub copied_files: usize,
}

/// Encrypt a whole pack in one pass.
///
/// Groups are processed root-first, then sub-packs in archive order. Files
/// unchecked in the selection tree are copied verbatim and left out of the
/// manifests; everything else is encrypted per the configured scheme. Each
/// group's manifest is encrypted with the master key and written at the
/// group root.
///
/// `progress` receives 0–100 proportional to files processed across all
/// groups, every `progress_every` files and once at completion.
pub fn encrypt_archive(
    entries: &[ArchiveEntry],
    tree: &SelectionTree,
    options: &EncryptOptions,
    mut progress: Option<&mut dyn FnMut(u8)>,
) -> Result<EncryptOutcome> {
    let master_key = match &options.master_key {
        Some(key) => {
            validate_key(key)?;
            key.clone()
        }
        None => random_key(),
    };
    let uuid = pack_uuid(entries);

    let by_path: HashMap<&str, &ArchiveEntry> =
        entries.iter().map(|e| (e.path.as_str(), e)).collect();
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    let groups = partition_paths(&paths);

    let total: usize = groups.iter().map(|g| g.files.len()).sum();
    let mut processed = 0usize;
    let mut encrypted_files = 0usize;
    let mut copied_files = 0usize;
    let mut out = Vec::with_capacity(entries.len() + groups.len());

    for group in &groups {
        let mut records = Vec::new();

        for path in &group.files {
            let entry = by_path.get(path.as_str()).ok_or_else(|| {
                PacklockError::InvalidFormat(format!("entry vanished during partition: {}", path))
            })?;

            if tree.is_included(path) {
                let file_key = match options.scheme {
                    KeyScheme::PerFile => random_key(),
                    KeyScheme::MasterOnly => master_key.clone(),
                };
                out.push(ArchiveEntry::new(
                    path.clone(),
                    cipher::encrypt(&entry.bytes, &file_key)?,
                ));
                records.push(ManifestRecord {
                    path: group.relative_path(path).to_string(),
                    key: match options.scheme {
                        KeyScheme::PerFile => Some(file_key),
                        KeyScheme::MasterOnly => None,
                    },
                });
                encrypted_files += 1;
            } else {
                out.push((*entry).clone());
                copied_files += 1;
            }

            processed += 1;
            if options.progress_every > 0 && processed % options.progress_every == 0 {
                if let Some(cb) = progress.as_deref_mut() {
                    cb(((processed * 100) / total.max(1)) as u8);
                }
            }
        }

        out.push(ArchiveEntry::new(
            group.manifest_path(),
            write_manifest(&records, &master_key, &uuid)?,
        ));
    }

    if let Some(cb) = progress.as_deref_mut() {
        cb(100);
    }

    Ok(EncryptOutcome {
        entries: out,
        master_key,
        uuid,
        encrypted_files,
        copied_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{read_manifest, HEADER_SIZE};

    const KEY: &str = "Master0123456789Master0123456789";

    fn sample_entries() -> Vec<ArchiveEntry> {
        vec![
            ArchiveEntry::new(
                "manifest.json",
                br#"{"header":{"uuid":"pack-uuid-1234"}}"#.to_vec(),
            ),
            ArchiveEntry::new("textures/a.png", vec![1u8, 2, 3, 4, 5]),
            ArchiveEntry::new("subpacks/winter/textures/b.png", vec![9u8, 8, 7]),
        ]
    }

    fn options_b() -> EncryptOptions {
        EncryptOptions {
            master_key: Some(KEY.into()),
            scheme: KeyScheme::MasterOnly,
            ..Default::default()
        }
    }

    #[test]
    fn test_master_only_scheme() {
        let entries = sample_entries();
        let tree = SelectionTree::with_default_exclusions(&["manifest.json", "textures/a.png"]);
        let outcome = encrypt_archive(&entries, &tree, &options_b(), None).unwrap();

        assert_eq!(outcome.master_key, KEY);
        assert_eq!(outcome.uuid, "pack-uuid-1234");
        assert_eq!(outcome.copied_files, 1);
        assert_eq!(outcome.encrypted_files, 2);

        let find = |p: &str| outcome.entries.iter().find(|e| e.path == p).unwrap();

        // excluded file copied byte for byte
        assert_eq!(find("manifest.json").bytes, entries[0].bytes);
        // included file encrypted with the master key
        assert_eq!(
            find("textures/a.png").bytes,
            cipher::encrypt(&entries[1].bytes, KEY).unwrap()
        );

        // root manifest records only the encrypted root file, keyless
        let records = read_manifest(&find("contents.json").bytes, KEY).unwrap();
        assert_eq!(
            records,
            vec![ManifestRecord {
                path: "textures/a.png".into(),
                key: None
            }]
        );

        // subpack group gets its own manifest with a relative record path
        let sub = read_manifest(&find("subpacks/winter/contents.json").bytes, KEY).unwrap();
        assert_eq!(sub[0].path, "textures/b.png");
    }

    #[test]
    fn test_per_file_scheme_records_keys() {
        let entries = sample_entries();
        let tree = SelectionTree::with_default_exclusions(&["manifest.json"]);
        let options = EncryptOptions {
            master_key: Some(KEY.into()),
            scheme: KeyScheme::PerFile,
            ..Default::default()
        };
        let outcome = encrypt_archive(&entries, &tree, &options, None).unwrap();

        let manifest = outcome
            .entries
            .iter()
            .find(|e| e.path == "contents.json")
            .unwrap();
        let records = read_manifest(&manifest.bytes, KEY).unwrap();
        let record = records.iter().find(|r| r.path == "textures/a.png").unwrap();
        let file_key = record.key.as_deref().unwrap();
        assert_ne!(file_key, KEY);

        let encrypted = outcome
            .entries
            .iter()
            .find(|e| e.path == "textures/a.png")
            .unwrap();
        assert_eq!(
            cipher::decrypt(&encrypted.bytes, file_key).unwrap(),
            entries[1].bytes
        );
    }

    #[test]
    fn test_generated_master_key_when_absent() {
        let entries = vec![ArchiveEntry::new("a.bin", vec![0u8; 8])];
        let tree = SelectionTree::from_paths(&["a.bin"]);
        let outcome =
            encrypt_archive(&entries, &tree, &EncryptOptions::default(), None).unwrap();
        assert_eq!(outcome.master_key.len(), 32);
        assert_eq!(outcome.uuid, crate::archive::PLACEHOLDER_UUID);
    }

    #[test]
    fn test_invalid_master_key_rejected() {
        let entries = sample_entries();
        let tree = SelectionTree::from_paths(&["textures/a.png"]);
        let options = EncryptOptions {
            master_key: Some("short".into()),
            ..Default::default()
        };
        assert!(matches!(
            encrypt_archive(&entries, &tree, &options, None),
            Err(PacklockError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_progress_reaches_100() {
        let entries: Vec<ArchiveEntry> = (0..25)
            .map(|i| ArchiveEntry::new(format!("f{}.bin", i), vec![i as u8]))
            .collect();
        let paths: Vec<String> = entries.iter().map(|e| e.path.clone()).collect();
        let tree = SelectionTree::from_paths(&paths);

        let mut reports = Vec::new();
        let mut cb = |p: u8| reports.push(p);
        encrypt_archive(&entries, &tree, &options_b(), Some(&mut cb)).unwrap();

        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*reports.last().unwrap(), 100);
        assert!(reports.len() >= 2);
    }

    #[test]
    fn test_manifest_body_well_formed() {
        // header sits in front of the encrypted body
        let entries = sample_entries();
        let tree = SelectionTree::from_paths(&["x"]);
        let outcome = encrypt_archive(&entries, &tree, &options_b(), None).unwrap();
        let manifest = outcome
            .entries
            .iter()
            .find(|e| e.path == "contents.json")
            .unwrap();
        assert!(manifest.bytes.len() > HEADER_SIZE);
        assert!(crate::manifest::header_is_valid(&manifest.bytes));
    }
}
