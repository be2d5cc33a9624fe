use crate::archive::ArchiveEntry;
use crate::cipher;
use crate::error::{PacklockError, Result};
use crate::key::validate_key;
use crate::manifest::{read_manifest, MANIFEST_NAME};
use std::collections::HashMap;

/// Decrypt a whole pack with its master key.
///
/// Every manifest in the archive is parsed with the master key to build a
/// path → key map; records without an explicit key fall back to the master
/// key. Parsing all manifests and failing on every one is the format's only
/// "wrong key" signal. Entries outside the map were excluded at encryption
/// time and are copied verbatim; manifests themselves are omitted from the
/// output.
pub fn decrypt_archive(entries: &[ArchiveEntry], master_key: &str) -> Result<Vec<ArchiveEntry>> {
    validate_key(master_key)?;

    let manifests: Vec<&ArchiveEntry> = entries
        .iter()
        .filter(|e| e.path.ends_with(MANIFEST_NAME))
        .collect();
    if manifests.is_empty() {
        return Err(PacklockError::ManifestNotFound);
    }

    let mut key_map: HashMap<String, String> = HashMap::new();
    let mut parsed_any = false;
    for manifest in &manifests {
        let group_prefix = &manifest.path[..manifest.path.len() - MANIFEST_NAME.len()];
        match read_manifest(&manifest.bytes, master_key) {
            Ok(records) => {
                parsed_any = true;
                for record in records {
                    key_map.insert(
                        format!("{}{}", group_prefix, record.path),
                        record.key.unwrap_or_else(|| master_key.to_string()),
                    );
                }
            }
            // A single undecryptable manifest is tolerated; only a clean
            // sweep of failures condemns the key.
            Err(PacklockError::KeyMismatch) | Err(PacklockError::InvalidHeader(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    if !parsed_any {
        return Err(PacklockError::KeyMismatch);
    }

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.path.ends_with(MANIFEST_NAME) {
            continue;
        }
        match key_map.get(&entry.path) {
            Some(key) => out.push(ArchiveEntry::new(
                entry.path.clone(),
                cipher::decrypt(&entry.bytes, key)?,
            )),
            None => out.push(entry.clone()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::KeyScheme;
    use crate::pipeline::encrypt::{encrypt_archive, EncryptOptions};
    use crate::selection::SelectionTree;

    const KEY: &str = "Master0123456789Master0123456789";

    fn encrypted_pack(scheme: KeyScheme) -> (Vec<ArchiveEntry>, Vec<ArchiveEntry>) {
        let plain = vec![
            ArchiveEntry::new("manifest.json", br#"{"header":{"uuid":"u-1"}}"#.to_vec()),
            ArchiveEntry::new("textures/a.png", vec![1u8, 2, 3]),
            ArchiveEntry::new("subpacks/winter/textures/b.png", vec![4u8, 5]),
        ];
        let paths: Vec<String> = plain.iter().map(|e| e.path.clone()).collect();
        let tree = SelectionTree::with_default_exclusions(&paths);
        let options = EncryptOptions {
            master_key: Some(KEY.into()),
            scheme,
            ..Default::default()
        };
        let outcome = encrypt_archive(&plain, &tree, &options, None).unwrap();
        (plain, outcome.entries)
    }

    #[test]
    fn test_roundtrip_master_only() {
        let (plain, encrypted) = encrypted_pack(KeyScheme::MasterOnly);
        let mut decrypted = decrypt_archive(&encrypted, KEY).unwrap();
        decrypted.sort_by(|a, b| a.path.cmp(&b.path));
        let mut expected = plain;
        expected.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(decrypted, expected);
    }

    #[test]
    fn test_roundtrip_per_file() {
        let (plain, encrypted) = encrypted_pack(KeyScheme::PerFile);
        let mut decrypted = decrypt_archive(&encrypted, KEY).unwrap();
        decrypted.sort_by(|a, b| a.path.cmp(&b.path));
        let mut expected = plain;
        expected.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(decrypted, expected);
    }

    #[test]
    fn test_manifests_omitted_from_output() {
        let (_, encrypted) = encrypted_pack(KeyScheme::MasterOnly);
        let decrypted = decrypt_archive(&encrypted, KEY).unwrap();
        assert!(decrypted.iter().all(|e| !e.path.ends_with(MANIFEST_NAME)));
    }

    #[test]
    fn test_wrong_key_is_mismatch() {
        let (_, encrypted) = encrypted_pack(KeyScheme::MasterOnly);
        let wrong = "Wrong00123456789Wrong00123456789";
        assert!(matches!(
            decrypt_archive(&encrypted, wrong),
            Err(PacklockError::KeyMismatch)
        ));
    }

    #[test]
    fn test_no_manifest_is_fatal() {
        let entries = vec![ArchiveEntry::new("a.bin", vec![1u8])];
        assert!(matches!(
            decrypt_archive(&entries, KEY),
            Err(PacklockError::ManifestNotFound)
        ));
    }

    #[test]
    fn test_short_key_rejected_before_work() {
        assert!(matches!(
            decrypt_archive(&[], "short"),
            Err(PacklockError::InvalidKeyLength { .. })
        ));
    }
}
