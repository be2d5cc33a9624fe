use crate::archive::{read_archive, write_archive};
use crate::error::Result;
use crate::pipeline::decrypt_archive;
use std::path::Path;

#[derive(Debug)]
pub struct DecryptSummary {
    pub files: usize,
}

/// Decrypt an encrypted pack zip back to its plaintext form.
///
/// `input` is the inner `*_encrypted.zip` from a bundle (or any archive
/// containing `contents.json` manifests). The output zip is written only
/// after every file decrypted cleanly.
pub fn decrypt_pack_file(input: &Path, output: &Path, master_key: &str) -> Result<DecryptSummary> {
    let bytes = std::fs::read(input)?;
    let entries = read_archive(&bytes)?;
    let decrypted = decrypt_archive(&entries, master_key)?;
    std::fs::write(output, write_archive(&decrypted)?)?;
    Ok(DecryptSummary {
        files: decrypted.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveEntry;
    use crate::cli::encrypt::encrypt_pack_file;
    use crate::error::PacklockError;
    use crate::pipeline::EncryptOptions;
    use tempfile::tempdir;

    const KEY: &str = "RoundTrip0123456789RoundTrip0123";

    #[test]
    fn test_file_level_roundtrip() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("pack.zip");
        let original = vec![
            ArchiveEntry::new("manifest.json", br#"{"header":{"uuid":"u"}}"#.to_vec()),
            ArchiveEntry::new("textures/a.png", vec![10u8, 20, 30]),
        ];
        std::fs::write(&input, write_archive(&original).unwrap()).unwrap();

        let options = EncryptOptions {
            master_key: Some(KEY.into()),
            ..Default::default()
        };
        let summary =
            encrypt_pack_file(&input, dir.path(), &options, &[], &[], None).unwrap();

        // pull the inner encrypted pack out of the bundle
        let bundle = read_archive(&std::fs::read(&summary.bundle_path).unwrap()).unwrap();
        let encrypted_path = dir.path().join("pack_encrypted.zip");
        std::fs::write(&encrypted_path, &bundle[0].bytes).unwrap();

        let output = dir.path().join("decrypted.zip");
        let result = decrypt_pack_file(&encrypted_path, &output, KEY).unwrap();
        assert_eq!(result.files, 2);

        let mut decrypted = read_archive(&std::fs::read(&output).unwrap()).unwrap();
        decrypted.sort_by(|a, b| a.path.cmp(&b.path));
        let mut expected = original;
        expected.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(decrypted, expected);
    }

    #[test]
    fn test_no_output_on_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("plain.zip");
        std::fs::write(
            &input,
            write_archive(&[ArchiveEntry::new("a.bin", vec![1u8])]).unwrap(),
        )
        .unwrap();

        let output = dir.path().join("out.zip");
        let err = decrypt_pack_file(&input, &output, KEY).unwrap_err();
        assert!(matches!(err, PacklockError::ManifestNotFound));
        assert!(!output.exists());
    }
}
