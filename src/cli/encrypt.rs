use crate::archive::{read_archive, write_archive, ArchiveEntry};
use crate::error::Result;
use crate::pipeline::{encrypt_archive, EncryptOptions};
use crate::selection::SelectionTree;
use std::path::{Path, PathBuf};

/// What the encrypt command produced.
#[derive(Debug)]
pub struct EncryptSummary {
    /// The outer bundle zip written to disk.
    pub bundle_path: PathBuf,
    pub master_key: String,
    pub uuid: String,
    pub encrypted_files: usize,
    pub copied_files: usize,
}

/// Encrypt a pack zip into a deliverable bundle.
///
/// The bundle is a zip holding the transformed pack (`<base>_encrypted.zip`),
/// the raw master key (`<base>.zip.key`) and a human-readable `info.txt`.
/// Nothing is written until the whole transform has succeeded.
///
/// `exclude`/`include` override the default selection (manifest and icons
/// excluded, everything else encrypted) for individual paths or folders.
pub fn encrypt_pack_file(
    input: &Path,
    output_dir: &Path,
    options: &EncryptOptions,
    exclude: &[String],
    include: &[String],
    progress: Option<&mut dyn FnMut(u8)>,
) -> Result<EncryptSummary> {
    let input_bytes = std::fs::read(input)?;
    let entries = read_archive(&input_bytes)?;

    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    let mut tree = SelectionTree::with_default_exclusions(&paths);
    for path in exclude {
        tree.set_checked(path, false);
    }
    for path in include {
        tree.set_checked(path, true);
    }

    let outcome = encrypt_archive(&entries, &tree, options, progress)?;
    let inner_zip = write_archive(&outcome.entries)?;

    let base = pack_base_name(input);
    let info = format!(
        "UUID: {}\nMaster key: {}\nEncrypted file: {}_encrypted.zip\n\
         Keep the key file private; a lost key can only be brute-forced.\n",
        outcome.uuid, outcome.master_key, base
    );
    let bundle = write_archive(&[
        ArchiveEntry::new(format!("{}_encrypted.zip", base), inner_zip),
        ArchiveEntry::new(
            format!("{}.zip.key", base),
            outcome.master_key.as_bytes().to_vec(),
        ),
        ArchiveEntry::new("info.txt", info.into_bytes()),
    ])?;

    let bundle_path = output_dir.join(format!("{}_bundle.zip", base));
    std::fs::write(&bundle_path, bundle)?;

    Ok(EncryptSummary {
        bundle_path,
        master_key: outcome.master_key,
        uuid: outcome.uuid,
        encrypted_files: outcome.encrypted_files,
        copied_files: outcome.copied_files,
    })
}

fn pack_base_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resource_pack".to_string())
}
