//! Packlock - Resource Pack Encryption Toolkit
//!
//! Encrypts Bedrock-style resource packs with AES-256 in CFB-8 mode, file
//! by file, recording the keys in an encrypted `contents.json` manifest
//! per pack group. Subpacks get their own manifest so the client can
//! unlock them independently. The companion `recover` command brute-forces
//! a lost master key from the manifest's known-plaintext prefix.
//!
//! ## Pack layout
//!
//! ```text
//! pack.zip
//! ├── manifest.json        (copied verbatim, source of the pack UUID)
//! ├── pack_icon.png        (copied verbatim)
//! ├── contents.json        (256-byte header + encrypted record list)
//! ├── textures/...         (encrypted)
//! └── subpacks/<name>/
//!     ├── contents.json    (manifest for this subpack)
//!     └── ...              (encrypted)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use packlock::cli::{encrypt_pack_file, decrypt_pack_file};
//! use packlock::pipeline::EncryptOptions;
//! use std::path::Path;
//!
//! let options = EncryptOptions::default();
//! let summary = encrypt_pack_file(
//!     Path::new("pack.zip"),
//!     Path::new("out"),
//!     &options,
//!     &[],
//!     &[],
//!     None,
//! ).unwrap();
//!
//! decrypt_pack_file(
//!     Path::new("out/pack_encrypted.zip"),
//!     Path::new("pack_decrypted.zip"),
//!     &summary.master_key,
//! ).unwrap();
//! ```

pub mod archive;
pub mod cipher;
pub mod cli;
pub mod error;
pub mod key;
pub mod manifest;
pub mod partition;
pub mod pipeline;
pub mod search;
pub mod selection;

pub use error::{PacklockError, Result};
pub use key::{random_key, validate_key, KEY_LENGTH};
pub use manifest::{read_manifest, write_manifest, KeyScheme, ManifestRecord};
