//! Encrypted manifest (`contents.json`) codec.
//!
//! Each keyed group in a pack carries one manifest: a fixed 256-byte
//! plaintext header followed by the group's record list as UTF-8 JSON
//! (`{"content":[{"path":..,"key"?:..},..]}`) encrypted with the pack's
//! master key.
//!
//! Header layout:
//!
//! ```text
//! [version: 4 zero bytes][magic FC B9 CF 9B][reserved: 8 zero bytes]
//! [uuid length: 1][uuid: L bytes UTF-8][zero padding to 256]
//! ```

use crate::cipher;
use crate::error::{PacklockError, Result};
use serde::{Deserialize, Serialize};

/// Fixed header size; the encrypted JSON body starts at this offset.
pub const HEADER_SIZE: usize = 256;

/// Magic constant at offset 4.
pub const MAGIC: [u8; 4] = [0xFC, 0xB9, 0xCF, 0x9B];

/// Format version at offset 0 (all zero in every known pack).
pub const FORMAT_VERSION: [u8; 4] = [0, 0, 0, 0];

/// File name of a group manifest, at the root of its group.
pub const MANIFEST_NAME: &str = "contents.json";

/// Version + magic + reserved bytes preceding the UUID length byte.
const UUID_OFFSET: usize = 16;

/// Longest UUID that fits the fixed header (256 - 16 - 1 length byte).
pub const MAX_UUID_LEN: usize = HEADER_SIZE - UUID_OFFSET - 1;

/// One transformed file in a group.
///
/// `key` present: the file was encrypted with its own per-file key
/// (scheme A). `key` absent: the file was encrypted with the group's
/// master key (scheme B). Excluded files are not recorded at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// JSON document shape of the decrypted manifest body.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestBody {
    content: Vec<ManifestRecord>,
}

/// How working keys are assigned to files during encryption.
///
/// An explicit configuration choice, never auto-detected; decryption handles
/// both shapes transparently because records carry an optional key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScheme {
    /// Fresh random key per file, recorded in the manifest.
    #[default]
    PerFile,
    /// Every file uses the pack's master key; records carry no key.
    MasterOnly,
}

impl std::str::FromStr for KeyScheme {
    type Err = PacklockError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "per-file" | "perfile" => Ok(Self::PerFile),
            "master" | "master-only" => Ok(Self::MasterOnly),
            _ => Err(PacklockError::InvalidFormat(format!("key scheme: {}", s))),
        }
    }
}

/// Encode the fixed 256-byte header for a pack UUID.
pub fn encode_header(uuid: &str) -> Result<[u8; HEADER_SIZE]> {
    let cid = uuid.as_bytes();
    if cid.len() > MAX_UUID_LEN {
        return Err(PacklockError::InvalidHeader(format!(
            "UUID is {} bytes, max {}",
            cid.len(),
            MAX_UUID_LEN
        )));
    }
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&FORMAT_VERSION);
    header[4..8].copy_from_slice(&MAGIC);
    // bytes 8..16 reserved, already zero
    header[UUID_OFFSET] = cid.len() as u8;
    header[UUID_OFFSET + 1..UUID_OFFSET + 1 + cid.len()].copy_from_slice(cid);
    Ok(header)
}

/// Strictly decode a header, returning the embedded UUID.
///
/// Used by `info` and tests. The read path stays lenient — see
/// [`read_manifest`].
pub fn decode_header(bytes: &[u8]) -> Result<String> {
    if bytes.len() < HEADER_SIZE {
        return Err(PacklockError::InvalidHeader(format!(
            "{} bytes, need {}",
            bytes.len(),
            HEADER_SIZE
        )));
    }
    if bytes[0..4] != FORMAT_VERSION {
        return Err(PacklockError::InvalidHeader("version mismatch".into()));
    }
    if bytes[4..8] != MAGIC {
        return Err(PacklockError::InvalidHeader("magic mismatch".into()));
    }
    let len = bytes[UUID_OFFSET] as usize;
    if UUID_OFFSET + 1 + len > HEADER_SIZE {
        return Err(PacklockError::InvalidHeader(format!(
            "UUID length {} overflows header",
            len
        )));
    }
    let uuid = std::str::from_utf8(&bytes[UUID_OFFSET + 1..UUID_OFFSET + 1 + len])
        .map_err(|_| PacklockError::InvalidHeader("UUID is not UTF-8".into()))?;
    Ok(uuid.to_string())
}

/// Quick non-failing probe: does this buffer start with a manifest header?
pub fn header_is_valid(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_SIZE && bytes[4..8] == MAGIC
}

/// Serialize, encrypt and frame a group's record list.
pub fn write_manifest(records: &[ManifestRecord], master_key: &str, uuid: &str) -> Result<Vec<u8>> {
    let header = encode_header(uuid)?;
    let body = serde_json::to_vec(&ManifestBody {
        content: records.to_vec(),
    })?;
    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&cipher::encrypt(&body, master_key)?);
    Ok(out)
}

/// Decrypt and parse a manifest file.
///
/// Splits at byte 256 and decrypts the remainder without verifying
/// version/magic first — headers in the wild are informational and existing
/// tools never reject on them. A decode or parse failure means the key is
/// wrong ([`PacklockError::KeyMismatch`]); that is the only key-validation
/// mechanism the format has, and it is probabilistic rather than
/// cryptographic.
pub fn read_manifest(bytes: &[u8], key: &str) -> Result<Vec<ManifestRecord>> {
    if bytes.len() < HEADER_SIZE {
        return Err(PacklockError::InvalidHeader(format!(
            "manifest is {} bytes, shorter than its header",
            bytes.len()
        )));
    }
    let body = cipher::decrypt(&bytes[HEADER_SIZE..], key)?;
    let parsed: ManifestBody = std::str::from_utf8(&body)
        .ok()
        .and_then(|s| serde_json::from_str(s).ok())
        .ok_or(PacklockError::KeyMismatch)?;
    Ok(parsed.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "KkMnOpQrStUvWxYz0123456789AbCdEf";
    const UUID: &str = "11111111-2222-3333-4444-555555555555";

    fn sample_records() -> Vec<ManifestRecord> {
        vec![
            ManifestRecord {
                path: "textures/a.png".into(),
                key: Some("ZZMnOpQrStUvWxYz0123456789AbCdEf".into()),
            },
            ManifestRecord {
                path: "sounds/b.ogg".into(),
                key: None,
            },
        ]
    }

    #[test]
    fn test_header_roundtrip() {
        let header = encode_header(UUID).unwrap();
        assert_eq!(header.len(), HEADER_SIZE);
        assert_eq!(decode_header(&header).unwrap(), UUID);
        // fixed prefix and zero padding
        assert_eq!(&header[0..4], &FORMAT_VERSION);
        assert_eq!(&header[4..8], &MAGIC);
        assert!(header[17 + UUID.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_header_rejects_long_uuid() {
        let long = "u".repeat(MAX_UUID_LEN + 1);
        assert!(matches!(
            encode_header(&long),
            Err(PacklockError::InvalidHeader(_))
        ));
        assert!(encode_header(&"u".repeat(MAX_UUID_LEN)).is_ok());
    }

    #[test]
    fn test_decode_rejects_short_and_corrupt() {
        assert!(decode_header(&[0u8; 16]).is_err());
        let mut header = encode_header(UUID).unwrap();
        header[5] ^= 0xFF;
        assert!(decode_header(&header).is_err());
    }

    #[test]
    fn test_header_is_valid_probe() {
        let header = encode_header(UUID).unwrap();
        assert!(header_is_valid(&header));
        assert!(!header_is_valid(&[0u8; HEADER_SIZE]));
        assert!(!header_is_valid(&header[..100]));
    }

    #[test]
    fn test_manifest_roundtrip_preserves_order() {
        let records = sample_records();
        let bytes = write_manifest(&records, KEY, UUID).unwrap();
        assert_eq!(decode_header(&bytes).unwrap(), UUID);
        assert_eq!(read_manifest(&bytes, KEY).unwrap(), records);
    }

    #[test]
    fn test_manifest_wrong_key_is_mismatch() {
        let bytes = write_manifest(&sample_records(), KEY, UUID).unwrap();
        let other = "FfEdCbA9876543210zYxWvUtSrQpOnMk";
        assert!(matches!(
            read_manifest(&bytes, other),
            Err(PacklockError::KeyMismatch)
        ));
    }

    #[test]
    fn test_record_without_key_omits_field() {
        let record = ManifestRecord {
            path: "a.png".into(),
            key: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"path":"a.png"}"#);
        // and absent key deserializes back to None
        let back: ManifestRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key, None);
    }

    #[test]
    fn test_body_json_shape() {
        // The decrypted body must start with {"content": — the key-search
        // engine's probe signature depends on it.
        let bytes = write_manifest(&sample_records(), KEY, UUID).unwrap();
        let body = cipher::decrypt(&bytes[HEADER_SIZE..], KEY).unwrap();
        assert!(body.starts_with(br#"{"content":["#));
    }
}
