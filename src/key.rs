use crate::error::{PacklockError, Result};
use rand::Rng;

/// Every key in the system is exactly 32 ASCII characters, which doubles as
/// the 32-byte AES-256 key.
pub const KEY_LENGTH: usize = 32;

/// Alphabet used when generating fresh random keys.
pub const KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Validate a user-supplied key: exactly 32 characters, all ASCII.
///
/// The key's UTF-8 bytes are used directly as the AES-256 key, so a
/// multi-byte character would silently change the effective key length.
pub fn validate_key(key: &str) -> Result<()> {
    let chars = key.chars().count();
    if chars != KEY_LENGTH || key.len() != KEY_LENGTH {
        return Err(PacklockError::InvalidKeyLength {
            expected: KEY_LENGTH,
            actual: chars,
        });
    }
    Ok(())
}

/// Generate a random 32-character key from the alphanumeric alphabet.
pub fn random_key() -> String {
    let mut rng = rand::thread_rng();
    (0..KEY_LENGTH)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}
