//! AES-256/CFB-8 stream cipher.
//!
//! Each keystream byte is produced by encrypting a 16-byte shift register
//! with AES-256 in single-block ECB mode and taking the first byte of the
//! result. After every byte the register shifts left by one and the
//! **ciphertext** byte is pushed in — on both encrypt and decrypt — which is
//! what makes the two directions share the same loop shape.
//!
//! The register is seeded with the first 16 bytes of the key itself; the key
//! doubles as the IV. No integrity tag, no key derivation — the format this
//! implements predates both.

use crate::error::Result;
use crate::key::{validate_key, KEY_LENGTH};
use aes::Aes256;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, KeyInit};

const REGISTER_SIZE: usize = 16;

/// Incremental CFB-8 keystream state.
///
/// The pipeline uses the whole-buffer [`encrypt`]/[`decrypt`] helpers; the
/// key-search engine drives this type directly so it can test a 4-byte
/// ciphertext prefix without decrypting a full manifest.
pub struct Cfb8 {
    block: Aes256,
    register: [u8; REGISTER_SIZE],
}

impl Cfb8 {
    /// Build from a textual key after validating its length.
    pub fn new(key: &str) -> Result<Self> {
        validate_key(key)?;
        let mut raw = [0u8; KEY_LENGTH];
        raw.copy_from_slice(key.as_bytes());
        Ok(Self::from_raw_key(&raw))
    }

    /// Build from raw key bytes, skipping validation.
    ///
    /// The brute-force worker constructs millions of these per second from
    /// candidate keys that are correct by construction.
    pub fn from_raw_key(key: &[u8; KEY_LENGTH]) -> Self {
        let block = Aes256::new(GenericArray::from_slice(key));
        let mut register = [0u8; REGISTER_SIZE];
        register.copy_from_slice(&key[..REGISTER_SIZE]);
        Self { block, register }
    }

    fn keystream_byte(&self) -> u8 {
        let mut block = GenericArray::clone_from_slice(&self.register);
        self.block.encrypt_block(&mut block);
        block[0]
    }

    /// Shift the register left one byte and append the ciphertext byte.
    fn feed(&mut self, ciphertext_byte: u8) {
        self.register.copy_within(1.., 0);
        self.register[REGISTER_SIZE - 1] = ciphertext_byte;
    }

    pub fn encrypt_byte(&mut self, plain: u8) -> u8 {
        let out = plain ^ self.keystream_byte();
        self.feed(out);
        out
    }

    pub fn decrypt_byte(&mut self, ciphertext: u8) -> u8 {
        let out = ciphertext ^ self.keystream_byte();
        self.feed(ciphertext);
        out
    }

    pub fn encrypt_vec(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&b| self.encrypt_byte(b)).collect()
    }

    pub fn decrypt_vec(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&b| self.decrypt_byte(b)).collect()
    }
}

/// Encrypt a buffer. Length-preserving; empty input yields empty output.
pub fn encrypt(data: &[u8], key: &str) -> Result<Vec<u8>> {
    Ok(Cfb8::new(key)?.encrypt_vec(data))
}

/// Decrypt a buffer encrypted by [`encrypt`] under the same key.
pub fn decrypt(data: &[u8], key: &str) -> Result<Vec<u8>> {
    Ok(Cfb8::new(key)?.decrypt_vec(data))
}
