//! Base-62 key enumeration.
//!
//! Candidate keys are indexed by a non-negative integer counter. The counter
//! is written in base 62 over a fixed, ordered alphabet (digits, then
//! lowercase, then uppercase), most-significant digit first, left-padded with
//! `'0'` to exactly 32 characters. This is an exact bijection between
//! `[0, 62^32)` and the 32-character keyspace; the keyspace size exceeds
//! `u128`, so counters are arbitrary-precision.

use crate::key::KEY_LENGTH;
use num_bigint::BigUint;

/// Enumeration alphabet, in digit-value order.
pub const SEARCH_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const RADIX: u32 = 62;

/// Total number of 32-character keys over the alphabet.
pub fn keyspace_size() -> BigUint {
    BigUint::from(RADIX).pow(KEY_LENGTH as u32)
}

fn symbol_value(symbol: u8) -> Option<u8> {
    match symbol {
        b'0'..=b'9' => Some(symbol - b'0'),
        b'a'..=b'z' => Some(symbol - b'a' + 10),
        b'A'..=b'Z' => Some(symbol - b'A' + 36),
        _ => None,
    }
}

/// Render a counter as its 32-byte key. `None` once the counter leaves the
/// keyspace.
pub fn counter_to_key_bytes(counter: &BigUint) -> Option<[u8; KEY_LENGTH]> {
    let digits = counter.to_radix_le(RADIX);
    if digits.len() > KEY_LENGTH {
        return None;
    }
    let mut key = [SEARCH_ALPHABET[0]; KEY_LENGTH];
    for (i, &digit) in digits.iter().enumerate() {
        key[KEY_LENGTH - 1 - i] = SEARCH_ALPHABET[digit as usize];
    }
    Some(key)
}

/// String form of [`counter_to_key_bytes`].
pub fn counter_to_key(counter: &BigUint) -> Option<String> {
    counter_to_key_bytes(counter)
        .map(|bytes| bytes.iter().map(|&b| b as char).collect())
}

/// Inverse of [`counter_to_key`]. `None` for keys of the wrong length or
/// with symbols outside the alphabet.
pub fn key_to_counter(key: &str) -> Option<BigUint> {
    if key.len() != KEY_LENGTH {
        return None;
    }
    let digits: Option<Vec<u8>> = key.bytes().map(symbol_value).collect();
    BigUint::from_radix_be(&digits?, RADIX)
}

/// In-place key incrementer for the brute-force hot loop.
///
/// Advancing is a carry over the digit array rather than a full BigUint
/// division per candidate.
pub struct KeyOdometer {
    /// Digit values, most significant first.
    digits: [u8; KEY_LENGTH],
    /// Rendered key, kept in sync with `digits`.
    key: [u8; KEY_LENGTH],
}

impl KeyOdometer {
    /// Position the odometer at a counter. `None` if the counter is outside
    /// the keyspace.
    pub fn new(start: &BigUint) -> Option<Self> {
        let key = counter_to_key_bytes(start)?;
        let mut digits = [0u8; KEY_LENGTH];
        for (i, &symbol) in key.iter().enumerate() {
            digits[i] = symbol_value(symbol)?;
        }
        Some(Self { digits, key })
    }

    pub fn key_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    pub fn key(&self) -> String {
        self.key.iter().map(|&b| b as char).collect()
    }

    /// Step to the next key. Returns false when the keyspace wraps.
    pub fn advance(&mut self) -> bool {
        for i in (0..KEY_LENGTH).rev() {
            if u32::from(self.digits[i]) + 1 < RADIX {
                self.digits[i] += 1;
                self.key[i] = SEARCH_ALPHABET[self.digits[i] as usize];
                return true;
            }
            self.digits[i] = 0;
            self.key[i] = SEARCH_ALPHABET[0];
        }
        false
    }
}
