//! Reversible keyed transforms and text framings used for literals and layers.
//!
//! None of this is meant to be confidential: the key always travels next to
//! the payload. The transforms exist so that constants are not readable by
//! static inspection.

use crate::result::{Error, Result};
use base64::Engine;
use rand::Rng;
use rand::seq::SliceRandom;

/// Punctuation that is legal inside a double-quoted Lua string and can never
/// be part of an identifier, number or escape sequence.
pub const SYMBOL_POOL: &[u8] = b"!#$%&()*+,-./:;<=>?@[]^{|}~";

/// Per-run key bytes for the repeating-key transforms.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    bytes: Vec<u8>,
}

impl EncryptionKey {
    /// Draws a fresh key of `min..=max` non-zero bytes.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> Self {
        let len = rng.random_range(min.max(1)..=max.max(min.max(1)));
        let bytes = (0..len).map(|_| rng.random_range(1..=255u8)).collect();
        Self { bytes }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::EmptyKey);
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// XOR `data` against the repeating key. Self-inverse.
    pub fn xor(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.bytes.iter().cycle())
            .map(|(d, k)| d ^ k)
            .collect()
    }

    /// Adds the repeating key to `data`, modulo 256.
    pub fn add(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.bytes.iter().cycle())
            .map(|(d, k)| d.wrapping_add(*k))
            .collect()
    }

    /// Inverse of [`EncryptionKey::add`].
    pub fn sub(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.bytes.iter().cycle())
            .map(|(d, k)| d.wrapping_sub(*k))
            .collect()
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A 16-symbol alphabet; each byte is framed as two symbols (high nibble first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolAlphabet {
    symbols: [u8; 16],
}

impl SymbolAlphabet {
    /// Picks 16 distinct symbols from [`SYMBOL_POOL`] in random order.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut pool = SYMBOL_POOL.to_vec();
        pool.shuffle(rng);
        let mut symbols = [0u8; 16];
        symbols.copy_from_slice(&pool[..16]);
        Self { symbols }
    }

    /// The alphabet as a string, in nibble order.
    pub fn as_str(&self) -> &str {
        // SYMBOL_POOL is ASCII
        std::str::from_utf8(&self.symbols).unwrap_or_default()
    }

    pub fn encode(&self, data: &[u8]) -> String {
        let mut out = String::with_capacity(data.len() * 2);
        for b in data {
            out.push(self.symbols[(b >> 4) as usize] as char);
            out.push(self.symbols[(b & 0x0f) as usize] as char);
        }
        out
    }

    pub fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let bytes = text.as_bytes();
        if bytes.len() % 2 != 0 {
            return Err(Error::OddPayload(bytes.len()));
        }
        bytes
            .chunks(2)
            .map(|pair| Ok((self.nibble(pair[0])? << 4) | self.nibble(pair[1])?))
            .collect()
    }

    fn nibble(&self, symbol: u8) -> Result<u8> {
        self.symbols
            .iter()
            .position(|&s| s == symbol)
            .map(|p| p as u8)
            .ok_or(Error::UnknownSymbol(symbol as char))
    }
}

/// Standard base64 framing.
pub fn base64_encode(data: &[u8]) -> String {
    base64::prelude::BASE64_STANDARD.encode(data)
}

pub fn base64_decode(text: &str) -> Result<Vec<u8>> {
    Ok(base64::prelude::BASE64_STANDARD.decode(text)?)
}
