//! Core results and error types

use thiserror::Error;

/// Core error type encompassing all core module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The source program could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Human readable message from the grammar library, including location.
        message: String,
    },

    /// Failed to decode hex string.
    #[error("hex decode failed: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Failed to decode base64 string.
    #[error("base64 decode failed: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Invalid hexadecimal in seed.
    #[error("invalid hexadecimal in seed")]
    InvalidSeedHex,

    /// Invalid seed length.
    #[error("invalid seed length: expected 64 hex chars, got {0}")]
    InvalidSeedLength(usize),

    /// A splice span does not fit the buffer or does not fall on char boundaries.
    #[error("invalid span {start}..{end} for buffer of {len} bytes")]
    InvalidSpan {
        /// Span start offset.
        start: usize,
        /// Span end offset.
        end: usize,
        /// Buffer length at the time of the splice.
        len: usize,
    },

    /// Splices were not supplied in strictly descending, non-overlapping order.
    #[error("splice at offset {0} is out of descending order")]
    SpliceOrder(usize),

    /// A payload contains a symbol outside its alphabet.
    #[error("symbol {0:?} is not part of the alphabet")]
    UnknownSymbol(char),

    /// A framed payload has an odd number of digits.
    #[error("framed payload has odd length {0}")]
    OddPayload(usize),

    /// An encryption key was empty.
    #[error("encryption key must not be empty")]
    EmptyKey,
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
