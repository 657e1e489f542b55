//! Error types for the BSER codec.

/// Errors that can occur while encoding, decoding, or framing BSER data.
///
/// A "need more data" outcome is never an error: the incremental entry
/// points express it as `Ok(None)`. Errors reported from inside a PDU body
/// whose full length was already verified available are fatal for that
/// message only; the caller may `reset()` the accumulator and continue
/// with the next PDU.
#[derive(Debug, thiserror::Error)]
pub enum BserError {
    #[error("bad PDU magic: expected 00 01, got {0:02X} {1:02X}")]
    BadMagic(u8, u8),

    #[error("truncated input: need {needed} bytes but only {avail} remaining")]
    Truncated { needed: usize, avail: usize },

    #[error("decoded value spans {actual} bytes but PDU header declared {declared}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unknown BSER tag: 0x{0:02X}")]
    UnknownTag(u8),

    #[error("accumulator underflow: requested {requested} bytes but only {avail} readable")]
    Underflow { requested: usize, avail: usize },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid UTF-8 in map key: {0}")]
    InvalidKey(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
