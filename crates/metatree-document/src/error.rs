//! Error types for document decoding and conversion.

use thiserror::Error;

/// Failure raised while decoding bencoded input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BencodeError {
    /// Input ended in the middle of a value.
    #[error("unexpected end of bencode input")]
    UnexpectedEof {
        /// Byte offset where more input was expected.
        offset: usize,
    },
    /// A byte that cannot start or continue the current value.
    #[error("invalid bencode byte")]
    InvalidByte {
        /// Byte offset of the offending byte.
        offset: usize,
        /// The offending byte.
        byte: u8,
    },
    /// Integer payload was empty, non-canonical, or out of range.
    #[error("invalid bencode integer")]
    InvalidInteger {
        /// Byte offset of the integer marker.
        offset: usize,
    },
    /// String length prefix does not fit the remaining input.
    #[error("bencode string length overflow")]
    LengthOverflow {
        /// Byte offset of the length prefix.
        offset: usize,
    },
    /// Dictionary key is not valid UTF-8.
    #[error("bencode dictionary key is not UTF-8")]
    KeyNotUtf8 {
        /// Byte offset of the key.
        offset: usize,
    },
    /// Dictionary repeats a key.
    #[error("duplicate bencode dictionary key")]
    DuplicateKey {
        /// Byte offset of the repeated key.
        offset: usize,
        /// The repeated key.
        key: String,
    },
    /// Nesting exceeded the decoder limit.
    #[error("bencode nesting too deep")]
    DepthExceeded {
        /// Byte offset of the container that crossed the limit.
        offset: usize,
        /// Configured nesting limit.
        limit: usize,
    },
    /// Bytes remain after the top-level value.
    #[error("trailing data after bencode value")]
    TrailingData {
        /// Byte offset of the first trailing byte.
        offset: usize,
    },
}

impl BencodeError {
    /// Byte offset associated with the failure.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::UnexpectedEof { offset }
            | Self::InvalidByte { offset, .. }
            | Self::InvalidInteger { offset }
            | Self::LengthOverflow { offset }
            | Self::KeyNotUtf8 { offset }
            | Self::DuplicateKey { offset, .. }
            | Self::DepthExceeded { offset, .. }
            | Self::TrailingData { offset } => *offset,
        }
    }
}

/// Convenience alias for codec results.
pub type BencodeResult<T> = Result<T, BencodeError>;

/// A foreign value that has no document representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported document shape")]
pub struct ShapeError {
    /// Slash-separated path of the offending value (`""` for the top level).
    pub path: String,
    /// Name of the offending shape (`null`, `boolean`, `float`, ...).
    pub found: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_constant_and_offsets_exposed() {
        let err = BencodeError::DuplicateKey {
            offset: 17,
            key: "name".to_string(),
        };
        assert_eq!(err.offset(), 17);
        assert_eq!(err.to_string(), "duplicate bencode dictionary key");

        let shape = ShapeError {
            path: "/info/private".to_string(),
            found: "boolean",
        };
        assert_eq!(shape.to_string(), "unsupported document shape");
    }
}
