use std::fmt;

/// Which length-prefixed structure exceeded its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthKind {
    Text,
    Binary,
    List,
    Map,
}

impl fmt::Display for LengthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LengthKind::Text => "text",
            LengthKind::Binary => "binary",
            LengthKind::List => "list",
            LengthKind::Map => "map",
        })
    }
}

/// Errors that can occur while packing a value tree.
///
/// All of these are caller-input errors. Packing never emits a partial
/// encoding: on error nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// A map holds the same key more than once.
    #[error("duplicate map key {key:?}")]
    DuplicateKey { key: String },

    /// A text/binary payload or a container count does not fit the length prefix.
    #[error("{kind} length {len} exceeds maximum {max}")]
    LengthTooLarge {
        kind: LengthKind,
        len: usize,
        max: usize,
    },

    /// A native integer cannot be represented as a 64-bit signed integer.
    #[error("integer {value} out of range for a 64-bit signed integer")]
    IntegerOutOfRange { value: i128 },

    /// Containers are nested deeper than the configured limit.
    #[error("container nesting exceeds maximum depth {max}")]
    DepthLimitExceeded { max: usize },

    /// The destination buffer cannot hold the whole encoding.
    #[error("destination buffer too small ({needed} bytes needed, {available} available)")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Why a buffer was rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// The tag byte does not name any known type.
    UnknownTag(u8),
    /// A boolean payload was neither `0x00` nor `0x01`.
    InvalidBoolean(u8),
    /// A declared length or count exceeds the configured maximum.
    LengthTooLarge {
        kind: LengthKind,
        len: usize,
        max: usize,
    },
    /// Text payload bytes are not valid UTF-8.
    InvalidUtf8,
    /// A map key was encoded with a non-text tag.
    NonTextKey(u8),
    /// A map repeats a key.
    DuplicateKey(String),
    /// Containers are nested deeper than the configured limit.
    DepthLimitExceeded { max: usize },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::UnknownTag(tag) => write!(f, "unknown type tag {tag:#04x}"),
            MalformedReason::InvalidBoolean(byte) => write!(f, "invalid boolean byte {byte:#04x}"),
            MalformedReason::LengthTooLarge { kind, len, max } => {
                write!(f, "{kind} length {len} exceeds maximum {max}")
            }
            MalformedReason::InvalidUtf8 => f.write_str("invalid utf-8 in text"),
            MalformedReason::NonTextKey(tag) => write!(f, "map key has non-text tag {tag:#04x}"),
            MalformedReason::DuplicateKey(key) => write!(f, "duplicate map key {key:?}"),
            MalformedReason::DepthLimitExceeded { max } => {
                write!(f, "container nesting exceeds maximum depth {max}")
            }
        }
    }
}

/// Errors that can occur while unpacking a buffer.
///
/// [`DecodingError::Truncated`] means the buffer ends inside the value: on a
/// streaming transport, read more bytes and retry with the longer buffer.
/// [`DecodingError::Malformed`] means the bytes can never decode; the stream
/// is desynchronized and waiting will not help.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    /// The buffer ended before the declared structure was complete.
    #[error("truncated input at offset {offset} (need at least {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    /// The buffer content violates the format.
    #[error("malformed input at offset {offset}: {reason}")]
    Malformed {
        offset: usize,
        reason: MalformedReason,
    },
}

impl DecodingError {
    /// True when more input could complete the value.
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodingError::Truncated { .. })
    }

    /// True when the input can never decode.
    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodingError::Malformed { .. })
    }

    /// Minimum number of extra bytes required, for truncated input.
    pub fn needed(&self) -> Option<usize> {
        match self {
            DecodingError::Truncated { needed, .. } => Some(*needed),
            DecodingError::Malformed { .. } => None,
        }
    }

    /// Byte offset into the input where the problem was detected.
    pub fn offset(&self) -> usize {
        match self {
            DecodingError::Truncated { offset, .. } | DecodingError::Malformed { offset, .. } => {
                *offset
            }
        }
    }

    /// The malformed reason, if any.
    pub fn reason(&self) -> Option<&MalformedReason> {
        match self {
            DecodingError::Malformed { reason, .. } => Some(reason),
            DecodingError::Truncated { .. } => None,
        }
    }
}
