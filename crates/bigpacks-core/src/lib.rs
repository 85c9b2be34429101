//! Self-describing binary packing for dynamically-typed value trees.
//!
//! This is the codec layer of bigpacks. A [`Value`] tree (booleans, integers,
//! floats, text, binary, lists, and insertion-ordered maps) is packed into a
//! compact byte sequence where every node carries:
//! - A 1-byte type tag (family in the high nibble, width in the low nibble)
//! - A type-specific payload (little-endian numbers, `u32`-prefixed blocks)
//!
//! [`unpack`] decodes exactly one value from the front of a buffer and hands
//! back the untouched remainder, so concatenated values can be decoded one
//! after another straight out of a receive buffer. [`Scanner`] finds where a
//! value ends in a buffer that is still filling, so a stream reader only
//! decodes once the whole value has arrived.

pub mod config;
pub mod error;
pub mod pack;
pub mod scan;
pub mod tag;
pub mod unpack;
pub mod value;

#[cfg(feature = "serde")]
mod serialize;

pub use config::{CodecConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LENGTH};
pub use error::{DecodingError, EncodingError, LengthKind, MalformedReason};
pub use pack::{encoded_len, encoded_len_with, pack, pack_into, pack_into_with, pack_with};
pub use scan::Scanner;
pub use unpack::{iter_values, unpack, unpack_with, Values};
pub use value::{Map, Value};
