//! Compact self-describing binary packing for key-value data.
//!
//! bigpacks turns a tree of booleans, integers, floats, text, binary blobs,
//! lists, and insertion-ordered maps into a compact byte sequence and back.
//! [`unpack`] returns the unconsumed remainder of its input, so packed values
//! can be concatenated on a link and decoded one after another.
//!
//! ```
//! use bigpacks::{pack, unpack, Map, Value};
//!
//! let mut data = Map::new();
//! data.insert("foo", 123);
//! data.insert("bar", 456.789);
//! data.insert("baz", true);
//! data.insert("qux", "hello!");
//!
//! let packed = pack(&Value::Map(data.clone())).unwrap();
//! let (unpacked, remainder) = unpack(&packed).unwrap();
//!
//! assert_eq!(unpacked, Value::Map(data));
//! assert!(remainder.is_empty());
//! ```
//!
//! # Crate Structure
//!
//! - The crate root re-exports the codec ([`pack`], [`unpack`], [`Value`], ...)
//! - [`stream`] — Blocking and async readers/writers (behind `stream` feature)

pub use bigpacks_core::*;

/// Re-export stream types (requires `stream` feature).
#[cfg(feature = "stream")]
pub mod stream {
    pub use bigpacks_stream::*;
}
