//! Reading and writing streams of packed values.
//!
//! A packed value carries no outer header: its own tags and length prefixes
//! say where it ends. The readers here buffer incoming bytes and retry the
//! decode whenever it reports truncated input, so callers always get complete
//! values. Malformed input is surfaced immediately since no amount of extra
//! bytes can fix it.
//!
//! Checksums, escaping, and request/response correlation belong to the
//! transport that carries these bytes and are out of scope here.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_value, encode_value, StreamConfig, DEFAULT_MAX_MESSAGE_SIZE};
#[cfg(feature = "async")]
pub use codec::ValueCodec;
pub use error::{Result, StreamError};
pub use reader::ValueReader;
pub use writer::ValueWriter;
