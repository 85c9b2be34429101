use std::collections::HashSet;

use crate::config::CodecConfig;
use crate::error::{DecodingError, LengthKind, MalformedReason};
use crate::tag::{self, LENGTH_SIZE, TAG_SIZE};
use crate::value::{Map, Value};

/// Smallest possible encoded map entry: an empty text key and a none value.
const MIN_ENTRY_SIZE: usize = TAG_SIZE + LENGTH_SIZE + TAG_SIZE;

/// Unpack one value from the front of `bytes` with the default configuration.
///
/// Returns the value and the unconsumed remainder, which is a subslice of
/// `bytes` and can be passed straight back into `unpack` to decode the next
/// value of a concatenated stream.
pub fn unpack(bytes: &[u8]) -> Result<(Value, &[u8]), DecodingError> {
    unpack_with(bytes, &CodecConfig::default())
}

/// [`unpack`] with explicit limits.
pub fn unpack_with<'a>(
    bytes: &'a [u8],
    config: &CodecConfig,
) -> Result<(Value, &'a [u8]), DecodingError> {
    let mut decoder = Decoder {
        input: bytes,
        pos: 0,
        config: *config,
    };
    let value = decoder.value(0)?;
    Ok((value, &bytes[decoder.pos..]))
}

/// Iterate over every value in a buffer of concatenated packed values.
pub fn iter_values(bytes: &[u8]) -> Values<'_> {
    Values::with_config(bytes, CodecConfig::default())
}

/// Iterator returned by [`iter_values`].
///
/// Yields values until the buffer is exhausted. After the first error it
/// yields nothing more; error offsets are relative to the original buffer.
#[derive(Debug, Clone)]
pub struct Values<'a> {
    rest: &'a [u8],
    consumed: usize,
    config: CodecConfig,
    failed: bool,
}

impl<'a> Values<'a> {
    pub fn with_config(bytes: &'a [u8], config: CodecConfig) -> Self {
        Self {
            rest: bytes,
            consumed: 0,
            config,
            failed: false,
        }
    }

    /// Bytes not yet decoded.
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl Iterator for Values<'_> {
    type Item = Result<Value, DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rest.is_empty() {
            return None;
        }
        match unpack_with(self.rest, &self.config) {
            Ok((value, rest)) => {
                self.consumed += self.rest.len() - rest.len();
                self.rest = rest;
                Some(Ok(value))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(shift(err, self.consumed)))
            }
        }
    }
}

fn shift(err: DecodingError, by: usize) -> DecodingError {
    match err {
        DecodingError::Truncated { offset, needed } => DecodingError::Truncated {
            offset: offset + by,
            needed,
        },
        DecodingError::Malformed { offset, reason } => DecodingError::Malformed {
            offset: offset + by,
            reason,
        },
    }
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    config: CodecConfig,
}

impl<'a> Decoder<'a> {
    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodingError> {
        let available = self.remaining();
        if n > available {
            return Err(DecodingError::Truncated {
                offset: self.pos,
                needed: n - available,
            });
        }
        let bytes = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodingError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodingError> {
        Ok(self.take(1)?[0])
    }

    fn length(&mut self, kind: LengthKind) -> Result<usize, DecodingError> {
        let offset = self.pos;
        let len = u32::from_le_bytes(self.array()?) as usize;
        let max = self.config.max_length;
        if len > max {
            return Err(malformed(
                offset,
                MalformedReason::LengthTooLarge { kind, len, max },
            ));
        }
        Ok(len)
    }

    fn text(&mut self) -> Result<&'a str, DecodingError> {
        let len = self.length(LengthKind::Text)?;
        let offset = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).map_err(|_| malformed(offset, MalformedReason::InvalidUtf8))
    }

    fn enter_container(&self, depth: usize, offset: usize) -> Result<(), DecodingError> {
        if depth >= self.config.max_depth {
            return Err(malformed(
                offset,
                MalformedReason::DepthLimitExceeded {
                    max: self.config.max_depth,
                },
            ));
        }
        Ok(())
    }

    fn value(&mut self, depth: usize) -> Result<Value, DecodingError> {
        let start = self.pos;
        let value = match self.u8()? {
            tag::NONE => Value::None,
            tag::BOOLEAN => {
                let offset = self.pos;
                match self.u8()? {
                    0 => Value::Bool(false),
                    1 => Value::Bool(true),
                    other => return Err(malformed(offset, MalformedReason::InvalidBoolean(other))),
                }
            }
            tag::INTEGER_32 => Value::Integer(i64::from(i32::from_le_bytes(self.array()?))),
            tag::INTEGER_64 => Value::Integer(i64::from_le_bytes(self.array()?)),
            tag::FLOAT_32 => Value::Float(f64::from(f32::from_le_bytes(self.array()?))),
            tag::FLOAT_64 => Value::Float(f64::from_le_bytes(self.array()?)),
            tag::TEXT => Value::Text(self.text()?.to_owned()),
            tag::BINARY => {
                let len = self.length(LengthKind::Binary)?;
                Value::Binary(self.take(len)?.to_vec())
            }
            tag::LIST => {
                self.enter_container(depth, start)?;
                let count = self.length(LengthKind::List)?;
                // Each element takes at least one byte; never trust the count for allocation.
                let mut items = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    items.push(self.value(depth + 1)?);
                }
                Value::List(items)
            }
            tag::MAP => {
                self.enter_container(depth, start)?;
                let count = self.length(LengthKind::Map)?;
                let capacity = count.min(self.remaining() / MIN_ENTRY_SIZE);
                let mut map = Map::with_capacity(capacity);
                let mut seen = HashSet::with_capacity(capacity);
                for _ in 0..count {
                    let key_offset = self.pos;
                    let key_tag = self.u8()?;
                    if key_tag != tag::TEXT {
                        return Err(malformed(key_offset, MalformedReason::NonTextKey(key_tag)));
                    }
                    let key = self.text()?;
                    if !seen.insert(key) {
                        return Err(malformed(
                            key_offset,
                            MalformedReason::DuplicateKey(key.to_owned()),
                        ));
                    }
                    let item = self.value(depth + 1)?;
                    map.push(key, item);
                }
                Value::Map(map)
            }
            other => return Err(malformed(start, MalformedReason::UnknownTag(other))),
        };
        Ok(value)
    }
}

fn malformed(offset: usize, reason: MalformedReason) -> DecodingError {
    DecodingError::Malformed { offset, reason }
}
