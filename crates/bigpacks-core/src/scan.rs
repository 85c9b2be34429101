use crate::config::CodecConfig;
use crate::error::{DecodingError, LengthKind, MalformedReason};
use crate::tag::{self, LENGTH_SIZE, TAG_SIZE};

/// Finds where the first packed value in a growing buffer ends, without
/// building it.
///
/// A receive buffer only ever grows at the back while a value is arriving.
/// The scanner remembers how far it has walked and how many items are still
/// owed to each open container, so every call picks up where the last one
/// stopped instead of walking the value again from the front. When [`scan`]
/// returns a length, decode that prefix with [`unpack_with`] and [`reset`] before
/// scanning the next value.
///
/// Only framing is checked: tags, length limits, nesting depth, and key
/// tags. UTF-8, boolean payloads, and duplicate keys are left to the decoder.
///
/// [`scan`]: Scanner::scan
/// [`reset`]: Scanner::reset
/// [`unpack_with`]: crate::unpack_with
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    pos: usize,
    open: Vec<Container>,
}

#[derive(Debug, Clone, Copy)]
struct Container {
    // Items still expected. A map entry counts twice: key, then value.
    remaining: usize,
    map: bool,
}

impl Container {
    fn expects_key(&self) -> bool {
        self.map && self.remaining % 2 == 0
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the current value walked so far.
    pub fn scanned(&self) -> usize {
        self.pos
    }

    /// Start over at the front of the buffer. Keeps the container stack's capacity.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.open.clear();
    }

    /// Resume scanning `bytes`, which must begin with everything passed since
    /// the last reset.
    ///
    /// Returns the encoded length of the first value once all of it is
    /// present. Until then returns [`DecodingError::Truncated`]; framing that
    /// can never decode is [`DecodingError::Malformed`] with the same offset
    /// [`unpack_with`](crate::unpack_with) would report.
    pub fn scan(&mut self, bytes: &[u8], config: &CodecConfig) -> Result<usize, DecodingError> {
        loop {
            let start = self.pos;
            require(bytes, start, TAG_SIZE)?;
            let tag_byte = bytes[start];
            if self.open.last().is_some_and(Container::expects_key) && tag_byte != tag::TEXT {
                return Err(malformed(start, MalformedReason::NonTextKey(tag_byte)));
            }

            let body = start + TAG_SIZE;
            let (end, opened) = match tag_byte {
                tag::NONE => (body, None),
                tag::BOOLEAN => (body + 1, None),
                tag::INTEGER_32 | tag::FLOAT_32 => (body + 4, None),
                tag::INTEGER_64 | tag::FLOAT_64 => (body + 8, None),
                tag::TEXT | tag::BINARY => {
                    let kind = if tag_byte == tag::TEXT {
                        LengthKind::Text
                    } else {
                        LengthKind::Binary
                    };
                    let len = length(bytes, body, kind, config)?;
                    (body + LENGTH_SIZE + len, None)
                }
                tag::LIST | tag::MAP => {
                    if self.open.len() >= config.max_depth {
                        return Err(malformed(
                            start,
                            MalformedReason::DepthLimitExceeded {
                                max: config.max_depth,
                            },
                        ));
                    }
                    let map = tag_byte == tag::MAP;
                    let kind = if map { LengthKind::Map } else { LengthKind::List };
                    let count = length(bytes, body, kind, config)?;
                    let remaining = if map { count.saturating_mul(2) } else { count };
                    (body + LENGTH_SIZE, Some(Container { remaining, map }))
                }
                other => return Err(malformed(start, MalformedReason::UnknownTag(other))),
            };
            require(bytes, body, end - body)?;
            self.pos = end;

            if let Some(parent) = self.open.last_mut() {
                parent.remaining -= 1;
            }
            if let Some(container) = opened {
                self.open.push(container);
            }
            while self.open.last().is_some_and(|c| c.remaining == 0) {
                self.open.pop();
            }
            if self.open.is_empty() {
                return Ok(self.pos);
            }
        }
    }
}

fn require(bytes: &[u8], offset: usize, n: usize) -> Result<(), DecodingError> {
    let available = bytes.len().saturating_sub(offset);
    if n > available {
        return Err(DecodingError::Truncated {
            offset,
            needed: n - available,
        });
    }
    Ok(())
}

fn length(
    bytes: &[u8],
    offset: usize,
    kind: LengthKind,
    config: &CodecConfig,
) -> Result<usize, DecodingError> {
    require(bytes, offset, LENGTH_SIZE)?;
    let mut raw = [0u8; LENGTH_SIZE];
    raw.copy_from_slice(&bytes[offset..offset + LENGTH_SIZE]);
    let len = u32::from_le_bytes(raw) as usize;
    let max = config.max_length;
    if len > max {
        return Err(malformed(offset, MalformedReason::LengthTooLarge { kind, len, max }));
    }
    Ok(len)
}

fn malformed(offset: usize, reason: MalformedReason) -> DecodingError {
    DecodingError::Malformed { offset, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack;
    use crate::unpack::{unpack, unpack_with};
    use crate::value::{Map, Value};

    fn sample() -> Value {
        let mut inner = Map::new();
        inner.insert("empty", Value::List(Vec::new()));
        inner.insert("bin", Value::binary(vec![0x00, 0xFF]));
        let mut map = Map::new();
        map.insert("flag", true);
        map.insert("small", 7);
        map.insert("large", i64::MAX);
        map.insert("ratio", 0.25);
        map.insert("name", "sensor");
        map.insert("none", Value::None);
        map.insert("inner", inner);
        map.insert("list", vec![Value::from(1), Value::Map(Map::new()), Value::from("x")]);
        Value::Map(map)
    }

    fn scan(bytes: &[u8]) -> Result<usize, DecodingError> {
        Scanner::new().scan(bytes, &CodecConfig::default())
    }

    #[test]
    fn finds_end_of_value() {
        let mut bytes = pack(&sample()).unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(&[0xFF, 0xFF]);
        assert_eq!(scan(&bytes), Ok(len));
    }

    #[test]
    fn scalars_and_empty_containers() {
        assert_eq!(scan(&[tag::NONE, 0xEE]), Ok(1));
        assert_eq!(scan(&[tag::BOOLEAN, 1]), Ok(2));
        assert_eq!(scan(&[tag::LIST, 0, 0, 0, 0]), Ok(5));
        assert_eq!(scan(&[tag::MAP, 0, 0, 0, 0, tag::NONE]), Ok(5));

        let mut single = vec![tag::FLOAT_32];
        single.extend_from_slice(&1.5f32.to_le_bytes());
        assert_eq!(scan(&single), Ok(5));
    }

    #[test]
    fn resumes_as_bytes_arrive() {
        let bytes = pack(&sample()).unwrap();
        let config = CodecConfig::default();
        let mut scanner = Scanner::new();

        let mut last = 0;
        for end in 0..bytes.len() {
            let err = scanner.scan(&bytes[..end], &config).unwrap_err();
            assert!(err.is_truncated(), "prefix of {end} bytes gave {err:?}");
            assert!(scanner.scanned() >= last);
            assert!(scanner.scanned() <= end);
            last = scanner.scanned();
        }
        assert_eq!(scanner.scan(&bytes, &config), Ok(bytes.len()));
    }

    #[test]
    fn incomplete_block_reports_shortfall() {
        let bytes = pack(&Value::from("hello")).unwrap();
        assert_eq!(
            scan(&bytes[..7]),
            Err(DecodingError::Truncated {
                offset: 1,
                needed: 3
            })
        );
        assert_eq!(
            scan(&bytes[..3]),
            Err(DecodingError::Truncated {
                offset: 1,
                needed: 2
            })
        );
    }

    #[test]
    fn reset_moves_on_to_next_value() {
        let mut bytes = pack(&sample()).unwrap();
        let first = bytes.len();
        bytes.extend(pack(&Value::from("next")).unwrap());

        let config = CodecConfig::default();
        let mut scanner = Scanner::new();
        assert_eq!(scanner.scan(&bytes, &config), Ok(first));

        scanner.reset();
        assert_eq!(scanner.scanned(), 0);
        assert_eq!(scanner.scan(&bytes[first..], &config), Ok(bytes.len() - first));
    }

    #[test]
    fn long_list_in_small_steps() {
        let value = Value::List(vec![Value::None; 100_000]);
        let bytes = pack(&value).unwrap();
        let config = CodecConfig::default();
        let mut scanner = Scanner::new();

        let mut end = 0;
        let len = loop {
            end = (end + 7).min(bytes.len());
            match scanner.scan(&bytes[..end], &config) {
                Ok(len) => break len,
                Err(err) => assert!(err.is_truncated()),
            }
        };
        assert_eq!(len, bytes.len());
        assert_eq!(unpack(&bytes[..len]).unwrap().0, value);
    }

    #[test]
    fn framing_errors_match_decoder() {
        let depth = CodecConfig {
            max_depth: 2,
            ..CodecConfig::default()
        };
        let short = CodecConfig {
            max_length: 16,
            ..CodecConfig::default()
        };
        let cases: [(&[u8], CodecConfig); 4] = [
            (&[0xEE, 0x00], CodecConfig::default()),
            (
                &[tag::MAP, 1, 0, 0, 0, tag::INTEGER_32, 1, 0, 0, 0, tag::NONE],
                CodecConfig::default(),
            ),
            (
                &[tag::LIST, 1, 0, 0, 0, tag::LIST, 1, 0, 0, 0, tag::LIST, 0, 0, 0, 0],
                depth,
            ),
            (&[tag::BINARY, 17, 0, 0, 0], short),
        ];

        for (bytes, config) in cases {
            let expected = unpack_with(bytes, &config).unwrap_err();
            assert!(expected.is_malformed());
            assert_eq!(Scanner::new().scan(bytes, &config), Err(expected));
        }
    }

    #[test]
    fn content_errors_are_left_to_decoder() {
        let bytes = [tag::TEXT, 2, 0, 0, 0, 0xC3, 0x28];
        assert_eq!(scan(&bytes), Ok(bytes.len()));
        assert!(unpack(&bytes).unwrap_err().is_malformed());
    }

    #[test]
    fn adversarial_nesting_stops_at_limit() {
        let mut bytes = Vec::new();
        for _ in 0..10_000 {
            bytes.extend_from_slice(&[tag::LIST, 1, 0, 0, 0]);
        }
        let err = scan(&bytes).unwrap_err();
        assert_eq!(
            err.reason(),
            Some(&MalformedReason::DepthLimitExceeded {
                max: crate::config::DEFAULT_MAX_DEPTH
            })
        );
    }
}
