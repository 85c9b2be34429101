use bytes::BufMut;

use crate::config::CodecConfig;
use crate::error::{EncodingError, LengthKind};
use crate::tag::{self, LENGTH_SIZE, TAG_SIZE};
use crate::value::Value;

/// Pack a value tree with the default configuration.
///
/// Wire format, per node:
/// ```text
/// ┌──────────┬──────────────────────────────────────────────┐
/// │ Tag (1B) │ Payload                                      │
/// ├──────────┼──────────────────────────────────────────────┤
/// │ 0x10     │ 0x00 / 0x01                                  │
/// │ 0x20     │ (none)                                       │
/// │ 0x41     │ i32 (4B LE)                                  │
/// │ 0x42     │ i64 (8B LE)                                  │
/// │ 0x52     │ f64 (8B LE)                                  │
/// │ 0x80     │ count (4B LE), then `count` values           │
/// │ 0x90     │ count (4B LE), then `count` text/value pairs │
/// │ 0xC0     │ length (4B LE), then UTF-8 bytes             │
/// │ 0xD0     │ length (4B LE), then raw bytes               │
/// └──────────┴──────────────────────────────────────────────┘
/// ```
///
/// Integers take the 4-byte form whenever they fit in an `i32`.
pub fn pack(value: &Value) -> Result<Vec<u8>, EncodingError> {
    pack_with(value, &CodecConfig::default())
}

/// Pack a value tree with explicit limits.
pub fn pack_with(value: &Value, config: &CodecConfig) -> Result<Vec<u8>, EncodingError> {
    let len = encoded_len_with(value, config)?;
    let mut out = Vec::with_capacity(len);
    write_value(value, &mut out);
    debug_assert_eq!(out.len(), len);
    Ok(out)
}

/// Append the encoding of `value` to `dst`, returning the number of bytes written.
///
/// The tree is validated before anything is written, so on error `dst` is
/// left untouched.
pub fn pack_into<B: BufMut>(value: &Value, dst: &mut B) -> Result<usize, EncodingError> {
    pack_into_with(value, dst, &CodecConfig::default())
}

/// [`pack_into`] with explicit limits.
pub fn pack_into_with<B: BufMut>(
    value: &Value,
    dst: &mut B,
    config: &CodecConfig,
) -> Result<usize, EncodingError> {
    let len = encoded_len_with(value, config)?;
    if dst.remaining_mut() < len {
        return Err(EncodingError::BufferTooSmall {
            needed: len,
            available: dst.remaining_mut(),
        });
    }
    write_value(value, dst);
    Ok(len)
}

/// Size in bytes of the encoding of `value`, validating it exactly as `pack` would.
pub fn encoded_len(value: &Value) -> Result<usize, EncodingError> {
    encoded_len_with(value, &CodecConfig::default())
}

/// [`encoded_len`] with explicit limits.
pub fn encoded_len_with(value: &Value, config: &CodecConfig) -> Result<usize, EncodingError> {
    measure(value, config, 0)
}

fn measure(value: &Value, config: &CodecConfig, depth: usize) -> Result<usize, EncodingError> {
    let len = match value {
        Value::None => TAG_SIZE,
        Value::Bool(_) => TAG_SIZE + 1,
        Value::Integer(i) => TAG_SIZE + integer_width(*i),
        Value::Float(_) => TAG_SIZE + 8,
        Value::Text(s) => block_len(LengthKind::Text, s.len(), config)?,
        Value::Binary(b) => block_len(LengthKind::Binary, b.len(), config)?,
        Value::List(items) => {
            enter_container(depth, config)?;
            check_length(LengthKind::List, items.len(), config)?;
            let mut total = TAG_SIZE + LENGTH_SIZE;
            for item in items {
                total += measure(item, config, depth + 1)?;
            }
            total
        }
        Value::Map(map) => {
            enter_container(depth, config)?;
            check_length(LengthKind::Map, map.len(), config)?;
            if let Some(key) = map.first_duplicate() {
                return Err(EncodingError::DuplicateKey {
                    key: key.to_owned(),
                });
            }
            let mut total = TAG_SIZE + LENGTH_SIZE;
            for (key, item) in map.iter() {
                total += block_len(LengthKind::Text, key.len(), config)?;
                total += measure(item, config, depth + 1)?;
            }
            total
        }
    };
    Ok(len)
}

fn integer_width(value: i64) -> usize {
    if i32::try_from(value).is_ok() {
        4
    } else {
        8
    }
}

fn max_length(config: &CodecConfig) -> usize {
    config.max_length.min(u32::MAX as usize)
}

fn check_length(kind: LengthKind, len: usize, config: &CodecConfig) -> Result<(), EncodingError> {
    let max = max_length(config);
    if len > max {
        return Err(EncodingError::LengthTooLarge { kind, len, max });
    }
    Ok(())
}

fn block_len(kind: LengthKind, len: usize, config: &CodecConfig) -> Result<usize, EncodingError> {
    check_length(kind, len, config)?;
    Ok(TAG_SIZE + LENGTH_SIZE + len)
}

fn enter_container(depth: usize, config: &CodecConfig) -> Result<(), EncodingError> {
    if depth >= config.max_depth {
        return Err(EncodingError::DepthLimitExceeded {
            max: config.max_depth,
        });
    }
    Ok(())
}

// Only called on trees that passed `measure`, so every length fits a u32.
fn write_value<B: BufMut>(value: &Value, dst: &mut B) {
    match value {
        Value::None => dst.put_u8(tag::NONE),
        Value::Bool(b) => {
            dst.put_u8(tag::BOOLEAN);
            dst.put_u8(u8::from(*b));
        }
        Value::Integer(i) => match i32::try_from(*i) {
            Ok(small) => {
                dst.put_u8(tag::INTEGER_32);
                dst.put_i32_le(small);
            }
            Err(_) => {
                dst.put_u8(tag::INTEGER_64);
                dst.put_i64_le(*i);
            }
        },
        Value::Float(f) => {
            dst.put_u8(tag::FLOAT_64);
            dst.put_f64_le(*f);
        }
        Value::Text(s) => write_block(tag::TEXT, s.as_bytes(), dst),
        Value::Binary(b) => write_block(tag::BINARY, b, dst),
        Value::List(items) => {
            dst.put_u8(tag::LIST);
            dst.put_u32_le(items.len() as u32);
            for item in items {
                write_value(item, dst);
            }
        }
        Value::Map(map) => {
            dst.put_u8(tag::MAP);
            dst.put_u32_le(map.len() as u32);
            for (key, item) in map.iter() {
                write_block(tag::TEXT, key.as_bytes(), dst);
                write_value(item, dst);
            }
        }
    }
}

fn write_block<B: BufMut>(tag: u8, bytes: &[u8], dst: &mut B) {
    dst.put_u8(tag);
    dst.put_u32_le(bytes.len() as u32);
    dst.put_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Map;

    #[test]
    fn scalars() {
        assert_eq!(pack(&Value::None).unwrap(), [0x20]);
        assert_eq!(pack(&Value::Bool(true)).unwrap(), [0x10, 0x01]);
        assert_eq!(pack(&Value::Bool(false)).unwrap(), [0x10, 0x00]);
        assert_eq!(
            pack(&Value::Integer(-2)).unwrap(),
            [0x41, 0xFE, 0xFF, 0xFF, 0xFF]
        );

        let mut expected = vec![0x52];
        expected.extend_from_slice(&456.789f64.to_le_bytes());
        assert_eq!(pack(&Value::Float(456.789)).unwrap(), expected);
    }

    #[test]
    fn integers_promote_to_eight_bytes() {
        assert_eq!(pack(&Value::Integer(i32::MAX as i64)).unwrap().len(), 5);
        assert_eq!(pack(&Value::Integer(i32::MIN as i64)).unwrap().len(), 5);

        let big = pack(&Value::Integer(i32::MAX as i64 + 1)).unwrap();
        assert_eq!(big[0], tag::INTEGER_64);
        assert_eq!(&big[1..], &(i32::MAX as i64 + 1).to_le_bytes());

        let min = pack(&Value::Integer(i64::MIN)).unwrap();
        assert_eq!(min[0], tag::INTEGER_64);
        assert_eq!(min.len(), 9);
    }

    #[test]
    fn text_and_binary_blocks() {
        assert_eq!(
            pack(&Value::from("hi")).unwrap(),
            [0xC0, 0x02, 0x00, 0x00, 0x00, b'h', b'i']
        );
        assert_eq!(
            pack(&Value::binary(vec![0xAA])).unwrap(),
            [0xD0, 0x01, 0x00, 0x00, 0x00, 0xAA]
        );
        assert_eq!(pack(&Value::from("")).unwrap(), [0xC0, 0, 0, 0, 0]);
    }

    #[test]
    fn containers() {
        let list = Value::List(vec![Value::Bool(true), Value::None]);
        assert_eq!(
            pack(&list).unwrap(),
            [0x80, 0x02, 0x00, 0x00, 0x00, 0x10, 0x01, 0x20]
        );

        let mut map = Map::new();
        map.insert("k", 1);
        assert_eq!(
            pack(&Value::Map(map)).unwrap(),
            [0x90, 0x01, 0x00, 0x00, 0x00, 0xC0, 0x01, 0x00, 0x00, 0x00, b'k', 0x41, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn encoded_len_matches_pack() {
        let mut inner = Map::new();
        inner.insert("deep", vec![Value::from(1.25), Value::from(i64::MAX)]);
        let mut map = Map::new();
        map.insert("inner", inner);
        map.insert("blob", Value::binary(vec![1, 2, 3]));
        let value = Value::Map(map);

        assert_eq!(encoded_len(&value).unwrap(), pack(&value).unwrap().len());
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut map = Map::new();
        map.push("a", 1);
        map.push("a", 2);
        let err = pack(&Value::Map(map)).unwrap_err();
        assert_eq!(err, EncodingError::DuplicateKey { key: "a".into() });
    }

    #[test]
    fn nested_duplicate_key_rejected() {
        let mut inner = Map::new();
        inner.push("x", true);
        inner.push("x", false);
        let value = Value::List(vec![Value::None, Value::Map(inner)]);
        assert!(matches!(
            pack(&value),
            Err(EncodingError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn length_limit() {
        let cfg = CodecConfig {
            max_length: 4,
            ..CodecConfig::default()
        };
        let err = pack_with(&Value::from("hello"), &cfg).unwrap_err();
        assert_eq!(
            err,
            EncodingError::LengthTooLarge {
                kind: LengthKind::Text,
                len: 5,
                max: 4
            }
        );

        let list: Value = (0..5).collect();
        assert!(matches!(
            pack_with(&list, &cfg),
            Err(EncodingError::LengthTooLarge {
                kind: LengthKind::List,
                ..
            })
        ));

        let mut map = Map::new();
        map.insert("longkey", 1);
        assert!(matches!(
            pack_with(&Value::Map(map), &cfg),
            Err(EncodingError::LengthTooLarge {
                kind: LengthKind::Text,
                ..
            })
        ));
    }

    #[test]
    fn depth_limit() {
        let cfg = CodecConfig {
            max_depth: 2,
            ..CodecConfig::default()
        };
        let two = Value::List(vec![Value::List(vec![])]);
        assert!(pack_with(&two, &cfg).is_ok());

        let three = Value::List(vec![two]);
        assert_eq!(
            pack_with(&three, &cfg).unwrap_err(),
            EncodingError::DepthLimitExceeded { max: 2 }
        );
    }

    #[test]
    fn pack_into_appends() {
        let mut buf = vec![0xEE];
        let written = pack_into(&Value::Bool(true), &mut buf).unwrap();
        assert_eq!(written, 2);
        assert_eq!(buf, [0xEE, 0x10, 0x01]);
    }

    #[test]
    fn failed_pack_writes_nothing() {
        let mut map = Map::new();
        map.push("a", 1);
        map.push("b", 2);
        map.push("a", 3);

        let mut buf = vec![0xEE];
        assert!(pack_into(&Value::Map(map), &mut buf).is_err());
        assert_eq!(buf, [0xEE]);
    }

    #[test]
    fn buffer_too_small() {
        let mut storage = [0u8; 4];
        let mut dst = &mut storage[..];
        let err = pack_into(&Value::from("hello"), &mut dst).unwrap_err();
        assert_eq!(
            err,
            EncodingError::BufferTooSmall {
                needed: 10,
                available: 4
            }
        );
        assert_eq!(storage, [0u8; 4]);
    }
}
