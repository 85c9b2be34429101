//! Wire type tags.
//!
//! The high nibble selects the value family, the low nibble the payload
//! width. Families with a single layout use a zero low nibble.

/// Boolean, followed by one `0x00`/`0x01` byte.
pub const BOOLEAN: u8 = 0x10;

/// Absent value, no payload.
pub const NONE: u8 = 0x20;

/// Signed integer, 4-byte payload.
pub const INTEGER_32: u8 = 0x41;

/// Signed integer, 8-byte payload.
pub const INTEGER_64: u8 = 0x42;

/// IEEE-754 single precision, 4-byte payload. Accepted on decode only.
pub const FLOAT_32: u8 = 0x51;

/// IEEE-754 double precision, 8-byte payload.
pub const FLOAT_64: u8 = 0x52;

/// List, followed by a `u32` element count.
pub const LIST: u8 = 0x80;

/// Map, followed by a `u32` entry count.
pub const MAP: u8 = 0x90;

/// UTF-8 text, followed by a `u32` byte length.
pub const TEXT: u8 = 0xC0;

/// Raw bytes, followed by a `u32` byte length.
pub const BINARY: u8 = 0xD0;

/// Size of the tag itself.
pub const TAG_SIZE: usize = 1;

/// Size of the `u32` length/count prefix on blocks and containers.
pub const LENGTH_SIZE: usize = 4;

/// Returns a human-readable name for a tag byte.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        BOOLEAN => "boolean",
        NONE => "none",
        INTEGER_32 | INTEGER_64 => "integer",
        FLOAT_32 | FLOAT_64 => "float",
        LIST => "list",
        MAP => "map",
        TEXT => "text",
        BINARY => "binary",
        _ => "unknown",
    }
}

/// Returns true if the tag introduces a container (list or map).
pub fn is_container(tag: u8) -> bool {
    matches!(tag, LIST | MAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_every_tag() {
        for tag in [
            BOOLEAN, NONE, INTEGER_32, INTEGER_64, FLOAT_32, FLOAT_64, LIST, MAP, TEXT, BINARY,
        ] {
            assert_ne!(tag_name(tag), "unknown", "tag {tag:#04x}");
        }
        assert_eq!(tag_name(0x43), "unknown");
        assert_eq!(tag_name(0xFF), "unknown");
    }

    #[test]
    fn containers() {
        assert!(is_container(LIST));
        assert!(is_container(MAP));
        assert!(!is_container(TEXT));
        assert!(!is_container(BINARY));
    }
}
