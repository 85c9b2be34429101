/// Default container nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default cap on text/binary byte lengths and list/map counts (28 bits).
pub const DEFAULT_MAX_LENGTH: usize = 0x0FFF_FFFF;

/// Limits applied symmetrically by the packer and the unpacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum container nesting. `0` rejects every list and map.
    pub max_depth: usize,
    /// Maximum text/binary byte length and list/map element count.
    pub max_length: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}
