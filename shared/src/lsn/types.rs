use std::fmt;
use std::str::FromStr;

/// A write-ahead-log location as PostgreSQL reports it: `X/Y`, where `X` is
/// the segment id (high 32 bits) and `Y` the byte offset inside that id's
/// 4-byte offset space.
///
/// A position on its own says nothing about how far into a segment it lies;
/// that depends on the segment size the primary is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// High-order component, parsed from the hex token before `/`.
    pub segment_id: u32,
    /// Low-order component, parsed from the hex token after `/`.
    pub byte_offset: u32,
}

impl Position {
    pub const ZERO: Position = Position {
        segment_id: 0,
        byte_offset: 0,
    };

    #[inline]
    pub fn new(segment_id: u32, byte_offset: u32) -> Self {
        Self {
            segment_id,
            byte_offset,
        }
    }

    /// Parse from PostgreSQL's `X/Y` hex format (e.g. `3E/5B05DE30`).
    ///
    /// Exactly one `/` is accepted and both halves must be base-16. Nothing
    /// else is checked here.
    pub fn parse(token: &str) -> Result<Self, PositionParseError> {
        let malformed = || PositionParseError(token.to_string());

        let (hi, lo) = token.split_once('/').ok_or_else(malformed)?;
        if lo.contains('/') {
            return Err(malformed());
        }
        let segment_id = parse_hex(hi).ok_or_else(malformed)?;
        let byte_offset = parse_hex(lo).ok_or_else(malformed)?;
        Ok(Self::new(segment_id, byte_offset))
    }

    /// Format as `X/Y`, zero-padding each half to at least the given widths.
    pub fn to_padded_string(self, segment_width: usize, offset_width: usize) -> String {
        format!(
            "{:0sw$X}/{:0ow$X}",
            self.segment_id,
            self.byte_offset,
            sw = segment_width,
            ow = offset_width
        )
    }

    /// The position as a flat 64-bit byte address.
    #[inline]
    pub fn as_u64(self) -> u64 {
        ((self.segment_id as u64) << 32) | self.byte_offset as u64
    }

    /// Returns true if this position is ahead of `other` in WAL order.
    #[inline]
    pub fn is_ahead_of(self, other: Position) -> bool {
        self > other
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:X}", self.segment_id, self.byte_offset)
    }
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for Position {
    #[inline]
    fn from(val: u64) -> Self {
        Self::new((val >> 32) as u32, val as u32)
    }
}

// `from_str_radix` tolerates a leading sign; WAL tokens never carry one.
fn parse_hex(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(part, 16).ok()
}

/// Error returned when a position token cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionParseError(pub String);

impl fmt::Display for PositionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid WAL position: '{}'", self.0)
    }
}

impl std::error::Error for PositionParseError {}
