//! Bit framing for embedded payloads.
//!
//! A payload is expanded to bits (MSB first) and terminated by a sentinel:
//!
//! ```text
//! [payload bytes][sentinel bytes]  ->  b7 b6 .. b0  b7 b6 .. b0  ...
//! ```
//!
//! Extraction regroups bits into bytes and stops at the first complete
//! sentinel. Sentinels are matched on whole-byte boundaries only.
//!
//! Payload bytes that reproduce the sentinel are NOT escaped: extraction
//! truncates at the first occurrence. This keeps the on-cover layout
//! compatible with existing stego files.

use super::error::StegoError;

/// End-of-message marker appended after the payload.
///
/// The payload is not escaped. Extraction stops at the first byte-aligned
/// occurrence of the pattern, so a payload that contains it comes back
/// truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel {
    pattern: &'static [u8],
}

impl Sentinel {
    /// Human-readable marker used by the basic image engine and the audio
    /// and video engines. Readable in raw LSB dumps.
    pub const TEXT: Sentinel = Sentinel {
        pattern: b"<<<END_OF_MESSAGE>>>",
    };

    /// Sixteen one-bits, used by the multi-bit image variant.
    pub const ONES: Sentinel = Sentinel {
        pattern: &[0xFF, 0xFF],
    };

    /// Creates a sentinel from an arbitrary non-empty byte pattern.
    pub const fn new(pattern: &'static [u8]) -> Option<Self> {
        if pattern.is_empty() {
            None
        } else {
            Some(Self { pattern })
        }
    }

    /// The marker bytes.
    pub fn as_bytes(&self) -> &'static [u8] {
        self.pattern
    }

    /// Length of the marker in bytes.
    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    /// Always false; sentinels cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }
}

impl Default for Sentinel {
    fn default() -> Self {
        Self::TEXT
    }
}

/// A framed payload: payload bytes followed by the sentinel, read as bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    bytes: Vec<u8>,
    payload_len: usize,
}

impl BitStream {
    /// Number of bits in the stream. Always a multiple of 8.
    pub fn len(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes in the stream, sentinel included.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Number of payload bytes, sentinel excluded.
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// The framed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterates the stream one bit at a time, MSB first within each byte.
    pub fn bits(&self) -> Bits<'_> {
        Bits {
            bytes: &self.bytes,
            index: 0,
        }
    }
}

/// Iterator over the bits of a [`BitStream`]. Yields 0 or 1.
#[derive(Debug, Clone)]
pub struct Bits<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl Iterator for Bits<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.index >= self.bytes.len() * 8 {
            return None;
        }
        let byte = self.bytes[self.index / 8];
        let bit = (byte >> (7 - self.index % 8)) & 1;
        self.index += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bytes.len() * 8 - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Bits<'_> {}

/// Frames a payload: payload bytes followed by the sentinel.
pub fn frame(payload: &[u8], sentinel: Sentinel) -> BitStream {
    let mut bytes = Vec::with_capacity(payload.len() + sentinel.len());
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(sentinel.as_bytes());
    BitStream {
        bytes,
        payload_len: payload.len(),
    }
}

/// Incremental extractor. Engines push bits in scan order and stop as soon
/// as [`Unframer::push_bit`] reports the sentinel.
#[derive(Debug)]
pub struct Unframer {
    sentinel: Sentinel,
    bytes: Vec<u8>,
    current: u8,
    filled: u8,
    consumed: usize,
    done: bool,
}

impl Unframer {
    pub fn new(sentinel: Sentinel) -> Self {
        Self {
            sentinel,
            bytes: Vec::new(),
            current: 0,
            filled: 0,
            consumed: 0,
            done: false,
        }
    }

    /// Feeds one bit (only the lowest bit of `bit` is used).
    ///
    /// Returns `true` once the sentinel has been located; further bits are
    /// ignored.
    pub fn push_bit(&mut self, bit: u8) -> bool {
        if self.done {
            return true;
        }

        self.current = (self.current << 1) | (bit & 1);
        self.filled += 1;
        self.consumed += 1;

        if self.filled == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.filled = 0;
            self.done = self.bytes.ends_with(self.sentinel.as_bytes());
        }

        self.done
    }

    /// Whether the sentinel has been located.
    pub fn is_complete(&self) -> bool {
        self.done
    }

    /// Bits consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Returns the payload and the number of bits consumed up to and
    /// including the sentinel, or `None` if no sentinel was seen.
    ///
    /// A trailing partial byte is discarded.
    pub fn finish(mut self) -> Option<(Vec<u8>, usize)> {
        if !self.done {
            return None;
        }
        let payload_len = self.bytes.len() - self.sentinel.len();
        self.bytes.truncate(payload_len);
        Some((self.bytes, self.consumed))
    }
}

/// Extracts a payload from a bit source.
///
/// Returns the payload bytes and the number of bits consumed, or
/// `SentinelNotFound` if the source is exhausted first.
pub fn unframe<I>(bits: I, sentinel: Sentinel) -> Result<(Vec<u8>, usize), StegoError>
where
    I: IntoIterator<Item = u8>,
{
    let mut unframer = Unframer::new(sentinel);
    for bit in bits {
        if unframer.push_bit(bit) {
            break;
        }
    }

    let consumed = unframer.consumed();
    unframer.finish().ok_or_else(|| {
        StegoError::sentinel_not_found(format!(
            "scanned {} bits without reaching the end marker",
            consumed
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(bytes: &[u8]) -> Vec<u8> {
        bytes
            .iter()
            .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1))
            .collect()
    }

    #[test]
    fn test_frame_is_msb_first_with_sentinel() {
        let stream = frame(b"A", Sentinel::TEXT);

        assert_eq!(stream.payload_len(), 1);
        assert_eq!(stream.byte_len(), 1 + 20);
        assert_eq!(stream.len(), 21 * 8);

        // 'A' = 0x41 = 0100_0001
        let first: Vec<u8> = stream.bits().take(8).collect();
        assert_eq!(first, vec![0, 1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&stream.as_bytes()[1..], b"<<<END_OF_MESSAGE>>>");
    }

    #[test]
    fn test_bits_iterator_is_exact_size() {
        let stream = frame(b"xyz", Sentinel::ONES);
        let mut bits = stream.bits();
        assert_eq!(bits.len(), 5 * 8);
        bits.next();
        assert_eq!(bits.len(), 5 * 8 - 1);
    }

    #[test]
    fn test_unframe_roundtrip() {
        let stream = frame(b"HELLO", Sentinel::TEXT);
        let (payload, consumed) = unframe(stream.bits(), Sentinel::TEXT).unwrap();

        assert_eq!(payload, b"HELLO");
        assert_eq!(consumed, stream.len());
    }

    #[test]
    fn test_unframe_ignores_trailing_bits() {
        let stream = frame(b"data", Sentinel::ONES);
        let mut bits: Vec<u8> = stream.bits().collect();
        bits.extend([1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1]);

        let (payload, consumed) = unframe(bits, Sentinel::ONES).unwrap();
        assert_eq!(payload, b"data");
        assert_eq!(consumed, stream.len());
    }

    #[test]
    fn test_unframe_without_sentinel_fails() {
        let bits = bits_of(b"no terminator here");
        let result = unframe(bits, Sentinel::TEXT);
        assert!(matches!(result, Err(StegoError::SentinelNotFound { .. })));
    }

    #[test]
    fn test_unframe_empty_source_fails() {
        let result = unframe(Vec::new(), Sentinel::ONES);
        assert!(matches!(result, Err(StegoError::SentinelNotFound { .. })));
    }

    #[test]
    fn test_empty_payload() {
        let stream = frame(b"", Sentinel::TEXT);
        let (payload, _) = unframe(stream.bits(), Sentinel::TEXT).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_sentinel_inside_payload_truncates() {
        // Not escaped: the first occurrence wins.
        let stream = frame(b"ab\xFF\xFFcd", Sentinel::ONES);
        let (payload, _) = unframe(stream.bits(), Sentinel::ONES).unwrap();
        assert_eq!(payload, b"ab");
    }

    #[test]
    fn test_ones_sentinel_is_byte_aligned() {
        // 0x7F 0xFF 0x80 has sixteen consecutive one-bits, but not on a byte
        // boundary, so it must not terminate the payload.
        let stream = frame(&[0x7F, 0xFF, 0x80, 0x01], Sentinel::ONES);
        let (payload, _) = unframe(stream.bits(), Sentinel::ONES).unwrap();
        assert_eq!(payload, vec![0x7F, 0xFF, 0x80, 0x01]);
    }

    #[test]
    fn test_custom_sentinel() {
        let sentinel = Sentinel::new(b"\0END").unwrap();
        let stream = frame(b"custom", sentinel);
        let (payload, _) = unframe(stream.bits(), sentinel).unwrap();
        assert_eq!(payload, b"custom");

        assert!(Sentinel::new(b"").is_none());
    }

    #[test]
    fn test_push_bit_stops_after_sentinel() {
        let stream = frame(b"hi", Sentinel::ONES);
        let mut unframer = Unframer::new(Sentinel::ONES);
        for bit in stream.bits() {
            unframer.push_bit(bit);
        }
        assert!(unframer.is_complete());
        assert!(unframer.push_bit(0));
        assert_eq!(unframer.consumed(), stream.len());
        assert_eq!(unframer.finish().unwrap().0, b"hi");
    }
}
