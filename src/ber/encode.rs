//! BER encoding.
//!
//! Uses a reverse buffer: content is written first, then length and tag
//! are prepended, so constructed lengths never need pre-calculation.

use bytes::Bytes;

use super::length::encode_length;
use super::tag;

/// Buffer for BER encoding that writes backwards.
///
/// Pushes append to the underlying vector and [`finish`](EncodeBuf::finish)
/// reverses it, so fields must be pushed in reverse wire order.
#[derive(Debug)]
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Push multiple bytes (reversed, so they read forward in the output).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, count) = encode_length(len);
        self.buf.extend_from_slice(&bytes[..count]);
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Current length of encoded data.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start_len = self.len();
        f(self);
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i32) {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        if value >= 0 {
            while start < 3 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
                start += 1;
            }
        } else {
            while start < 3 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
                start += 1;
            }
        }
        self.push_bytes(&bytes[start..]);
        self.push_length(4 - start);
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode an unsigned 32-bit integer with a specific application tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let (arr, len) = encode_unsigned_stack::<5>(&value.to_be_bytes());
        self.push_bytes(&arr[5 - len..]);
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Encode a 64-bit Counter64.
    pub fn push_counter64(&mut self, value: u64) {
        let (arr, len) = encode_unsigned_stack::<9>(&value.to_be_bytes());
        self.push_bytes(&arr[9 - len..]);
        self.push_length(len);
        self.push_tag(tag::application::COUNTER64);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Encode a NULL or any other empty primitive (exception markers).
    pub fn push_empty(&mut self, tag: u8) {
        self.push_length(0);
        self.push_tag(tag);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &crate::oid::Oid) {
        let ber = oid.to_ber();
        self.push_bytes(&ber);
        self.push_length(ber.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Encode an IP address.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Finalize and return the encoded bytes.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal unsigned encoding over big-endian input bytes.
///
/// Returns a stack array with the valid bytes at the END (for the
/// reverse buffer) and the valid byte count. A leading 0x00 is kept
/// when the most significant bit is set, to avoid sign confusion.
fn encode_unsigned_stack<const N: usize>(be: &[u8]) -> ([u8; N], usize) {
    debug_assert_eq!(N, be.len() + 1);
    let mut out = [0u8; N];
    out[1..].copy_from_slice(be);

    if be.iter().all(|&b| b == 0) {
        return (out, 1);
    }

    let mut start = 0;
    while start < be.len() - 1 && be[start] == 0 {
        start += 1;
    }
    if be[start] & 0x80 != 0 {
        // Keep a 0x00 prefix byte
        (out, N - start)
    } else {
        (out, N - 1 - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn finish(buf: EncodeBuf) -> Vec<u8> {
        buf.finish().to_vec()
    }

    #[test]
    fn test_encode_integer() {
        for (value, expected) in [
            (0, vec![0x02, 0x01, 0x00]),
            (42, vec![0x02, 0x01, 0x2A]),
            (127, vec![0x02, 0x01, 0x7F]),
            (128, vec![0x02, 0x02, 0x00, 0x80]),
            (-1, vec![0x02, 0x01, 0xFF]),
            (-129, vec![0x02, 0x02, 0xFF, 0x7F]),
        ] {
            let mut buf = EncodeBuf::new();
            buf.push_integer(value);
            assert_eq!(finish(buf), expected, "value {}", value);
        }
    }

    #[test]
    fn test_encode_unsigned32() {
        let mut buf = EncodeBuf::new();
        buf.push_unsigned32(tag::application::COUNTER32, 255);
        assert_eq!(finish(buf), vec![0x41, 0x02, 0x00, 0xFF]);

        let mut buf = EncodeBuf::new();
        buf.push_unsigned32(tag::application::GAUGE32, 0);
        assert_eq!(finish(buf), vec![0x42, 0x01, 0x00]);

        let mut buf = EncodeBuf::new();
        buf.push_unsigned32(tag::application::TIMETICKS, u32::MAX);
        assert_eq!(finish(buf), vec![0x43, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_null() {
        let mut buf = EncodeBuf::new();
        buf.push_empty(tag::universal::NULL);
        assert_eq!(finish(buf), vec![0x05, 0x00]);
    }

    #[test]
    fn test_encode_oid() {
        let mut buf = EncodeBuf::new();
        buf.push_oid(&oid!(1, 3, 6, 1));
        assert_eq!(finish(buf), vec![0x06, 0x03, 0x2B, 0x06, 0x01]);
    }

    #[test]
    fn test_encode_sequence() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            // Reverse buffer: push in reverse order for forward output
            buf.push_integer(2);
            buf.push_integer(1);
        });
        // SEQUENCE { INTEGER 1, INTEGER 2 }
        assert_eq!(
            finish(buf),
            vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]
        );
    }
}
