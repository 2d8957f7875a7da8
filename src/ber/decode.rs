//! BER decoding.
//!
//! A forward cursor over immutable bytes. Only definite lengths are
//! accepted; every error carries the absolute offset where it happened
//! so undecodable datagrams can be logged usefully before being dropped.

use bytes::Bytes;

use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;

/// Maximum nesting/content length expressible in a length field we accept.
/// UDP datagrams cannot exceed 65535 bytes, so anything larger is garbage.
const MAX_CONTENT_LEN: usize = 65_535;

/// Forward BER decoder.
#[derive(Debug)]
pub struct Decoder {
    data: Bytes,
    pos: usize,
    /// Absolute offset of `data[0]` in the original datagram, for error reporting.
    base: usize,
}

impl Decoder {
    /// Create a decoder over a complete datagram.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Whether all content has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Absolute offset of the cursor in the original datagram.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.is_empty() {
            return Err(Error::decode(self.offset(), DecodeErrorKind::TruncatedData));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<Bytes> {
        if n > self.remaining() {
            return Err(Error::decode(
                self.offset(),
                DecodeErrorKind::InsufficientData {
                    needed: n,
                    available: self.remaining(),
                },
            ));
        }
        let out = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(out)
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Result<u8> {
        if self.is_empty() {
            return Err(Error::decode(self.offset(), DecodeErrorKind::TruncatedData));
        }
        Ok(self.data[self.pos])
    }

    fn read_length(&mut self) -> Result<usize> {
        let off = self.offset();
        let first = self.read_byte()?;
        let len = if first < 0x80 {
            usize::from(first)
        } else if first == 0x80 {
            return Err(Error::decode(off, DecodeErrorKind::IndefiniteLength));
        } else {
            let octets = usize::from(first & 0x7F);
            if octets > 4 {
                return Err(Error::decode(off, DecodeErrorKind::LengthTooLong { octets }));
            }
            let mut v: usize = 0;
            for _ in 0..octets {
                v = (v << 8) | usize::from(self.read_byte()?);
            }
            v
        };
        if len > MAX_CONTENT_LEN {
            return Err(Error::decode(off, DecodeErrorKind::InvalidLength));
        }
        Ok(len)
    }

    /// Read a TLV with the expected tag and return its content bytes.
    pub fn read_tlv(&mut self, expected: u8) -> Result<Bytes> {
        let off = self.offset();
        let actual = self.read_byte()?;
        if actual != expected {
            return Err(Error::decode(
                off,
                DecodeErrorKind::UnexpectedTag { expected, actual },
            ));
        }
        let len = self.read_length()?;
        if len > self.remaining() {
            return Err(Error::decode(off, DecodeErrorKind::TlvOverflow));
        }
        self.take(len)
    }

    /// Read a constructed TLV and return a sub-decoder over its content.
    pub fn read_constructed(&mut self, expected: u8) -> Result<Decoder> {
        let start = self.pos;
        let content = self.read_tlv(expected)?;
        let header = (self.pos - start) - content.len();
        Ok(Decoder {
            data: content,
            pos: 0,
            base: self.base + start + header,
        })
    }

    /// Read a SEQUENCE and return a sub-decoder over its content.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a signed INTEGER (up to 4 content bytes).
    pub fn read_integer(&mut self) -> Result<i32> {
        let off = self.offset();
        let content = self.read_tlv(tag::universal::INTEGER)?;
        if content.is_empty() {
            return Err(Error::decode(off, DecodeErrorKind::ZeroLengthInteger));
        }
        if content.len() > 4 {
            return Err(Error::decode(off, DecodeErrorKind::IntegerOverflow));
        }
        let mut v: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
        for &b in content.iter() {
            v = (v << 8) | i64::from(b);
        }
        Ok(v as i32)
    }

    /// Read an unsigned 32-bit value with the given application tag.
    pub fn read_unsigned32(&mut self, tag: u8) -> Result<u32> {
        let off = self.offset();
        let v = self.read_unsigned(tag, 5)?;
        u32::try_from(v).map_err(|_| Error::decode(off, DecodeErrorKind::IntegerOverflow))
    }

    /// Read an unsigned 64-bit value with the given application tag (Counter64).
    pub fn read_unsigned64(&mut self, tag: u8) -> Result<u64> {
        self.read_unsigned(tag, 9)
    }

    fn read_unsigned(&mut self, tag: u8, max_len: usize) -> Result<u64> {
        let off = self.offset();
        let content = self.read_tlv(tag)?;
        if content.is_empty() {
            return Err(Error::decode(off, DecodeErrorKind::ZeroLengthInteger));
        }
        if content.len() > max_len || (content.len() == max_len && content[0] != 0) {
            return Err(Error::decode(off, DecodeErrorKind::IntegerOverflow));
        }
        let mut v: u64 = 0;
        for &b in content.iter() {
            v = (v << 8) | u64::from(b);
        }
        Ok(v)
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        self.read_tlv(tag::universal::OCTET_STRING)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        self.read_empty(tag::universal::NULL)
    }

    /// Read any zero-length primitive (NULL, exception markers).
    pub fn read_empty(&mut self, tag: u8) -> Result<()> {
        let off = self.offset();
        let content = self.read_tlv(tag)?;
        if !content.is_empty() {
            return Err(Error::decode(off, DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let off = self.offset();
        let content = self.read_tlv(tag::universal::OBJECT_IDENTIFIER)?;
        Oid::from_ber(&content)
            .ok_or_else(|| Error::decode(off, DecodeErrorKind::InvalidOidEncoding))
    }
}
