//! SNMP value types.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;

/// An SNMP value as carried in a variable binding.
///
/// Includes the RFC 3416 exception markers (`NoSuchObject`,
/// `NoSuchInstance`, `EndOfMibView`) which appear in v2c responses in
/// place of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// INTEGER (Integer32).
    Integer(i32),
    /// OCTET STRING.
    OctetString(Bytes),
    /// NULL (placeholder in requests).
    Null,
    /// OBJECT IDENTIFIER.
    ObjectIdentifier(Oid),
    /// IpAddress (4 octets).
    IpAddress([u8; 4]),
    /// Counter32 (wrapping, monotonic).
    Counter32(u32),
    /// Gauge32 / Unsigned32.
    Gauge32(u32),
    /// TimeTicks (hundredths of a second).
    TimeTicks(u32),
    /// Counter64.
    Counter64(u64),
    /// noSuchObject exception: object type not served.
    NoSuchObject,
    /// noSuchInstance exception: object type served but instance absent.
    NoSuchInstance,
    /// endOfMibView exception: no further OIDs in the view.
    EndOfMibView,
}

impl Value {
    /// Whether this is one of the v2c exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(s) => buf.push_octet_string(s),
            Value::Null => buf.push_empty(tag::universal::NULL),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Counter64(v) => buf.push_counter64(*v),
            Value::NoSuchObject => buf.push_empty(tag::context::NO_SUCH_OBJECT),
            Value::NoSuchInstance => buf.push_empty(tag::context::NO_SUCH_INSTANCE),
            Value::EndOfMibView => buf.push_empty(tag::context::END_OF_MIB_VIEW),
        }
    }

    /// Decode from BER, dispatching on the next tag.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let t = decoder.peek_tag()?;
        match t {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer()?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_octet_string()?)),
            tag::universal::NULL => {
                decoder.read_null()?;
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid()?))
            }
            tag::application::IP_ADDRESS => {
                let off = decoder.offset();
                let content = decoder.read_tlv(t)?;
                let addr: [u8; 4] = content.as_ref().try_into().map_err(|_| {
                    Error::decode(
                        off,
                        DecodeErrorKind::InvalidIpAddressLength {
                            length: content.len(),
                        },
                    )
                })?;
                Ok(Value::IpAddress(addr))
            }
            tag::application::COUNTER32 => Ok(Value::Counter32(decoder.read_unsigned32(t)?)),
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32(t)?)),
            tag::application::TIMETICKS => Ok(Value::TimeTicks(decoder.read_unsigned32(t)?)),
            tag::application::COUNTER64 => Ok(Value::Counter64(decoder.read_unsigned64(t)?)),
            tag::context::NO_SUCH_OBJECT => {
                decoder.read_empty(t)?;
                Ok(Value::NoSuchObject)
            }
            tag::context::NO_SUCH_INSTANCE => {
                decoder.read_empty(t)?;
                Ok(Value::NoSuchInstance)
            }
            tag::context::END_OF_MIB_VIEW => {
                decoder.read_empty(t)?;
                Ok(Value::EndOfMibView)
            }
            other => Err(Error::decode(
                decoder.offset(),
                DecodeErrorKind::UnknownValueType(other),
            )),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(s) => match std::str::from_utf8(s) {
                Ok(text) => write!(f, "{}", text),
                Err(_) => {
                    for b in s.iter() {
                        write!(f, "{:02X} ", b)?;
                    }
                    Ok(())
                }
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            Value::Counter32(v) => write!(f, "{}", v),
            Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::OctetString(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s.into_bytes()))
    }
}
