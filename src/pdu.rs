//! PDU and message framing.
//!
//! A v1/v2c message is `SEQUENCE { version, community, PDU }` where the
//! PDU is `[type] { request-id, error-status, error-index, varbinds }`.
//! GETBULK reuses the error-status slot for non-repeaters and the
//! error-index slot for max-repetitions (RFC 3416 Section 4.2.3).

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// SNMP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// SNMPv1.
    V1,
    /// SNMPv2c.
    V2c,
}

impl Version {
    /// Create from the wire version integer.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::V1),
            1 => Some(Self::V2c),
            _ => None,
        }
    }

    /// Convert to the wire version integer.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::V1 => 0,
            Self::V2c => 1,
        }
    }
}

/// PDU type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    Response,
    SetRequest,
    GetBulkRequest,
}

impl PduType {
    /// The BER tag for this PDU type.
    pub fn tag(&self) -> u8 {
        match self {
            Self::GetRequest => tag::pdu::GET_REQUEST,
            Self::GetNextRequest => tag::pdu::GET_NEXT_REQUEST,
            Self::Response => tag::pdu::RESPONSE,
            Self::SetRequest => tag::pdu::SET_REQUEST,
            Self::GetBulkRequest => tag::pdu::GET_BULK_REQUEST,
        }
    }

    /// Look up a PDU type from its BER tag.
    pub fn from_tag(tag_byte: u8) -> Option<Self> {
        match tag_byte {
            tag::pdu::GET_REQUEST => Some(Self::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(Self::GetNextRequest),
            tag::pdu::RESPONSE => Some(Self::Response),
            tag::pdu::SET_REQUEST => Some(Self::SetRequest),
            tag::pdu::GET_BULK_REQUEST => Some(Self::GetBulkRequest),
            _ => None,
        }
    }
}

/// An SNMP PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    /// PDU type.
    pub pdu_type: PduType,
    /// Request ID, echoed into the response.
    pub request_id: i32,
    /// Error status; non-repeaters for GETBULK.
    pub error_status: i32,
    /// Error index; max-repetitions for GETBULK.
    pub error_index: i32,
    /// Variable bindings.
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Create a request PDU with NULL-valued varbinds.
    pub fn request(pdu_type: PduType, request_id: i32, oids: Vec<Oid>) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.into_iter().map(VarBind::null).collect(),
        }
    }

    /// Create a GETBULK request PDU.
    pub fn bulk_request(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: Vec<Oid>,
    ) -> Self {
        Self {
            pdu_type: PduType::GetBulkRequest,
            request_id,
            error_status: non_repeaters,
            error_index: max_repetitions,
            varbinds: oids.into_iter().map(VarBind::null).collect(),
        }
    }

    /// Create a successful response PDU.
    pub fn response(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create an error response PDU.
    pub fn error_response(
        request_id: i32,
        status: ErrorStatus,
        index: i32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: status.as_i32(),
            error_index: index,
            varbinds,
        }
    }

    /// GETBULK non-repeaters count (negative wire values clamp to 0).
    pub fn non_repeaters(&self) -> usize {
        self.error_status.max(0) as usize
    }

    /// GETBULK max-repetitions count (negative wire values clamp to 0).
    pub fn max_repetitions(&self) -> usize {
        self.error_index.max(0) as usize
    }

    fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let off = decoder.offset();
        let tag_byte = decoder.peek_tag()?;
        let pdu_type = PduType::from_tag(tag_byte)
            .ok_or_else(|| Error::decode(off, DecodeErrorKind::UnknownPduType(tag_byte)))?;
        let mut body = decoder.read_constructed(tag_byte)?;
        let request_id = body.read_integer()?;
        let error_status = body.read_integer()?;
        let error_index = body.read_integer()?;
        let varbinds = decode_varbind_list(&mut body)?;
        Ok(Self {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

/// A complete v1/v2c message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Protocol version.
    pub version: Version,
    /// Community string (plaintext credential).
    pub community: Bytes,
    /// The PDU.
    pub pdu: Pdu,
}

impl Message {
    /// Create a message.
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Encode to a datagram.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });
        buf.finish()
    }

    /// Decode from a datagram.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut msg = decoder.read_sequence()?;
        let version_off = msg.offset();
        let raw_version = msg.read_integer()?;
        let version = Version::from_i32(raw_version).ok_or_else(|| {
            Error::decode(version_off, DecodeErrorKind::UnknownVersion(raw_version))
        })?;
        let community = msg.read_octet_string()?;
        let pdu = Pdu::decode(&mut msg)?;
        Ok(Self {
            version,
            community,
            pdu,
        })
    }
}
