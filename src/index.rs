//! Table row index encoding (RFC 2578 Section 7.7).
//!
//! Row instances live at `column . index-arcs`. An integer index
//! contributes one arc; a variable-length string index contributes a
//! length arc followed by one arc per byte. Decoding requires the
//! index schema since arc sequences are not self-describing.

use bytes::Bytes;
use smallvec::SmallVec;

use crate::error::{Error, Result, RowIndexErrorKind};
use crate::oid::Oid;

/// Longest accepted string index component, in bytes.
pub const MAX_INDEX_STRING_LEN: u32 = 128;

/// Schema for one index component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// Unsigned integer, one arc.
    Integer,
    /// Variable-length octet string, length arc plus byte arcs.
    OctetString,
}

/// A decoded index component value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexValue {
    Int(u32),
    Str(Bytes),
}

impl IndexValue {
    /// Construct a string index from anything byte-like.
    pub fn str(bytes: impl Into<Bytes>) -> Self {
        Self::Str(bytes.into())
    }

    fn arc_count(&self) -> usize {
        match self {
            Self::Int(_) => 1,
            Self::Str(s) => 1 + s.len(),
        }
    }
}

impl Ord for IndexValue {
    /// Order matching the lexicographic order of the encoded arcs.
    ///
    /// Integers compare by value. Strings compare first by length
    /// (the leading length arc) and then byte-wise.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Str(a), Self::Str(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            // Cross-variant order is arbitrary but total; schemas
            // never mix variants at the same position.
            (Self::Int(_), Self::Str(_)) => std::cmp::Ordering::Less,
            (Self::Str(_), Self::Int(_)) => std::cmp::Ordering::Greater,
        }
    }
}

impl PartialOrd for IndexValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u32> for IndexValue {
    fn from(value: u32) -> Self {
        Self::Int(value)
    }
}

impl From<&'static str> for IndexValue {
    fn from(value: &'static str) -> Self {
        Self::Str(Bytes::from_static(value.as_bytes()))
    }
}

/// Encode index values into OID arcs.
pub fn encode_index(values: &[IndexValue]) -> SmallVec<[u32; 16]> {
    let mut arcs = SmallVec::with_capacity(values.iter().map(IndexValue::arc_count).sum());
    for value in values {
        match value {
            IndexValue::Int(n) => arcs.push(*n),
            IndexValue::Str(s) => {
                arcs.push(s.len() as u32);
                arcs.extend(s.iter().map(|&b| u32::from(b)));
            }
        }
    }
    arcs
}

/// Decode OID arcs back into index values according to a schema.
///
/// The arcs must match the schema exactly; trailing arcs are an error.
pub fn decode_index(arcs: &[u32], schema: &[IndexType]) -> Result<Vec<IndexValue>> {
    let mut values = Vec::with_capacity(schema.len());
    let mut rest = arcs;
    for index_type in schema {
        match index_type {
            IndexType::Integer => {
                let (&arc, tail) = rest
                    .split_first()
                    .ok_or(Error::row_index(RowIndexErrorKind::Truncated))?;
                values.push(IndexValue::Int(arc));
                rest = tail;
            }
            IndexType::OctetString => {
                let (&len, tail) = rest
                    .split_first()
                    .ok_or(Error::row_index(RowIndexErrorKind::Truncated))?;
                if len > MAX_INDEX_STRING_LEN {
                    return Err(Error::row_index(RowIndexErrorKind::LengthTooLarge {
                        length: len,
                        max: MAX_INDEX_STRING_LEN,
                    }));
                }
                let len = len as usize;
                if tail.len() < len {
                    return Err(Error::row_index(RowIndexErrorKind::Truncated));
                }
                let (str_arcs, tail) = tail.split_at(len);
                let mut bytes = Vec::with_capacity(len);
                for &arc in str_arcs {
                    let byte = u8::try_from(arc)
                        .map_err(|_| Error::row_index(RowIndexErrorKind::ByteArcOutOfRange(arc)))?;
                    bytes.push(byte);
                }
                values.push(IndexValue::Str(Bytes::from(bytes)));
                rest = tail;
            }
        }
    }
    if !rest.is_empty() {
        return Err(Error::row_index(RowIndexErrorKind::TrailingArcs {
            count: rest.len(),
        }));
    }
    Ok(values)
}

/// Build a full instance OID from a column base and index values.
pub fn instance_oid(base: &Oid, values: &[IndexValue]) -> Oid {
    base.append(&encode_index(values))
}

/// The instance OID of a scalar object, `base.0`.
pub fn scalar_instance(base: &Oid) -> Oid {
    base.child(0)
}
