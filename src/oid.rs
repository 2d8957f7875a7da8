//! Object Identifier (OID) type and ordering.
//!
//! OIDs are compared arc-by-arc as unsigned integers; a strict prefix
//! sorts before any OID that extends it. This is the ordering GETNEXT
//! and GETBULK traversal depend on.

use smallvec::SmallVec;

use crate::error::{Error, OidErrorKind, Result};

/// Maximum number of arcs accepted when constructing or decoding an OID.
///
/// RFC 2578 limits OIDs to 128 sub-identifiers; this also bounds decode
/// work for hostile datagrams.
pub const MAX_OID_LEN: usize = 128;

/// An object identifier: an immutable sequence of unsigned integer arcs.
///
/// The derived `Ord` is element-wise numeric over the arc slice, which is
/// exactly SNMP's lexicographic OID ordering.
///
/// # Example
///
/// ```rust
/// use mibd::{Oid, oid};
///
/// let a = oid!(1, 3, 6, 1, 2);
/// let b = oid!(1, 3, 6, 1, 2, 1);
/// assert!(a < b); // prefix sorts first
/// assert!(b.starts_with(&a));
/// assert_eq!(a.to_string(), "1.3.6.1.2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid(SmallVec<[u32; 12]>);

impl Oid {
    /// Create an OID from a slice of arcs.
    pub fn from_arcs(arcs: &[u32]) -> Self {
        Self(SmallVec::from_slice(arcs))
    }

    /// Parse a dotted-decimal OID string, e.g. `"1.3.6.1.4.1"`.
    ///
    /// A single leading dot is tolerated. Fails with [`Error::InvalidOid`]
    /// on empty input, non-numeric arcs, or too many arcs.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs: SmallVec<[u32; 12]> = SmallVec::new();
        for part in trimmed.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
            if arcs.len() > MAX_OID_LEN {
                return Err(Error::invalid_oid_with_input(
                    OidErrorKind::TooManyArcs {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    },
                    s,
                ));
            }
        }
        Ok(Self(arcs))
    }

    /// The arcs of this OID.
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this OID has no arcs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this OID starts with `prefix` (prefix-of check, including equality).
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Return a new OID with `suffix` arcs appended.
    pub fn append(&self, suffix: &[u32]) -> Oid {
        let mut arcs = self.0.clone();
        arcs.extend_from_slice(suffix);
        Oid(arcs)
    }

    /// Return a new OID with a single arc appended.
    pub fn child(&self, arc: u32) -> Oid {
        self.append(&[arc])
    }

    /// Encode to BER sub-identifier bytes (X.690 8.19).
    ///
    /// The first two arcs pack into one sub-identifier as `40 * a + b`.
    pub(crate) fn to_ber(&self) -> SmallVec<[u8; 32]> {
        let mut out: SmallVec<[u8; 32]> = SmallVec::new();
        let arcs = self.arcs();
        if arcs.is_empty() {
            return out;
        }
        let head = match arcs.len() {
            1 => u64::from(arcs[0]) * 40,
            _ => u64::from(arcs[0]) * 40 + u64::from(arcs[1]),
        };
        push_subid(&mut out, head);
        for &arc in arcs.iter().skip(2) {
            push_subid(&mut out, u64::from(arc));
        }
        out
    }

    /// Decode from BER sub-identifier bytes.
    ///
    /// Returns `None` on truncated base-128 runs, arc overflow, or an
    /// arc count over [`MAX_OID_LEN`].
    pub(crate) fn from_ber(bytes: &[u8]) -> Option<Oid> {
        if bytes.is_empty() {
            return None;
        }
        let mut arcs: SmallVec<[u32; 12]> = SmallVec::new();

        let mut acc: u64 = 0;
        let mut continued = false;
        let mut first_done = false;
        for b in bytes.iter().copied() {
            acc = (acc << 7) | u64::from(b & 0x7F);
            if acc > u64::from(u32::MAX) {
                return None;
            }
            if b & 0x80 != 0 {
                continued = true;
                continue;
            }
            continued = false;
            if !first_done {
                // First sub-identifier packs the first two arcs
                let (a, b) = if acc < 40 {
                    (0, acc)
                } else if acc < 80 {
                    (1, acc - 40)
                } else {
                    (2, acc - 80)
                };
                arcs.push(a as u32);
                arcs.push(b as u32);
                first_done = true;
            } else {
                arcs.push(acc as u32);
            }
            if arcs.len() > MAX_OID_LEN {
                return None;
            }
            acc = 0;
        }
        if continued {
            return None;
        }
        Some(Oid(arcs))
    }
}

fn push_subid(out: &mut SmallVec<[u8; 32]>, value: u64) {
    let mut tmp = [0u8; 10];
    let mut n = 0;
    let mut v = value;
    loop {
        tmp[n] = (v & 0x7F) as u8;
        v >>= 7;
        n += 1;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let mut byte = tmp[i];
        if i != 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Oid::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Oid::from_arcs(arcs)
    }
}

/// Construct an [`Oid`] from comma-separated arcs.
///
/// ```rust
/// use mibd::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),+ $(,)?) => {
        $crate::oid::Oid::from_arcs(&[$($arc as u32),+])
    };
}
