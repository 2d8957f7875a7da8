//! Community-based access control.
//!
//! Each community maps to a security name and a single readable
//! subtree. Authorization never changes what a requester can tell
//! apart: a denied OID resolves exactly like an unregistered one.

use bytes::Bytes;

use crate::oid::Oid;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// OID is readable under this community.
    Permitted,
    /// Community string is not configured.
    NoSuchCommunity,
    /// Community is known but the OID is outside its subtree.
    NotInSubtree,
}

/// One configured community.
#[derive(Debug, Clone)]
pub struct CommunityEntry {
    /// The community string as it appears on the wire.
    pub community: Bytes,
    /// Internal security name for logging.
    pub security_name: Bytes,
    /// Subtree this community may read.
    pub read_subtree: Oid,
}

/// The set of configured communities.
#[derive(Debug, Clone, Default)]
pub struct CommunityTable {
    entries: Vec<CommunityEntry>,
}

impl CommunityTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a community. A repeated community string shadows nothing;
    /// the first match wins on lookup.
    pub fn add(
        &mut self,
        community: impl Into<Bytes>,
        security_name: impl Into<Bytes>,
        read_subtree: Oid,
    ) {
        self.entries.push(CommunityEntry {
            community: community.into(),
            security_name: security_name.into(),
            read_subtree,
        });
    }

    /// Find the entry for a community string, byte-exact.
    pub fn lookup(&self, community: &[u8]) -> Option<&CommunityEntry> {
        self.entries.iter().find(|e| e.community == community)
    }

    /// Check whether `community` may read `oid`.
    pub fn authorize(&self, community: &[u8], oid: &Oid) -> Access {
        match self.lookup(community) {
            None => Access::NoSuchCommunity,
            Some(entry) if oid.starts_with(&entry.read_subtree) => Access::Permitted,
            Some(_) => Access::NotInSubtree,
        }
    }

    /// Whether no communities are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
