//! Request resolution: one request PDU in, one response PDU out.
//!
//! Resolution is pure with respect to the registry snapshot it is
//! handed; the dispatch loop holds the registry read lock for the
//! whole call so GETBULK walks never observe a half-applied update.
//!
//! Authorization is folded into lookup: an OID the community may not
//! read resolves exactly like an unregistered one, so a requester
//! cannot probe the registry shape outside its subtree.

use tracing::warn;

use crate::access::{Access, CommunityTable};
use crate::error::{Error, ErrorStatus};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType, Version};
use crate::registry::{Instance, Registry};
use crate::value::Value;
use crate::varbind::VarBind;

/// Cap on varbinds per request; beyond this the response is `tooBig`.
pub const MAX_VARBINDS: usize = 64;

/// Cap on GETBULK max-repetitions; larger requests are clamped.
pub const MAX_REPETITIONS_CAP: usize = 256;

/// Resolves one request against a registry snapshot.
pub struct Resolver<'a> {
    registry: &'a Registry,
    communities: &'a CommunityTable,
    community: &'a [u8],
    version: Version,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a Registry,
        communities: &'a CommunityTable,
        community: &'a [u8],
        version: Version,
    ) -> Self {
        Self {
            registry,
            communities,
            community,
            version,
        }
    }

    /// Resolve a request PDU. Returns `None` when no response should
    /// be sent at all (inbound responses, GETBULK over v1).
    pub fn resolve(&self, pdu: &Pdu) -> Option<Pdu> {
        if pdu.pdu_type == PduType::Response {
            return None;
        }
        if pdu.varbinds.len() > MAX_VARBINDS {
            let error = Error::TooManyVarbinds {
                count: pdu.varbinds.len(),
                max: MAX_VARBINDS,
            };
            warn!(%error, "refusing request, answering tooBig");
            return Some(Pdu::error_response(
                pdu.request_id,
                ErrorStatus::TooBig,
                0,
                Vec::new(),
            ));
        }
        match pdu.pdu_type {
            PduType::GetRequest => {
                let varbinds = pdu
                    .varbinds
                    .iter()
                    .map(|vb| self.resolve_get(&vb.oid))
                    .collect();
                Some(self.finish(pdu, varbinds))
            }
            PduType::GetNextRequest => {
                let varbinds = pdu
                    .varbinds
                    .iter()
                    .map(|vb| self.next_in_view(&vb.oid))
                    .collect();
                Some(self.finish(pdu, varbinds))
            }
            PduType::GetBulkRequest => self.resolve_bulk(pdu),
            PduType::SetRequest => Some(self.refuse_set(pdu)),
            PduType::Response => None,
        }
    }

    /// GET one OID.
    fn resolve_get(&self, oid: &Oid) -> VarBind {
        if self.authorize(oid) != Access::Permitted {
            return VarBind::new(oid.clone(), Value::NoSuchObject);
        }
        match self.registry.get(oid) {
            Some(instance) => self.read_value(oid, instance),
            None => {
                let value = match self.registry.known_base(oid) {
                    Some(_) => Value::NoSuchInstance,
                    None => Value::NoSuchObject,
                };
                VarBind::new(oid.clone(), value)
            }
        }
    }

    /// GETNEXT one OID: the first readable instance strictly after it.
    ///
    /// Instances outside the community's subtree are skipped over, so
    /// the walk glides across forbidden regions instead of ending
    /// there.
    fn next_in_view(&self, oid: &Oid) -> VarBind {
        let mut cursor = oid;
        loop {
            match self.registry.next(cursor) {
                Some((next_oid, instance)) => {
                    if self.authorize(next_oid) == Access::Permitted {
                        return self.read_value(next_oid, instance);
                    }
                    cursor = next_oid;
                }
                None => return VarBind::new(oid.clone(), Value::EndOfMibView),
            }
        }
    }

    /// GETBULK: non-repeaters get a single GETNEXT step, repeaters
    /// are advanced up to max-repetitions times, round-major.
    fn resolve_bulk(&self, pdu: &Pdu) -> Option<Pdu> {
        if self.version == Version::V1 {
            // GETBULK does not exist in v1
            return None;
        }
        let non_repeaters = pdu.non_repeaters().min(pdu.varbinds.len());
        let max_repetitions = pdu.max_repetitions().min(MAX_REPETITIONS_CAP);

        let mut varbinds = Vec::new();
        for vb in &pdu.varbinds[..non_repeaters] {
            varbinds.push(self.next_in_view(&vb.oid));
        }

        let mut cursors: Vec<(Oid, bool)> = pdu.varbinds[non_repeaters..]
            .iter()
            .map(|vb| (vb.oid.clone(), false))
            .collect();
        for _ in 0..max_repetitions {
            for (cursor, exhausted) in &mut cursors {
                if *exhausted {
                    varbinds.push(VarBind::new(cursor.clone(), Value::EndOfMibView));
                    continue;
                }
                let vb = self.next_in_view(cursor);
                if vb.value == Value::EndOfMibView {
                    *exhausted = true;
                } else {
                    *cursor = vb.oid.clone();
                }
                varbinds.push(vb);
            }
        }
        Some(Pdu::response(pdu.request_id, varbinds))
    }

    /// SET is answered, never applied.
    fn refuse_set(&self, pdu: &Pdu) -> Pdu {
        let status = match self.version {
            // v1 predates notWritable
            Version::V1 => ErrorStatus::NoSuchName,
            Version::V2c => ErrorStatus::NotWritable,
        };
        Pdu::error_response(pdu.request_id, status, 1, pdu.varbinds.clone())
    }

    /// Build the response, downgrading v2c exception values to a v1
    /// `noSuchName` error with the request varbinds echoed back.
    fn finish(&self, request: &Pdu, varbinds: Vec<VarBind>) -> Pdu {
        if self.version == Version::V1 {
            if let Some(idx) = varbinds.iter().position(|vb| vb.value.is_exception()) {
                return Pdu::error_response(
                    request.request_id,
                    ErrorStatus::NoSuchName,
                    (idx + 1) as i32,
                    request.varbinds.clone(),
                );
            }
        }
        Pdu::response(request.request_id, varbinds)
    }

    fn authorize(&self, oid: &Oid) -> Access {
        self.communities.authorize(self.community, oid)
    }

    /// Read the instance value, degrading provider failures to
    /// `noSuchInstance` so one bad callback cannot poison a response.
    fn read_value(&self, oid: &Oid, instance: &Instance) -> VarBind {
        match instance.provider.read() {
            Ok(value) => VarBind::new(oid.clone(), value),
            Err(error) => {
                warn!(oid = %oid, %error, "value provider failed");
                VarBind::new(oid.clone(), Value::NoSuchInstance)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::index::IndexValue;
    use crate::oid;
    use crate::provider::Provider;

    fn fixtures() -> (Registry, CommunityTable) {
        let mut registry = Registry::new();
        registry
            .insert_scalar(oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1), Provider::constant("hello"))
            .unwrap();
        let column = oid!(1, 3, 6, 1, 4, 1, 9999, 1, 2, 1, 2);
        registry
            .insert_row(&column, &[IndexValue::from("r1")], Provider::constant("A"))
            .unwrap();
        registry
            .insert_row(&column, &[IndexValue::from("r2")], Provider::constant("B"))
            .unwrap();
        let mut communities = CommunityTable::new();
        communities.add("public", "agent", oid!(1, 3, 6, 1, 4, 1));
        (registry, communities)
    }

    fn resolver<'a>(
        registry: &'a Registry,
        communities: &'a CommunityTable,
        version: Version,
    ) -> Resolver<'a> {
        Resolver::new(registry, communities, b"public", version)
    }

    fn row_oid(suffix: &'static str) -> Oid {
        crate::index::instance_oid(
            &oid!(1, 3, 6, 1, 4, 1, 9999, 1, 2, 1, 2),
            &[IndexValue::from(suffix)],
        )
    }

    #[test]
    fn test_get_scalar() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::request(
            PduType::GetRequest,
            1,
            vec![oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 0)],
        );
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.pdu_type, PduType::Response);
        assert_eq!(response.request_id, 1);
        assert_eq!(response.error_status, 0);
        assert_eq!(
            response.varbinds[0].value,
            Value::OctetString("hello".into())
        );
    }

    #[test]
    fn test_get_miss_classification() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::request(
            PduType::GetRequest,
            2,
            vec![
                // registered base, unregistered instance
                oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 1),
                // nothing registered anywhere near
                oid!(1, 3, 6, 1, 4, 1, 7777, 1),
            ],
        );
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.varbinds[0].value, Value::NoSuchInstance);
        assert_eq!(response.varbinds[1].value, Value::NoSuchObject);
    }

    #[test]
    fn test_get_unauthorized_looks_unregistered() {
        let (mut registry, communities) = fixtures();
        registry
            .insert_scalar(oid!(1, 3, 6, 1, 2, 1, 99), Provider::constant("secret"))
            .unwrap();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::request(
            PduType::GetRequest,
            3,
            vec![oid!(1, 3, 6, 1, 2, 1, 99, 0)],
        );
        let response = r.resolve(&request).unwrap();
        // identical to a miss outside any base
        assert_eq!(response.varbinds[0].value, Value::NoSuchObject);
    }

    #[test]
    fn test_get_next_walks_rows() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let column = oid!(1, 3, 6, 1, 4, 1, 9999, 1, 2, 1, 2);
        let request = Pdu::request(PduType::GetNextRequest, 4, vec![column]);
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.varbinds[0].oid, row_oid("r1"));
        assert_eq!(response.varbinds[0].value, Value::OctetString("A".into()));

        let request = Pdu::request(PduType::GetNextRequest, 5, vec![row_oid("r1")]);
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.varbinds[0].oid, row_oid("r2"));
        assert_eq!(response.varbinds[0].value, Value::OctetString("B".into()));
    }

    #[test]
    fn test_get_next_end_of_view() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::request(PduType::GetNextRequest, 6, vec![oid!(2)]);
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.varbinds[0].oid, oid!(2));
        assert_eq!(response.varbinds[0].value, Value::EndOfMibView);
    }

    #[test]
    fn test_get_next_skips_forbidden() {
        let (mut registry, communities) = fixtures();
        // registered before the readable subtree
        registry
            .insert_scalar(oid!(1, 3, 6, 1, 2, 1, 1), Provider::constant("sysDescr"))
            .unwrap();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::request(PduType::GetNextRequest, 7, vec![oid!(1, 3)]);
        let response = r.resolve(&request).unwrap();
        // the forbidden instance is glided over
        assert_eq!(
            response.varbinds[0].oid,
            oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 0)
        );
    }

    #[test]
    fn test_bulk_non_repeaters_only() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::bulk_request(8, 1, 5, vec![oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1)]);
        let response = r.resolve(&request).unwrap();
        // single GETNEXT step, no repetitions
        assert_eq!(response.varbinds.len(), 1);
        assert_eq!(
            response.varbinds[0].oid,
            oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 0)
        );
    }

    #[test]
    fn test_bulk_repeats_until_end_of_view() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let column = oid!(1, 3, 6, 1, 4, 1, 9999, 1, 2, 1, 2);
        let request = Pdu::bulk_request(9, 0, 5, vec![column]);
        let response = r.resolve(&request).unwrap();
        // every repetition yields one binding per repeater, padded
        // with endOfMibView once the view is exhausted
        assert_eq!(response.varbinds.len(), 5);
        assert_eq!(response.varbinds[0].oid, row_oid("r1"));
        assert_eq!(response.varbinds[1].oid, row_oid("r2"));
        for vb in &response.varbinds[2..] {
            assert_eq!(vb.value, Value::EndOfMibView);
        }
    }

    #[test]
    fn test_bulk_zero_repetitions() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::bulk_request(10, 0, 0, vec![oid!(1, 3)]);
        let response = r.resolve(&request).unwrap();
        assert!(response.varbinds.is_empty());
    }

    #[test]
    fn test_bulk_matches_getnext_for_single_step() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let start = oid!(1, 3, 6, 1, 4, 1, 9999);
        let next = r
            .resolve(&Pdu::request(PduType::GetNextRequest, 11, vec![start.clone()]))
            .unwrap();
        let bulk = r
            .resolve(&Pdu::bulk_request(11, 0, 1, vec![start]))
            .unwrap();
        assert_eq!(next.varbinds, bulk.varbinds);
    }

    #[test]
    fn test_bulk_dropped_for_v1() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V1);
        let request = Pdu::bulk_request(12, 0, 5, vec![oid!(1, 3)]);
        assert!(r.resolve(&request).is_none());
    }

    #[test]
    fn test_v1_downgrades_exceptions() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V1);
        let request = Pdu::request(
            PduType::GetRequest,
            13,
            vec![
                oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 0),
                oid!(1, 3, 6, 1, 4, 1, 7777, 1),
            ],
        );
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.error_status, ErrorStatus::NoSuchName.as_i32());
        assert_eq!(response.error_index, 2);
        // v1 echoes the request varbinds untouched
        assert_eq!(response.varbinds, request.varbinds);
    }

    #[test]
    fn test_set_refused() {
        let (registry, communities) = fixtures();
        let request = Pdu {
            pdu_type: PduType::SetRequest,
            request_id: 14,
            error_status: 0,
            error_index: 0,
            varbinds: vec![VarBind::new(
                oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 0),
                Value::Integer(1),
            )],
        };
        let r = resolver(&registry, &communities, Version::V2c);
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.error_status, ErrorStatus::NotWritable.as_i32());
        assert_eq!(response.error_index, 1);
        assert_eq!(response.varbinds, request.varbinds);

        let r = resolver(&registry, &communities, Version::V1);
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.error_status, ErrorStatus::NoSuchName.as_i32());
    }

    #[test]
    fn test_too_many_varbinds() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        let oids = (0..=MAX_VARBINDS as u32)
            .map(|i| oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1).child(i))
            .collect();
        let request = Pdu::request(PduType::GetRequest, 15, oids);
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.error_status, ErrorStatus::TooBig.as_i32());
        assert!(response.varbinds.is_empty());
    }

    #[test]
    fn test_inbound_response_ignored() {
        let (registry, communities) = fixtures();
        let r = resolver(&registry, &communities, Version::V2c);
        assert!(r.resolve(&Pdu::response(16, Vec::new())).is_none());
    }

    #[test]
    fn test_provider_failure_degrades() {
        let (mut registry, communities) = fixtures();
        registry
            .insert_scalar(
                oid!(1, 3, 6, 1, 4, 1, 9999, 1, 3),
                Provider::dynamic(|| Err(Error::provider("sensor offline"))),
            )
            .unwrap();
        let r = resolver(&registry, &communities, Version::V2c);
        let request = Pdu::request(
            PduType::GetRequest,
            17,
            vec![oid!(1, 3, 6, 1, 4, 1, 9999, 1, 3, 0)],
        );
        let response = r.resolve(&request).unwrap();
        assert_eq!(response.varbinds[0].value, Value::NoSuchInstance);
    }
}
