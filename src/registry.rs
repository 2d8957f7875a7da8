//! Object registry: the sorted instance map behind request resolution.
//!
//! Instances are kept in a `Vec` sorted by OID so `get` is a binary
//! search and `next` is a binary search plus an index bump, giving the
//! lexicographic successor GETNEXT/GETBULK walk over.
//!
//! Declared bases are tracked separately so a miss can be classified:
//! an OID under a known base is `noSuchInstance`, anything else is
//! `noSuchObject`.

use crate::error::{Error, Result};
use crate::index::{IndexValue, instance_oid, scalar_instance};
use crate::oid::Oid;
use crate::provider::Provider;
use crate::value::Value;

/// What a registered base OID names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A scalar object; its single instance lives at `base.0`.
    Scalar,
    /// A table column; instances live at `column . index-arcs`.
    TableColumn,
}

/// A registered instance.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Kind of the object this instance belongs to.
    pub kind: ObjectKind,
    /// Where the value comes from.
    pub provider: Provider,
}

/// Sorted map from instance OID to provider.
#[derive(Debug, Default)]
pub struct Registry {
    instances: Vec<(Oid, Instance)>,
    bases: Vec<(Oid, ObjectKind)>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a base OID without adding any instances under it.
    ///
    /// Re-declaring the same base with the same kind is a no-op.
    pub fn declare_base(&mut self, base: Oid, kind: ObjectKind) -> Result<()> {
        match self.bases.binary_search_by(|(b, _)| b.cmp(&base)) {
            Ok(idx) => {
                if self.bases[idx].1 != kind {
                    return Err(Error::DuplicateOid(base));
                }
            }
            Err(idx) => self.bases.insert(idx, (base, kind)),
        }
        Ok(())
    }

    /// Register a scalar object and its instance at `base.0`.
    pub fn insert_scalar(&mut self, base: Oid, provider: impl Into<Provider>) -> Result<()> {
        self.declare_base(base.clone(), ObjectKind::Scalar)?;
        self.insert_instance(scalar_instance(&base), ObjectKind::Scalar, provider.into())
    }

    /// Declare a table column base.
    pub fn declare_column(&mut self, column: Oid) -> Result<()> {
        self.declare_base(column, ObjectKind::TableColumn)
    }

    /// Register a row instance under a column, encoding the index.
    ///
    /// The column base is declared automatically if it is new.
    pub fn insert_row(
        &mut self,
        column: &Oid,
        index: &[IndexValue],
        provider: impl Into<Provider>,
    ) -> Result<()> {
        self.declare_base(column.clone(), ObjectKind::TableColumn)?;
        self.insert_instance(
            instance_oid(column, index),
            ObjectKind::TableColumn,
            provider.into(),
        )
    }

    /// Register an instance at an explicit OID.
    pub fn insert_instance(
        &mut self,
        oid: Oid,
        kind: ObjectKind,
        provider: impl Into<Provider>,
    ) -> Result<()> {
        match self.instances.binary_search_by(|(o, _)| o.cmp(&oid)) {
            Ok(_) => Err(Error::DuplicateOid(oid)),
            Err(idx) => {
                let provider = provider.into();
                self.instances.insert(idx, (oid, Instance { kind, provider }));
                Ok(())
            }
        }
    }

    /// Look up an instance by exact OID.
    pub fn get(&self, oid: &Oid) -> Option<&Instance> {
        self.instances
            .binary_search_by(|(o, _)| o.cmp(oid))
            .ok()
            .map(|idx| &self.instances[idx].1)
    }

    /// The first registered instance strictly after `oid`.
    ///
    /// `oid` itself need not be registered; a column or subtree base
    /// yields its first instance since a prefix sorts before its
    /// extensions.
    pub fn next(&self, oid: &Oid) -> Option<(&Oid, &Instance)> {
        let idx = match self.instances.binary_search_by(|(o, _)| o.cmp(oid)) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        };
        self.instances.get(idx).map(|(o, i)| (o, i))
    }

    /// The first registered instance.
    pub fn first(&self) -> Option<(&Oid, &Instance)> {
        self.instances.first().map(|(o, i)| (o, i))
    }

    /// Remove an instance by exact OID, returning it if present.
    pub fn remove(&mut self, oid: &Oid) -> Option<Instance> {
        self.instances
            .binary_search_by(|(o, _)| o.cmp(oid))
            .ok()
            .map(|idx| self.instances.remove(idx).1)
    }

    /// Remove a row instance by column and index values.
    pub fn remove_row(&mut self, column: &Oid, index: &[IndexValue]) -> Option<Instance> {
        self.remove(&instance_oid(column, index))
    }

    /// Replace the provider at an existing instance with a constant.
    pub fn set_value(&mut self, oid: &Oid, value: Value) -> Result<()> {
        let idx = self
            .instances
            .binary_search_by(|(o, _)| o.cmp(oid))
            .map_err(|_| Error::UnknownInstance(oid.clone()))?;
        self.instances[idx].1.provider = Provider::Constant(value);
        Ok(())
    }

    /// The declared base this OID falls under, if any.
    pub fn known_base(&self, oid: &Oid) -> Option<ObjectKind> {
        self.bases
            .iter()
            .find(|(base, _)| oid.starts_with(base))
            .map(|(_, kind)| *kind)
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instances are registered.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Iterate instances in OID order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &Instance)> {
        self.instances.iter().map(|(o, i)| (o, i))
    }
}
