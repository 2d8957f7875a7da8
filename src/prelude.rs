//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mibd::prelude::*;
//! ```
//!
//! This imports:
//! - Core types: [`Agent`], [`Registry`], [`Oid`], [`Value`], [`VarBind`]
//! - Providers and table indexing: [`Provider`], [`IndexValue`]
//! - Error handling: [`Error`], [`Result`]
//! - The [`oid!`] macro for compile-time OID construction

pub use crate::agent::{Agent, AgentBuilder};
pub use crate::error::{Error, Result};
pub use crate::index::{IndexType, IndexValue};
pub use crate::oid::Oid;
pub use crate::pdu::Version;
pub use crate::provider::Provider;
pub use crate::registry::{ObjectKind, Registry};
pub use crate::value::Value;
pub use crate::varbind::VarBind;

#[doc(no_inline)]
pub use crate::oid;
