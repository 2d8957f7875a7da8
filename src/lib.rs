//! Read-only SNMP v1/v2c agent core.
//!
//! `mibd` answers GET, GETNEXT, and GETBULK over UDP from an
//! in-process registry of managed object instances. Values come from
//! constant or callback providers, table rows are addressed through
//! RFC 2578 index encoding, and plaintext community strings gate read
//! access to configured subtrees. SET is acknowledged but never
//! applied.
//!
//! # Example
//!
//! ```rust,no_run
//! use mibd::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut registry = Registry::new();
//!     registry.insert_scalar(
//!         oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1),
//!         Provider::constant("hello"),
//!     )?;
//!     registry.insert_row(
//!         &oid!(1, 3, 6, 1, 4, 1, 9999, 1, 2, 1, 2),
//!         &[IndexValue::from("row1")],
//!         Provider::constant("A"),
//!     )?;
//!
//!     let agent = Agent::builder()
//!         .bind("0.0.0.0:7757".parse().unwrap())
//!         .community("public", "agent", oid!(1, 3, 6, 1, 4, 1))
//!         .registry(registry)
//!         .build()
//!         .await?;
//!     agent.run().await
//! }
//! ```
//!
//! # Concurrency
//!
//! The registry lives behind a `tokio::sync::RwLock`. Request
//! resolution holds the read guard end to end, so a multi-varbind
//! GETBULK never observes a half-applied update;
//! [`Agent::spawn_updater`] mutates under the write guard on a fixed
//! period.

pub mod access;
pub mod agent;
pub mod ber;
pub mod error;
pub mod index;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod value;
pub mod varbind;

mod util;

pub use access::{Access, CommunityEntry, CommunityTable};
pub use agent::{Agent, AgentBuilder, DEFAULT_PORT};
pub use error::{Error, ErrorStatus, Result};
pub use index::{IndexType, IndexValue};
pub use oid::Oid;
pub use pdu::{Message, Pdu, PduType, Version};
pub use provider::Provider;
pub use registry::{Instance, ObjectKind, Registry};
pub use value::Value;
pub use varbind::VarBind;
