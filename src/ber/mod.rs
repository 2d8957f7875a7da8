//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Encoding and decoding of BER-encoded data as used in SNMP v1/v2c
//! messages, following X.690 with definite lengths only.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
