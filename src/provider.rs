//! Value providers for registered instances.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

/// Source of the value for a registered instance.
///
/// Constant providers hold a value directly; dynamic providers invoke
/// a callback on every read, so the value reflects the moment the
/// request is resolved.
#[derive(Clone)]
pub enum Provider {
    Constant(Value),
    Dynamic(Arc<dyn Fn() -> Result<Value> + Send + Sync>),
}

impl Provider {
    /// Provider that always yields the same value.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    /// Provider that computes its value on every read.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Produce the current value.
    pub fn read(&self) -> Result<Value> {
        match self {
            Self::Constant(value) => Ok(value.clone()),
            Self::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Dynamic(_) => f.debug_tuple("Dynamic").field(&"<fn>").finish(),
        }
    }
}

impl From<Value> for Provider {
    fn from(value: Value) -> Self {
        Self::Constant(value)
    }
}
