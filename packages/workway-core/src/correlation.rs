//! Correlation IDs for cross-service tracing.
//!
//! Every outbound request carries a correlation ID — generated fresh,
//! supplied by the caller, or propagated from an inbound header — and every
//! raised [`WorkwayError`](crate::error::WorkwayError) records the ID of the
//! request that produced it. Log pipelines join on this value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header name used to propagate correlation IDs between services.
pub const CORRELATION_HEADER: &str = "x-workway-correlation-id";

/// Correlation ID attached to requests and errors.
///
/// Use `CorrelationId::NONE` for uncorrelated work, or `CorrelationId::new()`
/// to generate a fresh ID.
///
/// # Example
///
/// ```ignore
/// use workway_core::CorrelationId;
///
/// // Create a new random correlation ID
/// let cid = CorrelationId::new();
///
/// // Use NONE for uncorrelated work
/// let uncorrelated = CorrelationId::NONE;
/// assert!(uncorrelated.is_none());
///
/// // Propagate an inbound header value
/// let cid: CorrelationId = header_value.parse().unwrap_or_default();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Sentinel value for uncorrelated work.
    ///
    /// Uses nil UUID (`00000000-0000-0000-0000-000000000000`).
    pub const NONE: Self = Self(Uuid::nil());

    /// Create a new random correlation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Check if this is the NONE sentinel value.
    pub fn is_none(&self) -> bool {
        self.0.is_nil()
    }

    /// Check if this is a real correlation ID (not NONE).
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Get the inner UUID value.
    pub fn into_inner(self) -> Uuid {
        self.0
    }

    /// Get a reference to the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CorrelationId> for Uuid {
    fn from(cid: CorrelationId) -> Uuid {
        cid.0
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_nil_uuid() {
        assert!(CorrelationId::NONE.is_none());
        assert!(!CorrelationId::NONE.is_some());
        assert_eq!(CorrelationId::NONE.to_string(), "NONE");
    }

    #[test]
    fn new_ids_are_unique() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert!(a.is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn round_trips_through_display_and_parse() {
        let cid = CorrelationId::new();
        let parsed: CorrelationId = cid.to_string().parse().unwrap();
        assert_eq!(cid, parsed);
    }

    #[test]
    fn rejects_garbage_header_values() {
        assert!("not-a-uuid".parse::<CorrelationId>().is_err());
    }
}
