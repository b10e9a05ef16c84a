//! Unique identifiers for dispatcher entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a socket endpoint
///
/// Every endpoint gets a fresh id at pair creation. The id of the peer is
/// recorded on each endpoint and survives peer teardown, so diagnostics can
/// always name the other side even after it is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId(Uuid);

impl EndpointId {
    /// Creates a new random endpoint ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an endpoint ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EndpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({})", self.0)
    }
}

/// Unique identifier for a socket pair
///
/// Both endpoints of a pair carry the same `PairId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairId(Uuid);

impl PairId {
    /// Creates a new random pair ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a pair ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PairId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pair({})", self.0)
    }
}
