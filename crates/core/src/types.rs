//! Identifier types for SFM graphs
//!
//! This module defines the identifiers used throughout the graph model:
//! - GraphId: identifies an in-memory graph object
//! - NodeId: identifies a node in any of the graph's node collections
//! - RelationshipId: identifies a relationship
//!
//! All three are thin wrappers around UUID v4 and serialize as the plain
//! hyphenated UUID string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier using UUID v4
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The nil identifier (all zero bytes)
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Create an identifier from raw bytes
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            /// Parse an identifier from its string representation
            ///
            /// Returns None if the string is not a valid UUID.
            pub fn from_string(s: &str) -> Option<Self> {
                Uuid::parse_str(s).ok().map(Self)
            }

            /// True if this is the nil identifier
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of an in-memory graph
    GraphId
);

uuid_id!(
    /// Unique identifier of a node
    ///
    /// Node identifiers are global: the same id must not appear in two
    /// different node collections of one graph.
    NodeId
);

uuid_id!(
    /// Unique identifier of a relationship
    RelationshipId
);
