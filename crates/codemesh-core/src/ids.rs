//! Newtype identifiers for every persisted entity.
//!
//! All are thin wrappers over `Uuid` so that a `SourceId` can never be
//! passed where a `ProjectId` is expected at a call site, even though
//! both are stored as `uuid` columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
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

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(TenantId);
uuid_id!(ProjectId);
uuid_id!(SourceId);
uuid_id!(IndexRunId);
uuid_id!(FileId);
uuid_id!(SymbolId);
uuid_id!(SymbolEdgeId);
uuid_id!(ColumnReferenceId);
uuid_id!(SymbolEmbeddingId);
