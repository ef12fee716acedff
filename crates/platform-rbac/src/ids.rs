//! # Identifiers
//!
//! Typed identifiers for every entity the engine touches. Each id is a
//! distinct newtype over the catalog's numeric key, so a module id can never
//! be looked up in an action set by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw numeric value.
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a protectable module.
    ModuleId
);

numeric_id!(
    /// Identifier of an action (one verb scoped to one module).
    ActionId
);

numeric_id!(
    /// Identifier of a role.
    RoleId
);

numeric_id!(
    /// Identifier of a stored grant row.
    GrantId
);
