//! Role records
//!
//! Roles are owned by an external directory. Resolution only reads the id;
//! the name and status are carried for projections and sign-in lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RoleId;

/// Lifecycle status of a role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoleStatus {
    /// Role can be assigned and used
    #[default]
    Active,

    /// Role is disabled
    Inactive,
}

/// A role that permissions are granted to.
///
/// # Examples
///
/// ```
/// use platform_rbac::roles::Role;
/// use platform_rbac::ids::RoleId;
///
/// let role = Role::new(RoleId(5), "Auditor");
/// assert!(role.is_active());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role ID
    pub id: RoleId,

    /// Display name
    pub name: String,

    /// Whether the role is enabled
    pub status: RoleStatus,

    /// When the role was created
    pub created_at: DateTime<Utc>,

    /// When the role was last updated
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Create a new active role.
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            status: RoleStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the role status.
    pub fn with_status(mut self, status: RoleStatus) -> Self {
        self.status = status;
        self.updated_at = Utc::now();
        self
    }

    /// Check if the role is active.
    pub fn is_active(&self) -> bool {
        self.status == RoleStatus::Active
    }
}
