//! # Permissions
//!
//! Stored grant rows. A permission assigns one action to one role; the pair
//! `(role_id, action_id)` is unique. Rows are created and destroyed by
//! applying a [`GrantDiff`](crate::diff::GrantDiff), never edited in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{RbacError, RbacResult};
use crate::ids::{ActionId, GrantId, RoleId};

/// A grant of one action to one role.
///
/// # Example
///
/// ```
/// use platform_rbac::permissions::Permission;
/// use platform_rbac::ids::{ActionId, GrantId, RoleId};
///
/// let grant = Permission::new(GrantId(1), RoleId(5), ActionId(10));
/// assert_eq!(grant.role_id, RoleId(5));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Grant row ID.
    pub id: GrantId,
    /// Role receiving the action.
    pub role_id: RoleId,
    /// Action granted.
    pub action_id: ActionId,
}

impl Permission {
    /// Create a new grant row.
    pub fn new(id: GrantId, role_id: RoleId, action_id: ActionId) -> Self {
        Self {
            id,
            role_id,
            action_id,
        }
    }
}

/// Build the set of actions a role currently holds from stored rows.
///
/// Rows belonging to other roles are ignored, so a store may hand over a
/// wider scan than strictly needed.
///
/// # Errors
///
/// [`RbacError::DuplicateGrantAttempt`] if the role holds the same action
/// twice. That can only happen when a writer bypassed reconciliation.
///
/// # Example
///
/// ```
/// use platform_rbac::permissions::{grant_snapshot, Permission};
/// use platform_rbac::ids::{ActionId, GrantId, RoleId};
///
/// let rows = vec![
///     Permission::new(GrantId(1), RoleId(5), ActionId(10)),
///     Permission::new(GrantId(2), RoleId(5), ActionId(20)),
///     Permission::new(GrantId(3), RoleId(6), ActionId(10)),
/// ];
///
/// let held = grant_snapshot(RoleId(5), &rows).unwrap();
/// assert_eq!(held.len(), 2);
/// ```
pub fn grant_snapshot(role_id: RoleId, grants: &[Permission]) -> RbacResult<BTreeSet<ActionId>> {
    let mut held = BTreeSet::new();
    for grant in grants.iter().filter(|g| g.role_id == role_id) {
        if !held.insert(grant.action_id) {
            return Err(RbacError::DuplicateGrantAttempt {
                role_id,
                action_id: grant.action_id,
            });
        }
    }
    Ok(held)
}
