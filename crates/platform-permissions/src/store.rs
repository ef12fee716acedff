//! Collaborator interfaces
//!
//! The engine never performs I/O. These traits describe what the service
//! needs from the module catalog, the role directory and the grant store.
//! Implementations are constructed once and injected into
//! [`PermissionService`](crate::service::PermissionService).

use async_trait::async_trait;
use platform_rbac::{Action, ActionId, GrantDiff, GrantId, Module, ModuleId, Permission, Role, RoleId};

use crate::error::StoreResult;

/// Read access to the module catalog.
#[async_trait]
pub trait ModuleCatalog: Send + Sync {
    /// Load the given modules together with every ancestor.
    ///
    /// Unknown IDs are skipped; the tree reports them when they are walked.
    async fn modules_with_ancestors(&self, ids: &[ModuleId]) -> StoreResult<Vec<Module>>;

    /// Load every action defined on the given modules.
    async fn actions_for_modules(&self, ids: &[ModuleId]) -> StoreResult<Vec<Action>>;
}

/// Read access to the action catalog.
#[async_trait]
pub trait ActionCatalog: Send + Sync {
    /// Load the actions with the given IDs.
    ///
    /// Returns only the actions that exist; the caller compares against the
    /// request to detect missing IDs.
    async fn actions_by_ids(&self, ids: &[ActionId]) -> StoreResult<Vec<Action>>;
}

/// Read access to roles.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Find a role by ID.
    async fn find_role(&self, id: RoleId) -> StoreResult<Option<Role>>;

    /// Load the roles with the given IDs.
    async fn roles_by_ids(&self, ids: &[RoleId]) -> StoreResult<Vec<Role>>;
}

/// Persistent grant rows.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Grants held by one role, in insertion order.
    async fn grants_for_role(&self, role_id: RoleId) -> StoreResult<Vec<Permission>>;

    /// Every grant, in insertion order.
    async fn all_grants(&self) -> StoreResult<Vec<Permission>>;

    /// Apply a diff atomically: either every insert and delete lands or none does.
    ///
    /// Returns the rows inserted.
    async fn apply_diff(&self, diff: &GrantDiff) -> StoreResult<Vec<Permission>>;

    /// Delete one grant row.
    async fn remove_grant(&self, id: GrantId) -> StoreResult<Permission>;

    /// Delete every grant held by a role, returning how many were removed.
    async fn remove_grants_for_role(&self, role_id: RoleId) -> StoreResult<usize>;
}
