//! In-memory collaborators
//!
//! Suitable for single-process deployments and tests. A database-backed
//! catalog and grant store implement the same traits.

use async_trait::async_trait;
use platform_rbac::{
    Action, ActionId, GrantDiff, GrantId, Module, ModuleId, Permission, Role, RoleId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::{ActionCatalog, GrantStore, ModuleCatalog, RoleDirectory};

#[derive(Default)]
struct CatalogState {
    modules: HashMap<ModuleId, Module>,
    module_order: Vec<ModuleId>,
    actions: HashMap<ActionId, Action>,
    action_order: Vec<ActionId>,
    roles: HashMap<RoleId, Role>,
}

impl CatalogState {
    fn insert_module(&mut self, module: Module) {
        if self.modules.insert(module.id, module.clone()).is_none() {
            self.module_order.push(module.id);
        }
    }

    fn insert_action(&mut self, action: Action) {
        if self.actions.insert(action.id, action).is_none() {
            self.action_order.push(action.id);
        }
    }
}

/// In-memory module, action and role catalog.
///
/// ```
/// use platform_permissions::memory::MemoryCatalog;
/// use platform_rbac::{Action, ActionId, ActionKind, Module, ModuleId, Role, RoleId};
///
/// let catalog = MemoryCatalog::new()
///     .with_module(Module::new(ModuleId(1), "Orders"))
///     .with_action(Action::new(ActionId(10), ModuleId(1), ActionKind::Read))
///     .with_role(Role::new(RoleId(5), "Clerk"));
/// # let _ = catalog;
/// ```
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl std::fmt::Debug for MemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCatalog").finish_non_exhaustive()
    }
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Add a module while building the catalog.
    pub fn with_module(mut self, module: Module) -> Self {
        self.state.get_mut().insert_module(module);
        self
    }

    /// Add an action while building the catalog.
    pub fn with_action(mut self, action: Action) -> Self {
        self.state.get_mut().insert_action(action);
        self
    }

    /// Add a role while building the catalog.
    pub fn with_role(mut self, role: Role) -> Self {
        self.state.get_mut().roles.insert(role.id, role);
        self
    }

    /// Insert or replace a module.
    pub async fn insert_module(&self, module: Module) {
        self.state.write().await.insert_module(module);
    }

    /// Insert or replace an action.
    pub async fn insert_action(&self, action: Action) {
        self.state.write().await.insert_action(action);
    }

    /// Insert or replace a role.
    pub async fn insert_role(&self, role: Role) {
        self.state.write().await.roles.insert(role.id, role);
    }

    /// Delete an action from the catalog. Grants that reference it dangle.
    pub async fn remove_action(&self, id: ActionId) -> Option<Action> {
        let mut state = self.state.write().await;
        state.action_order.retain(|a| *a != id);
        state.actions.remove(&id)
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleCatalog for MemoryCatalog {
    async fn modules_with_ancestors(&self, ids: &[ModuleId]) -> StoreResult<Vec<Module>> {
        let state = self.state.read().await;
        let mut wanted: HashSet<ModuleId> = HashSet::new();

        for id in ids {
            let mut current = Some(*id);
            while let Some(module_id) = current {
                if !wanted.insert(module_id) {
                    break;
                }
                current = state.modules.get(&module_id).and_then(|m| m.parent_id);
            }
        }

        Ok(state
            .module_order
            .iter()
            .filter(|id| wanted.contains(id))
            .filter_map(|id| state.modules.get(id).cloned())
            .collect())
    }

    async fn actions_for_modules(&self, ids: &[ModuleId]) -> StoreResult<Vec<Action>> {
        let state = self.state.read().await;
        let wanted: HashSet<ModuleId> = ids.iter().copied().collect();

        Ok(state
            .action_order
            .iter()
            .filter_map(|id| state.actions.get(id))
            .filter(|action| wanted.contains(&action.module_id))
            .copied()
            .collect())
    }
}

#[async_trait]
impl ActionCatalog for MemoryCatalog {
    async fn actions_by_ids(&self, ids: &[ActionId]) -> StoreResult<Vec<Action>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.actions.get(id))
            .copied()
            .collect())
    }
}

#[async_trait]
impl RoleDirectory for MemoryCatalog {
    async fn find_role(&self, id: RoleId) -> StoreResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&id).cloned())
    }

    async fn roles_by_ids(&self, ids: &[RoleId]) -> StoreResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.roles.get(id))
            .cloned()
            .collect())
    }
}

/// In-memory grant store.
///
/// Grant IDs are assigned from a monotonically increasing counter starting
/// at 1 and are never reused.
pub struct MemoryGrantStore {
    grants: RwLock<Vec<Permission>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for MemoryGrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGrantStore")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemoryGrantStore {
    /// Create an empty grant store.
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored grants.
    pub async fn len(&self) -> usize {
        self.grants.read().await.len()
    }

    /// Check if the store holds no grants.
    pub async fn is_empty(&self) -> bool {
        self.grants.read().await.is_empty()
    }

    fn next_grant_id(&self) -> GrantId {
        GrantId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MemoryGrantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn grants_for_role(&self, role_id: RoleId) -> StoreResult<Vec<Permission>> {
        let grants = self.grants.read().await;
        Ok(grants
            .iter()
            .filter(|g| g.role_id == role_id)
            .copied()
            .collect())
    }

    async fn all_grants(&self) -> StoreResult<Vec<Permission>> {
        Ok(self.grants.read().await.clone())
    }

    async fn apply_diff(&self, diff: &GrantDiff) -> StoreResult<Vec<Permission>> {
        let mut grants = self.grants.write().await;

        // Validate every insert before touching the rows.
        for action_id in &diff.add_set {
            let held = grants.iter().any(|g| {
                g.role_id == diff.role_id
                    && g.action_id == *action_id
                    && !diff.remove_set.contains(action_id)
            });
            if held {
                return Err(StoreError::DuplicateGrant {
                    role_id: diff.role_id,
                    action_id: *action_id,
                });
            }
        }

        grants.retain(|g| !(g.role_id == diff.role_id && diff.remove_set.contains(&g.action_id)));

        let inserted: Vec<Permission> = diff
            .add_set
            .iter()
            .map(|action_id| Permission::new(self.next_grant_id(), diff.role_id, *action_id))
            .collect();
        grants.extend(inserted.iter().copied());

        Ok(inserted)
    }

    async fn remove_grant(&self, id: GrantId) -> StoreResult<Permission> {
        let mut grants = self.grants.write().await;
        let index = grants
            .iter()
            .position(|g| g.id == id)
            .ok_or(StoreError::UnknownGrant(id))?;
        Ok(grants.remove(index))
    }

    async fn remove_grants_for_role(&self, role_id: RoleId) -> StoreResult<usize> {
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|g| g.role_id != role_id);
        Ok(before - grants.len())
    }
}
