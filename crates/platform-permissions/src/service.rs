//! Permission service
//!
//! Wires the resolution engine to its collaborators. Writes go through
//! [`PermissionService::assign_permissions`]: load the catalog slice the
//! request touches, expand the closure, diff it against the role's grants
//! and apply the diff, all under the role's lock. Reads go through
//! [`PermissionService::project_permissions`] and its variants.

use platform_rbac::{
    grant_snapshot, reconcile, Action, ActionId, GrantDiff, GrantId, GrantRow, Module, ModuleId,
    ModuleTree, Permission, ProjectedRole, Projector, Propagator, RbacError, Role, RoleId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::PermissionServiceConfig;
use crate::error::{PermissionError, PermissionResult};
use crate::locks::RoleLocks;
use crate::store::{ActionCatalog, GrantStore, ModuleCatalog, RoleDirectory};

/// Whether an assignment starts from the role's stored grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignMode {
    /// A freshly created role; the existing snapshot is empty.
    Create,
    /// An existing role; the stored grants are reconciled.
    Update,
}

/// Which grants a projection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionScope {
    /// One role.
    Role(RoleId),
    /// Every role holding grants.
    All,
}

/// Permission assignment and projection service.
pub struct PermissionService {
    modules: Arc<dyn ModuleCatalog>,
    actions: Arc<dyn ActionCatalog>,
    roles: Arc<dyn RoleDirectory>,
    grants: Arc<dyn GrantStore>,
    locks: RoleLocks,
    config: PermissionServiceConfig,
}

impl std::fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PermissionService {
    /// Create a service over the given collaborators.
    ///
    /// Fails if the configuration does not validate.
    pub fn new(
        modules: Arc<dyn ModuleCatalog>,
        actions: Arc<dyn ActionCatalog>,
        roles: Arc<dyn RoleDirectory>,
        grants: Arc<dyn GrantStore>,
        config: PermissionServiceConfig,
    ) -> PermissionResult<Self> {
        config.validate()?;

        Ok(Self {
            modules,
            actions,
            roles,
            grants,
            locks: RoleLocks::new(),
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &PermissionServiceConfig {
        &self.config
    }

    /// Grant a role exactly the requested actions plus their implied parent READs.
    ///
    /// Returns the diff that was applied. Nothing is written when the request
    /// is empty or any requested action is unknown; revoking everything goes
    /// through [`PermissionService::remove_permissions_for_role`].
    #[instrument(skip(self, requested), fields(requested = requested.len()))]
    pub async fn assign_permissions(
        &self,
        role_id: RoleId,
        requested: &BTreeSet<ActionId>,
        mode: AssignMode,
    ) -> PermissionResult<GrantDiff> {
        if requested.is_empty() {
            return Err(RbacError::NoActionsRequested.into());
        }

        let _guard = self.locks.acquire(role_id, self.config.lock_timeout()).await?;

        if mode == AssignMode::Update && self.roles.find_role(role_id).await?.is_none() {
            return Err(RbacError::RoleNotFound(role_id).into());
        }

        let tree = self.load_tree(requested).await?;
        let closure = Propagator::with_depth(&tree, self.config.propagation_depth)
            .expand_closure(requested)?;

        let existing = match mode {
            AssignMode::Create => BTreeSet::new(),
            AssignMode::Update => {
                let stored = self.grants.grants_for_role(role_id).await?;
                grant_snapshot(role_id, &stored)?
            }
        };

        let diff = reconcile(role_id, closure.actions(), &existing);
        if diff.is_empty() {
            debug!("Grants already match the requested closure");
            return Ok(diff);
        }

        self.grants.apply_diff(&diff).await?;
        info!(
            added = diff.add_set.len(),
            removed = diff.remove_set.len(),
            implied = closure.propagated().len(),
            "Applied permission diff"
        );

        Ok(diff)
    }

    /// Assign permissions to a newly created role.
    pub async fn create_permissions(
        &self,
        role_id: RoleId,
        requested: &BTreeSet<ActionId>,
    ) -> PermissionResult<GrantDiff> {
        self.assign_permissions(role_id, requested, AssignMode::Create)
            .await
    }

    /// Replace the permissions of an existing role.
    pub async fn update_permissions(
        &self,
        role_id: RoleId,
        requested: &BTreeSet<ActionId>,
    ) -> PermissionResult<GrantDiff> {
        self.assign_permissions(role_id, requested, AssignMode::Update)
            .await
    }

    /// Project stored grants into nested module trees.
    #[instrument(skip(self))]
    pub async fn project_permissions(
        &self,
        scope: ProjectionScope,
    ) -> PermissionResult<Vec<ProjectedRole>> {
        let grants = match scope {
            ProjectionScope::Role(role_id) => self.grants.grants_for_role(role_id).await?,
            ProjectionScope::All => self.grants.all_grants().await?,
        };

        let rows = self.load_rows(&grants).await?;
        let projected = Projector::new(self.config.submodule_scope).project(&rows);
        debug!(grants = grants.len(), roles = projected.len(), "Projected permissions");

        Ok(projected)
    }

    /// Project one role's grants, failing when it holds none.
    pub async fn find_role_permissions(&self, role_id: RoleId) -> PermissionResult<ProjectedRole> {
        self.find_role_permissions_or_empty(role_id)
            .await?
            .ok_or(PermissionError::PermissionsNotFound(role_id))
    }

    /// Project one role's grants, or `None` when it holds none.
    pub async fn find_role_permissions_or_empty(
        &self,
        role_id: RoleId,
    ) -> PermissionResult<Option<ProjectedRole>> {
        let mut projected = self
            .project_permissions(ProjectionScope::Role(role_id))
            .await?;
        Ok(projected.pop())
    }

    /// The view handed out at sign-in.
    ///
    /// A role without grants still gets a view carrying its name.
    #[instrument(skip(self))]
    pub async fn role_permissions_for_sign_in(
        &self,
        role_id: RoleId,
    ) -> PermissionResult<ProjectedRole> {
        let role = self
            .roles
            .find_role(role_id)
            .await?
            .ok_or(RbacError::RoleNotFound(role_id))?;

        Ok(self
            .find_role_permissions_or_empty(role_id)
            .await?
            .unwrap_or_else(|| ProjectedRole::empty(&role)))
    }

    /// Delete one grant.
    #[instrument(skip(self))]
    pub async fn remove_permission(&self, grant_id: GrantId) -> PermissionResult<Permission> {
        let removed = self.grants.remove_grant(grant_id).await?;
        info!(role_id = %removed.role_id, action_id = %removed.action_id, "Removed permission");
        Ok(removed)
    }

    /// Delete every grant held by a role, typically when the role is deleted.
    ///
    /// Returns how many grants were removed.
    #[instrument(skip(self))]
    pub async fn remove_permissions_for_role(&self, role_id: RoleId) -> PermissionResult<usize> {
        let _guard = self.locks.acquire(role_id, self.config.lock_timeout()).await?;

        let removed = self.grants.remove_grants_for_role(role_id).await?;
        if removed == 0 {
            return Err(PermissionError::PermissionsNotFound(role_id));
        }

        info!(removed, "Removed role permissions");
        Ok(removed)
    }

    /// Find a role that exists and is active.
    pub async fn active_role(&self, role_id: RoleId) -> PermissionResult<Role> {
        match self.roles.find_role(role_id).await? {
            Some(role) if role.is_active() => Ok(role),
            _ => Err(RbacError::RoleNotFound(role_id).into()),
        }
    }

    /// Load the modules and actions a request can reach.
    async fn load_tree(&self, requested: &BTreeSet<ActionId>) -> PermissionResult<ModuleTree> {
        let ids: Vec<ActionId> = requested.iter().copied().collect();
        let found = self.actions.actions_by_ids(&ids).await?;

        let known: BTreeSet<ActionId> = found.iter().map(|a| a.id).collect();
        let missing: Vec<ActionId> = requested.difference(&known).copied().collect();
        if !missing.is_empty() {
            return Err(RbacError::ActionNotFound(missing).into());
        }

        let mut module_ids: Vec<ModuleId> = found.iter().map(|a| a.module_id).collect();
        module_ids.sort();
        module_ids.dedup();

        let modules = self.modules.modules_with_ancestors(&module_ids).await?;
        let loaded: Vec<ModuleId> = modules.iter().map(|m| m.id).collect();
        let actions = self.modules.actions_for_modules(&loaded).await?;

        Ok(ModuleTree::new(modules, actions)?)
    }

    /// Join grants with their action, module and role, keeping grant order.
    async fn load_rows(&self, grants: &[Permission]) -> PermissionResult<Vec<GrantRow>> {
        if grants.is_empty() {
            return Ok(Vec::new());
        }

        let action_ids: Vec<ActionId> = unique(grants.iter().map(|g| g.action_id));
        let actions: HashMap<ActionId, Action> = self
            .actions
            .actions_by_ids(&action_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let module_ids: Vec<ModuleId> = unique(actions.values().map(|a| a.module_id));
        let modules: HashMap<ModuleId, Module> = self
            .modules
            .modules_with_ancestors(&module_ids)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let role_ids: Vec<RoleId> = unique(grants.iter().map(|g| g.role_id));
        let roles: HashMap<RoleId, Role> = self
            .roles
            .roles_by_ids(&role_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut rows = Vec::with_capacity(grants.len());
        for grant in grants {
            let Some(action) = actions.get(&grant.action_id) else {
                warn!(
                    grant_id = %grant.id,
                    action_id = %grant.action_id,
                    "Grant references a missing action"
                );
                continue;
            };
            let Some(module) = modules.get(&action.module_id) else {
                warn!(
                    grant_id = %grant.id,
                    module_id = %action.module_id,
                    "Grant references a missing module"
                );
                continue;
            };
            let Some(role) = roles.get(&grant.role_id) else {
                warn!(
                    grant_id = %grant.id,
                    role_id = %grant.role_id,
                    "Grant references a missing role"
                );
                continue;
            };
            rows.push(GrantRow::new(role, *action, module.clone()));
        }

        Ok(rows)
    }
}

fn unique<T: Ord + Copy>(ids: impl Iterator<Item = T>) -> Vec<T> {
    ids.collect::<BTreeSet<T>>().into_iter().collect()
}
