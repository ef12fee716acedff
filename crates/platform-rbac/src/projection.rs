//! # Projection
//!
//! Turns flat grant rows back into the nested tree a client renders:
//!
//! ```text
//! ProjectedRole
//!   └─ module[]            ← top-level modules the role holds actions on
//!        ├─ action[]
//!        └─ subModule[]    ← submodules whose parent is this module
//!             ├─ action[]
//!             └─ subModule[]
//! ```
//!
//! Roles, modules and actions keep first-seen order. Nothing is re-sorted.
//! Duplicates are dropped while accumulating, keyed by typed IDs.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::actions::{Action, ActionSummary};
use crate::ids::{ActionId, ModuleId, RoleId};
use crate::modules::Module;
use crate::roles::Role;

/// Which top-level modules a submodule may be attached under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmoduleScope {
    /// A submodule is attached wherever its parent appears, in any role.
    ///
    /// Submodule rows from every role share one node per module ID, so the
    /// node's action list is the union over all roles. A role can therefore
    /// see a submodule action that only another role holds. Use
    /// [`SubmoduleScope::WithinRole`] when each tree must show only its own
    /// grants.
    #[default]
    AcrossRoles,

    /// A submodule is attached only inside the role whose rows produced it
    WithinRole,
}

impl SubmoduleScope {
    /// Parse from a configuration value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "across_roles" | "global" => Some(Self::AcrossRoles),
            "within_role" | "role" => Some(Self::WithinRole),
            _ => None,
        }
    }

    /// Get string representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AcrossRoles => "across_roles",
            Self::WithinRole => "within_role",
        }
    }
}

/// One stored grant joined with its role, action and module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRow {
    /// Role holding the grant.
    pub role_id: RoleId,
    /// Role display name.
    pub role_name: String,
    /// Granted action.
    pub action: Action,
    /// Module the action belongs to.
    pub module: Module,
}

impl GrantRow {
    /// Join a grant's parts into a row.
    pub fn new(role: &Role, action: Action, module: Module) -> Self {
        Self {
            role_id: role.id,
            role_name: role.name.clone(),
            action,
            module,
        }
    }
}

/// A module node in a projected tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedModule {
    /// Module ID.
    pub id: ModuleId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Client route.
    pub path: Option<String>,
    /// Parent module.
    pub parent_id: Option<ModuleId>,
    /// Actions the role holds on this module.
    pub action: Vec<ActionSummary>,
    /// Child modules the role holds actions on.
    pub sub_module: Vec<ProjectedModule>,
}

/// The access tree of one role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedRole {
    /// Role ID.
    pub role_id: RoleId,
    /// Role display name.
    pub name: String,
    /// Top-level modules.
    pub module: Vec<ProjectedModule>,
}

impl ProjectedRole {
    /// A view for a role that holds no grants.
    pub fn empty(role: &Role) -> Self {
        Self {
            role_id: role.id,
            name: role.name.clone(),
            module: Vec::new(),
        }
    }

    /// Find a top-level module by ID.
    pub fn top_level(&self, id: ModuleId) -> Option<&ProjectedModule> {
        self.module.iter().find(|m| m.id == id)
    }

    /// Every action ID anywhere in the tree.
    pub fn action_ids(&self) -> HashSet<ActionId> {
        fn collect(node: &ProjectedModule, out: &mut HashSet<ActionId>) {
            out.extend(node.action.iter().map(|a| a.id));
            for child in &node.sub_module {
                collect(child, out);
            }
        }

        let mut out = HashSet::new();
        for node in &self.module {
            collect(node, &mut out);
        }
        out
    }
}

struct ModuleAcc {
    module: Module,
    actions: Vec<ActionSummary>,
    seen: HashSet<ActionId>,
}

impl ModuleAcc {
    fn push(&mut self, summary: ActionSummary) {
        if self.seen.insert(summary.id) {
            self.actions.push(summary);
        }
    }
}

#[derive(Default)]
struct ModuleGroup {
    entries: Vec<ModuleAcc>,
    index: HashMap<ModuleId, usize>,
}

impl ModuleGroup {
    fn entry(&mut self, module: &Module) -> &mut ModuleAcc {
        let idx = match self.index.get(&module.id) {
            Some(idx) => *idx,
            None => {
                self.entries.push(ModuleAcc {
                    module: module.clone(),
                    actions: Vec::new(),
                    seen: HashSet::new(),
                });
                self.index.insert(module.id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    /// Entry positions grouped by parent ID, in first-seen order.
    fn by_parent(&self) -> HashMap<ModuleId, Vec<usize>> {
        let mut children: HashMap<ModuleId, Vec<usize>> = HashMap::new();
        for (idx, acc) in self.entries.iter().enumerate() {
            if let Some(parent) = acc.module.parent_id {
                children.entry(parent).or_default().push(idx);
            }
        }
        children
    }

    fn build(
        &self,
        children: &HashMap<ModuleId, Vec<usize>>,
        acc: &ModuleAcc,
        path: &mut Vec<ModuleId>,
    ) -> ProjectedModule {
        path.push(acc.module.id);
        let mut sub_module = Vec::new();
        for idx in children.get(&acc.module.id).into_iter().flatten() {
            let child = &self.entries[*idx];
            if !path.contains(&child.module.id) {
                sub_module.push(self.build(children, child, path));
            }
        }
        path.pop();

        ProjectedModule {
            id: acc.module.id,
            name: acc.module.name.clone(),
            description: acc.module.description.clone(),
            path: acc.module.path.clone(),
            parent_id: acc.module.parent_id,
            action: acc.actions.clone(),
            sub_module,
        }
    }
}

struct RoleAcc {
    role_id: RoleId,
    name: String,
    top: ModuleGroup,
    subs: ModuleGroup,
}

/// Builds [`ProjectedRole`] trees from grant rows.
///
/// # Example
///
/// ```
/// use platform_rbac::actions::{Action, ActionKind};
/// use platform_rbac::ids::{ActionId, ModuleId, RoleId};
/// use platform_rbac::modules::Module;
/// use platform_rbac::projection::{GrantRow, Projector};
/// use platform_rbac::roles::Role;
///
/// let role = Role::new(RoleId(5), "Clerk");
/// let orders = Module::new(ModuleId(1), "Orders");
/// let items = Module::new(ModuleId(2), "OrderItems").with_parent(ModuleId(1));
///
/// let rows = vec![
///     GrantRow::new(&role, Action::new(ActionId(10), ModuleId(1), ActionKind::Read), orders),
///     GrantRow::new(&role, Action::new(ActionId(20), ModuleId(2), ActionKind::Write), items),
/// ];
///
/// let projected = Projector::default().project(&rows);
/// assert_eq!(projected.len(), 1);
/// assert_eq!(projected[0].module[0].sub_module[0].id, ModuleId(2));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    scope: SubmoduleScope,
}

impl Projector {
    /// Create a projector with an explicit submodule scope.
    pub fn new(scope: SubmoduleScope) -> Self {
        Self { scope }
    }

    /// The submodule scope in use.
    pub fn scope(&self) -> SubmoduleScope {
        self.scope
    }

    /// Project rows into one tree per role, roles in first-seen order.
    pub fn project(&self, rows: &[GrantRow]) -> Vec<ProjectedRole> {
        let (roles, shared_subs) = self.accumulate(rows);
        let shared_children = shared_subs.by_parent();

        let projected: Vec<ProjectedRole> = roles
            .iter()
            .map(|role| {
                let (subs, children) = match self.scope {
                    SubmoduleScope::AcrossRoles => (&shared_subs, shared_children.clone()),
                    SubmoduleScope::WithinRole => (&role.subs, role.subs.by_parent()),
                };
                let mut path = Vec::new();
                let module = role
                    .top
                    .entries
                    .iter()
                    .map(|top| subs.build(&children, top, &mut path))
                    .collect();

                ProjectedRole {
                    role_id: role.role_id,
                    name: role.name.clone(),
                    module,
                }
            })
            .collect();

        for (module_id, parent_id) in self.unattached_in(&roles, &shared_subs) {
            tracing::debug!(
                module_id = %module_id,
                parent_id = %parent_id,
                "Dropping submodule with no projected parent"
            );
        }
        projected
    }

    /// Submodules in `rows` that no projected tree reaches, in first-seen order.
    pub fn unattached(&self, rows: &[GrantRow]) -> Vec<ModuleId> {
        let (roles, shared_subs) = self.accumulate(rows);
        self.unattached_in(&roles, &shared_subs)
            .into_iter()
            .map(|(module_id, _)| module_id)
            .collect()
    }

    fn accumulate(&self, rows: &[GrantRow]) -> (Vec<RoleAcc>, ModuleGroup) {
        let mut roles: Vec<RoleAcc> = Vec::new();
        let mut role_index: HashMap<RoleId, usize> = HashMap::new();
        let mut shared_subs = ModuleGroup::default();

        for row in rows {
            let idx = *role_index.entry(row.role_id).or_insert_with(|| {
                roles.push(RoleAcc {
                    role_id: row.role_id,
                    name: row.role_name.clone(),
                    top: ModuleGroup::default(),
                    subs: ModuleGroup::default(),
                });
                roles.len() - 1
            });
            let role = &mut roles[idx];

            let summary = row.action.summary();
            if row.module.is_root() {
                role.top.entry(&row.module).push(summary);
            } else {
                let group = match self.scope {
                    SubmoduleScope::AcrossRoles => &mut shared_subs,
                    SubmoduleScope::WithinRole => &mut role.subs,
                };
                group.entry(&row.module).push(summary);
            }
        }

        (roles, shared_subs)
    }

    /// Walk down from each role's top-level modules; whatever is never
    /// reached was dropped, including every link of an orphaned chain.
    fn unattached_in(
        &self,
        roles: &[RoleAcc],
        shared_subs: &ModuleGroup,
    ) -> Vec<(ModuleId, ModuleId)> {
        let mut attached: HashSet<ModuleId> = HashSet::new();
        for role in roles {
            let subs = match self.scope {
                SubmoduleScope::AcrossRoles => shared_subs,
                SubmoduleScope::WithinRole => &role.subs,
            };
            let mut reachable: HashSet<ModuleId> = role.top.index.keys().copied().collect();
            loop {
                let before = reachable.len();
                for acc in &subs.entries {
                    if acc
                        .module
                        .parent_id
                        .is_some_and(|parent| reachable.contains(&parent))
                    {
                        reachable.insert(acc.module.id);
                    }
                }
                if reachable.len() == before {
                    break;
                }
            }
            attached.extend(reachable);
        }

        let mut dropped = Vec::new();
        let mut seen: HashSet<ModuleId> = HashSet::new();
        let pending = roles
            .iter()
            .flat_map(|role| role.subs.entries.iter())
            .chain(shared_subs.entries.iter());
        for acc in pending {
            let Some(parent) = acc.module.parent_id else {
                continue;
            };
            if !attached.contains(&acc.module.id) && seen.insert(acc.module.id) {
                dropped.push((acc.module.id, parent));
            }
        }
        dropped
    }
}

/// Project rows with the default submodule scope.
pub fn project(rows: &[GrantRow]) -> Vec<ProjectedRole> {
    Projector::default().project(rows)
}
