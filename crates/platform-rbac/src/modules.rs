//! # Modules
//!
//! Protectable modules and the in-memory tree they form.
//!
//! Modules form a forest: each module has at most one parent, and a module
//! without a parent is a root. Each module exposes a small catalog of
//! actions, at most one per [`ActionKind`].
//!
//! ```text
//! Orders (READ)                 ← root
//!   └─ OrderItems (WRITE)       ← submodule, parent = Orders
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::actions::{Action, ActionKind};
use crate::error::{RbacError, RbacResult};
use crate::ids::{ActionId, ModuleId};

/// A protectable resource node.
///
/// # Example
///
/// ```
/// use platform_rbac::modules::Module;
/// use platform_rbac::ids::ModuleId;
///
/// let orders = Module::new(ModuleId(1), "Orders").with_path("/orders");
/// let items = Module::new(ModuleId(2), "OrderItems").with_parent(ModuleId(1));
///
/// assert!(orders.is_root());
/// assert_eq!(items.parent_id, Some(ModuleId(1)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Module ID.
    pub id: ModuleId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Client route the module maps to.
    pub path: Option<String>,
    /// Parent module, `None` for roots.
    pub parent_id: Option<ModuleId>,
}

impl Module {
    /// Create a new root module.
    pub fn new(id: ModuleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            path: None,
            parent_id: None,
        }
    }

    /// Set the parent module.
    pub fn with_parent(mut self, parent_id: ModuleId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the client path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if this module is a root (has no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Immutable snapshot of the module catalog used for one resolution.
///
/// The tree only needs the modules a request touches plus their ancestor
/// chains. A parent that was not loaded is tolerated until something walks
/// into it, at which point [`RbacError::ModuleNotFound`] is raised.
#[derive(Debug, Clone, Default)]
pub struct ModuleTree {
    /// Modules by ID
    modules: HashMap<ModuleId, Module>,
    /// Catalog order of module IDs
    order: Vec<ModuleId>,
    /// Actions by ID
    actions: HashMap<ActionId, Action>,
    /// Action IDs per module, in catalog order
    module_actions: HashMap<ModuleId, Vec<ActionId>>,
}

impl ModuleTree {
    /// Build a tree from catalog rows.
    ///
    /// Repeated rows for the same module or action ID are collapsed to the
    /// first occurrence.
    ///
    /// # Errors
    ///
    /// - [`RbacError::ModuleNotFound`] if an action references an unloaded module
    /// - [`RbacError::DuplicateActionKind`] if a module has two actions of one kind
    /// - [`RbacError::CyclicHierarchy`] if the loaded parent links form a cycle
    pub fn new<M, A>(modules: M, actions: A) -> RbacResult<Self>
    where
        M: IntoIterator<Item = Module>,
        A: IntoIterator<Item = Action>,
    {
        let mut tree = Self::default();

        for module in modules {
            if tree.modules.contains_key(&module.id) {
                continue;
            }
            tree.order.push(module.id);
            tree.modules.insert(module.id, module);
        }

        for action in actions {
            if tree.actions.contains_key(&action.id) {
                continue;
            }
            if !tree.modules.contains_key(&action.module_id) {
                return Err(RbacError::ModuleNotFound(action.module_id));
            }

            let siblings = tree.module_actions.entry(action.module_id).or_default();
            let clash = siblings
                .iter()
                .filter_map(|id| tree.actions.get(id))
                .any(|existing| existing.kind == action.kind);
            if clash {
                return Err(RbacError::DuplicateActionKind {
                    module_id: action.module_id,
                    kind: action.kind,
                });
            }

            siblings.push(action.id);
            tree.actions.insert(action.id, action);
        }

        tree.check_acyclic()?;
        Ok(tree)
    }

    fn check_acyclic(&self) -> RbacResult<()> {
        let mut cleared: HashSet<ModuleId> = HashSet::new();

        for &start in &self.order {
            let mut path = HashSet::new();
            let mut current = Some(start);

            while let Some(id) = current {
                if cleared.contains(&id) {
                    break;
                }
                if !path.insert(id) {
                    return Err(RbacError::CyclicHierarchy(id));
                }
                current = self.modules.get(&id).and_then(|m| m.parent_id);
            }

            cleared.extend(path);
        }

        Ok(())
    }

    /// Get a module by ID.
    pub fn module(&self, id: ModuleId) -> RbacResult<&Module> {
        self.modules.get(&id).ok_or(RbacError::ModuleNotFound(id))
    }

    /// Get an action by ID.
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(&id)
    }

    /// Check if a module is loaded.
    pub fn contains(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }

    /// Number of loaded modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if no modules are loaded.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Ancestors of a module, immediate parent first and root last.
    ///
    /// Returns an empty sequence for a root module.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::modules::{Module, ModuleTree};
    /// use platform_rbac::ids::ModuleId;
    ///
    /// let tree = ModuleTree::new(
    ///     vec![
    ///         Module::new(ModuleId(1), "Sales"),
    ///         Module::new(ModuleId(2), "Orders").with_parent(ModuleId(1)),
    ///         Module::new(ModuleId(3), "OrderItems").with_parent(ModuleId(2)),
    ///     ],
    ///     vec![],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(tree.ancestors_of(ModuleId(3)).unwrap(), vec![ModuleId(2), ModuleId(1)]);
    /// assert!(tree.ancestors_of(ModuleId(1)).unwrap().is_empty());
    /// ```
    pub fn ancestors_of(&self, id: ModuleId) -> RbacResult<Vec<ModuleId>> {
        let mut ancestors = Vec::new();
        let mut current = self.module(id)?.parent_id;

        while let Some(parent_id) = current {
            if parent_id == id || ancestors.contains(&parent_id) {
                return Err(RbacError::CyclicHierarchy(parent_id));
            }
            let parent = self.module(parent_id)?;
            ancestors.push(parent_id);
            current = parent.parent_id;
        }

        Ok(ancestors)
    }

    /// The module's READ action, if it defines one.
    pub fn read_action_of(&self, id: ModuleId) -> RbacResult<Option<ActionId>> {
        self.module(id)?;
        Ok(self
            .actions_of(id)
            .into_iter()
            .find(|action| action.kind == ActionKind::Read)
            .map(|action| action.id))
    }

    /// Actions defined on a module, in catalog order.
    pub fn actions_of(&self, id: ModuleId) -> Vec<&Action> {
        self.module_actions
            .get(&id)
            .map(|ids| ids.iter().filter_map(|a| self.actions.get(a)).collect())
            .unwrap_or_default()
    }

    /// Direct children of a module, in catalog order.
    pub fn children_of(&self, id: ModuleId) -> Vec<&Module> {
        self.order
            .iter()
            .filter_map(|m| self.modules.get(m))
            .filter(|m| m.parent_id == Some(id))
            .collect()
    }

    /// Root modules, in catalog order.
    pub fn roots(&self) -> Vec<&Module> {
        self.order
            .iter()
            .filter_map(|m| self.modules.get(m))
            .filter(|m| m.is_root())
            .collect()
    }
}
