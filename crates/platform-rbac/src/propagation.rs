//! # Propagation
//!
//! Expands a requested set of actions into its closure: whenever an action on
//! a submodule is granted, the READ action of its parent module is granted
//! too, so the parent stays visible to the role.
//!
//! ## Depth
//!
//! [`PropagationDepth::FullChain`] walks every ancestor and adds each one's
//! READ action. [`PropagationDepth::ImmediateParent`] only looks one level up,
//! which matches deployments whose trees are never deeper than two levels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{RbacError, RbacResult};
use crate::ids::{ActionId, ModuleId};
use crate::modules::ModuleTree;

/// How far up the hierarchy implicit READ access is propagated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropagationDepth {
    /// Only the immediate parent's READ action.
    ///
    /// A parent missing from the loaded tree contributes nothing.
    ImmediateParent,

    /// The READ action of every ancestor up to the root.
    ///
    /// Every ancestor must be loaded; an unloaded one fails with
    /// [`RbacError::ModuleNotFound`].
    #[default]
    FullChain,
}

impl PropagationDepth {
    /// Parse from a configuration value.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::propagation::PropagationDepth;
    ///
    /// assert_eq!(PropagationDepth::parse("full"), Some(PropagationDepth::FullChain));
    /// assert_eq!(PropagationDepth::parse("parent"), Some(PropagationDepth::ImmediateParent));
    /// assert_eq!(PropagationDepth::parse("sideways"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "parent" | "immediate_parent" | "one" => Some(Self::ImmediateParent),
            "full" | "full_chain" | "all" => Some(Self::FullChain),
            _ => None,
        }
    }

    /// Get string representation of the depth.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmediateParent => "immediate_parent",
            Self::FullChain => "full_chain",
        }
    }
}

/// The expanded set of actions that must be granted for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    /// Every action in the closure.
    actions: BTreeSet<ActionId>,
    /// Actions present only because of propagation.
    propagated: BTreeSet<ActionId>,
}

impl Closure {
    /// All action IDs in the closure.
    pub fn actions(&self) -> &BTreeSet<ActionId> {
        &self.actions
    }

    /// Action IDs that were added by propagation and not requested directly.
    pub fn propagated(&self) -> &BTreeSet<ActionId> {
        &self.propagated
    }

    /// Check if the closure contains an action.
    pub fn contains(&self, id: ActionId) -> bool {
        self.actions.contains(&id)
    }

    /// Number of actions in the closure.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the closure is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over the closure in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionId> {
        self.actions.iter()
    }

    /// Consume the closure, returning the full action set.
    pub fn into_actions(self) -> BTreeSet<ActionId> {
        self.actions
    }
}

/// Computes closures against a loaded [`ModuleTree`].
///
/// # Example
///
/// ```
/// use platform_rbac::actions::{Action, ActionKind};
/// use platform_rbac::ids::{ActionId, ModuleId};
/// use platform_rbac::modules::{Module, ModuleTree};
/// use platform_rbac::propagation::Propagator;
/// use std::collections::BTreeSet;
///
/// let tree = ModuleTree::new(
///     vec![
///         Module::new(ModuleId(1), "Orders"),
///         Module::new(ModuleId(2), "OrderItems").with_parent(ModuleId(1)),
///     ],
///     vec![
///         Action::new(ActionId(10), ModuleId(1), ActionKind::Read),
///         Action::new(ActionId(20), ModuleId(2), ActionKind::Write),
///     ],
/// )
/// .unwrap();
///
/// let requested = BTreeSet::from([ActionId(20)]);
/// let closure = Propagator::new(&tree).expand_closure(&requested).unwrap();
/// assert!(closure.contains(ActionId(10)));
/// assert!(closure.contains(ActionId(20)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Propagator<'a> {
    tree: &'a ModuleTree,
    depth: PropagationDepth,
}

impl<'a> Propagator<'a> {
    /// Create a propagator that walks the full ancestor chain.
    pub fn new(tree: &'a ModuleTree) -> Self {
        Self::with_depth(tree, PropagationDepth::default())
    }

    /// Create a propagator with an explicit depth.
    pub fn with_depth(tree: &'a ModuleTree, depth: PropagationDepth) -> Self {
        Self { tree, depth }
    }

    /// The depth this propagator walks.
    pub fn depth(&self) -> PropagationDepth {
        self.depth
    }

    /// Expand requested actions into their closure.
    ///
    /// Validation is all-or-nothing: if any requested ID is unknown, the
    /// whole expansion fails with every missing ID listed.
    ///
    /// # Errors
    ///
    /// - [`RbacError::ActionNotFound`] if any requested action is not in the tree
    /// - [`RbacError::ModuleNotFound`] if an ancestor chain reaches an unloaded module
    pub fn expand_closure(&self, requested: &BTreeSet<ActionId>) -> RbacResult<Closure> {
        let missing: Vec<ActionId> = requested
            .iter()
            .copied()
            .filter(|id| self.tree.action(*id).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(RbacError::ActionNotFound(missing));
        }

        let mut implied = BTreeSet::new();
        for id in requested {
            let Some(action) = self.tree.action(*id) else {
                continue;
            };
            for ancestor in self.ancestors(action.module_id)? {
                if let Some(read) = self.tree.read_action_of(ancestor)? {
                    implied.insert(read);
                }
            }
        }

        let propagated: BTreeSet<ActionId> = implied.difference(requested).copied().collect();
        if !propagated.is_empty() {
            tracing::debug!(
                requested = requested.len(),
                propagated = ?propagated,
                depth = self.depth.as_str(),
                "Propagated parent READ actions"
            );
        }

        let actions = requested.union(&implied).copied().collect();
        Ok(Closure {
            actions,
            propagated,
        })
    }

    fn ancestors(&self, module_id: ModuleId) -> RbacResult<Vec<ModuleId>> {
        match self.depth {
            PropagationDepth::FullChain => self.tree.ancestors_of(module_id),
            PropagationDepth::ImmediateParent => {
                let parent = self.tree.module(module_id)?.parent_id;
                Ok(parent
                    .into_iter()
                    .filter(|id| self.tree.contains(*id))
                    .collect())
            }
        }
    }
}
