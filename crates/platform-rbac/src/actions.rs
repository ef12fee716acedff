//! # Actions
//!
//! Defines the verbs a role can be granted on a module.
//! Every action belongs to exactly one module, and a module carries at most
//! one action of each kind.

use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, ModuleId};

/// Kinds of action a module can expose.
///
/// - **Read**: View the module (also drives menu visibility)
/// - **Write**: Create or modify data inside the module
/// - **Delete**: Remove data inside the module
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    /// Read/view the module.
    Read,

    /// Create or modify data in the module.
    Write,

    /// Remove data from the module.
    Delete,
}

impl ActionKind {
    /// Get the string representation of the action kind.
    ///
    /// # Returns
    ///
    /// The uppercase catalog name (`READ`, `WRITE`, `DELETE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Read => "READ",
            ActionKind::Write => "WRITE",
            ActionKind::Delete => "DELETE",
        }
    }

    /// Parse an action kind from its catalog name.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive)
    ///
    /// # Returns
    ///
    /// `Some(ActionKind)` if valid, `None` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::actions::ActionKind;
    ///
    /// assert_eq!(ActionKind::parse("READ"), Some(ActionKind::Read));
    /// assert_eq!(ActionKind::parse("write"), Some(ActionKind::Write));
    /// assert_eq!(ActionKind::parse("CREATE"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "READ" => Some(ActionKind::Read),
            "WRITE" => Some(ActionKind::Write),
            "DELETE" => Some(ActionKind::Delete),
            _ => None,
        }
    }

    /// Get all action kinds.
    pub fn all() -> [Self; 3] {
        [ActionKind::Read, ActionKind::Write, ActionKind::Delete]
    }

    /// Check if this is the read kind.
    pub fn is_read(&self) -> bool {
        matches!(self, ActionKind::Read)
    }
}

/// An action defined in the catalog.
///
/// # Example
///
/// ```
/// use platform_rbac::actions::{Action, ActionKind};
/// use platform_rbac::ids::{ActionId, ModuleId};
///
/// let action = Action::new(ActionId(10), ModuleId(1), ActionKind::Read);
/// assert!(action.kind.is_read());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action ID.
    pub id: ActionId,
    /// Module the action is scoped to.
    pub module_id: ModuleId,
    /// The verb.
    #[serde(rename = "action")]
    pub kind: ActionKind,
}

impl Action {
    /// Create a new action.
    pub fn new(id: ActionId, module_id: ModuleId, kind: ActionKind) -> Self {
        Self {
            id,
            module_id,
            kind,
        }
    }

    /// Compact view used inside projected trees.
    pub fn summary(&self) -> ActionSummary {
        ActionSummary {
            id: self.id,
            kind: self.kind,
            module_id: self.module_id,
        }
    }
}

/// Action entry as it appears under a projected module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    /// Action ID.
    pub id: ActionId,
    /// The verb.
    #[serde(rename = "action")]
    pub kind: ActionKind,
    /// Owning module.
    pub module_id: ModuleId,
}
