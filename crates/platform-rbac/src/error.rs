//! Error types for permission resolution
//!
//! The engine raises these synchronously; it never retries and never applies
//! a partial result.

use thiserror::Error;

use crate::actions::ActionKind;
use crate::ids::{ActionId, ModuleId, RoleId};

/// Permission resolution error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RbacError {
    /// Module is not present in the loaded catalog
    #[error("Module not found: {0}")]
    ModuleNotFound(ModuleId),

    /// One or more requested actions do not exist
    #[error("Actions not found: {0:?}")]
    ActionNotFound(Vec<ActionId>),

    /// An assignment named no actions at all
    #[error("No actions requested")]
    NoActionsRequested,

    /// Role does not exist
    #[error("Role not found: {0}")]
    RoleNotFound(RoleId),

    /// The same action was granted to a role twice
    #[error("Duplicate grant of action {action_id} to role {role_id}")]
    DuplicateGrantAttempt {
        /// Role holding the grant.
        role_id: RoleId,
        /// Action granted twice.
        action_id: ActionId,
    },

    /// A module defines more than one action of the same kind
    #[error("Module {module_id} defines more than one {} action", kind.as_str())]
    DuplicateActionKind {
        /// Offending module.
        module_id: ModuleId,
        /// Repeated kind.
        kind: ActionKind,
    },

    /// A module is its own transitive ancestor
    #[error("Module hierarchy contains a cycle at module {0}")]
    CyclicHierarchy(ModuleId),
}

/// Result type for permission resolution.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Check if this error signals a broken data invariant rather than bad input.
    ///
    /// Invariant violations mean some caller bypassed the engine or the
    /// catalog is corrupt; they are never retryable.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            RbacError::DuplicateGrantAttempt { .. }
                | RbacError::DuplicateActionKind { .. }
                | RbacError::CyclicHierarchy(_)
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RbacError::ModuleNotFound(_) => "MODULE_NOT_FOUND",
            RbacError::ActionNotFound(_) => "ACTION_NOT_FOUND",
            RbacError::NoActionsRequested => "ACTION_NOT_FOUND_ALL",
            RbacError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            RbacError::DuplicateGrantAttempt { .. } => "DUPLICATE_GRANT",
            RbacError::DuplicateActionKind { .. } => "DUPLICATE_ACTION_KIND",
            RbacError::CyclicHierarchy(_) => "CYCLIC_MODULE_HIERARCHY",
        }
    }
}
