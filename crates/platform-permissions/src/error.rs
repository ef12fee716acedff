//! Error types for the permission service
//!
//! Engine errors pass through unchanged; storage and locking failures are
//! added on top. The outer HTTP layer turns these into responses using
//! [`PermissionError::status_code`] and [`PermissionError::error_code`].

use platform_rbac::{ActionId, GrantId, RbacError, RoleId};
use thiserror::Error;

use crate::config::ConfigError;

/// Collaborator (storage/catalog) error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend failure (connection, query, serialization)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Insert would duplicate an existing (role, action) grant
    #[error("Grant of action {action_id} to role {role_id} already exists")]
    DuplicateGrant {
        /// Role holding the grant.
        role_id: RoleId,
        /// Action already granted.
        action_id: ActionId,
    },

    /// Grant row does not exist
    #[error("Unknown grant: {0}")]
    UnknownGrant(GrantId),
}

/// Result type for collaborator operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Permission service error types.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// Resolution failed in the engine
    #[error(transparent)]
    Rbac(#[from] RbacError),

    /// A collaborator failed
    #[error(transparent)]
    Store(StoreError),

    /// Role holds no grants
    #[error("No permissions found for role {0}")]
    PermissionsNotFound(RoleId),

    /// Grant row not found
    #[error("Permission not found: {0}")]
    PermissionNotFound(GrantId),

    /// Another reconciliation for the role held its lock too long
    #[error("Timed out waiting for permission lock on role {0}")]
    LockTimeout(RoleId),

    /// Invalid service configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<StoreError> for PermissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateGrant { role_id, action_id } => {
                PermissionError::Rbac(RbacError::DuplicateGrantAttempt { role_id, action_id })
            }
            StoreError::UnknownGrant(id) => PermissionError::PermissionNotFound(id),
            other => PermissionError::Store(other),
        }
    }
}

/// Result type for permission service operations.
pub type PermissionResult<T> = Result<T, PermissionError>;

impl PermissionError {
    /// Check if this error should be logged at error level.
    ///
    /// Not-found errors are expected input failures; invariant violations,
    /// storage failures and configuration problems are not.
    pub fn is_server_error(&self) -> bool {
        match self {
            PermissionError::Rbac(err) => err.is_invariant_violation(),
            PermissionError::Store(_) | PermissionError::Config(_) => true,
            _ => false,
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PermissionError::Rbac(err) if err.is_invariant_violation() => 500,
            PermissionError::Rbac(_) => 404,
            PermissionError::PermissionsNotFound(_) | PermissionError::PermissionNotFound(_) => 404,
            PermissionError::LockTimeout(_) => 409,
            PermissionError::Store(_) | PermissionError::Config(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            PermissionError::Rbac(err) => err.error_code(),
            PermissionError::Store(_) => "STORE_ERROR",
            PermissionError::PermissionsNotFound(_) => "PERMISSIONS_NOT_FOUND",
            PermissionError::PermissionNotFound(_) => "PERMISSION_NOT_FOUND",
            PermissionError::LockTimeout(_) => "PERMISSION_LOCK_TIMEOUT",
            PermissionError::Config(_) => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_grant_maps_to_invariant_violation() {
        let err: PermissionError = StoreError::DuplicateGrant {
            role_id: RoleId(1),
            action_id: ActionId(10),
        }
        .into();

        assert!(matches!(
            err,
            PermissionError::Rbac(RbacError::DuplicateGrantAttempt { .. })
        ));
        assert!(err.is_server_error());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DUPLICATE_GRANT");
    }

    #[test]
    fn test_unknown_grant_maps_to_not_found() {
        let err: PermissionError = StoreError::UnknownGrant(GrantId(7)).into();
        assert!(matches!(err, PermissionError::PermissionNotFound(GrantId(7))));
        assert_eq!(err.status_code(), 404);
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_not_found_errors_are_client_errors() {
        let err = PermissionError::from(RbacError::ActionNotFound(vec![ActionId(999)]));
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "ACTION_NOT_FOUND");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_backend_error_is_server_error() {
        let err: PermissionError = StoreError::Backend("connection reset".to_string()).into();
        assert!(err.is_server_error());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "Storage backend error: connection reset");
    }

    #[test]
    fn test_lock_timeout() {
        let err = PermissionError::LockTimeout(RoleId(3));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "PERMISSION_LOCK_TIMEOUT");
    }
}
