//! Permission service configuration.
//!
//! Configuration is loaded from environment variables with defaults that
//! match the platform's production behavior.

use platform_rbac::{PropagationDepth, SubmoduleScope};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Settings for [`PermissionService`](crate::service::PermissionService).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionServiceConfig {
    /// How far implicit READ access climbs the module tree.
    pub propagation_depth: PropagationDepth,

    /// Which roles a projected submodule may be attached under.
    pub submodule_scope: SubmoduleScope,

    /// Seconds a reconciliation waits for its role's lock.
    pub lock_timeout_secs: u64,
}

impl Default for PermissionServiceConfig {
    fn default() -> Self {
        Self {
            propagation_depth: PropagationDepth::FullChain,
            submodule_scope: SubmoduleScope::AcrossRoles,
            lock_timeout_secs: 10,
        }
    }
}

impl PermissionServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PERMISSIONS_PROPAGATION_DEPTH`: `full` or `parent` (default: full)
    /// - `PERMISSIONS_SUBMODULE_SCOPE`: `across_roles` or `within_role` (default: across_roles)
    /// - `PERMISSIONS_LOCK_TIMEOUT_SECS`: Role lock wait in seconds (default: 10)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            propagation_depth: lookup("PERMISSIONS_PROPAGATION_DEPTH")
                .and_then(|s| PropagationDepth::parse(&s))
                .unwrap_or(default.propagation_depth),
            submodule_scope: lookup("PERMISSIONS_SUBMODULE_SCOPE")
                .and_then(|s| SubmoduleScope::parse(&s))
                .unwrap_or(default.submodule_scope),
            lock_timeout_secs: lookup("PERMISSIONS_LOCK_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.lock_timeout_secs),
        }
    }

    /// Get the role lock timeout as a Duration.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PERMISSIONS_LOCK_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PermissionServiceConfig::default();
        assert_eq!(config.propagation_depth, PropagationDepth::FullChain);
        assert_eq!(config.submodule_scope, SubmoduleScope::AcrossRoles);
        assert_eq!(config.lock_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = PermissionServiceConfig::from_lookup(lookup_from(&[
            ("PERMISSIONS_PROPAGATION_DEPTH", "parent"),
            ("PERMISSIONS_SUBMODULE_SCOPE", "within_role"),
            ("PERMISSIONS_LOCK_TIMEOUT_SECS", "3"),
        ]));

        assert_eq!(config.propagation_depth, PropagationDepth::ImmediateParent);
        assert_eq!(config.submodule_scope, SubmoduleScope::WithinRole);
        assert_eq!(config.lock_timeout_secs, 3);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = PermissionServiceConfig::from_lookup(lookup_from(&[
            ("PERMISSIONS_PROPAGATION_DEPTH", "sideways"),
            ("PERMISSIONS_LOCK_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config, PermissionServiceConfig::default());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PermissionServiceConfig {
            lock_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
