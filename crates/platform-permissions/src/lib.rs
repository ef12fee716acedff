//! # Platform Permissions
//!
//! This crate assigns and presents role permissions for the Relay platform.
//! It drives the `platform-rbac` resolution engine against a module catalog,
//! a role directory and a grant store.
//!
//! ## Overview
//!
//! The platform-permissions crate handles:
//! - **Assignment**: Create or update a role's grants, including implied parent READs
//! - **Projection**: Present stored grants as a nested module tree
//! - **Removal**: Delete single grants or every grant of a deleted role
//! - **Serialization**: Per-role locking so concurrent updates never lose writes
//!
//! ## Features
//!
//! - `memory` (default): In-memory catalog and grant store
//!
//! ## Configuration
//!
//! - `PERMISSIONS_PROPAGATION_DEPTH`: `full` (default) or `parent`
//! - `PERMISSIONS_SUBMODULE_SCOPE`: `across_roles` (default) or `within_role`
//! - `PERMISSIONS_LOCK_TIMEOUT_SECS`: Role lock wait (default: 10)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_permissions::{
//!     MemoryCatalog, MemoryGrantStore, PermissionService, PermissionServiceConfig,
//! };
//! use platform_rbac::{Action, ActionId, ActionKind, Module, ModuleId, Role, RoleId};
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//!
//! async fn assign_example() {
//!     let catalog = Arc::new(
//!         MemoryCatalog::new()
//!             .with_module(Module::new(ModuleId(1), "Orders"))
//!             .with_module(Module::new(ModuleId(2), "OrderItems").with_parent(ModuleId(1)))
//!             .with_action(Action::new(ActionId(10), ModuleId(1), ActionKind::Read))
//!             .with_action(Action::new(ActionId(20), ModuleId(2), ActionKind::Write))
//!             .with_role(Role::new(RoleId(5), "Clerk")),
//!     );
//!
//!     let service = PermissionService::new(
//!         catalog.clone(),
//!         catalog.clone(),
//!         catalog,
//!         Arc::new(MemoryGrantStore::new()),
//!         PermissionServiceConfig::from_env(),
//!     )
//!     .unwrap();
//!
//!     // Granting OrderItems WRITE also grants Orders READ
//!     let diff = service
//!         .create_permissions(RoleId(5), &BTreeSet::from([ActionId(20)]))
//!         .await
//!         .unwrap();
//!     assert_eq!(diff.add_set.len(), 2);
//!
//!     let view = service.find_role_permissions(RoleId(5)).await.unwrap();
//!     println!("{}", view.module[0].sub_module[0].name);
//! }
//! ```

pub mod config;
pub mod error;
pub mod locks;
pub mod service;
pub mod store;

#[cfg(feature = "memory")]
pub mod memory;

// Re-export main types
pub use config::{ConfigError, PermissionServiceConfig};
pub use error::{PermissionError, PermissionResult, StoreError, StoreResult};
pub use locks::{RoleGuard, RoleLocks};
pub use service::{AssignMode, PermissionService, ProjectionScope};
pub use store::{ActionCatalog, GrantStore, ModuleCatalog, RoleDirectory};

#[cfg(feature = "memory")]
pub use memory::{MemoryCatalog, MemoryGrantStore};
