//! # Platform RBAC (Role-Based Access Control)
//!
//! This crate is the permission resolution engine for the Relay platform.
//! It decides which actions a role must hold and how to present them.
//!
//! ## Overview
//!
//! The platform-rbac crate handles:
//! - **Modules**: Protectable resources arranged as a tree
//! - **Actions**: READ / WRITE / DELETE verbs scoped to one module
//! - **Propagation**: Implicit parent READ access for granted submodules
//! - **Reconciliation**: Minimal add/remove grant sets for a role
//! - **Projection**: Flat grant rows back into a nested module tree
//!
//! ## Architecture
//!
//! ```text
//! requested action ids
//!        │
//!        ▼
//!   Propagator ──► Closure ──► reconcile(existing) ──► GrantDiff ──► store
//!   (ModuleTree)                                                       │
//!                                                                      ▼
//!                              ProjectedRole ◄── Projector ◄── GrantRow[]
//! ```
//!
//! The engine is synchronous and pure. It never touches storage: callers
//! load a [`ModuleTree`] and a grant snapshot, and apply the returned
//! [`GrantDiff`] themselves. Reconciliation for a given role must be
//! serialized by the caller and the diff applied atomically.
//!
//! ## Usage
//!
//! ```rust
//! use platform_rbac::{
//!     reconcile, Action, ActionId, ActionKind, Module, ModuleId, ModuleTree, Propagator, RoleId,
//! };
//! use std::collections::BTreeSet;
//!
//! let tree = ModuleTree::new(
//!     vec![
//!         Module::new(ModuleId(1), "Orders"),
//!         Module::new(ModuleId(2), "OrderItems").with_parent(ModuleId(1)),
//!     ],
//!     vec![
//!         Action::new(ActionId(10), ModuleId(1), ActionKind::Read),
//!         Action::new(ActionId(20), ModuleId(2), ActionKind::Write),
//!     ],
//! )
//! .unwrap();
//!
//! let closure = Propagator::new(&tree)
//!     .expand_closure(&BTreeSet::from([ActionId(20)]))
//!     .unwrap();
//!
//! let diff = reconcile(RoleId(5), closure.actions(), &BTreeSet::new());
//! assert_eq!(diff.add_set, BTreeSet::from([ActionId(10), ActionId(20)]));
//! assert!(diff.remove_set.is_empty());
//! ```

pub mod actions;
pub mod diff;
pub mod error;
pub mod ids;
pub mod modules;
pub mod permissions;
pub mod projection;
pub mod propagation;
pub mod roles;

// Re-export main types for convenience
pub use actions::{Action, ActionKind, ActionSummary};
pub use diff::{reconcile, GrantDiff};
pub use error::{RbacError, RbacResult};
pub use ids::{ActionId, GrantId, ModuleId, RoleId};
pub use modules::{Module, ModuleTree};
pub use permissions::{grant_snapshot, Permission};
pub use projection::{project, GrantRow, ProjectedModule, ProjectedRole, Projector, SubmoduleScope};
pub use propagation::{Closure, PropagationDepth, Propagator};
pub use roles::{Role, RoleStatus};
