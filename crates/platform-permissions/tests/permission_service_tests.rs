//! End-to-end tests for permission assignment and projection.
//!
//! The service runs against the in-memory catalog and grant store.
//! Fixture catalog:
//!
//! ```text
//! Orders (1)            READ 10, DELETE 11
//! └── OrderItems (2)    WRITE 20, READ 21
//!     └── ItemNotes (3) WRITE 30
//! Reports (4)           READ 40
//! Settings (5)          (no actions)
//! └── Users (6)         WRITE 60
//! ```

use async_trait::async_trait;
use platform_permissions::{
    GrantStore, MemoryCatalog, MemoryGrantStore, PermissionError, PermissionService,
    PermissionServiceConfig, ProjectionScope, StoreResult,
};
use platform_rbac::{
    Action, ActionId, ActionKind, GrantDiff, GrantId, Module, ModuleId, Permission, RbacError,
    Role, RoleId, SubmoduleScope,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Test fixture wiring the service to in-memory collaborators.
struct TestFixture {
    service: Arc<PermissionService>,
    store: Arc<MemoryGrantStore>,
}

impl TestFixture {
    fn new() -> Self {
        Self::with_config(PermissionServiceConfig::default())
    }

    fn with_config(config: PermissionServiceConfig) -> Self {
        let store = Arc::new(MemoryGrantStore::new());
        let service = build_service(store.clone(), config);
        Self { service, store }
    }

    async fn held(&self, role: u64) -> BTreeSet<ActionId> {
        self.store
            .grants_for_role(RoleId(role))
            .await
            .unwrap()
            .iter()
            .map(|g| g.action_id)
            .collect()
    }
}

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_module(Module::new(ModuleId(1), "Orders").with_path("/orders"))
        .with_module(
            Module::new(ModuleId(2), "OrderItems")
                .with_parent(ModuleId(1))
                .with_path("/orders/items"),
        )
        .with_module(Module::new(ModuleId(3), "ItemNotes").with_parent(ModuleId(2)))
        .with_module(Module::new(ModuleId(4), "Reports"))
        .with_module(Module::new(ModuleId(5), "Settings"))
        .with_module(Module::new(ModuleId(6), "Users").with_parent(ModuleId(5)))
        .with_action(Action::new(ActionId(10), ModuleId(1), ActionKind::Read))
        .with_action(Action::new(ActionId(11), ModuleId(1), ActionKind::Delete))
        .with_action(Action::new(ActionId(20), ModuleId(2), ActionKind::Write))
        .with_action(Action::new(ActionId(21), ModuleId(2), ActionKind::Read))
        .with_action(Action::new(ActionId(30), ModuleId(3), ActionKind::Write))
        .with_action(Action::new(ActionId(40), ModuleId(4), ActionKind::Read))
        .with_action(Action::new(ActionId(60), ModuleId(6), ActionKind::Write))
        .with_role(Role::new(RoleId(5), "Clerk"))
        .with_role(Role::new(RoleId(6), "Manager"))
        .with_role(Role::new(RoleId(7), "Guest"))
}

fn build_service(
    grants: Arc<dyn GrantStore>,
    config: PermissionServiceConfig,
) -> Arc<PermissionService> {
    let catalog = Arc::new(catalog());
    let service =
        PermissionService::new(catalog.clone(), catalog.clone(), catalog, grants, config).unwrap();
    Arc::new(service)
}

fn ids(values: &[u64]) -> BTreeSet<ActionId> {
    values.iter().map(|v| ActionId(*v)).collect()
}

// ============================================================================
// Assignment
// ============================================================================

#[tokio::test]
async fn test_create_adds_parent_read() {
    let fixture = TestFixture::new();

    let diff = fixture
        .service
        .create_permissions(RoleId(5), &ids(&[20]))
        .await
        .unwrap();

    assert_eq!(diff.add_set, ids(&[10, 20]));
    assert!(diff.remove_set.is_empty());
    assert_eq!(fixture.held(5).await, ids(&[10, 20]));
}

#[tokio::test]
async fn test_update_removes_unrequested_grants() {
    let fixture = TestFixture::new();
    fixture
        .service
        .create_permissions(RoleId(5), &ids(&[10, 20]))
        .await
        .unwrap();

    let diff = fixture
        .service
        .update_permissions(RoleId(5), &ids(&[10]))
        .await
        .unwrap();

    assert!(diff.add_set.is_empty());
    assert_eq!(diff.remove_set, ids(&[20]));
    assert_eq!(fixture.held(5).await, ids(&[10]));
}

#[tokio::test]
async fn test_unknown_action_changes_nothing() {
    let fixture = TestFixture::new();
    fixture
        .service
        .create_permissions(RoleId(5), &ids(&[40]))
        .await
        .unwrap();

    let err = fixture
        .service
        .update_permissions(RoleId(5), &ids(&[20, 999]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PermissionError::Rbac(RbacError::ActionNotFound(ref missing)) if missing == &vec![ActionId(999)]
    ));
    assert_eq!(err.status_code(), 404);
    assert_eq!(fixture.held(5).await, ids(&[40]));
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let fixture = TestFixture::new();
    let requested = ids(&[30, 40]);

    let first = fixture
        .service
        .update_permissions(RoleId(5), &requested)
        .await
        .unwrap();
    assert_eq!(first.add_set, ids(&[10, 21, 30, 40]));

    let second = fixture
        .service
        .update_permissions(RoleId(5), &requested)
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(fixture.store.len().await, 4);
}

#[tokio::test]
async fn test_parent_without_read_contributes_nothing() {
    let fixture = TestFixture::new();

    let diff = fixture
        .service
        .create_permissions(RoleId(5), &ids(&[60]))
        .await
        .unwrap();

    assert_eq!(diff.add_set, ids(&[60]));
}

#[tokio::test]
async fn test_roles_do_not_share_grants() {
    let fixture = TestFixture::new();
    fixture
        .service
        .create_permissions(RoleId(5), &ids(&[20]))
        .await
        .unwrap();
    fixture
        .service
        .create_permissions(RoleId(6), &ids(&[40]))
        .await
        .unwrap();

    fixture
        .service
        .update_permissions(RoleId(6), &ids(&[11]))
        .await
        .unwrap();

    assert_eq!(fixture.held(5).await, ids(&[10, 20]));
    assert_eq!(fixture.held(6).await, ids(&[11]));
}

#[tokio::test]
async fn test_empty_update_keeps_existing_grants() {
    let fixture = TestFixture::new();
    fixture
        .service
        .create_permissions(RoleId(5), &ids(&[20]))
        .await
        .unwrap();

    let err = fixture
        .service
        .update_permissions(RoleId(5), &BTreeSet::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PermissionError::Rbac(RbacError::NoActionsRequested)));
    assert_eq!(err.status_code(), 404);
    assert_eq!(fixture.held(5).await, ids(&[10, 20]));
}

// ============================================================================
// Projection
// ============================================================================

#[tokio::test]
async fn test_projection_round_trip() {
    let fixture = TestFixture::new();
    let diff = fixture
        .service
        .create_permissions(RoleId(5), &ids(&[11, 30, 40]))
        .await
        .unwrap();

    let view = fixture.service.find_role_permissions(RoleId(5)).await.unwrap();
    assert_eq!(view.role_id, RoleId(5));
    assert_eq!(view.name, "Clerk");

    // Exactly the closure, nothing more.
    let expected: HashSet<ActionId> = diff.add_set.iter().copied().collect();
    assert_eq!(view.action_ids(), expected);

    let orders = view.top_level(ModuleId(1)).unwrap();
    let orders_actions: Vec<ActionId> = orders.action.iter().map(|a| a.id).collect();
    assert_eq!(orders_actions, vec![ActionId(10), ActionId(11)]);

    let items = &orders.sub_module[0];
    assert_eq!(items.id, ModuleId(2));
    assert_eq!(items.parent_id, Some(ModuleId(1)));
    assert_eq!(items.action[0].id, ActionId(21));

    let notes = &items.sub_module[0];
    assert_eq!(notes.id, ModuleId(3));
    assert_eq!(notes.action[0].id, ActionId(30));

    assert!(view.top_level(ModuleId(4)).is_some());
    assert!(view.top_level(ModuleId(2)).is_none());
}

#[tokio::test]
async fn test_projection_serializes_camel_case() {
    let fixture = TestFixture::new();
    fixture
        .service
        .create_permissions(RoleId(5), &ids(&[20]))
        .await
        .unwrap();

    let view = fixture.service.find_role_permissions(RoleId(5)).await.unwrap();
    let json = serde_json::to_value(&view).unwrap();

    assert_eq!(json["roleId"], 5);
    assert_eq!(json["module"][0]["path"], "/orders");
    assert_eq!(json["module"][0]["subModule"][0]["parentId"], 1);
    assert_eq!(json["module"][0]["subModule"][0]["action"][0]["action"], "WRITE");
    assert_eq!(json["module"][0]["subModule"][0]["action"][0]["moduleId"], 2);
}

/// Role 5 holds Orders READ; role 6 holds only the OrderItems WRITE row.
async fn split_grants(store: &MemoryGrantStore) {
    store
        .apply_diff(&GrantDiff {
            role_id: RoleId(5),
            add_set: ids(&[10]),
            remove_set: BTreeSet::new(),
        })
        .await
        .unwrap();
    store
        .apply_diff(&GrantDiff {
            role_id: RoleId(6),
            add_set: ids(&[20]),
            remove_set: BTreeSet::new(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_submodules_attach_across_roles() {
    let fixture = TestFixture::new();
    split_grants(&fixture.store).await;

    let views = fixture
        .service
        .project_permissions(ProjectionScope::All)
        .await
        .unwrap();

    assert_eq!(views.len(), 2);
    assert_eq!(views[0].role_id, RoleId(5));
    assert_eq!(views[0].module[0].sub_module[0].id, ModuleId(2));

    // Role 6 has no top-level module for its submodule to hang from.
    assert_eq!(views[1].role_id, RoleId(6));
    assert!(views[1].module.is_empty());
}

#[tokio::test]
async fn test_submodules_stay_within_role() {
    let fixture = TestFixture::with_config(PermissionServiceConfig {
        submodule_scope: SubmoduleScope::WithinRole,
        ..Default::default()
    });
    split_grants(&fixture.store).await;

    let views = fixture
        .service
        .project_permissions(ProjectionScope::All)
        .await
        .unwrap();

    assert_eq!(views.len(), 2);
    assert!(views[0].module[0].sub_module.is_empty());
    assert!(views[1].module.is_empty());
}

#[tokio::test]
async fn test_sign_in_falls_back_to_empty_view() {
    let fixture = TestFixture::new();

    let view = fixture
        .service
        .role_permissions_for_sign_in(RoleId(7))
        .await
        .unwrap();
    assert_eq!(view.name, "Guest");
    assert!(view.module.is_empty());

    let err = fixture
        .service
        .role_permissions_for_sign_in(RoleId(404))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ROLE_NOT_FOUND");
}

// ============================================================================
// Removal
// ============================================================================

#[tokio::test]
async fn test_remove_single_permission() {
    let fixture = TestFixture::new();
    fixture
        .service
        .create_permissions(RoleId(5), &ids(&[40]))
        .await
        .unwrap();
    let grant = fixture.store.grants_for_role(RoleId(5)).await.unwrap()[0];

    let removed = fixture.service.remove_permission(grant.id).await.unwrap();
    assert_eq!(removed.action_id, ActionId(40));

    let err = fixture.service.remove_permission(grant.id).await.unwrap_err();
    assert!(matches!(err, PermissionError::PermissionNotFound(id) if id == grant.id));
    assert_eq!(err.error_code(), "PERMISSION_NOT_FOUND");
}

#[tokio::test]
async fn test_remove_permissions_for_role() {
    let fixture = TestFixture::new();
    fixture
        .service
        .create_permissions(RoleId(5), &ids(&[20, 40]))
        .await
        .unwrap();

    let removed = fixture
        .service
        .remove_permissions_for_role(RoleId(5))
        .await
        .unwrap();
    assert_eq!(removed, 3);

    let err = fixture
        .service
        .remove_permissions_for_role(RoleId(5))
        .await
        .unwrap_err();
    assert!(matches!(err, PermissionError::PermissionsNotFound(RoleId(5))));
}

// ============================================================================
// Concurrency
// ============================================================================

/// Grant store that pauses between reading a snapshot and returning it,
/// widening the window for lost updates.
struct SlowGrantStore {
    inner: MemoryGrantStore,
    delay: Duration,
}

#[async_trait]
impl GrantStore for SlowGrantStore {
    async fn grants_for_role(&self, role_id: RoleId) -> StoreResult<Vec<Permission>> {
        let grants = self.inner.grants_for_role(role_id).await?;
        tokio::time::sleep(self.delay).await;
        Ok(grants)
    }

    async fn all_grants(&self) -> StoreResult<Vec<Permission>> {
        self.inner.all_grants().await
    }

    async fn apply_diff(&self, diff: &GrantDiff) -> StoreResult<Vec<Permission>> {
        self.inner.apply_diff(diff).await
    }

    async fn remove_grant(&self, id: GrantId) -> StoreResult<Permission> {
        self.inner.remove_grant(id).await
    }

    async fn remove_grants_for_role(&self, role_id: RoleId) -> StoreResult<usize> {
        self.inner.remove_grants_for_role(role_id).await
    }
}

#[tokio::test]
async fn test_concurrent_updates_are_serialized() {
    let store = Arc::new(SlowGrantStore {
        inner: MemoryGrantStore::new(),
        delay: Duration::from_millis(20),
    });
    let service = build_service(store.clone(), PermissionServiceConfig::default());

    let requests = [ids(&[10]), ids(&[20]), ids(&[10, 40]), ids(&[30])];
    let handles: Vec<_> = requests
        .iter()
        .cloned()
        .map(|requested| {
            let service = service.clone();
            tokio::spawn(async move { service.update_permissions(RoleId(5), &requested).await })
        })
        .collect();

    for handle in handles {
        // Stale snapshots would surface as duplicate-grant failures here.
        handle.await.unwrap().unwrap();
    }

    let grants = store.grants_for_role(RoleId(5)).await.unwrap();
    let held: BTreeSet<ActionId> = grants.iter().map(|g| g.action_id).collect();
    assert_eq!(held.len(), grants.len());

    let closures = [ids(&[10]), ids(&[10, 20]), ids(&[10, 40]), ids(&[10, 21, 30])];
    assert!(closures.contains(&held));
}
