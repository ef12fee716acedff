//! Per-role reconciliation locks
//!
//! A reconciliation reads a grant snapshot, diffs it and writes the result.
//! Two of those running for the same role against one store would lose
//! updates, so every read-modify-write for a role holds that role's lock.

use platform_rbac::RoleId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{PermissionError, PermissionResult};

/// Lock table keyed by role.
///
/// Entries for roles nobody holds or waits on are pruned on the next
/// acquisition, so the table stays bounded by the roles in flight.
#[derive(Debug, Default)]
pub struct RoleLocks {
    locks: Mutex<HashMap<RoleId, Arc<Mutex<()>>>>,
}

/// Guard for one role; the lock is released on drop.
pub type RoleGuard = OwnedMutexGuard<()>;

impl RoleLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a role, waiting at most `timeout`.
    pub async fn acquire(&self, role_id: RoleId, timeout: Duration) -> PermissionResult<RoleGuard> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the table holds an idle entry; guards and waiters keep a clone.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(role_id).or_default().clone()
        };

        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                tracing::warn!(
                    role_id = %role_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Timed out waiting for role lock"
                );
                Err(PermissionError::LockTimeout(role_id))
            }
        }
    }

    /// Number of entries in the table.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Check if the table has no entries.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
