//! # Reconciliation
//!
//! Computes the minimal change that moves a role from the grants it holds to
//! the grants a closure requires.
//!
//! ```text
//! add_set    = closure − existing
//! remove_set = existing − closure
//! ```
//!
//! The diff is computed from a point-in-time snapshot. Callers must
//! serialize reconciliation per role and apply the diff atomically, otherwise
//! a concurrent writer can be overwritten by a diff built from stale data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ids::{ActionId, RoleId};

/// Grants to insert and delete for one role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrantDiff {
    /// Role the diff applies to.
    pub role_id: RoleId,
    /// Actions to grant.
    pub add_set: BTreeSet<ActionId>,
    /// Actions to revoke.
    pub remove_set: BTreeSet<ActionId>,
}

impl GrantDiff {
    /// Check if applying the diff would change nothing.
    pub fn is_empty(&self) -> bool {
        self.add_set.is_empty() && self.remove_set.is_empty()
    }

    /// Total number of grant changes.
    pub fn len(&self) -> usize {
        self.add_set.len() + self.remove_set.len()
    }

    /// The grant set that results from applying this diff to `existing`.
    pub fn apply_to(&self, existing: &BTreeSet<ActionId>) -> BTreeSet<ActionId> {
        existing
            .difference(&self.remove_set)
            .chain(self.add_set.iter())
            .copied()
            .collect()
    }
}

/// Reconcile a desired closure against the grants a role already holds.
///
/// Pure set arithmetic: no validation, no storage access. On the creation
/// path pass an empty `existing` set, which makes `remove_set` empty and
/// `add_set` equal to the closure.
///
/// # Example
///
/// ```
/// use platform_rbac::diff::reconcile;
/// use platform_rbac::ids::{ActionId, RoleId};
/// use std::collections::BTreeSet;
///
/// let existing = BTreeSet::from([ActionId(10), ActionId(20)]);
/// let desired = BTreeSet::from([ActionId(10)]);
///
/// let diff = reconcile(RoleId(5), &desired, &existing);
/// assert!(diff.add_set.is_empty());
/// assert_eq!(diff.remove_set, BTreeSet::from([ActionId(20)]));
/// ```
pub fn reconcile(
    role_id: RoleId,
    closure: &BTreeSet<ActionId>,
    existing: &BTreeSet<ActionId>,
) -> GrantDiff {
    GrantDiff {
        role_id,
        add_set: closure.difference(existing).copied().collect(),
        remove_set: existing.difference(closure).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(values: &[u64]) -> BTreeSet<ActionId> {
        values.iter().copied().map(ActionId).collect()
    }

    #[test]
    fn test_creation_path_adds_whole_closure() {
        let diff = reconcile(RoleId(5), &ids(&[10, 20]), &BTreeSet::new());
        assert_eq!(diff.add_set, ids(&[10, 20]));
        assert!(diff.remove_set.is_empty());
        assert_eq!(diff.role_id, RoleId(5));
    }

    #[test]
    fn test_update_path_removes_dropped_grants() {
        let diff = reconcile(RoleId(5), &ids(&[10]), &ids(&[10, 20]));
        assert!(diff.add_set.is_empty());
        assert_eq!(diff.remove_set, ids(&[20]));
    }

    #[test]
    fn test_update_path_mixed() {
        let diff = reconcile(RoleId(1), &ids(&[1, 2, 3]), &ids(&[3, 4]));
        assert_eq!(diff.add_set, ids(&[1, 2]));
        assert_eq!(diff.remove_set, ids(&[4]));
        assert_eq!(diff.len(), 3);
    }

    #[test]
    fn test_unchanged_state_is_empty_diff() {
        let diff = reconcile(RoleId(1), &ids(&[10, 20]), &ids(&[10, 20]));
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
    }

    #[test]
    fn test_apply_to() {
        let existing = ids(&[3, 4]);
        let diff = reconcile(RoleId(1), &ids(&[1, 3]), &existing);
        assert_eq!(diff.apply_to(&existing), ids(&[1, 3]));
    }

    #[test]
    fn test_diff_serialization() {
        let diff = reconcile(RoleId(5), &ids(&[10, 20]), &BTreeSet::new());
        let value = serde_json::to_value(&diff).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "roleId": 5, "addSet": [10, 20], "removeSet": [] })
        );
    }

    fn arb_ids() -> impl Strategy<Value = BTreeSet<ActionId>> {
        proptest::collection::btree_set(0u64..64, 0..32)
            .prop_map(|set| set.into_iter().map(ActionId).collect())
    }

    proptest! {
        #[test]
        fn prop_set_difference_correct(closure in arb_ids(), existing in arb_ids()) {
            let diff = reconcile(RoleId(1), &closure, &existing);

            for id in &diff.add_set {
                prop_assert!(closure.contains(id) && !existing.contains(id));
            }
            for id in &diff.remove_set {
                prop_assert!(existing.contains(id) && !closure.contains(id));
            }
            for id in closure.difference(&existing) {
                prop_assert!(diff.add_set.contains(id));
            }
            for id in existing.difference(&closure) {
                prop_assert!(diff.remove_set.contains(id));
            }
        }

        #[test]
        fn prop_add_and_remove_disjoint(closure in arb_ids(), existing in arb_ids()) {
            let diff = reconcile(RoleId(1), &closure, &existing);
            prop_assert!(diff.add_set.is_disjoint(&diff.remove_set));
        }

        #[test]
        fn prop_reconcile_idempotent(closure in arb_ids()) {
            let diff = reconcile(RoleId(1), &closure, &closure);
            prop_assert!(diff.is_empty());
        }

        #[test]
        fn prop_apply_reaches_closure(closure in arb_ids(), existing in arb_ids()) {
            let diff = reconcile(RoleId(1), &closure, &existing);
            prop_assert_eq!(diff.apply_to(&existing), closure);
        }
    }
}
