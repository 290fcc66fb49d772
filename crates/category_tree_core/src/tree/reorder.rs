//! Sibling reordering: array-move plus contiguous order assignment.
//!
//! # Invariants
//! - `plan_reorder` assigns `order = index` to every sibling, so the result
//!   is exactly `0..n-1` in visual sequence whatever the previous values.
//! - Every sibling gets an assignment, including unchanged ones.

use crate::model::category::CategoryId;
use crate::repo::category_repo::{OrderOutcome, OrderUpdate};

/// Moves `source` to the index currently held by `target`.
///
/// Returns `None` when either id is not a sibling or both are the same.
pub fn move_within(
    siblings: &[CategoryId],
    source: CategoryId,
    target: CategoryId,
) -> Option<Vec<CategoryId>> {
    let from = siblings.iter().position(|id| *id == source)?;
    let to = siblings.iter().position(|id| *id == target)?;
    if from == to {
        return None;
    }
    let mut reordered = siblings.to_vec();
    let moved = reordered.remove(from);
    reordered.insert(to, moved);
    Some(reordered)
}

/// One order assignment per sibling, in the given sequence.
pub fn plan_reorder(sequence: &[CategoryId]) -> Vec<OrderUpdate> {
    sequence
        .iter()
        .enumerate()
        .map(|(index, id)| OrderUpdate {
            id: *id,
            order: index as i64,
        })
        .collect()
}

/// Per-item outcome of one persisted reorder batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReorderReport {
    pub outcomes: Vec<OrderOutcome>,
}

impl ReorderReport {
    /// True only when every item was stored.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(OrderOutcome::is_ok)
    }

    pub fn failed(&self) -> impl Iterator<Item = &OrderOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_ok())
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_ok()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::{move_within, plan_reorder, ReorderReport};
    use crate::repo::category_repo::OrderOutcome;
    use uuid::Uuid;

    #[test]
    fn move_within_shifts_neighbours() {
        let ids: Vec<_> = (0..4).map(|_| Uuid::new_v4()).collect();
        let moved = move_within(&ids, ids[3], ids[1]).unwrap();
        assert_eq!(moved, vec![ids[0], ids[3], ids[1], ids[2]]);

        let moved = move_within(&ids, ids[0], ids[2]).unwrap();
        assert_eq!(moved, vec![ids[1], ids[2], ids[0], ids[3]]);
    }

    #[test]
    fn move_within_ignores_strangers_and_self_drops() {
        let ids: Vec<_> = (0..2).map(|_| Uuid::new_v4()).collect();
        assert!(move_within(&ids, ids[0], ids[0]).is_none());
        assert!(move_within(&ids, Uuid::new_v4(), ids[0]).is_none());
    }

    #[test]
    fn plan_assigns_contiguous_orders() {
        let ids: Vec<_> = (0..3).map(|_| Uuid::new_v4()).collect();
        let plan = plan_reorder(&ids);
        assert_eq!(
            plan.iter().map(|update| update.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            plan.iter().map(|update| update.id).collect::<Vec<_>>(),
            ids
        );
    }

    #[test]
    fn plan_for_empty_and_single_lists() {
        assert!(plan_reorder(&[]).is_empty());
        let only = Uuid::new_v4();
        assert_eq!(plan_reorder(&[only]).len(), 1);
    }

    #[test]
    fn report_fails_when_any_item_fails() {
        let report = ReorderReport {
            outcomes: vec![
                OrderOutcome {
                    id: Uuid::new_v4(),
                    order: 0,
                    error: None,
                },
                OrderOutcome {
                    id: Uuid::new_v4(),
                    order: 1,
                    error: Some("offline".to_string()),
                },
            ],
        };
        assert!(!report.is_success());
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert!(ReorderReport::default().is_success());
    }
}
