//! Confirmation step between a resolved cross-level drag and the move call.
//!
//! # Invariants
//! - State flows `Idle -> PendingConfirmation -> Committing -> Idle` or
//!   `PendingConfirmation -> Idle` on cancel.
//! - Pending state is cleared after a commit whether the move succeeded or
//!   not; there is no retry in place.

use crate::model::category::{CategoryId, CategoryLevel, CategoryNode};
use crate::repo::category_repo::CategoryStore;
use crate::service::category_service::CategoryService;
use crate::service::notice::MutationOutcome;
use crate::tree::normalize::count_descendants;
use crate::tree::resolver::MoveResolution;
use log::info;

/// A resolved move waiting for the user's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub node_id: CategoryId,
    pub node_name: String,
    /// Categories below the dragged node; informational only.
    pub descendant_count: usize,
    pub source_level: CategoryLevel,
    pub target_level: CategoryLevel,
    pub target_parent: Option<CategoryId>,
}

impl PendingMove {
    /// Confirmation prompt for the dialog.
    pub fn prompt(&self) -> String {
        format!(
            "Move \"{}\" from level {} to level {}?",
            self.node_name, self.source_level, self.target_level
        )
    }

    /// Warning shown when descendants will be shifted along with the node.
    pub fn warning(&self) -> Option<String> {
        match self.descendant_count {
            0 => None,
            1 => Some("1 descendant category will be adjusted automatically".to_string()),
            count => Some(format!(
                "{count} descendant categories will be adjusted automatically"
            )),
        }
    }
}

/// Gate state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Idle,
    PendingConfirmation(PendingMove),
    Committing(PendingMove),
}

/// Holds at most one pending move.
#[derive(Debug, Default)]
pub struct MoveGate {
    state: GateState,
}

impl MoveGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingMove> {
        match &self.state {
            GateState::PendingConfirmation(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.state, GateState::Committing(_))
    }

    /// Opens confirmation for `node`; replaces any earlier pending move.
    ///
    /// Returns `None` for `MoveResolution::NoOp` or while a commit is running.
    pub fn propose(&mut self, node: &CategoryNode, resolution: MoveResolution) -> Option<&PendingMove> {
        let MoveResolution::Move {
            new_level,
            new_parent,
        } = resolution
        else {
            return None;
        };
        if self.is_committing() {
            return None;
        }

        self.state = GateState::PendingConfirmation(PendingMove {
            node_id: node.id,
            node_name: node.name.clone(),
            descendant_count: count_descendants(node),
            source_level: node.level,
            target_level: new_level,
            target_parent: new_parent,
        });
        self.pending()
    }

    /// Discards the pending move without calling the store.
    pub fn cancel(&mut self) -> Option<PendingMove> {
        match std::mem::take(&mut self.state) {
            GateState::PendingConfirmation(pending) => {
                info!(
                    "event=category_move_gate module=service status=cancelled descendants={}",
                    pending.descendant_count
                );
                Some(pending)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Commits the pending move through `service`.
    ///
    /// Returns `None` when nothing is pending.
    pub fn confirm<S: CategoryStore>(
        &mut self,
        service: &CategoryService<S>,
    ) -> Option<MutationOutcome<()>> {
        let pending = match std::mem::take(&mut self.state) {
            GateState::PendingConfirmation(pending) => pending,
            other => {
                self.state = other;
                return None;
            }
        };

        self.state = GateState::Committing(pending.clone());
        let outcome =
            service.move_category(pending.node_id, pending.target_level, pending.target_parent);
        self.state = GateState::Idle;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::{GateState, MoveGate, PendingMove};
    use crate::model::category::{CategoryLevel, CategoryNode};
    use crate::tree::resolver::MoveResolution;
    use uuid::Uuid;

    fn node(level: CategoryLevel, children: Vec<CategoryNode>) -> CategoryNode {
        CategoryNode {
            id: Uuid::new_v4(),
            name: "Science".to_string(),
            description: String::new(),
            level,
            parent_id: None,
            order: 0,
            course_count: 0,
            created_at: 0,
            updated_at: 0,
            children,
        }
    }

    #[test]
    fn noop_resolution_keeps_gate_idle() {
        let mut gate = MoveGate::new();
        assert!(gate
            .propose(&node(CategoryLevel::Two, vec![]), MoveResolution::NoOp)
            .is_none());
        assert_eq!(gate.state(), &GateState::Idle);
    }

    #[test]
    fn propose_counts_descendants_and_cancel_returns_to_idle() {
        let grandchild = node(CategoryLevel::Three, vec![]);
        let child = node(CategoryLevel::Three, vec![]);
        let dragged = node(CategoryLevel::Two, vec![child, grandchild]);
        let parent = Uuid::new_v4();

        let mut gate = MoveGate::new();
        let pending = gate
            .propose(
                &dragged,
                MoveResolution::Move {
                    new_level: CategoryLevel::Two,
                    new_parent: Some(parent),
                },
            )
            .cloned()
            .unwrap();
        assert_eq!(pending.descendant_count, 2);
        assert_eq!(pending.target_parent, Some(parent));
        assert_eq!(
            pending.warning().as_deref(),
            Some("2 descendant categories will be adjusted automatically")
        );

        assert_eq!(gate.cancel(), Some(pending));
        assert_eq!(gate.state(), &GateState::Idle);
        assert_eq!(gate.cancel(), None);
    }

    #[test]
    fn leaf_move_has_no_warning() {
        let pending = PendingMove {
            node_id: Uuid::new_v4(),
            node_name: "Leaf".to_string(),
            descendant_count: 0,
            source_level: CategoryLevel::Three,
            target_level: CategoryLevel::Two,
            target_parent: Some(Uuid::new_v4()),
        };
        assert!(pending.warning().is_none());
        assert_eq!(pending.prompt(), "Move \"Leaf\" from level 3 to level 2?");
    }
}
