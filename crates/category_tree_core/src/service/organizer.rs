//! Drag session over one category tree.
//!
//! # Responsibility
//! - Keep the cached snapshot, nested tree and level index in step.
//! - Route drag gestures to sibling reordering or the move confirmation gate.
//!
//! # Invariants
//! - Tree and `LevelIndex` are rebuilt together whenever the cache changes.
//! - Optimistic order patches live until the next snapshot arrives through
//!   `refresh` or `on_snapshot`; the organizer never reloads on its own.
//! - Only one reorder batch or move commit runs per session at a time:
//!   both take `&mut self` and finish before returning.

use crate::model::category::{CategoryId, CategoryNode, CategoryRecord};
use crate::repo::category_repo::{CategoryRepoResult, CategoryStore};
use crate::service::category_service::CategoryService;
use crate::service::move_gate::{MoveGate, PendingMove};
use crate::service::notice::{MutationOutcome, Notice};
use crate::tree::cache::TreeCache;
use crate::tree::normalize::{find_node, siblings, LevelIndex};
use crate::tree::reorder::{move_within, plan_reorder, ReorderReport};
use crate::tree::resolver::{resolve_move, DropPosition, MoveResolution};
use log::{debug, info};

/// What a drag gesture turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing changed.
    NoOp,
    /// Siblings were reordered and persisted.
    Reordered { report: ReorderReport, notice: Notice },
    /// A cross-level move waits for `confirm_move` or `cancel_move`.
    AwaitingConfirmation(PendingMove),
    /// Gesture refused before any store call.
    Rejected(Notice),
}

/// View-model for one category tree editing session.
pub struct TreeOrganizer<S: CategoryStore> {
    service: CategoryService<S>,
    cache: TreeCache,
    tree: Vec<CategoryNode>,
    index: LevelIndex,
    gate: MoveGate,
}

impl<S: CategoryStore> TreeOrganizer<S> {
    /// Loads the initial snapshot from `store`.
    pub fn new(store: S) -> CategoryRepoResult<Self> {
        let records = store.list_categories()?;
        let mut organizer = Self {
            service: CategoryService::new(store),
            cache: TreeCache::new(records),
            tree: Vec::new(),
            index: LevelIndex::default(),
            gate: MoveGate::new(),
        };
        organizer.rebuild();
        Ok(organizer)
    }

    pub fn service(&self) -> &CategoryService<S> {
        &self.service
    }

    /// Current nested view, including optimistic order patches.
    pub fn tree(&self) -> &[CategoryNode] {
        &self.tree
    }

    pub fn level_index(&self) -> &LevelIndex {
        &self.index
    }

    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    pub fn node(&self, id: CategoryId) -> Option<&CategoryNode> {
        find_node(&self.tree, id)
    }

    /// Whether the move gate is mid-commit.
    ///
    /// Reorders and confirmations finish their store work before returning,
    /// so this reads `false` between calls.
    pub fn is_saving(&self) -> bool {
        self.gate.is_committing()
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.gate.pending()
    }

    /// Re-reads the authoritative list from the store.
    pub fn refresh(&mut self) -> CategoryRepoResult<()> {
        let records = self.service.store().list_categories()?;
        self.on_snapshot(records);
        Ok(())
    }

    /// Installs a pushed snapshot, dropping pending order patches.
    pub fn on_snapshot(&mut self, records: Vec<CategoryRecord>) {
        self.cache.replace_confirmed(records);
        self.rebuild();
        debug!(
            "event=tree_snapshot module=organizer status=ok revision={} nodes={}",
            self.cache.revision(),
            self.index.len()
        );
    }

    /// Handles a drag of `source` released on `target`.
    pub fn handle_drag_end(
        &mut self,
        source: CategoryId,
        target: CategoryId,
        position: DropPosition,
    ) -> DragOutcome {
        let (Some(source_level), Some(target_level)) =
            (self.index.level(source), self.index.level(target))
        else {
            return DragOutcome::Rejected(Notice::error(
                "Category is no longer in the tree; refresh and try again",
            ));
        };

        if source_level == target_level && position == DropPosition::Beside {
            return self.reorder_siblings(source, target);
        }

        match resolve_move(&self.index, source, target, position) {
            Ok(MoveResolution::NoOp) => DragOutcome::NoOp,
            // Roots resolve to the root placement they already have.
            Ok(MoveResolution::Move {
                new_level,
                new_parent,
            }) if new_level == source_level && new_parent == self.index.parent(source) => {
                DragOutcome::NoOp
            }
            Ok(resolution) => {
                let Some(node) = find_node(&self.tree, source) else {
                    return DragOutcome::NoOp;
                };
                match self.gate.propose(node, resolution) {
                    Some(pending) => DragOutcome::AwaitingConfirmation(pending.clone()),
                    None => DragOutcome::NoOp,
                }
            }
            Err(err) => {
                info!(
                    "event=category_drag module=organizer status=rejected error={}",
                    err
                );
                DragOutcome::Rejected(Notice::error(format!("Cannot move category: {err}")))
            }
        }
    }

    /// Commits the pending move. `None` when nothing is pending.
    pub fn confirm_move(&mut self) -> Option<MutationOutcome<()>> {
        self.gate.confirm(&self.service)
    }

    /// Drops the pending move without touching the store.
    pub fn cancel_move(&mut self) -> Option<PendingMove> {
        self.gate.cancel()
    }

    fn reorder_siblings(&mut self, source: CategoryId, target: CategoryId) -> DragOutcome {
        let parent = self.index.parent(source);
        if parent != self.index.parent(target) {
            return DragOutcome::NoOp;
        }
        let Some(current) = siblings(&self.tree, parent) else {
            return DragOutcome::NoOp;
        };
        let ids: Vec<CategoryId> = current.iter().map(|node| node.id).collect();
        let Some(sequence) = move_within(&ids, source, target) else {
            return DragOutcome::NoOp;
        };

        let plan = plan_reorder(&sequence);
        self.cache.apply_patches(&plan);
        self.rebuild();

        let (report, notice) = self.service.persist_order(&plan);

        DragOutcome::Reordered { report, notice }
    }

    fn rebuild(&mut self) {
        self.tree = self.cache.tree();
        self.index = LevelIndex::build(&self.tree);
    }
}
