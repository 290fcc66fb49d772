//! Drag-and-drop level/parent resolution over the fixed three-level policy.
//!
//! # Invariants
//! - Same-level `Beside` drags resolve to `NoOp`; sibling reordering is
//!   handled by `tree::reorder`. `Into` always targets one level below.
//! - Level-1 categories stay at the root.
//! - A `Move` always pairs level 1 with no parent and levels 2/3 with a
//!   parent one level up; unresolvable ancestors are reported, not guessed.

use crate::model::category::{CategoryId, CategoryLevel};
use crate::tree::normalize::LevelIndex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Where the dragged node was released relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPosition {
    /// Next to the target, taking the target's level.
    #[default]
    Beside,
    /// Onto the target, becoming its child.
    Into,
}

/// Result of resolving one drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResolution {
    /// Nothing to move.
    NoOp,
    /// Placement to submit through the move confirmation gate.
    Move {
        new_level: CategoryLevel,
        new_parent: Option<CategoryId>,
    },
}

/// Gestures that cannot be turned into a valid placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// Source or target is not part of the indexed tree.
    UnknownNode(CategoryId),
    /// No node at `level` contains `target`.
    AncestorNotFound {
        target: CategoryId,
        level: CategoryLevel,
    },
    /// Dropping into a level-3 node.
    DepthExceeded { target: CategoryId },
    /// Resolved parent lies inside the dragged subtree.
    WouldCreateCycle {
        source: CategoryId,
        parent: CategoryId,
    },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "category {id} is not in the current tree"),
            Self::AncestorNotFound { target, level } => {
                write!(f, "no level {level} category contains {target}")
            }
            Self::DepthExceeded { target } => write!(
                f,
                "category {target} is at the deepest level and cannot take children"
            ),
            Self::WouldCreateCycle { source, parent } => write!(
                f,
                "category {source} cannot be placed under its own descendant {parent}"
            ),
        }
    }
}

impl Error for ResolveError {}

/// Resolves a drag of `source` released on `target`.
pub fn resolve_move(
    index: &LevelIndex,
    source: CategoryId,
    target: CategoryId,
    position: DropPosition,
) -> Result<MoveResolution, ResolveError> {
    let source_level = index
        .level(source)
        .ok_or(ResolveError::UnknownNode(source))?;
    let target_level = index
        .level(target)
        .ok_or(ResolveError::UnknownNode(target))?;

    if source == target || (position == DropPosition::Beside && source_level == target_level) {
        return Ok(MoveResolution::NoOp);
    }
    if source_level == CategoryLevel::One {
        return Ok(MoveResolution::Move {
            new_level: CategoryLevel::One,
            new_parent: None,
        });
    }

    let new_level = match position {
        DropPosition::Beside => target_level,
        DropPosition::Into => target_level
            .child()
            .ok_or(ResolveError::DepthExceeded { target })?,
    };
    let new_parent = parent_for_level(index, new_level, target)?;

    if let Some(parent) = new_parent {
        if index.is_within(source, parent) {
            return Err(ResolveError::WouldCreateCycle { source, parent });
        }
    }
    if new_level == source_level && new_parent == index.parent(source) {
        return Ok(MoveResolution::NoOp);
    }

    Ok(MoveResolution::Move {
        new_level,
        new_parent,
    })
}

/// Parent a node landing at `new_level` next to or into `target` gets.
fn parent_for_level(
    index: &LevelIndex,
    new_level: CategoryLevel,
    target: CategoryId,
) -> Result<Option<CategoryId>, ResolveError> {
    let Some(parent_level) = new_level.parent() else {
        return Ok(None);
    };
    if index.level(target) == Some(parent_level) {
        return Ok(Some(target));
    }
    index
        .ancestor_at(target, parent_level)
        .map(Some)
        .ok_or(ResolveError::AncestorNotFound {
            target,
            level: parent_level,
        })
}

#[cfg(test)]
mod tests {
    use super::{resolve_move, DropPosition, MoveResolution, ResolveError};
    use crate::model::category::{CategoryId, CategoryLevel, CategoryRecord};
    use crate::tree::normalize::{normalize, LevelIndex};
    use uuid::Uuid;

    struct Fixture {
        a: CategoryId,
        b: CategoryId,
        c: CategoryId,
        d: CategoryId,
        e: CategoryId,
        g: CategoryId,
        index: LevelIndex,
    }

    fn record(
        id: CategoryId,
        level: CategoryLevel,
        parent_id: Option<CategoryId>,
        order: i64,
    ) -> CategoryRecord {
        CategoryRecord {
            id,
            name: id.to_string(),
            description: String::new(),
            level,
            parent_id,
            order,
            course_count: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    // A ─ C ─ D
    // B ─ E
    fn fixture() -> Fixture {
        let (a, b, c, d, e, g) = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let tree = normalize(&[
            record(a, CategoryLevel::One, None, 0),
            record(b, CategoryLevel::One, None, 1),
            record(c, CategoryLevel::Two, Some(a), 0),
            record(d, CategoryLevel::Three, Some(c), 0),
            record(e, CategoryLevel::Two, Some(b), 0),
            record(g, CategoryLevel::Three, Some(e), 0),
        ]);
        Fixture {
            a,
            b,
            c,
            d,
            e,
            g,
            index: LevelIndex::build(&tree),
        }
    }

    #[test]
    fn same_level_drag_is_noop() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.c, f.e, DropPosition::Beside),
            Ok(MoveResolution::NoOp)
        );
        assert_eq!(
            resolve_move(&f.index, f.d, f.g, DropPosition::Beside),
            Ok(MoveResolution::NoOp)
        );
        assert_eq!(
            resolve_move(&f.index, f.c, f.c, DropPosition::Into),
            Ok(MoveResolution::NoOp)
        );
    }

    #[test]
    fn drop_into_same_level_node_nests_under_it() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.c, f.e, DropPosition::Into),
            Ok(MoveResolution::Move {
                new_level: CategoryLevel::Three,
                new_parent: Some(f.e),
            })
        );
    }

    #[test]
    fn drop_into_same_level_leaf_is_rejected() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.d, f.g, DropPosition::Into),
            Err(ResolveError::DepthExceeded { target: f.g })
        );
    }

    #[test]
    fn level_two_dropped_on_root_is_promoted() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.c, f.b, DropPosition::Beside),
            Ok(MoveResolution::Move {
                new_level: CategoryLevel::One,
                new_parent: None,
            })
        );
    }

    #[test]
    fn root_source_always_stays_root() {
        let f = fixture();
        for target in [f.b, f.c, f.d, f.e] {
            for position in [DropPosition::Beside, DropPosition::Into] {
                assert_eq!(
                    resolve_move(&f.index, f.a, target, position),
                    Ok(MoveResolution::Move {
                        new_level: CategoryLevel::One,
                        new_parent: None,
                    })
                );
            }
        }
    }

    #[test]
    fn level_three_dropped_beside_level_two_is_promoted_under_its_root() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.d, f.e, DropPosition::Beside),
            Ok(MoveResolution::Move {
                new_level: CategoryLevel::Two,
                new_parent: Some(f.b),
            })
        );
    }

    #[test]
    fn level_two_dropped_beside_level_three_is_demoted_under_its_parent() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.e, f.d, DropPosition::Beside),
            Ok(MoveResolution::Move {
                new_level: CategoryLevel::Three,
                new_parent: Some(f.c),
            })
        );
    }

    #[test]
    fn drop_into_uses_target_as_parent() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.d, f.b, DropPosition::Into),
            Ok(MoveResolution::Move {
                new_level: CategoryLevel::Two,
                new_parent: Some(f.b),
            })
        );
        assert_eq!(
            resolve_move(&f.index, f.c, f.b, DropPosition::Into),
            Ok(MoveResolution::Move {
                new_level: CategoryLevel::Two,
                new_parent: Some(f.b),
            })
        );
    }

    #[test]
    fn drop_into_current_parent_is_noop() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.c, f.a, DropPosition::Into),
            Ok(MoveResolution::NoOp)
        );
    }

    #[test]
    fn drop_into_level_three_is_rejected() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.e, f.d, DropPosition::Into),
            Err(ResolveError::DepthExceeded { target: f.d })
        );
    }

    #[test]
    fn drop_under_own_descendant_is_rejected() {
        let f = fixture();
        assert_eq!(
            resolve_move(&f.index, f.c, f.d, DropPosition::Beside),
            Err(ResolveError::WouldCreateCycle {
                source: f.c,
                parent: f.c,
            })
        );
    }

    #[test]
    fn unknown_nodes_are_reported() {
        let f = fixture();
        let stranger = Uuid::new_v4();
        assert_eq!(
            resolve_move(&f.index, stranger, f.a, DropPosition::Beside),
            Err(ResolveError::UnknownNode(stranger))
        );
    }

    #[test]
    fn resolved_levels_stay_in_range_for_every_pair() {
        let f = fixture();
        let ids = [f.a, f.b, f.c, f.d, f.e, f.g];
        for source in ids {
            for target in ids {
                for position in [DropPosition::Beside, DropPosition::Into] {
                    if let Ok(MoveResolution::Move {
                        new_level,
                        new_parent,
                    }) = resolve_move(&f.index, source, target, position)
                    {
                        assert!(CategoryLevel::ALL.contains(&new_level));
                        assert_eq!(new_parent.is_some(), new_level != CategoryLevel::One);
                    }
                }
            }
        }
    }
}
