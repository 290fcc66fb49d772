//! Flat rows to nested tree, and the derived lookup structures.
//!
//! # Invariants
//! - Siblings are ordered by `order ASC, id ASC`.
//! - Nesting stops at level 3 regardless of the rows' parent links.
//! - `LevelIndex` is rebuilt from a tree snapshot, never patched in place.

use crate::model::category::{CategoryId, CategoryLevel, CategoryNode, CategoryRecord};
use log::warn;
use std::collections::HashMap;

const MAX_DEPTH: usize = 3;

/// Builds the nested view from flat category rows.
///
/// Rows whose parent is not part of `records` cannot be reached from a root
/// and are left out of the result.
pub fn normalize(records: &[CategoryRecord]) -> Vec<CategoryNode> {
    let mut groups: HashMap<Option<CategoryId>, Vec<&CategoryRecord>> = HashMap::new();
    for record in records {
        groups.entry(record.parent_id).or_default().push(record);
    }
    for siblings in groups.values_mut() {
        siblings.sort_by(|left, right| {
            left.order
                .cmp(&right.order)
                .then_with(|| left.id.cmp(&right.id))
        });
    }

    let roots = attach_children(&groups, None, 1);
    let attached = roots.iter().map(|root| 1 + count_descendants(root)).sum::<usize>();
    if attached != records.len() {
        warn!(
            "event=tree_normalize module=tree status=partial records={} attached={}",
            records.len(),
            attached
        );
    }
    roots
}

fn attach_children(
    groups: &HashMap<Option<CategoryId>, Vec<&CategoryRecord>>,
    parent_id: Option<CategoryId>,
    depth: usize,
) -> Vec<CategoryNode> {
    let Some(members) = groups.get(&parent_id) else {
        return Vec::new();
    };
    members
        .iter()
        .map(|record| {
            let mut node = CategoryNode::from_record(record);
            if depth < MAX_DEPTH {
                node.children = attach_children(groups, Some(record.id), depth + 1);
            }
            node
        })
        .collect()
}

/// One node's placement as emitted by `flatten`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlatPlacement {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub level: CategoryLevel,
    /// Position in the sibling array, not the stored order value.
    pub order: i64,
}

/// Depth-first walk emitting each node's placement.
pub fn flatten(tree: &[CategoryNode]) -> Vec<FlatPlacement> {
    let mut placements = Vec::new();
    flatten_into(tree, &mut placements);
    placements
}

fn flatten_into(nodes: &[CategoryNode], placements: &mut Vec<FlatPlacement>) {
    for (index, node) in nodes.iter().enumerate() {
        placements.push(FlatPlacement {
            id: node.id,
            parent_id: node.parent_id,
            level: node.level,
            order: index as i64,
        });
        flatten_into(&node.children, placements);
    }
}

/// Total number of nodes below `node`. Zero for leaves.
pub fn count_descendants(node: &CategoryNode) -> usize {
    node.children
        .iter()
        .map(|child| 1 + count_descendants(child))
        .sum()
}

/// Depth-first lookup by id.
pub fn find_node(tree: &[CategoryNode], id: CategoryId) -> Option<&CategoryNode> {
    tree.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find_node(&node.children, id)
        }
    })
}

/// Returns the sibling list under `parent_id` (roots for `None`).
pub fn siblings(tree: &[CategoryNode], parent_id: Option<CategoryId>) -> Option<&[CategoryNode]> {
    match parent_id {
        None => Some(tree),
        Some(parent_id) => find_node(tree, parent_id).map(|parent| parent.children.as_slice()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    level: CategoryLevel,
    parent_id: Option<CategoryId>,
}

/// Id → level/parent lookup derived from one tree snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelIndex {
    entries: HashMap<CategoryId, IndexEntry>,
}

impl LevelIndex {
    pub fn build(tree: &[CategoryNode]) -> Self {
        let mut entries = HashMap::new();
        index_nodes(tree, &mut entries);
        Self { entries }
    }

    pub fn level(&self, id: CategoryId) -> Option<CategoryLevel> {
        self.entries.get(&id).map(|entry| entry.level)
    }

    pub fn parent(&self, id: CategoryId) -> Option<CategoryId> {
        self.entries.get(&id).and_then(|entry| entry.parent_id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walks up from `id` (inclusive) to the first node at `level`.
    pub fn ancestor_at(&self, id: CategoryId, level: CategoryLevel) -> Option<CategoryId> {
        let mut cursor = Some(id);
        for _ in 0..=MAX_DEPTH {
            let current = cursor?;
            let entry = self.entries.get(&current)?;
            if entry.level == level {
                return Some(current);
            }
            cursor = entry.parent_id;
        }
        None
    }

    /// Returns whether `candidate` is `root` or lies below it.
    pub fn is_within(&self, root: CategoryId, candidate: CategoryId) -> bool {
        let mut cursor = Some(candidate);
        for _ in 0..=MAX_DEPTH {
            match cursor {
                Some(current) if current == root => return true,
                Some(current) => cursor = self.parent(current),
                None => return false,
            }
        }
        false
    }
}

fn index_nodes(nodes: &[CategoryNode], entries: &mut HashMap<CategoryId, IndexEntry>) {
    for node in nodes {
        entries.insert(
            node.id,
            IndexEntry {
                level: node.level,
                parent_id: node.parent_id,
            },
        );
        index_nodes(&node.children, entries);
    }
}
