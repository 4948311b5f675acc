//! # Drop resolution
//!
//! Turns a live drop preview into a legality-checked decision:
//!
//! - **Reorder**: every dragged node already lives in the destination
//! - **Move**: at least one dragged node comes from elsewhere
//!
//! Indices in a [`DropPreview`] address the destination's children *before*
//! the dragged nodes are taken out. The resolved `insert_at` addresses the
//! list *after* removal, which is what the tree transforms expect.

use casebundle_tree::Tree;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Where a pending drag would land if released now
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPreview {
    /// Destination folder; `None` is the bundle root
    pub parent_id: Option<String>,
    pub index: usize,
}

impl DropPreview {
    pub fn new(parent_id: Option<&str>, index: usize) -> Self {
        Self {
            parent_id: parent_id.map(str::to_string),
            index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    Reorder,
    Move,
}

/// A legal drop, ready for the move engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDrop {
    pub kind: DropKind,
    pub destination: Option<String>,
    /// Dragged ids in display order (not drag-anchor order)
    pub node_ids: Vec<String>,
    /// Index into the destination's children once the dragged nodes are out
    pub insert_at: usize,
    /// Destination child count once the dragged nodes are out
    pub remaining_len: usize,
}

impl ResolvedDrop {
    /// Whether the block lands anywhere but the end of the destination
    pub fn lands_before_end(&self) -> bool {
        self.insert_at < self.remaining_len
    }
}

/// Classify a drop and check it is legal.
///
/// Dragged ids that vanished from the tree (a reload or deletion raced the
/// gesture) are dropped silently; if none are left the drop is rejected.
pub fn resolve(
    tree: &Tree,
    dragged_ids: &[String],
    preview: &DropPreview,
) -> Result<ResolvedDrop, ValidationError> {
    if dragged_ids.is_empty() {
        return Err(ValidationError::EmptyDrag);
    }

    let node_ids = in_display_order(tree, dragged_ids);
    if node_ids.is_empty() {
        return Err(ValidationError::DraggedNodeMissing(dragged_ids[0].clone()));
    }

    // The root may be addressed by its own id; children of the root report no parent
    let destination = preview
        .parent_id
        .as_deref()
        .filter(|id| *id != tree.root_id());
    let siblings = match tree.children_of(destination) {
        Some(siblings) => siblings,
        None => {
            return Err(ValidationError::DestinationNotFolder(
                destination.unwrap_or_default().to_string(),
            ))
        }
    };

    if let Some(dest) = destination {
        check_not_into_self(tree, &node_ids, dest)?;
    }

    let index = preview.index.min(siblings.len());
    let removed_before = siblings[..index]
        .iter()
        .filter(|id| node_ids.contains(id))
        .count();
    let removed_total = siblings.iter().filter(|id| node_ids.contains(id)).count();

    let all_local = node_ids
        .iter()
        .all(|id| tree.find_parent_id(id) == destination);

    Ok(ResolvedDrop {
        kind: if all_local { DropKind::Reorder } else { DropKind::Move },
        destination: destination.map(str::to_string),
        node_ids,
        insert_at: index - removed_before,
        remaining_len: siblings.len() - removed_total,
    })
}

/// Reject moving a dragged folder into itself or anything beneath it
fn check_not_into_self(
    tree: &Tree,
    node_ids: &[String],
    destination: &str,
) -> Result<(), ValidationError> {
    for id in node_ids {
        let is_folder = tree.find_node(id).is_some_and(|e| e.is_folder());
        if !is_folder {
            continue;
        }

        if id == destination {
            return Err(ValidationError::FolderIntoItself(id.clone()));
        }
        if tree.is_descendant(id, destination) {
            return Err(ValidationError::FolderIntoDescendant {
                folder: id.clone(),
                destination: destination.to_string(),
            });
        }
    }
    Ok(())
}

/// Existing dragged ids, deduplicated, in display order
fn in_display_order(tree: &Tree, dragged_ids: &[String]) -> Vec<String> {
    if dragged_ids.len() == 1 {
        return dragged_ids
            .iter()
            .filter(|id| tree.contains(id))
            .cloned()
            .collect();
    }

    tree.document_order()
        .into_iter()
        .filter(|id| dragged_ids.contains(id))
        .collect()
}
