//! # Move engine
//!
//! Applies a resolved drop to the tree and produces the plan the sync layer
//! persists.
//!
//! ## Plan semantics
//!
//! ### Reorder
//! - Dragged nodes are pulled out of their shared parent and re-inserted as
//!   one contiguous block, in their original relative order
//! - Persisted as one "set sibling order" call with the parent's full list
//!
//! ### Move
//! - Each dragged node is pulled out of wherever it lives (parents may
//!   differ across a multi-selection) and the block is spliced into the
//!   destination
//! - The backend move appends at the end; when the block landed anywhere
//!   else a follow-up reorder is needed
//!
//! ### No-op
//! - Result identical to the input: same `Arc`, no plan, no remote call

use std::sync::Arc;

use casebundle_tree::{transforms, Tree};
use serde::{Deserialize, Serialize};

use crate::drop_resolver::{resolve, DropKind, DropPreview, ResolvedDrop};
use crate::errors::ValidationError;

/// Normalized description of a local tree change, sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MovePlan {
    #[serde(rename_all = "camelCase")]
    Reorder {
        parent_id: Option<String>,
        /// Full child list of the parent after the reorder
        ordered_ids: Vec<String>,
    },

    #[serde(rename_all = "camelCase")]
    Move {
        node_ids: Vec<String>,
        destination: Option<String>,
        /// Where the block starts among the destination's children
        index: usize,
        needs_follow_up_reorder: bool,
    },
}

impl MovePlan {
    pub fn kind(&self) -> &'static str {
        match self {
            MovePlan::Reorder { .. } => "reorder",
            MovePlan::Move { .. } => "move",
        }
    }
}

/// Result of running a drop through the engine
#[derive(Debug, Clone)]
pub struct DropOutcome {
    /// The tree the drop was computed against
    pub base: Arc<Tree>,
    /// The next tree; the input `Arc` itself when nothing changed
    pub tree: Arc<Tree>,
    pub plan: Option<MovePlan>,
}

impl DropOutcome {
    pub fn unchanged(tree: &Arc<Tree>) -> Self {
        Self {
            base: Arc::clone(tree),
            tree: Arc::clone(tree),
            plan: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.plan.is_none()
    }
}

/// Resolve and apply a drop.
///
/// Illegal drops come back as `Err` with the tree untouched; callers treat
/// them exactly like a no-op.
pub fn execute_drop(
    tree: &Arc<Tree>,
    dragged_ids: &[String],
    preview: &DropPreview,
) -> Result<DropOutcome, ValidationError> {
    let resolved = resolve(tree, dragged_ids, preview)?;
    Ok(apply(tree, &resolved))
}

/// Apply an already-resolved drop
pub fn apply(tree: &Arc<Tree>, resolved: &ResolvedDrop) -> DropOutcome {
    match resolved.kind {
        DropKind::Reorder => apply_reorder(tree, resolved),
        DropKind::Move => apply_move(tree, resolved),
    }
}

fn apply_reorder(tree: &Arc<Tree>, resolved: &ResolvedDrop) -> DropOutcome {
    let parent = resolved.destination.as_deref();
    let current = match tree.children_of(parent) {
        Some(children) => children,
        None => return DropOutcome::unchanged(tree),
    };

    let mut ordered: Vec<String> = current
        .iter()
        .filter(|id| !resolved.node_ids.contains(id))
        .cloned()
        .collect();
    let at = resolved.insert_at.min(ordered.len());
    ordered.splice(at..at, resolved.node_ids.iter().cloned());

    let next = transforms::set_child_order(tree, parent, &ordered);
    if Arc::ptr_eq(tree, &next) {
        tracing::debug!("Drop of {:?} leaves {:?} unchanged", resolved.node_ids, parent);
        return DropOutcome::unchanged(tree);
    }

    DropOutcome {
        base: Arc::clone(tree),
        tree: next,
        plan: Some(MovePlan::Reorder {
            parent_id: resolved.destination.clone(),
            ordered_ids: ordered,
        }),
    }
}

fn apply_move(tree: &Arc<Tree>, resolved: &ResolvedDrop) -> DropOutcome {
    let destination = resolved.destination.as_deref();
    let next = transforms::move_nodes(tree, &resolved.node_ids, destination, resolved.insert_at);
    if Arc::ptr_eq(tree, &next) {
        tracing::debug!("Move of {:?} into {:?} changed nothing", resolved.node_ids, destination);
        return DropOutcome::unchanged(tree);
    }

    DropOutcome {
        base: Arc::clone(tree),
        tree: next,
        plan: Some(MovePlan::Move {
            node_ids: resolved.node_ids.clone(),
            destination: resolved.destination.clone(),
            index: resolved.insert_at,
            needs_follow_up_reorder: resolved.lands_before_end(),
        }),
    }
}

/// Rebuild the destination order the user asked for from the backend's
/// authoritative child list: moved ids are taken out and re-inserted as a
/// block at `index`.
pub fn follow_up_order(authoritative: &[String], node_ids: &[String], index: usize) -> Vec<String> {
    let mut ordered: Vec<String> = authoritative
        .iter()
        .filter(|id| !node_ids.contains(id))
        .cloned()
        .collect();
    let moved: Vec<String> = node_ids
        .iter()
        .filter(|id| authoritative.contains(id))
        .cloned()
        .collect();

    let at = index.min(ordered.len());
    ordered.splice(at..at, moved);
    ordered
}
