//! # Drag controller
//!
//! A pointer-drag gesture as an explicit state machine:
//!
//! ```text
//!          start                drop (plan)         begin_persist
//! Idle ──────────► Dragging ─────────────► Resolved ─────────────► Persisting
//!  ▲                 │  │                                               │
//!  │   cancel / no   │  │ drop (no-op, illegal, no preview)             │ finish
//!  └─────────────────┴──┴───────────────────────────────────────────────┘
//! ```
//!
//! A new gesture may start while an earlier one is still `Resolved` or
//! `Persisting`; persistence of the earlier plan carries on independently.
//!
//! ## Hover rules
//!
//! - Carrying files over a folder's header row previews "insert inside at
//!   0", never "reorder next to this folder"
//! - Otherwise each row splits at its vertical midpoint into a "before" and
//!   an "after" zone
//! - Hovering one of the dragged nodes previews nothing

use std::sync::Arc;

use casebundle_tree::Tree;

use crate::drop_resolver::DropPreview;
use crate::errors::DragError;
use crate::move_engine::{execute_drop, DropOutcome, MovePlan};
use crate::selection::SelectionManager;

/// Synthetic id of the drop zone shown for an empty bundle
pub const ROOT_DROP_ZONE: &str = "ROOT";

/// Suffix of a folder's synthetic interior drop zone, `"<folderId>::content"`
pub const CONTENT_ZONE_SUFFIX: &str = "::content";

/// What the pointer is over, decoded from a raw droppable id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverTarget {
    Root,
    FolderContent(String),
    Row(String),
}

impl HoverTarget {
    pub fn parse(raw: &str) -> Self {
        if raw == ROOT_DROP_ZONE {
            return HoverTarget::Root;
        }
        match raw.strip_suffix(CONTENT_ZONE_SUFFIX) {
            Some(folder) => HoverTarget::FolderContent(folder.to_string()),
            None => HoverTarget::Row(raw.to_string()),
        }
    }

    pub fn content_zone_id(folder_id: &str) -> String {
        format!("{}{}", folder_id, CONTENT_ZONE_SUFFIX)
    }
}

/// Vertical extent of the hovered row, in the same units as the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowRect {
    pub top: f32,
    pub height: f32,
}

impl RowRect {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    pub fn midpoint(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// State of an in-progress drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    /// Nodes being dragged, in display order
    pub dragged_ids: Vec<String>,
    /// Raw id of the hovered droppable (may be synthetic)
    pub over_id: Option<String>,
    pub drop_preview: Option<DropPreview>,
    carrying_files: bool,
}

impl DragState {
    pub fn is_carrying_files(&self) -> bool {
        self.carrying_files
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging(DragState),
    Resolved { gesture: u64, plan: MovePlan },
    Persisting { gesture: u64, plan: MovePlan },
}

impl DragPhase {
    pub fn name(&self) -> &'static str {
        match self {
            DragPhase::Idle => "idle",
            DragPhase::Dragging(_) => "dragging",
            DragPhase::Resolved { .. } => "resolved",
            DragPhase::Persisting { .. } => "persisting",
        }
    }
}

#[derive(Debug)]
pub struct DragController {
    phase: DragPhase,
    next_gesture: u64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
            next_gesture: 1,
        }
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        match &self.phase {
            DragPhase::Dragging(state) => Some(state),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&DropPreview> {
        self.drag_state().and_then(|s| s.drop_preview.as_ref())
    }

    /// Begin dragging `active_id`.
    ///
    /// A file that is part of the selection drags the whole selection;
    /// any other file collapses the selection to itself. Folders always
    /// drag alone.
    pub fn start(
        &mut self,
        tree: &Tree,
        selection: &mut SelectionManager,
        active_id: &str,
    ) -> Result<DragState, DragError> {
        if let DragPhase::Dragging(_) = self.phase {
            return Err(self.invalid("start"));
        }

        let entry = tree
            .find_node(active_id)
            .ok_or_else(|| DragError::UnknownSource(active_id.to_string()))?;

        let dragged_ids = if entry.is_folder() {
            vec![active_id.to_string()]
        } else if selection.is_selected(active_id) {
            selection.ordered(tree)
        } else {
            selection.select_single(tree, active_id);
            vec![active_id.to_string()]
        };

        tracing::debug!("Drag started with {:?}", dragged_ids);
        let state = DragState {
            dragged_ids,
            over_id: None,
            drop_preview: None,
            carrying_files: entry.is_file(),
        };
        self.phase = DragPhase::Dragging(state.clone());
        Ok(state)
    }

    /// Update the live preview for the hovered droppable.
    ///
    /// `over_raw_id` of `None` means the pointer left every drop target and
    /// cancels the gesture.
    pub fn drag_over(
        &mut self,
        tree: &Tree,
        over_raw_id: Option<&str>,
        pointer_y: f32,
        over_rect: RowRect,
    ) -> Result<Option<&DropPreview>, DragError> {
        if !matches!(self.phase, DragPhase::Dragging(_)) {
            return Err(self.invalid("drag over"));
        }

        let raw = match over_raw_id {
            Some(raw) => raw,
            None => {
                self.cancel();
                return Ok(None);
            }
        };

        let state = match &mut self.phase {
            DragPhase::Dragging(state) => state,
            other => {
                return Err(DragError::InvalidTransition {
                    phase: other.name(),
                    event: "drag over",
                })
            }
        };

        state.over_id = Some(raw.to_string());
        let target = HoverTarget::parse(raw);
        state.drop_preview = compute_preview(tree, state, &target, pointer_y, over_rect);
        Ok(state.drop_preview.as_ref())
    }

    /// Abandon the current drag without touching the tree. Earlier gestures
    /// that are already persisting are unaffected.
    pub fn cancel(&mut self) {
        if let DragPhase::Dragging(_) = self.phase {
            tracing::debug!("Drag cancelled");
            self.phase = DragPhase::Idle;
        }
    }

    /// Release the pointer: resolve the preview against `tree`.
    ///
    /// Illegal drops, drops without a preview and drops that change nothing
    /// all return an unchanged outcome and go straight back to `Idle`.
    pub fn drop(&mut self, tree: &Arc<Tree>) -> Result<DropOutcome, DragError> {
        let state = match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Dragging(state) => state,
            other => {
                self.phase = other;
                return Err(self.invalid("drop"));
            }
        };

        let preview = match state.drop_preview {
            Some(preview) => preview,
            None => return Ok(DropOutcome::unchanged(tree)),
        };

        let outcome = match execute_drop(tree, &state.dragged_ids, &preview) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!("Drop rejected: {}", e);
                return Ok(DropOutcome::unchanged(tree));
            }
        };

        if let Some(plan) = &outcome.plan {
            let gesture = self.next_gesture;
            self.next_gesture += 1;
            self.phase = DragPhase::Resolved {
                gesture,
                plan: plan.clone(),
            };
        }
        Ok(outcome)
    }

    /// Hand the resolved plan to persistence. Returns the gesture number.
    pub fn begin_persist(&mut self) -> Result<(u64, MovePlan), DragError> {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Resolved { gesture, plan } => {
                self.phase = DragPhase::Persisting {
                    gesture,
                    plan: plan.clone(),
                };
                Ok((gesture, plan))
            }
            other => {
                self.phase = other;
                Err(self.invalid("persist"))
            }
        }
    }

    /// Persistence of `gesture` finished. Ignored when a newer gesture has
    /// already taken over the controller.
    pub fn finish(&mut self, gesture: u64) {
        if let DragPhase::Persisting { gesture: current, .. } = self.phase {
            if current == gesture {
                self.phase = DragPhase::Idle;
            }
        }
    }

    fn invalid(&self, event: &'static str) -> DragError {
        DragError::InvalidTransition {
            phase: self.phase.name(),
            event,
        }
    }
}

fn compute_preview(
    tree: &Tree,
    state: &DragState,
    target: &HoverTarget,
    pointer_y: f32,
    over_rect: RowRect,
) -> Option<DropPreview> {
    let is_dragged = |id: &str| state.dragged_ids.iter().any(|d| d == id);

    match target {
        HoverTarget::Root => {
            let len = tree.children_of(None).map_or(0, |c| c.len());
            Some(DropPreview::new(None, len))
        }

        HoverTarget::FolderContent(folder) => {
            let entry = tree.find_node(folder)?;
            if !entry.is_folder() || is_dragged(folder) {
                return None;
            }
            Some(DropPreview::new(Some(folder), 0))
        }

        HoverTarget::Row(id) => {
            let entry = tree.find_node(id)?;
            if is_dragged(id) {
                return None;
            }

            if state.carrying_files && entry.is_folder() {
                return Some(DropPreview::new(Some(id), 0));
            }

            let position = tree.position_of(id)?;
            let after = pointer_y > over_rect.midpoint();
            Some(DropPreview {
                parent_id: position.parent_id,
                index: position.index + usize::from(after),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebundle_tree::Node;

    fn tree() -> Arc<Tree> {
        Arc::new(
            Tree::from_root(Node::folder(
                "root",
                "Bundle",
                vec![
                    Node::file("a", "A"),
                    Node::file("b", "B"),
                    Node::folder("x", "FolderX", vec![Node::file("c", "C")]),
                ],
            ))
            .unwrap(),
        )
    }

    const ROW: RowRect = RowRect { top: 100.0, height: 20.0 };
    const TOP_HALF: f32 = 105.0;
    const BOTTOM_HALF: f32 = 115.0;

    #[test]
    fn test_parse_hover_targets() {
        assert_eq!(HoverTarget::parse("ROOT"), HoverTarget::Root);
        assert_eq!(
            HoverTarget::parse("x::content"),
            HoverTarget::FolderContent("x".to_string())
        );
        assert_eq!(HoverTarget::parse("a"), HoverTarget::Row("a".to_string()));
        assert_eq!(HoverTarget::content_zone_id("x"), "x::content");
    }

    #[test]
    fn test_start_with_unselected_file_collapses_selection() {
        let t = tree();
        let mut selection = SelectionManager::new();
        selection.select_single(&t, "b");

        let mut drag = DragController::new();
        let state = drag.start(&t, &mut selection, "a").unwrap();
        assert_eq!(state.dragged_ids, vec!["a"]);
        assert!(selection.is_selected("a"));
        assert!(!selection.is_selected("b"));
    }

    #[test]
    fn test_start_with_selected_file_drags_selection_in_order() {
        let t = tree();
        let mut selection = SelectionManager::new();
        selection.select_toggle(&t, "c");
        selection.select_toggle(&t, "a");

        let mut drag = DragController::new();
        let state = drag.start(&t, &mut selection, "c").unwrap();
        assert_eq!(state.dragged_ids, vec!["a", "c"]);
    }

    #[test]
    fn test_folder_drags_alone() {
        let t = tree();
        let mut selection = SelectionManager::new();
        selection.select_toggle(&t, "a");

        let mut drag = DragController::new();
        let state = drag.start(&t, &mut selection, "x").unwrap();
        assert_eq!(state.dragged_ids, vec!["x"]);
        assert!(!state.is_carrying_files());
    }

    #[test]
    fn test_midpoint_splits_row() {
        let t = tree();
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();
        drag.start(&t, &mut selection, "b").unwrap();

        let top = drag.drag_over(&t, Some("a"), TOP_HALF, ROW).unwrap().cloned();
        assert_eq!(top, Some(DropPreview::new(None, 0)));

        let bottom = drag.drag_over(&t, Some("a"), BOTTOM_HALF, ROW).unwrap().cloned();
        assert_eq!(bottom, Some(DropPreview::new(None, 1)));
    }

    #[test]
    fn test_files_over_folder_header_snap_inside() {
        let t = tree();
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();
        drag.start(&t, &mut selection, "a").unwrap();

        let preview = drag.drag_over(&t, Some("x"), BOTTOM_HALF, ROW).unwrap().cloned();
        assert_eq!(preview, Some(DropPreview::new(Some("x"), 0)));
    }

    #[test]
    fn test_folder_over_folder_header_reorders() {
        let t = Arc::new(
            Tree::from_root(Node::folder(
                "root",
                "Bundle",
                vec![Node::folder("x", "X", vec![]), Node::folder("y", "Y", vec![])],
            ))
            .unwrap(),
        );
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();
        drag.start(&t, &mut selection, "y").unwrap();

        let preview = drag.drag_over(&t, Some("x"), TOP_HALF, ROW).unwrap().cloned();
        assert_eq!(preview, Some(DropPreview::new(None, 0)));
    }

    #[test]
    fn test_hovering_dragged_node_has_no_preview() {
        let t = tree();
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();
        drag.start(&t, &mut selection, "a").unwrap();

        assert_eq!(drag.drag_over(&t, Some("a"), TOP_HALF, ROW).unwrap(), None);
    }

    #[test]
    fn test_root_and_content_zones() {
        let t = tree();
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();
        drag.start(&t, &mut selection, "c").unwrap();

        let root = drag.drag_over(&t, Some("ROOT"), 0.0, ROW).unwrap().cloned();
        assert_eq!(root, Some(DropPreview::new(None, 3)));

        let content = drag.drag_over(&t, Some("x::content"), 0.0, ROW).unwrap().cloned();
        assert_eq!(content, Some(DropPreview::new(Some("x"), 0)));
    }

    #[test]
    fn test_leaving_all_targets_cancels() {
        let t = tree();
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();
        drag.start(&t, &mut selection, "a").unwrap();

        assert_eq!(drag.drag_over(&t, None, 0.0, ROW).unwrap(), None);
        assert_eq!(drag.phase(), &DragPhase::Idle);
    }

    #[test]
    fn test_full_lifecycle() {
        let t = tree();
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();

        drag.start(&t, &mut selection, "b").unwrap();
        drag.drag_over(&t, Some("a"), TOP_HALF, ROW).unwrap();
        let outcome = drag.drop(&t).unwrap();
        assert!(outcome.plan.is_some());
        assert_eq!(drag.phase().name(), "resolved");

        let (gesture, _plan) = drag.begin_persist().unwrap();
        assert_eq!(drag.phase().name(), "persisting");

        // A second gesture may start before the first finishes
        drag.start(&outcome.tree, &mut selection, "a").unwrap();
        drag.finish(gesture);
        assert_eq!(drag.phase().name(), "dragging");
    }

    #[test]
    fn test_invalid_transitions() {
        let t = tree();
        let mut drag = DragController::new();
        assert_eq!(
            drag.drop(&t).unwrap_err(),
            DragError::InvalidTransition { phase: "idle", event: "drop" }
        );
        assert!(drag.begin_persist().is_err());

        let mut selection = SelectionManager::new();
        drag.start(&t, &mut selection, "a").unwrap();
        assert!(drag.start(&t, &mut selection, "b").is_err());
    }

    #[test]
    fn test_drop_without_preview_is_noop() {
        let t = tree();
        let mut selection = SelectionManager::new();
        let mut drag = DragController::new();
        drag.start(&t, &mut selection, "a").unwrap();

        let outcome = drag.drop(&t).unwrap();
        assert!(outcome.is_noop());
        assert!(Arc::ptr_eq(&t, &outcome.tree));
        assert_eq!(drag.phase(), &DragPhase::Idle);
    }
}
