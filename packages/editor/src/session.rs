//! # Edit Session
//!
//! One client's view of a bundle: the shared live tree plus the state that
//! never leaves the client (selection, folder expansion, the drag gesture).
//!
//! Every change to the tree goes through the [`SyncCoordinator`]; the
//! session only prunes its client-side state afterwards so it never points
//! at ids that no longer exist.

use std::sync::Arc;

use casebundle_tree::{Node, Tree};
use tokio::task::JoinHandle;

use crate::drag::{DragController, DragState, RowRect};
use crate::drop_resolver::DropPreview;
use crate::errors::{EditorError, SyncError};
use crate::remote::RemoteStore;
use crate::selection::{visible_file_order, ClickModifiers, ExpansionState, SelectionManager};
use crate::sync::{Operation, PendingSync, SyncCoordinator, SyncEvent};

pub struct EditSession<R: RemoteStore + ?Sized> {
    coordinator: Arc<SyncCoordinator<R>>,
    selection: SelectionManager,
    expansion: ExpansionState,
    drag: DragController,
}

impl<R: RemoteStore + ?Sized + 'static> EditSession<R> {
    pub fn new(coordinator: Arc<SyncCoordinator<R>>) -> Self {
        Self {
            coordinator,
            selection: SelectionManager::new(),
            expansion: ExpansionState::new(),
            drag: DragController::new(),
        }
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator<R>> {
        &self.coordinator
    }

    /// Current tree
    pub fn tree(&self) -> Arc<Tree> {
        self.coordinator.service().snapshot()
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// File ids in on-screen order
    pub fn visible_files(&self) -> Vec<String> {
        visible_file_order(&self.tree(), &self.expansion)
    }

    pub fn click(&mut self, id: &str, modifiers: ClickModifiers) {
        let tree = self.tree();
        self.selection.click(&tree, id, modifiers, &self.expansion);
    }

    pub fn toggle_folder(&mut self, folder_id: &str) {
        self.expansion.toggle(folder_id);
    }

    pub fn drag_start(&mut self, active_id: &str) -> Result<DragState, EditorError> {
        let tree = self.tree();
        Ok(self.drag.start(&tree, &mut self.selection, active_id)?)
    }

    pub fn drag_over(
        &mut self,
        over_raw_id: Option<&str>,
        pointer_y: f32,
        over_rect: RowRect,
    ) -> Result<Option<DropPreview>, EditorError> {
        let tree = self.tree();
        let preview = self.drag.drag_over(&tree, over_raw_id, pointer_y, over_rect)?;
        Ok(preview.cloned())
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// Release the pointer. Publishes the optimistic tree and returns the
    /// change still to be persisted, or `None` when the drop changed nothing.
    pub fn drop(&mut self) -> Result<Option<PendingSync>, EditorError> {
        let tree = self.tree();
        let outcome = self.drag.drop(&tree)?;
        if outcome.is_noop() {
            return Ok(None);
        }

        let (gesture, _) = self.drag.begin_persist()?;
        let pending = self.coordinator.apply_optimistically(gesture, outcome);
        match &pending {
            Some(PendingSync {
                operation: Operation::Drop { plan, .. },
                ..
            }) => tracing::debug!("Gesture {} published {} plan", gesture, plan.kind()),
            _ => self.drag.finish(gesture),
        }
        Ok(pending)
    }

    /// Persist a dropped gesture and wait for the backend
    pub async fn persist(&mut self, pending: PendingSync) -> Result<(), EditorError> {
        let result = self.coordinator.persist(&pending).await;
        self.finish(&pending.operation);
        result.map_err(EditorError::from)
    }

    /// Drop and persist in one step. Returns whether anything changed.
    pub async fn drop_and_persist(&mut self) -> Result<bool, EditorError> {
        match self.drop()? {
            Some(pending) => {
                self.persist(pending).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist in the background so the next gesture can start right away.
    /// Feed the resulting [`SyncEvent`] back through [`Self::handle_event`].
    pub fn spawn_persist(&self, pending: PendingSync) -> JoinHandle<Result<(), SyncError>> {
        self.coordinator.spawn_persist(pending)
    }

    pub fn handle_event(&mut self, event: &SyncEvent) {
        match event {
            SyncEvent::Persisted { operation } | SyncEvent::Failed { operation, .. } => {
                self.finish(operation)
            }
            SyncEvent::Reloaded { .. } => self.refresh(),
        }
    }

    pub async fn reload(&mut self) -> Result<(), EditorError> {
        self.coordinator.reload().await?;
        self.refresh();
        Ok(())
    }

    /// Create a folder and expand its parent so it shows up
    pub async fn create_folder(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Node, EditorError> {
        let folder = self.coordinator.create_folder(name, parent_id).await?;
        if let Some(parent) = parent_id {
            self.expansion.expand(parent);
        }
        Ok(folder)
    }

    pub async fn rename(&mut self, node_id: &str, name: &str) -> Result<(), EditorError> {
        Ok(self.coordinator.rename(node_id, name).await?)
    }

    pub async fn delete(&mut self, node_ids: &[String]) -> Result<(), EditorError> {
        let result = self.coordinator.delete(node_ids).await;
        self.refresh();
        Ok(result?)
    }

    /// Drop selection and expansion entries for ids that are gone
    pub fn refresh(&mut self) {
        let valid = self.coordinator.service().valid_ids();
        self.selection.prune_invalid(&valid);
        self.expansion.prune_invalid(&valid);
    }

    fn finish(&mut self, operation: &Operation) {
        if let Operation::Drop { gesture, .. } = operation {
            self.drag.finish(*gesture);
        }
        self.refresh();
    }
}
