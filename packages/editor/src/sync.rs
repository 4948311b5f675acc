//! # Sync coordinator
//!
//! Publishes local tree changes optimistically, then persists them to the
//! remote store and reports the outcome.
//!
//! ## Persistence
//!
//! - `Reorder` plans issue one "set sibling order" call
//! - `Move` plans issue the move call, await the backend's authoritative
//!   destination children, then issue a follow-up reorder only when the block
//!   should not sit at the end. The two calls are strictly sequential.
//!
//! ## Failures
//!
//! A rejected call is logged and broadcast as [`SyncEvent::Failed`]. With the
//! default [`FailurePolicy::KeepOptimistic`] the optimistic tree stays up and
//! the UI may diverge from the backend until the user reloads. With
//! [`FailurePolicy::RestoreSnapshot`] the pre-change tree is put back, but
//! only if nothing else has been published since.
//!
//! Gestures are not serialized: each one is computed against the latest
//! local tree, and overlapping persists race (the backend is last-write-wins).

use std::sync::Arc;

use casebundle_tree::{transforms, Node, Tree};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::drop_resolver::DropPreview;
use crate::errors::{SyncError, ValidationError};
use crate::move_engine::{execute_drop, follow_up_order, DropOutcome, MovePlan};
use crate::remote::{children_in, OrderItem, RemoteStore};
use crate::service::TreeService;

/// What to do with the optimistic tree when the backend rejects a change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Leave the optimistic tree standing; a manual reload resyncs
    #[default]
    KeepOptimistic,
    /// Put the pre-change tree back if it has not been superseded
    RestoreSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Buffered notifications per subscriber before it starts lagging
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    64
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// The local change a remote call is persisting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Drop { gesture: u64, plan: MovePlan },
    CreateFolder { name: String, parent_id: Option<String> },
    Rename { node_id: String, name: String },
    Delete { node_ids: Vec<String> },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Drop { plan, .. } => plan.kind(),
            Operation::CreateFolder { .. } => "create folder",
            Operation::Rename { .. } => "rename",
            Operation::Delete { .. } => "delete",
        }
    }
}

/// Outcome notifications for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Persisted {
        operation: Operation,
    },
    Failed {
        operation: Operation,
        error: SyncError,
        /// Whether the pre-change tree was put back
        restored: bool,
    },
    Reloaded {
        bundle_id: String,
        nodes: usize,
    },
}

/// An optimistic change that has been published but not yet persisted
#[derive(Debug, Clone)]
pub struct PendingSync {
    pub operation: Operation,
    /// Tree before the change
    pub before: Arc<Tree>,
    /// Tree this change published
    pub optimistic: Arc<Tree>,
}

pub struct SyncCoordinator<R: RemoteStore + ?Sized> {
    service: Arc<TreeService>,
    remote: Arc<R>,
    options: SyncOptions,
    events: broadcast::Sender<SyncEvent>,
}

impl<R: RemoteStore + ?Sized> SyncCoordinator<R> {
    pub fn new(service: Arc<TreeService>, remote: Arc<R>, options: SyncOptions) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            service,
            remote,
            options,
            events,
        }
    }

    pub fn service(&self) -> &Arc<TreeService> {
        &self.service
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Replace the local tree with the backend's copy. This is the manual
    /// recovery path after a failed persist.
    pub async fn reload(&self) -> Result<(), SyncError> {
        let bundle_id = self.service.bundle_id().to_string();
        let root = self.remote.load_tree(&bundle_id).await?;
        self.service.load(root)?;

        let nodes = self.service.snapshot().len();
        self.notify(SyncEvent::Reloaded { bundle_id, nodes });
        Ok(())
    }

    /// Publish a drop's tree immediately, before any network round trip.
    ///
    /// No-op outcomes publish nothing and return `None`. So do outcomes
    /// computed against a tree that is no longer the live one: publishing
    /// them would undo whatever landed in between.
    pub fn apply_optimistically(&self, gesture: u64, outcome: DropOutcome) -> Option<PendingSync> {
        let plan = outcome.plan?;
        if !self
            .service
            .compare_and_publish(&outcome.base, Arc::clone(&outcome.tree))
        {
            tracing::warn!(
                "Gesture {} was computed against a superseded tree; dropping its {} plan",
                gesture,
                plan.kind()
            );
            return None;
        }

        Some(PendingSync {
            operation: Operation::Drop { gesture, plan },
            before: outcome.base,
            optimistic: outcome.tree,
        })
    }

    /// Resolve a drop against the latest local tree and publish it
    pub fn apply_drop(
        &self,
        gesture: u64,
        dragged_ids: &[String],
        preview: &DropPreview,
    ) -> Result<Option<PendingSync>, ValidationError> {
        let current = self.service.snapshot();
        let outcome = execute_drop(&current, dragged_ids, preview)?;
        Ok(self.apply_optimistically(gesture, outcome))
    }

    /// Persist a published change. Never cancelled once started.
    pub async fn persist(&self, pending: &PendingSync) -> Result<(), SyncError> {
        let result = self.persist_operation(&pending.operation).await;

        match &result {
            Ok(()) => {
                tracing::info!(
                    "Persisted {} for bundle {}",
                    pending.operation.name(),
                    self.service.bundle_id()
                );
                self.notify(SyncEvent::Persisted {
                    operation: pending.operation.clone(),
                });
            }
            Err(error) => self.report_failure(pending, error),
        }

        result
    }

    /// Create a folder on the backend, then append it locally. The backend
    /// assigns the id, so this one is not optimistic.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Node, SyncError> {
        let operation = Operation::CreateFolder {
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        };

        let folder = match self
            .remote
            .create_folder(self.service.bundle_id(), name, parent_id)
            .await
        {
            Ok(folder) => folder,
            Err(e) => {
                let error = SyncError::from(e);
                tracing::error!("Failed to create folder {}: {}", name, error);
                self.notify(SyncEvent::Failed {
                    operation,
                    error: error.clone(),
                    restored: false,
                });
                return Err(error);
            }
        };

        self.service.update(|tree| {
            transforms::insert_nodes(tree, parent_id, std::slice::from_ref(&folder), None)
        });
        self.notify(SyncEvent::Persisted { operation });
        Ok(folder)
    }

    /// Append nodes the upload pipeline has already stored remotely
    pub fn add_uploaded(&self, parent_id: Option<&str>, nodes: &[Node]) -> bool {
        let (before, after) = self
            .service
            .update(|tree| transforms::insert_nodes(tree, parent_id, nodes, None));
        !Arc::ptr_eq(&before, &after)
    }

    /// Rename locally, then persist
    pub async fn rename(&self, node_id: &str, name: &str) -> Result<(), SyncError> {
        let (before, optimistic) = self
            .service
            .update(|tree| transforms::rename_node(tree, node_id, name));
        if Arc::ptr_eq(&before, &optimistic) {
            return Ok(());
        }

        let pending = PendingSync {
            operation: Operation::Rename {
                node_id: node_id.to_string(),
                name: name.to_string(),
            },
            before,
            optimistic,
        };
        self.persist(&pending).await
    }

    /// Remove subtrees locally, then persist
    pub async fn delete(&self, node_ids: &[String]) -> Result<(), SyncError> {
        let (before, optimistic) = self
            .service
            .update(|tree| transforms::remove_nodes(tree, node_ids));
        if Arc::ptr_eq(&before, &optimistic) {
            return Ok(());
        }

        let pending = PendingSync {
            operation: Operation::Delete {
                node_ids: node_ids.to_vec(),
            },
            before,
            optimistic,
        };
        self.persist(&pending).await
    }

    async fn persist_operation(&self, operation: &Operation) -> Result<(), SyncError> {
        let bundle_id = self.service.bundle_id();

        match operation {
            Operation::Drop { plan, .. } => self.persist_plan(plan).await,
            Operation::Rename { node_id, name } => {
                self.remote.rename_node(bundle_id, node_id, name).await?;
                Ok(())
            }
            Operation::Delete { node_ids } => {
                self.remote.delete_nodes(bundle_id, node_ids).await?;
                Ok(())
            }
            // Persisted before it was applied locally
            Operation::CreateFolder { .. } => Ok(()),
        }
    }

    async fn persist_plan(&self, plan: &MovePlan) -> Result<(), SyncError> {
        let bundle_id = self.service.bundle_id();

        match plan {
            MovePlan::Reorder { ordered_ids, .. } => {
                let items = OrderItem::from_ordered_ids(ordered_ids);
                self.remote.reorder(bundle_id, &items).await?;
            }

            MovePlan::Move {
                node_ids,
                destination,
                index,
                needs_follow_up_reorder,
            } => {
                let updated = self
                    .remote
                    .move_nodes(bundle_id, node_ids, destination.as_deref())
                    .await?;

                if !needs_follow_up_reorder {
                    return Ok(());
                }

                let authoritative =
                    children_in(&updated, destination.as_deref()).ok_or_else(|| {
                        SyncError::MissingDestination(
                            destination.clone().unwrap_or_else(|| bundle_id.to_string()),
                        )
                    })?;

                let ordered = follow_up_order(&authoritative, node_ids, *index);
                if ordered != authoritative {
                    let items = OrderItem::from_ordered_ids(&ordered);
                    self.remote.reorder(bundle_id, &items).await?;
                }
            }
        }

        Ok(())
    }

    fn report_failure(&self, pending: &PendingSync, error: &SyncError) {
        tracing::error!(
            "Failed to persist {} for bundle {}: {}",
            pending.operation.name(),
            self.service.bundle_id(),
            error
        );

        let restored = match self.options.failure_policy {
            FailurePolicy::KeepOptimistic => false,
            FailurePolicy::RestoreSnapshot => {
                let restored = self
                    .service
                    .compare_and_publish(&pending.optimistic, Arc::clone(&pending.before));
                if !restored {
                    tracing::warn!(
                        "Tree changed since the failed {}; not restoring",
                        pending.operation.name()
                    );
                }
                restored
            }
        };

        self.notify(SyncEvent::Failed {
            operation: pending.operation.clone(),
            error: error.clone(),
            restored,
        });
    }

    fn notify(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl<R: RemoteStore + ?Sized + 'static> SyncCoordinator<R> {
    /// Persist in the background. Rapid gestures each get their own task.
    pub fn spawn_persist(
        self: &Arc<Self>,
        pending: PendingSync,
    ) -> JoinHandle<Result<(), SyncError>> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.persist(&pending).await })
    }
}
