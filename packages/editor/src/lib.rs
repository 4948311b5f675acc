//! # Casebundle Editor
//!
//! Drag-and-drop editing of a case bundle's document tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ tree: ordered arena + copy-on-write edits   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: one client's editing state          │
//! │  - Selection + folder expansion             │
//! │  - Drag state machine + live drop preview   │
//! │  - Drop resolution (reorder / move / no-op) │
//! │  - Optimistic publish via TreeService       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync: persist plans to the RemoteStore      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Whole-tree replacement**: observers never see a half-applied change
//! 2. **Same `Arc` means unchanged**: no-op drops make no remote call
//! 3. **Optimistic clients**: the local tree updates before the network
//! 4. **Server authority on reload**: a load replaces the tree wholesale
//!
//! ## Usage
//!
//! ```rust,ignore
//! use casebundle_editor::{EditSession, MemoryRemote, SyncCoordinator, SyncOptions, TreeService};
//!
//! let service = Arc::new(TreeService::empty("bundle-1"));
//! let sync = Arc::new(SyncCoordinator::new(service, Arc::new(remote), SyncOptions::default()));
//! let mut session = EditSession::new(sync);
//! session.reload().await?;
//!
//! session.drag_start("doc-2")?;
//! session.drag_over(Some("folder-1::content"), y, rect)?;
//! session.drop_and_persist().await?;
//! ```

mod drag;
mod drop_resolver;
mod errors;
mod move_engine;
mod remote;
mod selection;
mod service;
mod session;
mod sync;

pub use drag::{
    DragController, DragPhase, DragState, HoverTarget, RowRect, CONTENT_ZONE_SUFFIX, ROOT_DROP_ZONE,
};
pub use drop_resolver::{resolve, DropKind, DropPreview, ResolvedDrop};
pub use errors::{DragError, EditorError, RemoteError, SyncError, ValidationError};
pub use move_engine::{apply, execute_drop, follow_up_order, DropOutcome, MovePlan};
pub use remote::{children_in, FailOn, MemoryRemote, OrderItem, RemoteCall, RemoteStore};
pub use selection::{
    visible_file_order, ClickModifiers, ExpansionState, SelectionManager, SelectionState,
};
pub use service::TreeService;
pub use session::EditSession;
pub use sync::{FailurePolicy, Operation, PendingSync, SyncCoordinator, SyncEvent, SyncOptions};

pub use casebundle_tree::{Node, NodeKind, Tree};
