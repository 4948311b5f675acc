//! Error types for the editor

use thiserror::Error;

/// Illegal drop attempts. Caught before any mutation and never shown to
/// the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Nothing is being dragged")]
    EmptyDrag,

    #[error("Folder {0} cannot be moved into itself")]
    FolderIntoItself(String),

    #[error("Folder {folder} cannot be moved into its descendant {destination}")]
    FolderIntoDescendant { folder: String, destination: String },

    #[error("Drop target is not a folder: {0}")]
    DestinationNotFolder(String),

    #[error("Dragged node no longer exists: {0}")]
    DraggedNodeMissing(String),
}

/// Failures reported by the remote store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{operation} rejected by backend: {message}")]
    Rejected { operation: String, message: String },

    #[error("Bundle not found: {0}")]
    BundleNotFound(String),

    #[error("Node not found on backend: {0}")]
    NodeNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Drag state machine misuse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    #[error("Cannot {event} while {phase}")]
    InvalidTransition { phase: &'static str, event: &'static str },

    #[error("Drag source no longer exists: {0}")]
    UnknownSource(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid tree from backend: {0}")]
    InvalidTree(#[from] casebundle_tree::TreeError),

    #[error("Destination {0} missing from move response")]
    MissingDestination(String),
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Drag error: {0}")]
    Drag(#[from] DragError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Tree error: {0}")]
    Tree(#[from] casebundle_tree::TreeError),
}

impl From<RemoteError> for EditorError {
    fn from(e: RemoteError) -> Self {
        EditorError::Sync(SyncError::Remote(e))
    }
}
