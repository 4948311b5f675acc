use thiserror::Error;

/// Errors raised when a tree payload violates the structural invariants.
///
/// Transforms on an already-valid tree never produce these; they degrade to
/// a no-op instead. Only wholesale loads are validated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("File node cannot have children: {0}")]
    FileWithChildren(String),

    #[error("Tree root must be a folder: {0}")]
    RootNotFolder(String),

    #[error("Node id cannot be empty")]
    EmptyId,
}
