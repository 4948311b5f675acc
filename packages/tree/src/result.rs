use crate::error::TreeError;

/// Result type for building and validating trees
pub type TreeResult<T> = Result<T, TreeError>;
