//! Error types for the repository substrate.

use crate::{PathAddress, PathError};

/// Errors from repository operations.
///
/// Absence is never an error at this layer: lookups return `Option`, and
/// these variants cover genuine failures only.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepoError {
    /// Path validation error.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// A staged change targets a node that does not exist.
    #[error("node not found: {path}")]
    NodeNotFound { path: PathAddress },

    /// A staged create has no parent node to attach to.
    #[error("missing parent for: {path}")]
    MissingParent { path: PathAddress },

    /// A staged create targets a path that is already occupied.
    #[error("path already occupied: {path}")]
    OccupiedPath { path: PathAddress },

    /// The repository rejected a commit for another reason.
    #[error("repository conflict: {message}")]
    Conflict { message: String },
}
