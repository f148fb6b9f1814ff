//! Error types for the asset layer.

use cask_props::PropsError;
use cask_repo::{PathAddress, RepoError};

/// Errors at the asset layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    /// Error from the property-access layer.
    #[error("property error: {0}")]
    Props(#[from] PropsError),

    /// Error from the repository substrate.
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    /// The node's primary type maps to no asset shape.
    #[error("no asset shape for primary type '{primary_type}' at {path}")]
    UnsupportedNodeType {
        primary_type: String,
        path: PathAddress,
    },

    /// A link asset whose target cannot be resolved.
    #[error("dangling link at {path}")]
    DanglingLink { path: PathAddress },

    /// A file-content node with no enclosing file node.
    #[error("content node without enclosing file at {path}")]
    OrphanContent { path: PathAddress },

    /// The save target is already occupied.
    #[error("path already occupied: {path}")]
    OccupiedPath { path: PathAddress },

    /// A real asset without its `file` child.
    #[error("asset has no file child: {path}")]
    MissingFile { path: PathAddress },
}
