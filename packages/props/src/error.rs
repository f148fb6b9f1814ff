//! Error types for the property-access layer.

use cask_repo::{PathAddress, PropertyType, RepoError};

/// Errors at the property-access layer.
///
/// Absence stays recoverable: missing properties come back as defaults or
/// `None`, never as one of these. These variants are the genuine contract
/// violations - wrong node shape, missing node, missing identity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropsError {
    /// Error from the repository substrate.
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    /// The addressed node does not exist.
    #[error("node not found: {path}")]
    NodeNotFound { path: PathAddress },

    /// The node's primary type is not the one the caller asserted.
    #[error("wrong primary type: expected '{expected}', got '{actual}'")]
    WrongPrimaryType { expected: String, actual: String },

    /// A referencable entity has no identity UUID.
    #[error("not referencable: {path}")]
    NotReferencable { path: PathAddress },

    /// A bulk property set contained a value outside the six scalar shapes.
    #[error("unsupported value for property '{name}': {property_type}")]
    UnsupportedValue {
        name: String,
        property_type: PropertyType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_repo::path_addr;

    #[test]
    fn display_names_the_types() {
        let e = PropsError::WrongPrimaryType {
            expected: "cask:asset".to_string(),
            actual: "cask:file".to_string(),
        };
        let s = e.to_string();
        assert!(s.contains("cask:asset"));
        assert!(s.contains("cask:file"));
    }

    #[test]
    fn repo_error_converts() {
        let e: PropsError = RepoError::OccupiedPath {
            path: path_addr!("/x"),
        }
        .into();
        assert!(matches!(e, PropsError::Repo(_)));
    }
}
