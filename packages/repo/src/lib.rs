//! Cask repository substrate.
//!
//! This is the narrow waist of the Cask stack. Everything at this level is
//! plain node data - no asset semantics, no typed-access sugar:
//! - `PathAddress`: Validated absolute path into the node tree
//! - `PropertyValue` / `PropertyType`: The closed property-shape vocabulary
//! - `Node`: A point-in-time snapshot of one node
//! - `Connection` / `ConnectionProvider`: The repository boundary traits
//! - `MemoryRepository`: An in-memory repository for tests and local use
//!
//! Use this layer for:
//! - Implementing a repository backend
//! - Moving node snapshots around without interpreting them
//!
//! # Example
//!
//! ```rust
//! use cask_repo::{Change, Connection, ConnectionProvider, MemoryRepository, PathAddress, PropertyValue};
//!
//! let repo = MemoryRepository::new();
//! let mut conn = repo.acquire().unwrap();
//!
//! let path = PathAddress::target("/docs").unwrap();
//! conn.stage(Change::CreateNode {
//!     path: path.clone(),
//!     primary_type: "cask:folder".to_string(),
//! }).unwrap();
//! conn.stage(Change::SetProperty {
//!     path: path.clone(),
//!     name: "title".to_string(),
//!     value: PropertyValue::String("Documents".to_string()),
//! }).unwrap();
//! conn.commit().unwrap();
//!
//! let node = conn.resolve(&path).unwrap().unwrap();
//! assert_eq!(node.primary_type, "cask:folder");
//! ```

pub use bytes::Bytes;

mod connection;
mod decimal;
mod error;
mod memory;
mod node;
mod path;
mod value;

pub use connection::{Change, Connection, ConnectionProvider};
pub use decimal::{Decimal, DecimalError};
pub use error::RepoError;
pub use memory::{MemoryConnection, MemoryRepository};
pub use node::Node;
pub use path::{PathAddress, PathError};
pub use value::{PropertyType, PropertyValue};

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;
