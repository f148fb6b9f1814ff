//! Cask typed property access.
//!
//! This layer adds meaning to the raw node data of cask-repo:
//! - `Session`: Owned-or-shared connection lifetime, made structural
//! - `PropertyScalar`: The codec between Rust types and stored shapes
//! - `NodeProperties`: Scoped, typed read/write access to one node
//! - `BinaryStream`: A lazily-resolved, size-queryable binary handle
//! - `Referencable` / `ReferenceProperty`: Identity and reference resolution
//! - `UsageCounter`: Mutex-guarded cumulative counters on a node
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cask_props::{NodeProperties, Session};
//! use cask_repo::{Change, Connection, ConnectionProvider, MemoryRepository, path_addr};
//!
//! let repo = MemoryRepository::new();
//! let mut conn = repo.acquire().unwrap();
//! conn.stage(Change::CreateNode {
//!     path: path_addr!("/doc"),
//!     primary_type: "cask:folder".to_string(),
//! }).unwrap();
//! conn.commit().unwrap();
//!
//! let session = Session::owned(Arc::new(repo));
//! let props = NodeProperties::open(session, path_addr!("/doc")).unwrap();
//! let props = props.set_property("title", "Hello".to_string()).unwrap();
//! assert_eq!(props.get("title", String::new()), "Hello");
//! ```

mod binary;
mod codec;
mod counters;
mod error;
mod properties;
mod reference;

pub use binary::BinaryStream;
pub use codec::PropertyScalar;
pub use counters::UsageCounter;
pub use error::PropsError;
pub use properties::{NodeProperties, Session};
pub use reference::{Referencable, ReferenceProperty};

/// Result alias for property-layer operations.
pub type PropsResult<T> = Result<T, PropsError>;
