//! Connection boundary traits: Connection, ConnectionProvider, Change.

use uuid::Uuid;

use crate::{Node, PathAddress, PropertyValue, RepoResult};

/// A staged mutation against the repository.
///
/// Changes are buffered on a connection and applied all-or-nothing by
/// [`Connection::commit`]. The vocabulary is deliberately small: node
/// creation and property updates are all the upper layers need.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// Create a node at a free path under an existing parent.
    CreateNode {
        path: PathAddress,
        primary_type: String,
    },
    /// Set (or overwrite) one property.
    SetProperty {
        path: PathAddress,
        name: String,
        value: PropertyValue,
    },
    /// Remove one property; removing an absent property is a no-op.
    RemoveProperty { path: PathAddress, name: String },
}

/// A scoped handle to the repository.
///
/// Reads return detached [`Node`] snapshots. Writes are staged with
/// [`Connection::stage`] and become visible only after a successful
/// [`Connection::commit`]; a dropped connection discards its staged
/// changes.
///
/// All implementations must satisfy these invariants:
/// - `commit` applies every staged change or none. After a failed commit
///   the repository state is unchanged and the staged list is kept, so
///   the caller may roll back or correct and retry.
/// - Reads see committed state only, never the connection's own staged
///   changes.
/// - Node creation assigns a fresh identity UUID.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Connection>`.
pub trait Connection: Send {
    /// Resolve a path to a node snapshot.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No node at this path.
    /// * `Ok(Some(node))` - The node's current committed state.
    fn resolve(&self, path: &PathAddress) -> RepoResult<Option<Node>>;

    /// Find a node by its identity UUID.
    ///
    /// May be implemented as a query; returns the node at its *current*
    /// path, wherever that is.
    fn find_by_uuid(&self, uuid: &Uuid) -> RepoResult<Option<Node>>;

    /// The size in bytes of a binary property.
    ///
    /// Returns 0 if the node or property is absent, or the property is
    /// not binary. Never an error.
    fn binary_size(&self, path: &PathAddress, name: &str) -> RepoResult<u64>;

    /// Buffer a change for the next commit.
    fn stage(&mut self, change: Change) -> RepoResult<()>;

    /// Apply every staged change atomically.
    fn commit(&mut self) -> RepoResult<()>;

    /// Discard all staged changes.
    fn rollback(&mut self);
}

/// Hands out scoped connections.
///
/// The provider is the shared, long-lived object; connections are cheap
/// and short-lived. Callers that need per-operation isolation acquire a
/// fresh connection each time and drop it when done.
pub trait ConnectionProvider: Send + Sync {
    /// Acquire a new connection.
    fn acquire(&self) -> RepoResult<Box<dyn Connection>>;
}

impl<T: Connection + ?Sized> Connection for Box<T> {
    fn resolve(&self, path: &PathAddress) -> RepoResult<Option<Node>> {
        self.as_ref().resolve(path)
    }

    fn find_by_uuid(&self, uuid: &Uuid) -> RepoResult<Option<Node>> {
        self.as_ref().find_by_uuid(uuid)
    }

    fn binary_size(&self, path: &PathAddress, name: &str) -> RepoResult<u64> {
        self.as_ref().binary_size(path, name)
    }

    fn stage(&mut self, change: Change) -> RepoResult<()> {
        self.as_mut().stage(change)
    }

    fn commit(&mut self) -> RepoResult<()> {
        self.as_mut().commit()
    }

    fn rollback(&mut self) {
        self.as_mut().rollback()
    }
}
