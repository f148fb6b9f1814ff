//! Session and NodeProperties - scoped typed access to one node.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use cask_repo::{
    Change, Connection, ConnectionProvider, Node, PathAddress, PropertyType, PropertyValue,
};

use crate::{BinaryStream, PropertyScalar, PropsError, PropsResult};

/// How a property handle reaches the repository.
///
/// The close-or-don't-close decision is structural:
/// - `Owned` acquires a fresh connection from the provider for every
///   operation and drops it on every exit path. Safe default, slightly
///   slower.
/// - `Shared` borrows a caller-owned connection for the duration of each
///   operation and never closes it; the caller owns its lifetime.
///
/// Cloning a session shares the same provider or connection.
#[derive(Clone)]
pub enum Session {
    /// Acquire-and-release per operation.
    Owned(Arc<dyn ConnectionProvider>),
    /// Borrow a caller-owned connection; never close it.
    Shared(Arc<Mutex<Box<dyn Connection>>>),
}

impl Session {
    /// A session that acquires a fresh connection per operation.
    pub fn owned(provider: Arc<dyn ConnectionProvider>) -> Self {
        Session::Owned(provider)
    }

    /// A session over a caller-owned connection.
    ///
    /// The connection outlives every handle built over this session; this
    /// layer will lock it per operation but never close it.
    pub fn shared(connection: Box<dyn Connection>) -> Self {
        Session::Shared(Arc::new(Mutex::new(connection)))
    }

    /// Run one operation against a connection.
    ///
    /// This is the single funnel for repository access: `Owned` sessions
    /// acquire here and release when the closure returns (on success and
    /// on error alike), `Shared` sessions lock here and unlock the same
    /// way.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut dyn Connection) -> PropsResult<T>,
    ) -> PropsResult<T> {
        match self {
            Session::Owned(provider) => {
                let mut conn = provider.acquire()?;
                f(conn.as_mut())
            }
            Session::Shared(connection) => {
                // A panic mid-operation must not take the session down
                // with it; staged state is defended by commit atomicity.
                let mut guard = connection
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                f(guard.as_mut())
            }
        }
    }
}

/// Scoped, session-decoupled access to one node's properties.
///
/// Constructed over a [`PathAddress`] plus a [`Session`]; construction
/// resolves the node once so a missing node fails fast instead of on
/// first use. Reads always see the node's current committed state.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use cask_props::{NodeProperties, Session};
/// use cask_repo::{Change, Connection, ConnectionProvider, MemoryRepository, path_addr};
///
/// let repo = MemoryRepository::new();
/// let mut conn = repo.acquire().unwrap();
/// conn.stage(Change::CreateNode {
///     path: path_addr!("/n"),
///     primary_type: "cask:folder".to_string(),
/// }).unwrap();
/// conn.commit().unwrap();
///
/// let props = NodeProperties::open(Session::owned(Arc::new(repo)), path_addr!("/n")).unwrap();
/// assert_eq!(props.get("missing", 42i64), 42);
/// ```
#[derive(Clone)]
pub struct NodeProperties {
    path: PathAddress,
    session: Session,
}

impl NodeProperties {
    /// Open a handle over an existing node.
    ///
    /// Fails with [`PropsError::NodeNotFound`] if nothing is at the path.
    pub fn open(session: Session, path: PathAddress) -> PropsResult<Self> {
        let props = NodeProperties { path, session };
        props.node()?;
        Ok(props)
    }

    /// The addressed path.
    pub fn path(&self) -> &PathAddress {
        &self.path
    }

    /// The session this handle reaches the repository through.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A fresh snapshot of the node.
    pub fn node(&self) -> PropsResult<Node> {
        self.session.with_conn(|conn| {
            conn.resolve(&self.path)?.ok_or_else(|| PropsError::NodeNotFound {
                path: self.path.clone(),
            })
        })
    }

    /// The node's primary type.
    pub fn primary_type(&self) -> PropsResult<String> {
        Ok(self.node()?.primary_type)
    }

    /// Whether the primary type is one of the given tags.
    pub fn is_primary_type(&self, tags: &[&str]) -> PropsResult<bool> {
        let actual = self.primary_type()?;
        Ok(tags.iter().any(|tag| *tag == actual))
    }

    /// Assert the node's primary type.
    ///
    /// Fails with [`PropsError::WrongPrimaryType`] on mismatch.
    pub fn assert_primary_type(&self, expected: &str) -> PropsResult<()> {
        let actual = self.primary_type()?;
        if actual == expected {
            Ok(())
        } else {
            Err(PropsError::WrongPrimaryType {
                expected: expected.to_string(),
                actual,
            })
        }
    }

    /// Typed read with a caller-supplied fallback.
    ///
    /// The Rust type of `default` selects the shape to attempt; an absent
    /// or untranslatable property returns the default, never an error.
    pub fn get<T: PropertyScalar>(&self, name: &str, default: T) -> T {
        self.get_as(name).unwrap_or(default)
    }

    /// Typed read as an optional.
    ///
    /// `None` for an absent node, absent property, or mismatched shape.
    pub fn get_as<T: PropertyScalar>(&self, name: &str) -> Option<T> {
        let node = self.node().ok()?;
        T::from_value(node.property(name)?)
    }

    /// The stored type of a property; `Undefined` when absent.
    pub fn property_type(&self, name: &str) -> PropertyType {
        self.node()
            .ok()
            .and_then(|node| node.property(name).map(PropertyValue::property_type))
            .unwrap_or(PropertyType::Undefined)
    }

    /// Whether a property with this name exists.
    pub fn contains_property(&self, name: &str) -> bool {
        self.node()
            .map(|node| node.has_property(name))
            .unwrap_or(false)
    }

    /// Every property projected to its string form.
    ///
    /// Binary-valued properties are excluded; properties with no string
    /// form are silently dropped.
    pub fn all(&self) -> BTreeMap<String, String> {
        let Ok(node) = self.node() else {
            return BTreeMap::new();
        };
        node.properties
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_display_string()
                    .map(|s| (name.clone(), s))
            })
            .collect()
    }

    /// Set many properties in one commit, all-or-nothing.
    ///
    /// Every entry must be one of the six scalar shapes or the whole call
    /// fails with [`PropsError::UnsupportedValue`] before anything is
    /// staged. On success all entries are committed in one transaction
    /// and a fresh handle is returned.
    pub fn set_properties(
        &self,
        properties: BTreeMap<String, PropertyValue>,
    ) -> PropsResult<Self> {
        for (name, value) in &properties {
            let property_type = value.property_type();
            if !property_type.is_scalar() {
                return Err(PropsError::UnsupportedValue {
                    name: name.clone(),
                    property_type,
                });
            }
        }

        self.session.with_conn(|conn| {
            // A failed write must leave nothing staged behind, or a shared
            // connection would replay it on the caller's next commit.
            for (name, value) in properties {
                if let Err(e) = conn.stage(Change::SetProperty {
                    path: self.path.clone(),
                    name,
                    value,
                }) {
                    conn.rollback();
                    return Err(e.into());
                }
            }
            if let Err(e) = conn.commit() {
                conn.rollback();
                return Err(e.into());
            }
            Ok(())
        })?;
        Ok(self.clone())
    }

    /// Set one scalar property and commit.
    ///
    /// May change the property's stored type. A repository-level failure
    /// (node gone, constraint violation) is recoverable: it is logged and
    /// answered with `None`, leaving nothing written.
    pub fn set_property<T: PropertyScalar>(&self, name: &str, value: T) -> Option<Self> {
        let result = self.session.with_conn(|conn| {
            let staged = conn
                .stage(Change::SetProperty {
                    path: self.path.clone(),
                    name: name.to_string(),
                    value: value.into_value(),
                })
                .and_then(|()| conn.commit());
            if let Err(e) = staged {
                conn.rollback();
                return Err(e.into());
            }
            Ok(())
        });
        match result {
            Ok(()) => Some(self.clone()),
            Err(e) => {
                log::warn!("failed to set property '{}' on {}: {}", name, self.path, e);
                None
            }
        }
    }

    /// A lazily-resolved stream over a binary property.
    pub fn retrieve_binary(&self, name: &str) -> BinaryStream {
        BinaryStream::bind(self.session.clone(), self.path.clone(), name)
    }

    /// The size of a binary property; 0 if absent or not binary.
    pub fn binary_size(&self, name: &str) -> u64 {
        self.session
            .with_conn(|conn| Ok(conn.binary_size(&self.path, name)?))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use cask_repo::{Decimal, MemoryRepository, RepoError, path_addr};
    use chrono::{DateTime, TimeZone, Utc};

    fn repo_with_node(path: &PathAddress) -> MemoryRepository {
        let repo = MemoryRepository::new();
        let mut conn = repo.connect();
        conn.stage(Change::CreateNode {
            path: path.clone(),
            primary_type: "cask:folder".to_string(),
        })
        .unwrap();
        conn.commit().unwrap();
        repo
    }

    fn owned_props(repo: &MemoryRepository, path: &PathAddress) -> NodeProperties {
        NodeProperties::open(Session::owned(Arc::new(repo.clone())), path.clone()).unwrap()
    }

    #[test]
    fn open_fails_fast_on_missing_node() {
        let repo = MemoryRepository::new();
        let result = NodeProperties::open(
            Session::owned(Arc::new(repo)),
            path_addr!("/missing"),
        );
        assert!(matches!(result, Err(PropsError::NodeNotFound { .. })));
    }

    #[test]
    fn primary_type_assertions() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path);

        assert_eq!(props.primary_type().unwrap(), "cask:folder");
        assert!(props.is_primary_type(&["cask:asset", "cask:folder"]).unwrap());
        assert!(!props.is_primary_type(&["cask:asset"]).unwrap());
        props.assert_primary_type("cask:folder").unwrap();
        assert!(matches!(
            props.assert_primary_type("cask:asset"),
            Err(PropsError::WrongPrimaryType { .. })
        ));
    }

    #[test]
    fn round_trip_all_scalar_types() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path);

        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let d: Decimal = "10.25".parse().unwrap();

        let props = props.set_property("s", "hello".to_string()).unwrap();
        let props = props.set_property("b", true).unwrap();
        let props = props.set_property("l", 42i64).unwrap();
        let props = props.set_property("f", 1.5f64).unwrap();
        let props = props.set_property("d", d.clone()).unwrap();
        let props = props.set_property("t", t).unwrap();

        assert_eq!(props.get("s", String::new()), "hello");
        assert_eq!(props.get("b", false), true);
        assert_eq!(props.get("l", 0i64), 42);
        assert_eq!(props.get("f", 0.0f64), 1.5);
        assert_eq!(props.get("d", Decimal::zero()), d);
        assert_eq!(props.get("t", DateTime::<Utc>::MIN_UTC), t);
    }

    #[test]
    fn wrong_shape_returns_default() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path)
            .set_property("s", "not a number".to_string())
            .unwrap();

        assert_eq!(props.get("s", 7i64), 7);
        assert_eq!(props.get("s", vec![true]), vec![true]);
        assert_eq!(props.get_as::<bool>("s"), None);
    }

    #[test]
    fn absent_property_returns_default() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path);
        assert_eq!(props.get("missing", 9i64), 9);
        assert_eq!(props.get_as::<String>("missing"), None);
    }

    #[test]
    fn property_type_introspection() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path)
            .set_property("l", 1i64)
            .unwrap();

        assert_eq!(props.property_type("l"), PropertyType::Long);
        assert_eq!(props.property_type("missing"), PropertyType::Undefined);
        assert!(props.contains_property("l"));
        assert!(!props.contains_property("missing"));
    }

    #[test]
    fn set_property_can_change_stored_type() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path)
            .set_property("x", 1i64)
            .unwrap();
        assert_eq!(props.property_type("x"), PropertyType::Long);

        let props = props.set_property("x", "now a string".to_string()).unwrap();
        assert_eq!(props.property_type("x"), PropertyType::String);
    }

    #[test]
    fn set_properties_commits_all() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path);

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), PropertyValue::from("one"));
        map.insert("b".to_string(), PropertyValue::from(2i64));
        let props = props.set_properties(map).unwrap();

        assert_eq!(props.get("a", String::new()), "one");
        assert_eq!(props.get("b", 0i64), 2);
    }

    #[test]
    fn set_properties_is_all_or_nothing() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path)
            .set_property("existing", 1i64)
            .unwrap();

        let mut map = BTreeMap::new();
        map.insert("existing".to_string(), PropertyValue::from(99i64));
        map.insert(
            "bad".to_string(),
            PropertyValue::Binary(Bytes::from_static(b"x")),
        );
        let result = props.set_properties(map);
        assert!(matches!(
            result,
            Err(PropsError::UnsupportedValue { .. })
        ));

        // Nothing was written, including the otherwise-valid entry.
        assert_eq!(props.get("existing", 0i64), 1);
        assert!(!props.contains_property("bad"));
    }

    #[test]
    fn set_properties_rejects_arrays_and_references() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path);

        let mut map = BTreeMap::new();
        map.insert("arr".to_string(), PropertyValue::Longs(vec![1, 2]));
        assert!(props.set_properties(map).is_err());

        let mut map = BTreeMap::new();
        map.insert(
            "ref".to_string(),
            PropertyValue::Reference(uuid::Uuid::new_v4()),
        );
        assert!(props.set_properties(map).is_err());
    }

    #[test]
    fn all_excludes_binary_properties() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let mut conn = repo.connect();
        conn.stage(Change::SetProperty {
            path: path.clone(),
            name: "data".to_string(),
            value: PropertyValue::Binary(Bytes::from_static(b"\x00\x01")),
        })
        .unwrap();
        conn.stage(Change::SetProperty {
            path: path.clone(),
            name: "label".to_string(),
            value: PropertyValue::from("visible"),
        })
        .unwrap();
        conn.commit().unwrap();

        let props = owned_props(&repo, &path);
        let all = props.all();
        assert_eq!(all.get("label"), Some(&"visible".to_string()));
        assert!(!all.contains_key("data"));
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn set_property_on_vanished_node_returns_none() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let props = owned_props(&repo, &path);

        // Point a second handle at a path that never existed; open() is
        // what fails fast, so build the failure through a raw clone.
        let ghost = NodeProperties {
            path: path_addr!("/ghost"),
            session: props.session().clone(),
        };
        assert!(ghost.set_property("x", 1i64).is_none());
    }

    #[test]
    fn shared_session_never_closes_the_connection() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let session = Session::shared(Box::new(repo.connect()));

        let props = NodeProperties::open(session.clone(), path.clone()).unwrap();
        props.set_property("a", 1i64).unwrap();

        // The same shared connection keeps serving a second handle.
        let again = NodeProperties::open(session, path).unwrap();
        assert_eq!(again.get("a", 0i64), 1);
    }

    #[test]
    fn shared_session_failed_write_leaves_connection_clean() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let session = Session::shared(Box::new(repo.connect()));
        let props = NodeProperties::open(session.clone(), path.clone()).unwrap();

        // A write against a node that does not exist fails and must be
        // rolled back off the shared connection.
        let ghost = NodeProperties {
            path: path_addr!("/ghost"),
            session: session.clone(),
        };
        assert!(ghost.set_property("x", 1i64).is_none());

        // The same connection keeps serving valid writes.
        let props = props.set_property("a", 1i64).unwrap();
        assert_eq!(props.get("a", 0i64), 1);

        // The failed write never lands, even after later commits succeed.
        let check = repo.connect();
        assert!(check.resolve(&path_addr!("/ghost")).unwrap().is_none());
    }

    #[test]
    fn shared_session_failed_bulk_write_is_rolled_back() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let session = Session::shared(Box::new(repo.connect()));
        let props = NodeProperties::open(session.clone(), path.clone()).unwrap();

        let ghost = NodeProperties {
            path: path_addr!("/ghost"),
            session,
        };
        let mut map = BTreeMap::new();
        map.insert("x".to_string(), PropertyValue::from(1i64));
        assert!(ghost.set_properties(map).is_err());

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), PropertyValue::from(2i64));
        let props = props.set_properties(map).unwrap();
        assert_eq!(props.get("a", 0i64), 2);
        assert!(!ghost.contains_property("x"));
    }

    #[test]
    fn shared_session_survives_a_panicked_operation() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let session = Session::shared(Box::new(repo.connect()));

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            session.with_conn(|_| -> PropsResult<()> { panic!("mid-operation") })
        }));
        assert!(panicked.is_err());

        // The mutex recovers; the session keeps working.
        let props = NodeProperties::open(session, path).unwrap();
        let props = props.set_property("a", 1i64).unwrap();
        assert_eq!(props.get("a", 0i64), 1);
    }

    #[test]
    fn binary_size_via_properties() {
        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let mut conn = repo.connect();
        conn.stage(Change::SetProperty {
            path: path.clone(),
            name: "data".to_string(),
            value: PropertyValue::Binary(Bytes::from_static(b"abcdef")),
        })
        .unwrap();
        conn.commit().unwrap();

        let props = owned_props(&repo, &path);
        assert_eq!(props.binary_size("data"), 6);
        assert_eq!(props.binary_size("missing"), 0);
    }

    #[test]
    fn repo_error_surfaces_through_set_properties() {
        // A shared connection whose commit always conflicts.
        struct FailingConn(cask_repo::MemoryConnection);
        impl Connection for FailingConn {
            fn resolve(&self, path: &PathAddress) -> cask_repo::RepoResult<Option<Node>> {
                self.0.resolve(path)
            }
            fn find_by_uuid(&self, uuid: &uuid::Uuid) -> cask_repo::RepoResult<Option<Node>> {
                self.0.find_by_uuid(uuid)
            }
            fn binary_size(&self, path: &PathAddress, name: &str) -> cask_repo::RepoResult<u64> {
                self.0.binary_size(path, name)
            }
            fn stage(&mut self, change: Change) -> cask_repo::RepoResult<()> {
                self.0.stage(change)
            }
            fn commit(&mut self) -> cask_repo::RepoResult<()> {
                Err(RepoError::Conflict {
                    message: "injected".to_string(),
                })
            }
            fn rollback(&mut self) {
                self.0.rollback()
            }
        }

        let path = path_addr!("/n");
        let repo = repo_with_node(&path);
        let session = Session::shared(Box::new(FailingConn(repo.connect())));
        let props = NodeProperties::open(session, path).unwrap();

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), PropertyValue::from(1i64));
        assert!(matches!(
            props.set_properties(map),
            Err(PropsError::Repo(RepoError::Conflict { .. }))
        ));
        assert!(props.set_property("a", 1i64).is_none());
    }
}
