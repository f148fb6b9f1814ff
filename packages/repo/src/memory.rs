//! In-memory repository.
//!
//! A node tree behind an `RwLock`, shared by every connection the
//! repository hands out. Commits take the write lock once and apply the
//! connection's staged changes all-or-nothing.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::{
    Change, Connection, ConnectionProvider, Node, PathAddress, PropertyValue, RepoError,
    RepoResult,
};

/// Primary type of the implicit root node.
pub const ROOT_TYPE: &str = "cask:root";

#[derive(Clone, Debug)]
struct TreeNode {
    primary_type: String,
    uuid: Uuid,
    properties: BTreeMap<String, PropertyValue>,
    /// Ordered children; order is insertion order.
    children: Vec<(String, TreeNode)>,
}

impl TreeNode {
    fn new(primary_type: &str) -> Self {
        TreeNode {
            primary_type: primary_type.to_string(),
            uuid: Uuid::new_v4(),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut TreeNode> {
        self.children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    fn descend(&self, path: &PathAddress) -> Option<&TreeNode> {
        let mut cursor = self;
        for segment in path.segments() {
            cursor = cursor.child(segment)?;
        }
        Some(cursor)
    }

    fn descend_mut(&mut self, path: &PathAddress) -> Option<&mut TreeNode> {
        let mut cursor = self;
        for segment in path.segments() {
            cursor = cursor.child_mut(segment)?;
        }
        Some(cursor)
    }

    fn snapshot(&self, path: &PathAddress) -> Node {
        Node {
            path: path.clone(),
            primary_type: self.primary_type.clone(),
            uuid: Some(self.uuid),
            properties: self.properties.clone(),
            child_names: self.children.iter().map(|(n, _)| n.clone()).collect(),
        }
    }

    fn find_by_uuid(&self, path: &PathAddress, uuid: &Uuid) -> Option<Node> {
        if &self.uuid == uuid {
            return Some(self.snapshot(path));
        }
        for (name, child) in &self.children {
            // Child names were validated when the node was created.
            let child_path = PathAddress::child_of(path, name).ok()?;
            if let Some(found) = child.find_by_uuid(&child_path, uuid) {
                return Some(found);
            }
        }
        None
    }
}

/// An in-memory repository.
///
/// Cloning the handle shares the same tree; use one `MemoryRepository`
/// per logical repository.
///
/// # Example
///
/// ```rust
/// use cask_repo::{Change, Connection, ConnectionProvider, MemoryRepository, path_addr};
///
/// let repo = MemoryRepository::new();
/// let mut conn = repo.acquire().unwrap();
/// conn.stage(Change::CreateNode {
///     path: path_addr!("/top"),
///     primary_type: "cask:folder".to_string(),
/// }).unwrap();
/// conn.commit().unwrap();
/// assert!(conn.resolve(&path_addr!("/top")).unwrap().is_some());
/// ```
#[derive(Clone)]
pub struct MemoryRepository {
    root: Arc<RwLock<TreeNode>>,
}

impl MemoryRepository {
    /// Create an empty repository (a bare root node).
    pub fn new() -> Self {
        MemoryRepository {
            root: Arc::new(RwLock::new(TreeNode::new(ROOT_TYPE))),
        }
    }

    /// Acquire a connection with the concrete type.
    pub fn connect(&self) -> MemoryConnection {
        MemoryConnection {
            root: Arc::clone(&self.root),
            staged: Vec::new(),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionProvider for MemoryRepository {
    fn acquire(&self) -> RepoResult<Box<dyn Connection>> {
        Ok(Box::new(self.connect()))
    }
}

/// A connection into a [`MemoryRepository`].
///
/// Staged changes live on the connection; `commit` applies them under the
/// tree's write lock, all-or-nothing. Dropping the connection discards
/// anything not committed.
pub struct MemoryConnection {
    root: Arc<RwLock<TreeNode>>,
    staged: Vec<Change>,
}

impl MemoryConnection {
    fn apply(tree: &mut TreeNode, change: &Change) -> RepoResult<()> {
        match change {
            Change::CreateNode { path, primary_type } => {
                if path.is_root() {
                    return Err(RepoError::OccupiedPath { path: path.clone() });
                }
                let parent =
                    tree.descend_mut(&path.parent())
                        .ok_or_else(|| RepoError::MissingParent {
                            path: path.clone(),
                        })?;
                let name = path.name();
                if parent.child(name).is_some() {
                    return Err(RepoError::OccupiedPath { path: path.clone() });
                }
                parent
                    .children
                    .push((name.to_string(), TreeNode::new(primary_type)));
                Ok(())
            }
            Change::SetProperty { path, name, value } => {
                let node = tree
                    .descend_mut(path)
                    .ok_or_else(|| RepoError::NodeNotFound { path: path.clone() })?;
                node.properties.insert(name.clone(), value.clone());
                Ok(())
            }
            Change::RemoveProperty { path, name } => {
                let node = tree
                    .descend_mut(path)
                    .ok_or_else(|| RepoError::NodeNotFound { path: path.clone() })?;
                node.properties.remove(name);
                Ok(())
            }
        }
    }
}

impl Connection for MemoryConnection {
    fn resolve(&self, path: &PathAddress) -> RepoResult<Option<Node>> {
        let tree = self.root.read().expect("repository lock poisoned");
        Ok(tree.descend(path).map(|node| node.snapshot(path)))
    }

    fn find_by_uuid(&self, uuid: &Uuid) -> RepoResult<Option<Node>> {
        let tree = self.root.read().expect("repository lock poisoned");
        Ok(tree.find_by_uuid(&PathAddress::root(), uuid))
    }

    fn binary_size(&self, path: &PathAddress, name: &str) -> RepoResult<u64> {
        let tree = self.root.read().expect("repository lock poisoned");
        let size = tree
            .descend(path)
            .and_then(|node| node.properties.get(name))
            .and_then(PropertyValue::as_binary)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or(0);
        Ok(size)
    }

    fn stage(&mut self, change: Change) -> RepoResult<()> {
        self.staged.push(change);
        Ok(())
    }

    fn commit(&mut self) -> RepoResult<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut tree = self.root.write().expect("repository lock poisoned");

        // Apply to a working copy so a mid-commit failure leaves the
        // shared tree untouched. Binary payloads are refcounted, so the
        // copy is shallow where it matters.
        let mut working = tree.clone();
        for change in &self.staged {
            Self::apply(&mut working, change)?;
        }

        log::debug!("committing {} staged change(s)", self.staged.len());
        *tree = working;
        self.staged.clear();
        Ok(())
    }

    fn rollback(&mut self) {
        self.staged.clear();
    }
}
