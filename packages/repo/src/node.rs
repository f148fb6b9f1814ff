//! The Node type - a point-in-time snapshot of one repository node.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{PathAddress, PathError, PropertyValue};

/// A snapshot of one node as seen through a connection.
///
/// A node has exactly one primary type, a map of named property values,
/// an ordered list of child names, and (once committed) a
/// repository-assigned identity UUID. The snapshot is detached: later
/// commits do not change it.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// The node's current path.
    pub path: PathAddress,
    /// The structural type tag, e.g. `cask:asset`.
    pub primary_type: String,
    /// Repository-assigned identity, if any.
    pub uuid: Option<Uuid>,
    /// Property name -> value.
    pub properties: BTreeMap<String, PropertyValue>,
    /// Child names in repository order.
    pub child_names: Vec<String>,
}

impl Node {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Whether a property with this name exists.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Whether a child with this name exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.child_names.iter().any(|c| c == name)
    }

    /// The path of a named child.
    pub fn child_path(&self, name: &str) -> Result<PathAddress, PathError> {
        PathAddress::child_of(&self.path, name)
    }
}
