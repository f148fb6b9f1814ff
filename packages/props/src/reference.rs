//! Identity and reference resolution.
//!
//! Two tiers, per the error taxonomy: an entity that *claims* identity
//! must have one (`NotReferencable` is a hard error), while a reference
//! *property* that points nowhere resolvable is soft - logged and treated
//! as absent.

use cask_repo::{PathAddress, PropertyValue};
use uuid::Uuid;

use crate::{NodeProperties, PropsError, PropsResult};

/// An entity that can surface its repository identity.
///
/// Identity is mandatory once claimed: a missing UUID is the hard error
/// [`PropsError::NotReferencable`], never an empty or synthesized value.
pub trait Referencable {
    /// The identity UUID.
    fn identity(&self) -> PropsResult<Uuid>;
}

impl Referencable for NodeProperties {
    fn identity(&self) -> PropsResult<Uuid> {
        let node = self.node()?;
        node.uuid.ok_or_else(|| PropsError::NotReferencable {
            path: self.path().clone(),
        })
    }
}

/// A reference-typed property, resolvable to the node it points to.
///
/// Accepts the three reference shapes: `Reference` and `WeakReference`
/// (identity-valued, resolved via UUID lookup) and `Path` (resolved by
/// direct lookup). Everything that can go wrong - absent property, wrong
/// shape, dangling target - resolves to `None` with a warning, because a
/// reference property, unlike an identity, makes no existence promise.
pub struct ReferenceProperty<'a> {
    properties: &'a NodeProperties,
    name: &'a str,
}

impl<'a> ReferenceProperty<'a> {
    /// View one property of a node as a reference.
    pub fn new(properties: &'a NodeProperties, name: &'a str) -> Self {
        ReferenceProperty { properties, name }
    }

    /// The *current* path of the referenced node, or `None`.
    pub fn referenced_node(&self) -> Option<PathAddress> {
        let node = match self.properties.node() {
            Ok(node) => node,
            Err(e) => {
                log::warn!("reference source {} unreadable: {}", self.properties.path(), e);
                return None;
            }
        };
        let Some(value) = node.property(self.name) else {
            return None;
        };

        let resolved = match value {
            PropertyValue::Reference(uuid) | PropertyValue::WeakReference(uuid) => {
                self.resolve_uuid(uuid)
            }
            PropertyValue::Path(path) => self.resolve_path(path),
            other => {
                log::warn!(
                    "property '{}' at {} is not a reference (stored type {})",
                    self.name,
                    self.properties.path(),
                    other.property_type()
                );
                return None;
            }
        };

        if resolved.is_none() {
            log::warn!(
                "dangling reference '{}' at {}",
                self.name,
                self.properties.path()
            );
        }
        resolved
    }

    fn resolve_uuid(&self, uuid: &Uuid) -> Option<PathAddress> {
        self.properties
            .session()
            .with_conn(|conn| Ok(conn.find_by_uuid(uuid)?))
            .ok()
            .flatten()
            .map(|node| node.path)
    }

    fn resolve_path(&self, path: &str) -> Option<PathAddress> {
        let address = PathAddress::target(path).ok()?;
        self.properties
            .session()
            .with_conn(|conn| Ok(conn.resolve(&address)?))
            .ok()
            .flatten()
            .map(|node| node.path)
    }
}
