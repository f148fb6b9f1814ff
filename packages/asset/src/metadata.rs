//! AssetMetadata - the metadata facet of an asset.
//!
//! Three backings, one contract: persisted metadata reads fresh from its
//! node on every access, detected metadata is derived in memory from the
//! content it describes, and projected metadata is a plain point-in-time
//! snapshot (the empty fallback included).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use cask_props::{NodeProperties, PropsResult, Session};
use cask_repo::{PathAddress, PropertyValue};

use crate::kind::{node_types, PROP_MIME_TYPE, WILDCARD_MIME};
use crate::{AssetError, AssetResult};

/// The metadata facet: a mime type plus a string key/value map.
///
/// `properties()` exposes the underlying property-set handle when the
/// metadata is persisted; in-memory metadata answers `None`.
pub trait AssetMetadata {
    /// The mime type; `*/*` when unknown.
    fn mime_type(&self) -> String;

    /// Every metadata entry projected to strings.
    fn to_map(&self) -> BTreeMap<String, String>;

    /// The backing property set, for persisted metadata.
    fn properties(&self) -> Option<&NodeProperties>;
}

/// Metadata persisted as a `cask:metadata` node.
///
/// Reads go to the repository on every access, so the view is always
/// current. Use [`StoredMetadata::snapshot_with`] for a point-in-time
/// mutation.
pub struct StoredMetadata {
    properties: NodeProperties,
}

impl StoredMetadata {
    /// Open persisted metadata; the node must be `cask:metadata`.
    pub fn open(session: Session, path: PathAddress) -> AssetResult<Self> {
        let properties = NodeProperties::open(session, path)?;
        properties.assert_primary_type(node_types::METADATA)?;
        Ok(StoredMetadata { properties })
    }

    fn open_checked(properties: NodeProperties) -> PropsResult<Self> {
        properties.assert_primary_type(node_types::METADATA)?;
        Ok(StoredMetadata { properties })
    }

    /// Commit a point-in-time mutation and return the new handle.
    ///
    /// All entries are applied in one transaction; the receiver stays
    /// valid and keeps reading current state.
    pub fn snapshot_with(
        &self,
        changes: BTreeMap<String, PropertyValue>,
    ) -> AssetResult<StoredMetadata> {
        let properties = self.properties.set_properties(changes)?;
        Ok(StoredMetadata { properties })
    }
}

impl AssetMetadata for StoredMetadata {
    fn mime_type(&self) -> String {
        self.properties
            .get(PROP_MIME_TYPE, WILDCARD_MIME.to_string())
    }

    fn to_map(&self) -> BTreeMap<String, String> {
        self.properties.all()
    }

    fn properties(&self) -> Option<&NodeProperties> {
        Some(&self.properties)
    }
}

/// In-memory metadata for content that is not persisted yet.
///
/// The mime type is detected from the file name lazily and exactly once;
/// an explicit mime type skips detection entirely.
pub struct DetectedMetadata {
    file_name: String,
    explicit_mime: Option<String>,
    detected_mime: OnceLock<String>,
    entries: BTreeMap<String, String>,
}

impl DetectedMetadata {
    /// Metadata for a named file, mime detected on first use.
    pub fn for_file(file_name: &str) -> Self {
        DetectedMetadata {
            file_name: file_name.to_string(),
            explicit_mime: None,
            detected_mime: OnceLock::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Override detection with a known mime type.
    #[must_use]
    pub fn with_mime_type(mut self, mime: &str) -> Self {
        self.explicit_mime = Some(mime.to_string());
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// The described file's name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl AssetMetadata for DetectedMetadata {
    fn mime_type(&self) -> String {
        if let Some(mime) = &self.explicit_mime {
            return mime.clone();
        }
        self.detected_mime
            .get_or_init(|| {
                mime_guess::from_path(&self.file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            })
            .clone()
    }

    fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    fn properties(&self) -> Option<&NodeProperties> {
        None
    }
}

/// A plain in-memory snapshot of metadata.
pub struct ProjectedMetadata {
    mime: String,
    entries: BTreeMap<String, String>,
}

impl ProjectedMetadata {
    /// A snapshot with the given mime type and entries.
    pub fn new(mime: &str, entries: BTreeMap<String, String>) -> Self {
        ProjectedMetadata {
            mime: mime.to_string(),
            entries,
        }
    }

    /// The empty fallback: wildcard mime, no entries.
    pub fn empty() -> Self {
        ProjectedMetadata {
            mime: WILDCARD_MIME.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

impl AssetMetadata for ProjectedMetadata {
    fn mime_type(&self) -> String {
        self.mime.clone()
    }

    fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    fn properties(&self) -> Option<&NodeProperties> {
        None
    }
}

// The variants open stored metadata through this, so wrong-shape nodes
// fail before any facet access.
pub(crate) fn open_stored(properties: NodeProperties) -> AssetResult<StoredMetadata> {
    StoredMetadata::open_checked(properties).map_err(AssetError::from)
}
