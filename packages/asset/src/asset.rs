//! Asset variants and dispatch.
//!
//! Four node shapes, one `Asset` contract. The shape is decided exactly
//! once, at construction, by primary-type lookup; every variant asserts
//! its required type eagerly, so a wrong-shape node never yields a
//! half-working asset.

use cask_props::{BinaryStream, NodeProperties, PropsError, Referencable, ReferenceProperty, Session};
use cask_repo::PathAddress;
use uuid::Uuid;

use crate::kind::{
    node_types, AssetNodeKind, CHILD_CONTENT, CHILD_FILE, CHILD_METADATA, PROP_LINK,
    PROP_MIME_TYPE, WILDCARD_MIME,
};
use crate::metadata::{open_stored, AssetMetadata, ProjectedMetadata};
use crate::{AssetError, AssetResult};

/// A link chain longer than this is treated as unresolvable. Chains this
/// deep do not occur in practice; a cycle of links would otherwise walk
/// forever.
const MAX_LINK_HOPS: usize = 64;

/// The binary facet of an asset: one binary property plus its mime type.
pub struct AssetFile {
    holder: NodeProperties,
    property: String,
    mime: String,
}

impl AssetFile {
    fn new(holder: NodeProperties, property: &str, mime: String) -> Self {
        AssetFile {
            holder,
            property: property.to_string(),
            mime,
        }
    }

    /// A lazily-resolved stream over the binary.
    pub fn retrieve(&self) -> BinaryStream {
        self.holder.retrieve_binary(&self.property)
    }

    /// The binary's size in bytes; 0 when absent.
    pub fn size(&self) -> u64 {
        self.holder.binary_size(&self.property)
    }

    /// The binary's mime type.
    pub fn mime_type(&self) -> &str {
        &self.mime
    }

    /// The node holding the binary.
    pub fn path(&self) -> &PathAddress {
        self.holder.path()
    }
}

/// The asset contract: a binary facet and a metadata facet over one of
/// the four node shapes.
///
/// # Object Safety
///
/// This trait is object-safe: dispatch hands out `Box<dyn Asset>`.
pub trait Asset {
    /// The backing node's path.
    fn path(&self) -> &PathAddress;

    /// The shape this asset was dispatched as.
    fn kind(&self) -> AssetNodeKind;

    /// The binary facet.
    fn file(&self) -> AssetResult<AssetFile>;

    /// The metadata facet.
    fn metadata(&self) -> AssetResult<Box<dyn AssetMetadata>>;

    /// The backing node's identity UUID.
    fn identity(&self) -> AssetResult<Uuid>;
}

/// A real, binary-bearing asset: a `cask:asset` node with a `file` child
/// and (usually) a `metadata` child.
pub struct RealAsset {
    props: NodeProperties,
}

impl RealAsset {
    /// Open a real asset; the node must be `cask:asset`.
    pub fn open(session: Session, path: PathAddress) -> AssetResult<Self> {
        Self::from_props(NodeProperties::open(session, path)?)
    }

    fn from_props(props: NodeProperties) -> AssetResult<Self> {
        props.assert_primary_type(node_types::ASSET)?;
        Ok(RealAsset { props })
    }

    fn child_props(&self, name: &str) -> Result<NodeProperties, PropsError> {
        let path = PathAddress::child_of(self.props.path(), name)
            .map_err(cask_repo::RepoError::from)?;
        NodeProperties::open(self.props.session().clone(), path)
    }
}

impl Asset for RealAsset {
    fn path(&self) -> &PathAddress {
        self.props.path()
    }

    fn kind(&self) -> AssetNodeKind {
        AssetNodeKind::Asset
    }

    fn file(&self) -> AssetResult<AssetFile> {
        let holder = self.child_props(CHILD_FILE).map_err(|e| match e {
            PropsError::NodeNotFound { .. } => AssetError::MissingFile {
                path: self.props.path().clone(),
            },
            other => AssetError::Props(other),
        })?;
        let mime = holder.get(PROP_MIME_TYPE, WILDCARD_MIME.to_string());
        Ok(AssetFile::new(holder, crate::kind::PROP_DATA, mime))
    }

    fn metadata(&self) -> AssetResult<Box<dyn AssetMetadata>> {
        // Metadata absence is never an error: fall back to the empty
        // wildcard metadata.
        match self.child_props(CHILD_METADATA) {
            Ok(props) => Ok(Box::new(open_stored(props)?)),
            Err(PropsError::NodeNotFound { .. }) => Ok(Box::new(ProjectedMetadata::empty())),
            Err(e) => Err(AssetError::Props(e)),
        }
    }

    fn identity(&self) -> AssetResult<Uuid> {
        Ok(self.props.identity()?)
    }
}

/// A link aliasing another asset: a `cask:assetLink` node whose `link`
/// property references the target by identity.
pub struct LinkAsset {
    props: NodeProperties,
}

impl LinkAsset {
    /// Open a link asset; the node must be `cask:assetLink`.
    pub fn open(session: Session, path: PathAddress) -> AssetResult<Self> {
        Self::from_props(NodeProperties::open(session, path)?)
    }

    fn from_props(props: NodeProperties) -> AssetResult<Self> {
        props.assert_primary_type(node_types::ASSET_LINK)?;
        Ok(LinkAsset { props })
    }

    /// Resolve the terminal target of this link, following chained links.
    ///
    /// A link asserts its target exists: anything unresolvable is the
    /// hard error [`AssetError::DanglingLink`].
    pub fn target(&self) -> AssetResult<Box<dyn Asset>> {
        let mut current = self.props.clone();
        for _ in 0..MAX_LINK_HOPS {
            let target_path = ReferenceProperty::new(&current, PROP_LINK)
                .referenced_node()
                .ok_or_else(|| AssetError::DanglingLink {
                    path: current.path().clone(),
                })?;
            let next = NodeProperties::open(current.session().clone(), target_path.clone())?;
            if next.is_primary_type(&[node_types::ASSET_LINK])? {
                current = next;
                continue;
            }
            return resolve_asset(self.props.session().clone(), &target_path);
        }
        Err(AssetError::DanglingLink {
            path: self.props.path().clone(),
        })
    }
}

impl Asset for LinkAsset {
    fn path(&self) -> &PathAddress {
        self.props.path()
    }

    fn kind(&self) -> AssetNodeKind {
        AssetNodeKind::Link
    }

    fn file(&self) -> AssetResult<AssetFile> {
        self.target()?.file()
    }

    fn metadata(&self) -> AssetResult<Box<dyn AssetMetadata>> {
        self.target()?.metadata()
    }

    fn identity(&self) -> AssetResult<Uuid> {
        // The link's own identity, so links can themselves be linked to.
        Ok(self.props.identity()?)
    }
}

/// A generic binary-bearing file: a `cask:file` node whose `content`
/// child holds the binary and mime type, with no metadata child.
pub struct FileAsset {
    props: NodeProperties,
}

impl FileAsset {
    /// Open a file asset; the node must be `cask:file`.
    pub fn open(session: Session, path: PathAddress) -> AssetResult<Self> {
        Self::from_props(NodeProperties::open(session, path)?)
    }

    fn from_props(props: NodeProperties) -> AssetResult<Self> {
        props.assert_primary_type(node_types::FILE)?;
        Ok(FileAsset { props })
    }

    fn content_props(&self) -> AssetResult<NodeProperties> {
        let path = PathAddress::child_of(self.props.path(), CHILD_CONTENT)
            .map_err(cask_repo::RepoError::from)
            .map_err(AssetError::Repo)?;
        NodeProperties::open(self.props.session().clone(), path).map_err(|e| match e {
            PropsError::NodeNotFound { .. } => AssetError::MissingFile {
                path: self.props.path().clone(),
            },
            other => AssetError::Props(other),
        })
    }
}

impl Asset for FileAsset {
    fn path(&self) -> &PathAddress {
        self.props.path()
    }

    fn kind(&self) -> AssetNodeKind {
        AssetNodeKind::File
    }

    fn file(&self) -> AssetResult<AssetFile> {
        let content = self.content_props()?;
        let mime = content.get(PROP_MIME_TYPE, WILDCARD_MIME.to_string());
        Ok(AssetFile::new(content, crate::kind::PROP_DATA, mime))
    }

    fn metadata(&self) -> AssetResult<Box<dyn AssetMetadata>> {
        match self.content_props() {
            Ok(content) => {
                let mime = content.get(PROP_MIME_TYPE, WILDCARD_MIME.to_string());
                Ok(Box::new(ProjectedMetadata::new(&mime, content.all())))
            }
            Err(AssetError::MissingFile { .. }) => Ok(Box::new(ProjectedMetadata::empty())),
            Err(e) => Err(e),
        }
    }

    fn identity(&self) -> AssetResult<Uuid> {
        Ok(self.props.identity()?)
    }
}

/// The content child of a generic file, adapted by delegating every
/// facet to the enclosing file node.
pub struct FileContentAsset {
    props: NodeProperties,
    parent: FileAsset,
}

impl FileContentAsset {
    /// Open a content asset; the node must be `cask:fileContent` and its
    /// parent must be a `cask:file`.
    pub fn open(session: Session, path: PathAddress) -> AssetResult<Self> {
        Self::from_props(NodeProperties::open(session, path)?)
    }

    fn from_props(props: NodeProperties) -> AssetResult<Self> {
        props.assert_primary_type(node_types::FILE_CONTENT)?;
        let parent_path = props.path().parent();
        let parent = FileAsset::open(props.session().clone(), parent_path).map_err(|e| match e {
            AssetError::Props(PropsError::NodeNotFound { .. }) => AssetError::OrphanContent {
                path: props.path().clone(),
            },
            other => other,
        })?;
        Ok(FileContentAsset { props, parent })
    }
}

impl Asset for FileContentAsset {
    fn path(&self) -> &PathAddress {
        self.props.path()
    }

    fn kind(&self) -> AssetNodeKind {
        AssetNodeKind::FileContent
    }

    fn file(&self) -> AssetResult<AssetFile> {
        self.parent.file()
    }

    fn metadata(&self) -> AssetResult<Box<dyn AssetMetadata>> {
        self.parent.metadata()
    }

    fn identity(&self) -> AssetResult<Uuid> {
        Ok(self.props.identity()?)
    }
}

/// Dispatch a node into its asset variant by primary type.
///
/// The shape decision happens here, once; an unmapped primary type is
/// [`AssetError::UnsupportedNodeType`].
pub fn resolve_asset(session: Session, path: &PathAddress) -> AssetResult<Box<dyn Asset>> {
    let props = NodeProperties::open(session, path.clone())?;
    let primary_type = props.primary_type()?;
    match AssetNodeKind::from_primary_type(&primary_type) {
        Some(AssetNodeKind::Asset) => Ok(Box::new(RealAsset::from_props(props)?)),
        Some(AssetNodeKind::Link) => Ok(Box::new(LinkAsset::from_props(props)?)),
        Some(AssetNodeKind::File) => Ok(Box::new(FileAsset::from_props(props)?)),
        Some(AssetNodeKind::FileContent) => Ok(Box::new(FileContentAsset::from_props(props)?)),
        None => Err(AssetError::UnsupportedNodeType {
            primary_type,
            path: path.clone(),
        }),
    }
}
