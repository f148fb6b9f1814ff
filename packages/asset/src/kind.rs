//! Node-type vocabulary for the asset layer.
//!
//! The persisted layout is fixed: an asset node carries a `file` child
//! (binary + mime) and a `metadata` child (property bag); a link node
//! carries one reference property; a generic file carries a `content`
//! child; an assets container holds randomly-named asset children.

/// Primary type tags.
pub mod node_types {
    /// A real, binary-bearing asset.
    pub const ASSET: &str = "cask:asset";
    /// A link aliasing another asset.
    pub const ASSET_LINK: &str = "cask:assetLink";
    /// A generic binary-bearing file node.
    pub const FILE: &str = "cask:file";
    /// The content child of a generic file node.
    pub const FILE_CONTENT: &str = "cask:fileContent";
    /// A container of staged assets.
    pub const ASSETS: &str = "cask:assets";
    /// The metadata child of an asset.
    pub const METADATA: &str = "cask:metadata";
    /// The file child of an asset (binary + mime holder).
    pub const RESOURCE: &str = "cask:resource";
}

/// Fixed child name for an asset's binary holder.
pub const CHILD_FILE: &str = "file";
/// Fixed child name for an asset's metadata bag.
pub const CHILD_METADATA: &str = "metadata";
/// Fixed child name for a generic file's content.
pub const CHILD_CONTENT: &str = "content";

/// Property holding the binary payload.
pub const PROP_DATA: &str = "data";
/// Property holding the mime type.
pub const PROP_MIME_TYPE: &str = "mimeType";
/// Property holding the original file name.
pub const PROP_FILE_NAME: &str = "fileName";
/// Reference property on a link node.
pub const PROP_LINK: &str = "link";

/// The mime type used when none is known.
pub const WILDCARD_MIME: &str = "*/*";

/// The four node shapes an `Asset` can be built over.
///
/// Dispatch is a one-time tag lookup at construction: an unknown primary
/// type is rejected up front rather than falling through at use time, and
/// the closed enum keeps every dispatch site exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetNodeKind {
    /// Backed by a `cask:asset` node.
    Asset,
    /// Backed by a `cask:assetLink` node.
    Link,
    /// Backed by a `cask:file` node.
    File,
    /// Backed by a `cask:fileContent` node.
    FileContent,
}

impl AssetNodeKind {
    /// Map a primary type to its asset shape, if it has one.
    pub fn from_primary_type(primary_type: &str) -> Option<Self> {
        match primary_type {
            node_types::ASSET => Some(AssetNodeKind::Asset),
            node_types::ASSET_LINK => Some(AssetNodeKind::Link),
            node_types::FILE => Some(AssetNodeKind::File),
            node_types::FILE_CONTENT => Some(AssetNodeKind::FileContent),
            _ => None,
        }
    }

    /// The primary type this shape requires.
    pub fn primary_type(self) -> &'static str {
        match self {
            AssetNodeKind::Asset => node_types::ASSET,
            AssetNodeKind::Link => node_types::ASSET_LINK,
            AssetNodeKind::File => node_types::FILE,
            AssetNodeKind::FileContent => node_types::FILE_CONTENT,
        }
    }
}
