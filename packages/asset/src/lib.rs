//! Cask asset layer.
//!
//! Content-asset semantics over cask-props:
//! - `AssetNodeKind` and the node-type vocabulary: the fixed persisted layout
//! - `Asset` + four variants: polymorphic read access, dispatched once by
//!   primary type
//! - `AssetMetadata` backings: persisted, detected, projected
//! - `StagedAsset` protocol: atomic write-side saves with an occupied-path
//!   check
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use cask_asset::{resolve_asset, StagedAsset, StagedRealAsset};
//! use cask_props::Session;
//! use cask_repo::{MemoryRepository, path_addr};
//!
//! let repo = MemoryRepository::new();
//! let session = Session::owned(Arc::new(repo));
//!
//! let staged = StagedRealAsset::new(Bytes::from_static(b"..."), "photo.jpg");
//! staged.save(&session, &path_addr!("/photo")).unwrap();
//!
//! let asset = resolve_asset(session, &path_addr!("/photo")).unwrap();
//! assert_eq!(asset.file().unwrap().mime_type(), "image/jpeg");
//! ```

mod asset;
mod error;
mod kind;
mod metadata;
mod staged;

pub use asset::{
    resolve_asset, Asset, AssetFile, FileAsset, FileContentAsset, LinkAsset, RealAsset,
};
pub use error::AssetError;
pub use kind::{
    node_types, AssetNodeKind, CHILD_CONTENT, CHILD_FILE, CHILD_METADATA, PROP_DATA,
    PROP_FILE_NAME, PROP_LINK, PROP_MIME_TYPE, WILDCARD_MIME,
};
pub use metadata::{AssetMetadata, DetectedMetadata, ProjectedMetadata, StoredMetadata};
pub use staged::{StagedAsset, StagedAssets, StagedLinkAsset, StagedRealAsset};

/// Result alias for asset-layer operations.
pub type AssetResult<T> = Result<T, AssetError>;
