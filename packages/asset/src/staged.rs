//! Write-side staged-save protocol.
//!
//! A staged asset holds everything its persisted form needs; `save`
//! checks the target path is free immediately before writing, stages the
//! whole multi-node structure, and commits it as one unit. Nothing
//! partial is ever observable: either every node lands or none does.

use bytes::Bytes;
use cask_props::{PropsError, PropsResult, Session};
use cask_repo::{Change, Connection, PathAddress, PropertyValue, RepoError};
use uuid::Uuid;

use crate::asset::{resolve_asset, Asset};
use crate::kind::{
    node_types, CHILD_FILE, CHILD_METADATA, PROP_DATA, PROP_FILE_NAME, PROP_LINK, PROP_MIME_TYPE,
};
use crate::metadata::{AssetMetadata, DetectedMetadata};
use crate::{AssetError, AssetResult};

/// Content staged for persistence, saved as one atomic structure.
///
/// `save` is deliberately not idempotent: an occupied target is the hard
/// error [`AssetError::OccupiedPath`], checked right before the write so
/// the unchecked window is as small as the connection allows.
pub trait StagedAsset {
    /// Stage every node and property of this asset's persisted form
    /// under `target`. Nothing is committed here.
    fn stage(&self, conn: &mut dyn Connection, target: &PathAddress) -> PropsResult<()>;

    /// Save under a free `target` path and return the persisted asset.
    fn save(&self, session: &Session, target: &PathAddress) -> AssetResult<Box<dyn Asset>> {
        save_with(session, target, |conn, path| self.stage(conn, path))?;
        resolve_asset(session.clone(), target)
    }
}

/// Occupied check, staging, one commit. The closure only stages.
fn save_with(
    session: &Session,
    target: &PathAddress,
    stage: impl FnOnce(&mut dyn Connection, &PathAddress) -> PropsResult<()>,
) -> AssetResult<()> {
    let result = session.with_conn(|conn| {
        if conn.resolve(target)?.is_some() {
            return Err(PropsError::Repo(RepoError::OccupiedPath {
                path: target.clone(),
            }));
        }
        // Roll back on any failure so a shared connection never carries
        // half a staged structure into the caller's next commit.
        if let Err(e) = stage(conn, target) {
            conn.rollback();
            return Err(e);
        }
        log::debug!("saving staged asset structure at {}", target);
        if let Err(e) = conn.commit() {
            conn.rollback();
            return Err(e.into());
        }
        Ok(())
    });
    match result {
        Ok(()) => Ok(()),
        Err(PropsError::Repo(RepoError::OccupiedPath { path })) => {
            Err(AssetError::OccupiedPath { path })
        }
        Err(e) => Err(AssetError::Props(e)),
    }
}

fn stage_create(conn: &mut dyn Connection, path: &PathAddress, primary_type: &str) -> PropsResult<()> {
    conn.stage(Change::CreateNode {
        path: path.clone(),
        primary_type: primary_type.to_string(),
    })?;
    Ok(())
}

fn stage_set(
    conn: &mut dyn Connection,
    path: &PathAddress,
    name: &str,
    value: PropertyValue,
) -> PropsResult<()> {
    conn.stage(Change::SetProperty {
        path: path.clone(),
        name: name.to_string(),
        value,
    })?;
    Ok(())
}

fn child(path: &PathAddress, name: &str) -> PropsResult<PathAddress> {
    Ok(PathAddress::child_of(path, name).map_err(RepoError::from)?)
}

/// A real asset staged for persistence: binary content plus metadata.
///
/// Persists as a `cask:asset` node with a `file` child holding the
/// binary and a `metadata` child holding the metadata map.
pub struct StagedRealAsset {
    content: Bytes,
    metadata: DetectedMetadata,
}

impl StagedRealAsset {
    /// Stage binary content under its original file name.
    ///
    /// The mime type is detected from the file name unless overridden
    /// with [`StagedRealAsset::with_mime_type`].
    pub fn new(content: Bytes, file_name: &str) -> Self {
        StagedRealAsset {
            content,
            metadata: DetectedMetadata::for_file(file_name),
        }
    }

    /// Override mime detection with a known mime type.
    #[must_use]
    pub fn with_mime_type(mut self, mime: &str) -> Self {
        self.metadata = self.metadata.with_mime_type(mime);
        self
    }

    /// Add a metadata entry to persist alongside the content.
    #[must_use]
    pub fn with_metadata_entry(mut self, key: &str, value: &str) -> Self {
        self.metadata = self.metadata.with_entry(key, value);
        self
    }

    /// The staged metadata, mime detection included.
    pub fn metadata(&self) -> &DetectedMetadata {
        &self.metadata
    }
}

impl StagedAsset for StagedRealAsset {
    fn stage(&self, conn: &mut dyn Connection, target: &PathAddress) -> PropsResult<()> {
        let mime = self.metadata.mime_type();

        stage_create(conn, target, node_types::ASSET)?;
        stage_set(
            conn,
            target,
            PROP_FILE_NAME,
            PropertyValue::from(self.metadata.file_name()),
        )?;

        let file = child(target, CHILD_FILE)?;
        stage_create(conn, &file, node_types::RESOURCE)?;
        stage_set(conn, &file, PROP_DATA, PropertyValue::Binary(self.content.clone()))?;
        stage_set(conn, &file, PROP_MIME_TYPE, PropertyValue::from(mime.as_str()))?;

        let metadata = child(target, CHILD_METADATA)?;
        stage_create(conn, &metadata, node_types::METADATA)?;
        for (key, value) in self.metadata.to_map() {
            stage_set(conn, &metadata, &key, PropertyValue::from(value))?;
        }
        // The mime type always lands, entry map or not.
        stage_set(conn, &metadata, PROP_MIME_TYPE, PropertyValue::from(mime.as_str()))?;
        Ok(())
    }
}

/// A link staged for persistence, aliasing an existing asset.
///
/// The target is captured by identity UUID at construction, not by path:
/// paths move, identities do not.
pub struct StagedLinkAsset {
    target_identity: Uuid,
}

impl StagedLinkAsset {
    /// Stage a link to an existing asset.
    ///
    /// Fails if the asset cannot surface an identity.
    pub fn to(target: &dyn Asset) -> AssetResult<Self> {
        Ok(StagedLinkAsset {
            target_identity: target.identity()?,
        })
    }

    /// Stage a link to a known identity.
    pub fn to_identity(target_identity: Uuid) -> Self {
        StagedLinkAsset { target_identity }
    }
}

impl StagedAsset for StagedLinkAsset {
    fn stage(&self, conn: &mut dyn Connection, target: &PathAddress) -> PropsResult<()> {
        stage_create(conn, target, node_types::ASSET_LINK)?;
        stage_set(
            conn,
            target,
            PROP_LINK,
            PropertyValue::Reference(self.target_identity),
        )?;
        Ok(())
    }
}

/// A collection of staged assets, saved together under one container.
///
/// `save` creates a `cask:assets` node and persists every staged asset
/// as a randomly-named child, all in one commit. An empty collection is
/// valid and produces an empty container.
#[derive(Default)]
pub struct StagedAssets {
    staged: Vec<Box<dyn StagedAsset>>,
}

impl StagedAssets {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a staged asset to the collection.
    pub fn push(&mut self, asset: Box<dyn StagedAsset>) {
        self.staged.push(asset);
    }

    /// The number of staged assets.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Save the container and every staged asset in one commit.
    ///
    /// Returns the persisted assets in staging order.
    pub fn save(
        &self,
        session: &Session,
        target: &PathAddress,
    ) -> AssetResult<Vec<Box<dyn Asset>>> {
        let mut children = Vec::with_capacity(self.staged.len());
        save_with(session, target, |conn, path| {
            stage_create(conn, path, node_types::ASSETS)?;
            for staged in &self.staged {
                let name = Uuid::new_v4().to_string();
                let child_path = child(path, &name)?;
                staged.stage(conn, &child_path)?;
                children.push(child_path);
            }
            Ok(())
        })?;

        children
            .into_iter()
            .map(|path| resolve_asset(session.clone(), &path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cask_props::NodeProperties;
    use cask_repo::{MemoryRepository, path_addr};

    use crate::kind::{AssetNodeKind, WILDCARD_MIME};

    fn session(repo: &MemoryRepository) -> Session {
        Session::owned(Arc::new(repo.clone()))
    }

    #[test]
    fn save_real_asset_creates_full_structure() {
        let repo = MemoryRepository::new();
        let staged = StagedRealAsset::new(Bytes::from_static(b"jpeg bytes"), "photo.jpg");

        let asset = staged.save(&session(&repo), &path_addr!("/a1")).unwrap();
        assert_eq!(asset.kind(), AssetNodeKind::Asset);

        let file = asset.file().unwrap();
        assert_eq!(file.mime_type(), "image/jpeg");
        assert_eq!(&file.retrieve().read_all()[..], b"jpeg bytes");

        let meta = asset.metadata().unwrap();
        assert_eq!(meta.mime_type(), "image/jpeg");
    }

    #[test]
    fn save_persists_file_name() {
        let repo = MemoryRepository::new();
        let staged = StagedRealAsset::new(Bytes::from_static(b"x"), "notes.txt");
        let asset = staged.save(&session(&repo), &path_addr!("/n1")).unwrap();

        let props =
            NodeProperties::open(session(&repo), asset.path().clone()).unwrap();
        assert_eq!(props.get(PROP_FILE_NAME, String::new()), "notes.txt");
    }

    #[test]
    fn explicit_mime_overrides_detection() {
        let repo = MemoryRepository::new();
        let staged =
            StagedRealAsset::new(Bytes::from_static(b"x"), "photo.jpg").with_mime_type("image/webp");
        let asset = staged.save(&session(&repo), &path_addr!("/a1")).unwrap();
        assert_eq!(asset.file().unwrap().mime_type(), "image/webp");
    }

    #[test]
    fn metadata_entries_are_persisted() {
        let repo = MemoryRepository::new();
        let staged = StagedRealAsset::new(Bytes::from_static(b"x"), "a.txt")
            .with_metadata_entry("author", "alice");
        let asset = staged.save(&session(&repo), &path_addr!("/a1")).unwrap();

        let meta = asset.metadata().unwrap();
        assert_eq!(meta.to_map().get("author"), Some(&"alice".to_string()));
        // Persisted metadata reads from its node.
        assert!(meta.properties().is_some());
    }

    #[test]
    fn second_save_at_same_path_fails_first_intact() {
        let repo = MemoryRepository::new();
        let first = StagedRealAsset::new(Bytes::from_static(b"original"), "a.bin");
        first.save(&session(&repo), &path_addr!("/a1")).unwrap();

        let second = StagedRealAsset::new(Bytes::from_static(b"intruder"), "b.bin");
        let result = second.save(&session(&repo), &path_addr!("/a1"));
        assert!(matches!(result, Err(AssetError::OccupiedPath { .. })));

        let survivor = resolve_asset(session(&repo), &path_addr!("/a1")).unwrap();
        assert_eq!(&survivor.file().unwrap().retrieve().read_all()[..], b"original");
    }

    #[test]
    fn save_under_missing_parent_commits_nothing() {
        let repo = MemoryRepository::new();
        let staged = StagedRealAsset::new(Bytes::from_static(b"x"), "a.bin");
        assert!(staged
            .save(&session(&repo), &path_addr!("/no/parent/here"))
            .is_err());
        assert!(resolve_asset(session(&repo), &path_addr!("/no")).is_err());
    }

    #[test]
    fn failed_save_leaves_shared_connection_clean() {
        let repo = MemoryRepository::new();
        let session = Session::shared(Box::new(repo.connect()));

        let staged = StagedRealAsset::new(Bytes::from_static(b"x"), "a.bin");
        assert!(staged.save(&session, &path_addr!("/no/parent/here")).is_err());

        // Nothing stale replays through the same connection.
        let asset = staged.save(&session, &path_addr!("/a1")).unwrap();
        assert_eq!(&asset.file().unwrap().retrieve().read_all()[..], b"x");
        assert!(resolve_asset(session, &path_addr!("/no")).is_err());
    }

    #[test]
    fn save_link_references_by_identity() {
        let repo = MemoryRepository::new();
        let real = StagedRealAsset::new(Bytes::from_static(b"payload"), "a.bin")
            .save(&session(&repo), &path_addr!("/a1"))
            .unwrap();

        let link = StagedLinkAsset::to(real.as_ref())
            .unwrap()
            .save(&session(&repo), &path_addr!("/l1"))
            .unwrap();
        assert_eq!(link.kind(), AssetNodeKind::Link);
        assert_eq!(&link.file().unwrap().retrieve().read_all()[..], b"payload");
    }

    #[test]
    fn chained_links_resolve_to_terminal_asset() {
        let repo = MemoryRepository::new();
        let real = StagedRealAsset::new(Bytes::from_static(b"deep"), "a.bin")
            .save(&session(&repo), &path_addr!("/a1"))
            .unwrap();

        let mut previous = real;
        for i in 0..4 {
            let path = PathAddress::target(&format!("/l{i}")).unwrap();
            previous = StagedLinkAsset::to(previous.as_ref())
                .unwrap()
                .save(&session(&repo), &path)
                .unwrap();
        }
        assert_eq!(&previous.file().unwrap().retrieve().read_all()[..], b"deep");
    }

    #[test]
    fn link_to_identity_that_never_lands_is_dangling() {
        let repo = MemoryRepository::new();
        let link = StagedLinkAsset::to_identity(Uuid::new_v4())
            .save(&session(&repo), &path_addr!("/l1"))
            .unwrap();
        assert!(matches!(link.file(), Err(AssetError::DanglingLink { .. })));
    }

    #[test]
    fn empty_collection_saves_an_empty_container() {
        let repo = MemoryRepository::new();
        let saved = StagedAssets::new()
            .save(&session(&repo), &path_addr!("/batch"))
            .unwrap();
        assert!(saved.is_empty());

        let props = NodeProperties::open(session(&repo), path_addr!("/batch")).unwrap();
        assert_eq!(props.primary_type().unwrap(), node_types::ASSETS);
        assert!(props.node().unwrap().child_names.is_empty());
    }

    #[test]
    fn collection_saves_every_child_under_random_names() {
        let repo = MemoryRepository::new();
        let mut batch = StagedAssets::new();
        batch.push(Box::new(StagedRealAsset::new(
            Bytes::from_static(b"one"),
            "one.txt",
        )));
        batch.push(Box::new(StagedRealAsset::new(
            Bytes::from_static(b"two"),
            "two.txt",
        )));
        assert_eq!(batch.len(), 2);

        let saved = batch.save(&session(&repo), &path_addr!("/batch")).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(&saved[0].file().unwrap().retrieve().read_all()[..], b"one");
        assert_eq!(&saved[1].file().unwrap().retrieve().read_all()[..], b"two");

        // Child names are UUIDs, unique per child.
        let container = NodeProperties::open(session(&repo), path_addr!("/batch")).unwrap();
        let names = container.node().unwrap().child_names;
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
        assert!(Uuid::parse_str(&names[0]).is_ok());
    }

    #[test]
    fn collection_save_on_occupied_path_fails() {
        let repo = MemoryRepository::new();
        StagedAssets::new()
            .save(&session(&repo), &path_addr!("/batch"))
            .unwrap();
        let result = StagedAssets::new().save(&session(&repo), &path_addr!("/batch"));
        assert!(matches!(result, Err(AssetError::OccupiedPath { .. })));
    }

    #[test]
    fn detection_falls_back_to_octet_stream() {
        let staged = StagedRealAsset::new(Bytes::from_static(b"x"), "blob");
        // Unknown extension falls back to octet-stream, never wildcard.
        assert_ne!(staged.metadata().mime_type(), WILDCARD_MIME);
        assert_eq!(staged.metadata().mime_type(), "application/octet-stream");
    }
}
