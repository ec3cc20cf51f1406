//! Facade over the per-concern content stores, all sharing one storage root

use std::path::{Component, Path, PathBuf};

use crate::content::{DiscussionStore, SlotReader, TreeScanner, UploadStore};
use crate::error::{PortalError, PortalResult};

pub struct CourseLibrary {
    root: PathBuf,
    pub tree: TreeScanner,
    pub discussions: DiscussionStore,
    pub slots: SlotReader,
    pub uploads: UploadStore,
}

impl CourseLibrary {
    pub fn new(root: PathBuf, strict_scan: bool) -> Self {
        Self {
            tree: TreeScanner::new(root.clone(), strict_scan),
            discussions: DiscussionStore::new(root.clone()),
            slots: SlotReader::new(root.clone()),
            uploads: UploadStore::new(root.clone()),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a root-relative request path for the file routes, rejecting
    /// anything that could escape the storage root.
    pub fn resolve(&self, relative: &str) -> PortalResult<PathBuf> {
        let candidate = Path::new(relative);
        if relative.is_empty()
            || !candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(PortalError::NotFound(relative.to_string()));
        }
        Ok(self.root.join(candidate))
    }
}
