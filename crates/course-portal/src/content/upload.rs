//! Upload handling
//!
//! The extension check is the only gate: no MIME sniffing, no size limit,
//! and a same-named upload silently overwrites. Rebuilding the tree is the
//! caller's job; the upload itself only writes the file.

use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::content::allowed_file;
use crate::error::{PortalError, PortalResult};

pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn store(
        &self,
        chapter: &str,
        section: &str,
        resource_type: &str,
        filename: &str,
        data: &[u8],
    ) -> PortalResult<()> {
        if !allowed_file(filename) {
            return Err(PortalError::InvalidFile(filename.to_string()));
        }

        let dir = self.root.join(chapter).join(section).join(resource_type);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(filename), data)?;

        info!(
            "Stored upload {} under {}/{}/{} ({} bytes)",
            filename,
            chapter,
            section,
            resource_type,
            data.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_disallowed_extension_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let err = store.store("CH1", "S1", "videos", "evil.exe", b"x").unwrap_err();
        assert!(matches!(err, PortalError::InvalidFile(_)));
        // No directory was created either
        assert!(!dir.path().join("CH1").exists());
    }

    #[test]
    fn test_store_creates_category_path() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        store.store("CH1", "S1", "videos", "lecture.mp4", b"frames").unwrap();
        let written = dir.path().join("CH1/S1/videos/lecture.mp4");
        assert_eq!(std::fs::read(written).unwrap(), b"frames");
    }

    #[test]
    fn test_same_name_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        store.store("CH1", "S1", "homework", "hw.pdf", b"old").unwrap();
        store.store("CH1", "S1", "homework", "hw.pdf", b"new").unwrap();

        let written = dir.path().join("CH1/S1/homework/hw.pdf");
        assert_eq!(std::fs::read(written).unwrap(), b"new");
    }
}
