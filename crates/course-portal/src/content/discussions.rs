//! Append-only discussion posts, one text file per (chapter, section)
//!
//! Writes use a single authoritative encoding (UTF-8). Reads tolerate the
//! encodings legacy files were written under; a file no decoder accepts
//! degrades to an empty list instead of failing the page.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::PortalResult;
use crate::utils::{decode_first, DISCUSSION_ENCODINGS};

const DISCUSSION_FILE: &str = "discussions.txt";

pub struct DiscussionStore {
    root: PathBuf,
}

impl DiscussionStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn file_path(&self, chapter: &str, section: &str) -> PathBuf {
        self.root.join(chapter).join(section).join(DISCUSSION_FILE)
    }

    /// Append one post. The section directory is created on first use.
    pub fn append(&self, chapter: &str, section: &str, text: &str) -> PortalResult<()> {
        let path = self.file_path(chapter, section);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(text.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// All posts in append order. Absent file and undecodable file both read
    /// as empty, favoring availability over completeness for legacy data.
    pub fn read(&self, chapter: &str, section: &str) -> Vec<String> {
        let path = self.file_path(chapter, section);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };

        match decode_first(&bytes, DISCUSSION_ENCODINGS) {
            Some(text) => text.lines().map(|line| line.trim_end().to_string()).collect(),
            None => {
                warn!("Discussion file {} unreadable in any known encoding", path.display());
                Vec::new()
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::GBK;
    use tempfile::TempDir;

    #[test]
    fn test_append_then_read_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = DiscussionStore::new(dir.path().to_path_buf());

        store.append("CH1", "S1", "first").unwrap();
        store.append("CH1", "S1", "second").unwrap();
        store.append("CH1", "S1", "third").unwrap();

        assert_eq!(store.read("CH1", "S1"), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = DiscussionStore::new(dir.path().to_path_buf());
        assert!(store.read("CH9", "S9").is_empty());
    }

    #[test]
    fn test_sections_are_isolated() {
        let dir = TempDir::new().unwrap();
        let store = DiscussionStore::new(dir.path().to_path_buf());

        store.append("CH1", "S1", "for s1").unwrap();
        store.append("CH1", "S2", "for s2").unwrap();

        assert_eq!(store.read("CH1", "S1"), vec!["for s1"]);
        assert_eq!(store.read("CH1", "S2"), vec!["for s2"]);
    }

    #[test]
    fn test_legacy_gbk_file_still_reads() {
        let dir = TempDir::new().unwrap();
        let store = DiscussionStore::new(dir.path().to_path_buf());

        let section = dir.path().join("CH1/S1");
        std::fs::create_dir_all(&section).unwrap();
        let (bytes, _, _) = GBK.encode("大家好\n");
        std::fs::write(section.join("discussions.txt"), &bytes).unwrap();

        assert_eq!(store.read("CH1", "S1"), vec!["大家好"]);
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        let dir = TempDir::new().unwrap();
        let store = DiscussionStore::new(dir.path().to_path_buf());

        store.append("CH1", "S1", "padded   ").unwrap();
        assert_eq!(store.read("CH1", "S1"), vec!["padded"]);
    }
}
