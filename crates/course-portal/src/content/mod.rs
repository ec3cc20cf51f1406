//! Content library - filesystem-owned course materials
//!
//! The filesystem is the source of truth for everything in this module: the
//! resource tree is a derived view rebuilt on every read, discussions are an
//! append-only text file per section, and answer/question slots resolve to
//! whatever artifacts exist on disk at lookup time.

pub mod answers;
pub mod discussions;
pub mod library;
pub mod scanner;
pub mod upload;

pub use answers::{Slot, SlotReader};
pub use discussions::DiscussionStore;
pub use library::CourseLibrary;
pub use scanner::{Category, CourseTree, SectionResources, TreeScanner};
pub use upload::UploadStore;

/// The only gate on resource identity: case-insensitive extension membership.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mp3", "txt", "pdf", "pptx", "jpg", "jpeg", "png"];

pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
