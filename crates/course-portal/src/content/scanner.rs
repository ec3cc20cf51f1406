//! Resource tree scanner
//!
//! Rebuilds the chapter → section → category → filenames view by walking the
//! storage root. The tree is derived and ephemeral: it is recomputed before
//! every read and carries no identity beyond directory names.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::content::allowed_file;
use crate::error::{PortalError, PortalResult};

/// The closed set of resource categories. Directory names outside the set
/// map to `Documents`, an explicit rule rather than a lookup default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Videos,
    Documents,
    ClassroomExercises,
    Homework,
    DiscussionExercises,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Videos,
        Category::Documents,
        Category::ClassroomExercises,
        Category::Homework,
        Category::DiscussionExercises,
    ];

    pub fn from_dir_name(name: &str) -> Category {
        match name {
            "videos" => Category::Videos,
            "documents" => Category::Documents,
            "classroom_exercises" => Category::ClassroomExercises,
            "homework" => Category::Homework,
            "discussion_exercises" => Category::DiscussionExercises,
            _ => Category::Documents,
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Videos => "videos",
            Category::Documents => "documents",
            Category::ClassroomExercises => "classroom_exercises",
            Category::Homework => "homework",
            Category::DiscussionExercises => "discussion_exercises",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Videos => "Videos",
            Category::Documents => "Documents",
            Category::ClassroomExercises => "Classroom exercises",
            Category::Homework => "Homework",
            Category::DiscussionExercises => "Discussion exercises",
        }
    }
}

/// Fixed-shape per-section record: five ordered filename lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionResources {
    pub videos: Vec<String>,
    pub documents: Vec<String>,
    pub classroom_exercises: Vec<String>,
    pub homework: Vec<String>,
    pub discussion_exercises: Vec<String>,
}

impl SectionResources {
    pub fn list(&self, category: Category) -> &[String] {
        match category {
            Category::Videos => &self.videos,
            Category::Documents => &self.documents,
            Category::ClassroomExercises => &self.classroom_exercises,
            Category::Homework => &self.homework,
            Category::DiscussionExercises => &self.discussion_exercises,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Videos => &mut self.videos,
            Category::Documents => &mut self.documents,
            Category::ClassroomExercises => &mut self.classroom_exercises,
            Category::Homework => &mut self.homework,
            Category::DiscussionExercises => &mut self.discussion_exercises,
        }
    }
}

/// Chapter name → section name → resources. `BTreeMap` keeps the rendering
/// order stable across rescans.
pub type CourseTree = BTreeMap<String, BTreeMap<String, SectionResources>>;

pub struct TreeScanner {
    root: PathBuf,
    strict: bool,
}

impl TreeScanner {
    pub fn new(root: PathBuf, strict: bool) -> Self {
        Self { root, strict }
    }

    /// Rebuild the full tree from disk. A missing root is created empty
    /// rather than reported.
    pub fn scan(&self) -> PortalResult<CourseTree> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }

        let mut tree = CourseTree::new();

        for (chapter_name, chapter_path) in self.subdirectories(&self.root)? {
            let mut sections = BTreeMap::new();

            for (section_name, section_path) in self.subdirectories(&chapter_path)? {
                let mut resources = SectionResources::default();

                for (candidate_name, candidate_path) in self.subdirectories(&section_path)? {
                    let target = resources.list_mut(Category::from_dir_name(&candidate_name));
                    for filename in self.files(&candidate_path)? {
                        if allowed_file(&filename) && !target.contains(&filename) {
                            target.push(filename);
                        }
                    }
                }

                sections.insert(section_name, resources);
            }

            tree.insert(chapter_name, sections);
        }

        Ok(tree)
    }

    /// Immediate subdirectories of `dir`, name-sorted. Unreadable directories
    /// are skipped in tolerant mode and propagated in strict mode.
    fn subdirectories(&self, dir: &Path) -> PortalResult<Vec<(String, PathBuf)>> {
        let mut out = Vec::new();
        for entry in self.read_dir_entries(dir)? {
            if entry.1.is_dir() {
                out.push(entry);
            }
        }
        Ok(out)
    }

    /// Plain files directly inside `dir`, name-sorted.
    fn files(&self, dir: &Path) -> PortalResult<Vec<String>> {
        let mut out = Vec::new();
        for (name, path) in self.read_dir_entries(dir)? {
            if path.is_file() {
                out.push(name);
            }
        }
        Ok(out)
    }

    fn read_dir_entries(&self, dir: &Path) -> PortalResult<Vec<(String, PathBuf)>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if self.strict => return Err(PortalError::ScanFailure(e)),
            Err(e) => {
                debug!("Skipping unreadable directory {}: {}", dir.display(), e);
                return Ok(Vec::new());
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if self.strict => return Err(PortalError::ScanFailure(e)),
                Err(_) => continue,
            };
            if let Ok(name) = entry.file_name().into_string() {
                out.push((name, entry.path()));
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}
