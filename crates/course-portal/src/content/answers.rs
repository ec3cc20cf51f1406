//! Answer and question slot lookup
//!
//! A slot is addressed by (chapter, section, folder, index) and resolves to
//! an optional image plus an optional text blob. Neither existing is a valid
//! empty result. Text that fails both decoders is an error here, unlike
//! discussion reads: answer content is expected single-encoding, so a decode
//! failure more likely means corruption than legacy data.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PortalError, PortalResult};
use crate::utils::{decode_first, SLOT_ENCODINGS};

const ANSWERS_DIR: &str = "answers";

/// Resolved slot content. Zero, one, or both fields may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slot {
    pub image: Option<String>,
    pub text: Option<String>,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.text.is_none()
    }
}

pub struct SlotReader {
    root: PathBuf,
}

impl SlotReader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Reference answer for `number` under the section's `answers/` folder.
    pub fn read_answer(&self, chapter: &str, section: &str, number: u32) -> PortalResult<Slot> {
        let folder = self.root.join(chapter).join(section).join(ANSWERS_DIR);
        Self::read_slot(&folder, "answer", number)
    }

    /// Question `number` inside an arbitrary part folder of the section.
    pub fn read_question(
        &self,
        chapter: &str,
        section: &str,
        part: &str,
        number: u32,
    ) -> PortalResult<Slot> {
        let folder = self.root.join(chapter).join(section).join(part);
        Self::read_slot(&folder, "ques", number)
    }

    fn read_slot(folder: &Path, stem: &str, number: u32) -> PortalResult<Slot> {
        let mut slot = Slot::default();

        let image_name = format!("{}{}.jpg", stem, number);
        if folder.join(&image_name).exists() {
            slot.image = Some(image_name);
        }

        let text_path = folder.join(format!("{}{}.txt", stem, number));
        if text_path.exists() {
            let bytes = fs::read(&text_path)?;
            match decode_first(&bytes, SLOT_ENCODINGS) {
                Some(text) => slot.text = Some(text),
                None => {
                    return Err(PortalError::DecodeFailure(text_path.display().to_string()));
                }
            }
        }

        Ok(slot)
    }

    /// Slot indexes that have at least one artifact in the section's
    /// `answers/` folder, ascending. View glue: lets the content page render
    /// exactly the slots that exist.
    pub fn answer_indexes(&self, chapter: &str, section: &str) -> Vec<u32> {
        Self::slot_indexes(&self.root.join(chapter).join(section).join(ANSWERS_DIR), "answer")
    }

    pub fn question_indexes(&self, chapter: &str, section: &str, part: &str) -> Vec<u32> {
        Self::slot_indexes(&self.root.join(chapter).join(section).join(part), "ques")
    }

    fn slot_indexes(folder: &Path, stem: &str) -> Vec<u32> {
        let entries = match fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut indexes: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let file_stem = name.rsplit_once('.')?.0;
                file_stem.strip_prefix(stem)?.parse().ok()
            })
            .collect();
        indexes.sort_unstable();
        indexes.dedup();
        indexes
    }
}
