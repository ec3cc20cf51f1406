//! Utilities module - text decoding helpers shared by the content stores

pub mod text_codec;

pub use text_codec::{decode_first, DISCUSSION_ENCODINGS, SLOT_ENCODINGS};
