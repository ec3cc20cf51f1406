//! Ordered multi-encoding text decoding
//!
//! Historical discussion and answer files were written under inconsistent
//! encodings. Decoding is expressed as an ordered list of attempts; the
//! caller decides whether exhausting the list is tolerable (discussions
//! degrade to empty) or an error (answer slots surface `DecodeFailure`).

use encoding_rs::{Encoding, GBK, UTF_8, WINDOWS_1252};

/// Decoder order for discussion files. Windows-1252 sits last because, like
/// latin1, it accepts any byte sequence.
pub const DISCUSSION_ENCODINGS: &[&Encoding] = &[UTF_8, GBK, WINDOWS_1252];

/// Decoder order for answer/question text: one primary, one fallback.
pub const SLOT_ENCODINGS: &[&Encoding] = &[UTF_8, GBK];

/// Try each encoding in order; return the first clean decode.
///
/// "Clean" means no malformed sequences: replacement-character salvage is
/// not attempted, so a wrong-encoding match cannot silently corrupt text.
pub fn decode_first(bytes: &[u8], encodings: &[&'static Encoding]) -> Option<String> {
    for encoding in encodings {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return Some(text.into_owned());
        }
    }
    None
}
