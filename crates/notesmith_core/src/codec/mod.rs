//! Notes-part codec: WordprocessingML fragments to spans and back.
//!
//! # Responsibility
//! - Decode every editable note of a notes part into simplified markup.
//! - Rewrite one note's primary paragraph from edited simplified markup.
//!
//! # Invariants
//! - Decode walks only the direct children of a note's primary paragraph.
//! - Encode touches only the addressed note; every other note is untouched.
//! - Neither direction aborts the whole document over one bad fragment.

pub mod decode;
pub mod encode;
mod wordml;

pub use decode::{decode_notes, decode_notes_document};
pub use encode::{encode_note, EncodeError, EncodeOutcome, EncodeResult};
