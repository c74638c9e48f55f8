//! Note and span model.
//!
//! # Responsibility
//! - Hold one decoded note as an ordered list of styled spans.
//! - Project a note into the record exchanged with the editing surface.
//!
//! # Invariants
//! - Concatenating `Span::text` in order reproduces the note's full text.
//! - A span has exactly one kind.

use serde::{Deserialize, Serialize};

/// Numeric note identifier as stored in the `w:id` attribute.
pub type NoteId = i64;

/// Ids Word reserves for the separator and continuation-separator notes.
pub const RESERVED_NOTE_IDS: [NoteId; 2] = [-1, 0];

/// Returns whether `id` is one of the reserved separator ids.
pub fn is_reserved_note_id(id: NoteId) -> bool {
    RESERVED_NOTE_IDS.contains(&id)
}

/// Styling of one span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SpanKind {
    Plain,
    /// Italic run.
    Emphasis,
    /// Hyperlink wrapper with its resolved target.
    Hyperlink { target: String },
}

/// One contiguous run of text with one styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Plain,
            text: text.into(),
        }
    }

    pub fn emphasis(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Emphasis,
            text: text.into(),
        }
    }

    pub fn hyperlink(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Hyperlink {
                target: target.into(),
            },
            text: text.into(),
        }
    }
}

/// Decoded note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    /// Spans of the primary paragraph, reference marker excluded.
    pub spans: Vec<Span>,
    /// Simplified-markup rendering of `spans`, trimmed.
    pub markup: String,
    /// Citation-cleaned full text used to seed metadata lookups.
    pub search_term: String,
}

impl Note {
    /// Untagged text of all spans in order.
    pub fn full_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            id: self.id.to_string(),
            markup: self.markup.clone(),
            search_term: self.search_term.clone(),
        }
    }
}

/// Wire shape of one note for the editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Decimal form of the note id.
    pub id: String,
    pub markup: String,
    pub search_term: String,
}
