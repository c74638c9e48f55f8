//! Explicit configuration passed into services and sessions.
//!
//! # Responsibility
//! - Own every kind-specific WordprocessingML name (parts, elements, styles).
//! - Carry editor rendering choices (body font, hyperlink colour).
//! - Describe logging setup without touching ambient global state.
//!
//! # Invariants
//! - Part paths are archive-relative and use `/` separators.
//! - Defaults match what Word itself writes for endnotes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default forced font family for rewritten plain and emphasis runs.
pub const DEFAULT_BODY_FONT: &str = "Times New Roman";
/// Default explicit hyperlink colour (RGB hex, no leading `#`).
pub const DEFAULT_HYPERLINK_COLOR: &str = "0000FF";

/// Which notes part a codec call operates on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    #[default]
    Endnote,
    Footnote,
}

impl NoteKind {
    /// Archive path of the notes part.
    pub fn part_path(self) -> &'static str {
        match self {
            Self::Endnote => "word/endnotes.xml",
            Self::Footnote => "word/footnotes.xml",
        }
    }

    /// Archive path of the relationship file that belongs to the notes part.
    pub fn rels_path(self) -> &'static str {
        match self {
            Self::Endnote => "word/_rels/endnotes.xml.rels",
            Self::Footnote => "word/_rels/footnotes.xml.rels",
        }
    }

    /// Qualified name of the note-level element.
    pub fn note_element(self) -> &'static str {
        match self {
            Self::Endnote => "w:endnote",
            Self::Footnote => "w:footnote",
        }
    }

    /// Qualified name of the auto-numbered reference marker inside a run.
    pub fn reference_marker(self) -> &'static str {
        match self {
            Self::Endnote => "w:endnoteRef",
            Self::Footnote => "w:footnoteRef",
        }
    }

    /// Paragraph style applied to note bodies.
    pub fn body_style(self) -> &'static str {
        match self {
            Self::Endnote => "EndnoteText",
            Self::Footnote => "FootnoteText",
        }
    }

    /// Character style applied to the reference marker run.
    pub fn reference_style(self) -> &'static str {
        match self {
            Self::Endnote => "EndnoteReference",
            Self::Footnote => "FootnoteReference",
        }
    }
}

/// Rendering choices applied by the note encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    pub note_kind: NoteKind,
    /// Font family forced on plain and emphasis runs.
    pub body_font: String,
    /// Explicit colour set on hyperlink runs next to the named style.
    pub hyperlink_color: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            note_kind: NoteKind::Endnote,
            body_font: DEFAULT_BODY_FONT.to_string(),
            hyperlink_color: DEFAULT_HYPERLINK_COLOR.to_string(),
        }
    }
}

impl EditorConfig {
    /// Returns a copy targeting another notes part.
    pub fn with_kind(mut self, note_kind: NoteKind) -> Self {
        self.note_kind = note_kind;
        self
    }
}

/// Rolling file log setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error` (case-insensitive).
    pub level: String,
    /// Absolute directory receiving rolling log files.
    pub log_dir: PathBuf,
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
        }
    }
}
