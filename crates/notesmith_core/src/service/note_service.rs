//! Note list/update use-cases over one extracted package directory.
//!
//! # Responsibility
//! - Read the notes part and its relationship file for listing.
//! - Apply one edit as a read-modify-write of the whole notes part.
//!
//! # Invariants
//! - A missing notes part lists as empty and updates as `PartMissing`.
//! - An update for an unknown note id writes nothing.
//! - `update_note` takes `&mut self`: one writer per notes part at a time.
//!
//! # See also
//! - crate::package::session for the owner of the extracted directory.

use crate::codec::{decode_notes, encode_note, EncodeError, EncodeOutcome};
use crate::config::{EditorConfig, NoteKind};
use crate::model::note::{Note, NoteRecord};
use crate::relationships::{relationship_index, Relationship, RelationshipTable, RelsError};
use crate::xml::{XmlDocument, XmlError};
use log::{error, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

#[derive(Debug)]
pub enum NoteServiceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The notes part exists but cannot be parsed, so it cannot be rewritten.
    Xml(XmlError),
    Relationships(RelsError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::Xml(err) => write!(f, "notes part: {err}"),
            Self::Relationships(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Xml(err) => Some(err),
            Self::Relationships(err) => Some(err),
        }
    }
}

impl From<XmlError> for NoteServiceError {
    fn from(value: XmlError) -> Self {
        Self::Xml(value)
    }
}

impl From<RelsError> for NoteServiceError {
    fn from(value: RelsError) -> Self {
        Self::Relationships(value)
    }
}

impl From<EncodeError> for NoteServiceError {
    fn from(value: EncodeError) -> Self {
        match value {
            EncodeError::Relationships(err) => Self::Relationships(err),
        }
    }
}

/// Filesystem locations of a notes part and its relationship file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesPartPaths {
    pub notes: PathBuf,
    pub rels: PathBuf,
}

impl NotesPartPaths {
    /// Paths of `kind`'s parts inside an extracted package directory.
    pub fn in_extract_dir(extract_dir: &Path, kind: NoteKind) -> Self {
        Self {
            notes: join_archive_path(extract_dir, kind.part_path()),
            rels: join_archive_path(extract_dir, kind.rels_path()),
        }
    }
}

/// Joins a `/`-separated archive path onto a directory.
pub fn join_archive_path(base: &Path, archive_path: &str) -> PathBuf {
    archive_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

/// Result of one update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The note was rewritten and the part saved.
    Applied { spans: usize, hyperlinks: usize },
    /// No note with that id; nothing was written.
    NoteNotFound,
    /// The package has no notes part of this kind; nothing was written.
    PartMissing,
}

/// Note use-case facade bound to one notes part.
pub struct NoteService {
    paths: NotesPartPaths,
    config: EditorConfig,
}

impl NoteService {
    pub fn new(paths: NotesPartPaths, config: EditorConfig) -> Self {
        Self { paths, config }
    }

    pub fn paths(&self) -> &NotesPartPaths {
        &self.paths
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Decodes every editable note, sorted by numeric id.
    ///
    /// # Errors
    /// - Returns `NoteServiceError::Io` for read failures other than a
    ///   missing file.
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        let Some(notes_part) = read_optional(&self.paths.notes)? else {
            info!(
                "event=notes_list module=service status=ok notes=0 reason=part_missing kind={:?}",
                self.config.note_kind
            );
            return Ok(Vec::new());
        };
        let index = match read_optional(&self.paths.rels)? {
            Some(bytes) => relationship_index(&bytes),
            None => HashMap::new(),
        };
        Ok(decode_notes(&notes_part, self.config.note_kind, &index))
    }

    /// Wire records for the editing surface.
    pub fn list_records(&self) -> NoteServiceResult<Vec<NoteRecord>> {
        Ok(self.list_notes()?.iter().map(Note::to_record).collect())
    }

    /// Current relationship entries; empty when the file does not exist.
    pub fn relationships(&self) -> NoteServiceResult<Vec<Relationship>> {
        match read_optional(&self.paths.rels)? {
            Some(bytes) => Ok(RelationshipTable::from_bytes(&self.paths.rels, &bytes)?
                .entries()
                .to_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Rewrites one note from edited simplified markup and saves the part.
    ///
    /// The relationship file is saved first, whenever a new hyperlink target
    /// is registered; the notes part is saved once at the end.
    ///
    /// # Errors
    /// - Returns `NoteServiceError::Xml` when the notes part is unparseable.
    /// - Returns `NoteServiceError::Relationships` when the relationship file
    ///   cannot be loaded or saved.
    /// - Returns `NoteServiceError::Io` when the notes part cannot be saved.
    pub fn update_note(&mut self, note_id: &str, markup: &str) -> NoteServiceResult<UpdateOutcome> {
        let started_at = Instant::now();
        let Some(notes_part) = read_optional(&self.paths.notes)? else {
            info!(
                "event=note_update module=service status=skip reason=part_missing kind={:?}",
                self.config.note_kind
            );
            return Ok(UpdateOutcome::PartMissing);
        };

        let mut document = XmlDocument::parse(&notes_part)?;
        let mut relationships = RelationshipTable::load(&self.paths.rels)?;
        let outcome = encode_note(
            &mut document,
            note_id,
            markup,
            &mut relationships,
            &self.config,
        )?;

        let EncodeOutcome::Rewritten { spans, hyperlinks } = outcome else {
            return Ok(UpdateOutcome::NoteNotFound);
        };

        let bytes = document.to_bytes()?;
        if let Err(err) = write_replacing(&self.paths.notes, &bytes) {
            error!(
                "event=note_update module=service status=error duration_ms={} error_code=part_write_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        info!(
            "event=note_update module=service status=ok spans={} hyperlinks={} bytes={} duration_ms={}",
            spans,
            hyperlinks,
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(UpdateOutcome::Applied { spans, hyperlinks })
    }
}

fn read_optional(path: &Path) -> NoteServiceResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(NoteServiceError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_replacing(path: &Path, bytes: &[u8]) -> NoteServiceResult<()> {
    let staging = path.with_extension("xml.tmp");
    std::fs::write(&staging, bytes).map_err(|source| NoteServiceError::Io {
        path: staging.clone(),
        source,
    })?;
    std::fs::rename(&staging, path).map_err(|source| NoteServiceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{join_archive_path, NotesPartPaths};
    use crate::config::NoteKind;
    use std::path::Path;

    #[test]
    fn archive_paths_join_per_segment() {
        let joined = join_archive_path(Path::new("/tmp/x"), "word/_rels/endnotes.xml.rels");
        assert_eq!(
            joined,
            Path::new("/tmp/x")
                .join("word")
                .join("_rels")
                .join("endnotes.xml.rels")
        );
    }

    #[test]
    fn part_paths_follow_kind() {
        let paths = NotesPartPaths::in_extract_dir(Path::new("/x"), NoteKind::Footnote);
        assert!(paths.notes.ends_with("word/footnotes.xml"));
        assert!(paths.rels.ends_with("word/_rels/footnotes.xml.rels"));
    }
}
