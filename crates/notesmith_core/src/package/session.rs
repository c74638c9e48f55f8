//! One editing session over one uploaded archive.
//!
//! # Invariants
//! - The uploaded bytes are kept unchanged as `source.docx`; repacking reads
//!   untouched entries from there, not from the extracted tree.
//! - Only parts rewritten through `update_note` are re-encoded on repack.

use super::{SessionError, SessionResult};
use crate::config::{EditorConfig, NoteKind};
use crate::model::note::Note;
use crate::service::note_service::{
    join_archive_path, NoteService, NoteServiceResult, NotesPartPaths, UpdateOutcome,
};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Stable identifier of one editing session.
pub type SessionId = Uuid;

const SOURCE_FILE_NAME: &str = "source.docx";
const EXTRACT_DIR_NAME: &str = "extracted";
const OUTPUT_PREFIX: &str = "Resolved_";
const FALLBACK_FILE_NAME: &str = "document.docx";

/// Unpacked archive plus the bookkeeping needed to repack it.
#[derive(Debug)]
pub struct PackageSession {
    id: SessionId,
    original_filename: String,
    config: EditorConfig,
    source_path: PathBuf,
    extract_dir: PathBuf,
    rewritten: BTreeSet<String>,
    workspace: TempDir,
}

impl PackageSession {
    /// Opens a session over an archive on disk.
    pub fn open(path: impl AsRef<Path>, config: EditorConfig) -> SessionResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(&filename, &bytes, config)
    }

    /// Opens a session over uploaded archive bytes.
    ///
    /// # Errors
    /// - Returns `SessionError::Io` when the workspace cannot be prepared.
    /// - Returns `SessionError::Archive` when `bytes` is not a zip archive.
    pub fn from_bytes(filename: &str, bytes: &[u8], config: EditorConfig) -> SessionResult<Self> {
        let workspace = tempfile::Builder::new()
            .prefix("notesmith-")
            .tempdir()
            .map_err(|source| SessionError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let source_path = workspace.path().join(SOURCE_FILE_NAME);
        let extract_dir = workspace.path().join(EXTRACT_DIR_NAME);
        std::fs::write(&source_path, bytes).map_err(|source| SessionError::Io {
            path: source_path.clone(),
            source,
        })?;

        let entries = extract_archive(&source_path, &extract_dir)?;
        let session = Self {
            id: Uuid::new_v4(),
            original_filename: sanitize_filename(filename),
            config,
            source_path,
            extract_dir,
            rewritten: BTreeSet::new(),
            workspace,
        };
        info!(
            "event=session_open module=package status=ok session_id={} entries={} bytes={}",
            session.id,
            entries,
            bytes.len()
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    /// Name offered for the repacked download.
    pub fn output_filename(&self) -> String {
        format!("{OUTPUT_PREFIX}{}", self.original_filename)
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    pub fn workspace_dir(&self) -> &Path {
        self.workspace.path()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Service bound to this session's `kind` notes part.
    pub fn note_service(&self, kind: NoteKind) -> NoteService {
        NoteService::new(
            NotesPartPaths::in_extract_dir(&self.extract_dir, kind),
            self.config.clone().with_kind(kind),
        )
    }

    /// Notes of the configured kind.
    pub fn notes(&self) -> NoteServiceResult<Vec<Note>> {
        self.note_service(self.config.note_kind).list_notes()
    }

    /// Rewrites one note of the configured kind.
    pub fn update_note(&mut self, note_id: &str, markup: &str) -> NoteServiceResult<UpdateOutcome> {
        self.update_note_of_kind(self.config.note_kind, note_id, markup)
    }

    /// Rewrites one note of `kind`, marking its parts for repacking.
    pub fn update_note_of_kind(
        &mut self,
        kind: NoteKind,
        note_id: &str,
        markup: &str,
    ) -> NoteServiceResult<UpdateOutcome> {
        let mut service = self.note_service(kind);
        let outcome = service.update_note(note_id, markup)?;
        if matches!(outcome, UpdateOutcome::Applied { .. }) {
            self.rewritten.insert(kind.part_path().to_string());
            if service.paths().rels.exists() {
                self.rewritten.insert(kind.rels_path().to_string());
            }
        }
        Ok(outcome)
    }

    /// Archive paths rewritten so far.
    pub fn rewritten_parts(&self) -> impl Iterator<Item = &str> {
        self.rewritten.iter().map(String::as_str)
    }

    /// Builds the output archive in memory.
    ///
    /// Entries are emitted in source order. Untouched entries are raw-copied
    /// with their original compression; rewritten parts are deflated afresh;
    /// parts that did not exist in the source are appended at the end.
    pub fn repack(&self) -> SessionResult<Vec<u8>> {
        let source = File::open(&self.source_path).map_err(|source| SessionError::Io {
            path: self.source_path.clone(),
            source,
        })?;
        let mut archive = ZipArchive::new(source)?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut written = BTreeSet::new();

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            let name = entry.name().to_string();
            if self.rewritten.contains(&name) {
                drop(entry);
                self.write_part(&mut writer, &name)?;
                written.insert(name);
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        for name in self.rewritten.difference(&written) {
            self.write_part(&mut writer, name)?;
        }

        let bytes = writer.finish()?.into_inner();
        info!(
            "event=session_repack module=package status=ok session_id={} rewritten={} bytes={}",
            self.id,
            self.rewritten.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Repacks to a file.
    pub fn repack_to(&self, path: impl AsRef<Path>) -> SessionResult<()> {
        let path = path.as_ref();
        let bytes = self.repack()?;
        std::fs::write(path, bytes).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_part(&self, writer: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str) -> SessionResult<()> {
        let path = join_archive_path(&self.extract_dir, name);
        let bytes = std::fs::read(&path).map_err(|source| SessionError::Io {
            path: path.clone(),
            source,
        })?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(name, options)?;
        writer
            .write_all(&bytes)
            .map_err(|source| SessionError::Io { path, source })?;
        debug!(
            "event=session_repack module=package status=ok part={} bytes={}",
            name,
            bytes.len()
        );
        Ok(())
    }
}

fn extract_archive(source_path: &Path, extract_dir: &Path) -> SessionResult<usize> {
    let source = File::open(source_path).map_err(|source| SessionError::Io {
        path: source_path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(source)?;
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| SessionError::Io { path, source }
    };

    std::fs::create_dir_all(extract_dir).map_err(io_error(extract_dir))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(
                "event=session_extract module=package status=skip reason=unsafe_entry_path index={}",
                index
            );
            continue;
        };
        let target = extract_dir.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(io_error(&target))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let mut out = File::create(&target).map_err(io_error(&target))?;
        std::io::copy(&mut entry, &mut out).map_err(io_error(&target))?;
    }
    Ok(archive.len())
}

/// Reduces an uploaded file name to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}
