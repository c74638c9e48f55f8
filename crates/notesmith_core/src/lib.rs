//! Core round-trip editing of footnotes and endnotes in `.docx` packages.
//! This crate is the single source of truth for note and relationship
//! invariants; CLI or web layers only drive it.

pub mod codec;
pub mod config;
pub mod logging;
pub mod lookup;
pub mod markup;
pub mod model;
pub mod package;
pub mod relationships;
pub mod service;
pub mod xml;

pub use codec::{decode_notes, encode_note, EncodeError, EncodeOutcome};
pub use config::{EditorConfig, LoggingConfig, NoteKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use lookup::{lookup, Candidate, CandidateKind, LookupError, LookupOutcome, MetadataSource};
pub use markup::search_term::derive_search_term;
pub use markup::{parse_markup, render_markup};
pub use model::note::{Note, NoteId, NoteRecord, Span, SpanKind};
pub use package::{PackageSession, SessionError, SessionId, SessionResult, SessionStore};
pub use relationships::{
    relationship_index, Relationship, RelationshipLookup, RelationshipTable, RelsError,
    RelsResult,
};
pub use service::note_service::{
    NoteService, NoteServiceError, NoteServiceResult, NotesPartPaths, UpdateOutcome,
};
pub use xml::{XmlDocument, XmlError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
