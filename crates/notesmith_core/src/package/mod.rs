//! Package session boundary: archive unpack, edit, repack.
//!
//! # Responsibility
//! - Own one uploaded archive and its extracted tree for an editing session.
//! - Repack with every part the session did not rewrite copied verbatim.
//! - Keep sessions in an explicit store instead of process-wide state.
//!
//! # Invariants
//! - Untouched archive entries are raw-copied: same bytes, same order.
//! - Dropping a session deletes its workspace directory.

use crate::service::note_service::NoteServiceError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod session;
pub mod store;

pub use session::{PackageSession, SessionId};
pub use store::SessionStore;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The upload is not a readable zip archive, or repacking failed.
    Archive(zip::result::ZipError),
    Service(NoteServiceError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::Archive(err) => write!(f, "archive error: {err}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Archive(err) => Some(err),
            Self::Service(err) => Some(err),
        }
    }
}

impl From<zip::result::ZipError> for SessionError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Archive(value)
    }
}

impl From<NoteServiceError> for SessionError {
    fn from(value: NoteServiceError) -> Self {
        Self::Service(value)
    }
}
