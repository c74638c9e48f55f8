//! Explicit session store keyed by an external owner key.
//!
//! The web or CLI layer owns the store and decides the key (browser session,
//! user id, ...). Opening a new archive for an owner discards the previous
//! session and its workspace.

use super::session::{PackageSession, SessionId};
use super::SessionResult;
use crate::config::EditorConfig;
use log::info;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, PackageSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `bytes` as the owner's current session, replacing any previous
    /// one.
    pub fn open(
        &mut self,
        owner: &str,
        filename: &str,
        bytes: &[u8],
        config: EditorConfig,
    ) -> SessionResult<SessionId> {
        let session = PackageSession::from_bytes(filename, bytes, config)?;
        let id = session.id();
        if let Some(previous) = self.sessions.insert(owner.to_string(), session) {
            info!(
                "event=session_replace module=package status=ok previous_session_id={} session_id={}",
                previous.id(),
                id
            );
        }
        Ok(id)
    }

    pub fn get(&self, owner: &str) -> Option<&PackageSession> {
        self.sessions.get(owner)
    }

    pub fn get_mut(&mut self, owner: &str) -> Option<&mut PackageSession> {
        self.sessions.get_mut(owner)
    }

    /// Drops the owner's session and deletes its workspace.
    ///
    /// Returns `false` when the owner had no session.
    pub fn reset(&mut self, owner: &str) -> bool {
        match self.sessions.remove(owner) {
            Some(session) => {
                info!(
                    "event=session_reset module=package status=ok session_id={}",
                    session.id()
                );
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
