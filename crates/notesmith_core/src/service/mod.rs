//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate file access, codecs and the relationship table into
//!   list/update use-cases.
//! - Keep the CLI and any web layer decoupled from part layout details.

pub mod note_service;
