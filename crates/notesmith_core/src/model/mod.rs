//! Domain model for editable notes.
//!
//! # Responsibility
//! - Define the in-memory note/span shapes shared by both codec directions.
//! - Define the wire record handed to the editing surface.
//!
//! # Invariants
//! - Notes `-1` and `0` (separator/continuation) are never materialized.
//! - Span order is document order and is significant.
//!
//! # See also
//! - crate::markup for the textual form of spans.

pub mod note;
