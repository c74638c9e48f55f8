//! Owned XML element tree used for whole-part read-modify-write.
//!
//! # Responsibility
//! - Parse one package part into an ordered, owned tree.
//! - Serialize the tree back with its declaration and attribute order intact.
//!
//! # Invariants
//! - Attributes keep source order; names keep their namespace prefix.
//! - Text is stored unescaped and re-escaped on write.
//! - Serialization never drops a node inside the root element, processing
//!   instructions included.
//! - Of the prolog only the declaration is kept; a doctype or anything else
//!   outside the root element is discarded.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod io;
mod tree;

pub use tree::{Declaration, Element, Node, XmlDocument};

pub type XmlResult<T> = Result<T, XmlError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// Input is not well-formed or not UTF-8.
    Malformed(String),
    /// Input has no root element.
    MissingRoot,
    Write(String),
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed xml: {message}"),
            Self::MissingRoot => write!(f, "xml document has no root element"),
            Self::Write(message) => write!(f, "failed to serialize xml: {message}"),
        }
    }
}

impl Error for XmlError {}
