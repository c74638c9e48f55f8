//! Hyperlink relationship table for one notes part.
//!
//! # Responsibility
//! - Load the `.rels` file that sits next to the notes part.
//! - Resolve a hyperlink URL to an existing identifier or mint a new one.
//! - Persist the whole table after every creation.
//!
//! # Invariants
//! - Identifiers are `rId<N>`; `N` only grows and is never reused.
//! - Hyperlink entries are deduplicated by exact target URL.
//! - Attributes are always written as `Id`, `Type`, `Target`, `TargetMode`.
//! - The file always starts with an XML declaration.
//!
//! # See also
//! - crate::codec::encode for the caller that mints identifiers.

use crate::xml::{Element, XmlDocument, XmlError};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Namespace of the package relationships root element.
pub const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
/// Relationship type for external hyperlinks.
pub const HYPERLINK_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
/// `TargetMode` value for targets outside the package.
pub const EXTERNAL_TARGET_MODE: &str = "External";

const ID_PREFIX: &str = "rId";
const ROOT_ELEMENT: &str = "Relationships";
const ENTRY_ELEMENT: &str = "Relationship";

static ID_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("valid relationship id regex"));

pub type RelsResult<T> = Result<T, RelsError>;

#[derive(Debug)]
pub enum RelsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The relationship file exists but cannot be parsed.
    Malformed(XmlError),
    /// An existing identifier already uses the largest representable number.
    IdSpaceExhausted,
}

impl Display for RelsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "relationship file `{}`: {source}", path.display())
            }
            Self::Malformed(err) => write!(f, "invalid relationship file: {err}"),
            Self::IdSpaceExhausted => {
                write!(f, "no relationship identifier left above the existing ones")
            }
        }
    }
}

impl Error for RelsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed(err) => Some(err),
            Self::IdSpaceExhausted => None,
        }
    }
}

impl From<XmlError> for RelsError {
    fn from(value: XmlError) -> Self {
        Self::Malformed(value)
    }
}

/// Read-only id → target lookup used while decoding.
pub trait RelationshipLookup {
    fn target_of(&self, id: &str) -> Option<&str>;
}

impl RelationshipLookup for HashMap<String, String> {
    fn target_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

/// One `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: Option<String>,
}

impl Relationship {
    pub fn is_hyperlink(&self) -> bool {
        self.rel_type.ends_with("/hyperlink")
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(ENTRY_ELEMENT)
            .with_attr("Id", self.id.as_str())
            .with_attr("Type", self.rel_type.as_str())
            .with_attr("Target", self.target.as_str());
        if let Some(mode) = self.target_mode.as_deref().filter(|mode| !mode.is_empty()) {
            element.set_attr("TargetMode", mode);
        }
        element
    }
}

/// Relationship entries of one notes part bound to their file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipTable {
    path: PathBuf,
    entries: Vec<Relationship>,
    /// `None` once an existing id carries `u64::MAX`.
    next_id: Option<u64>,
}

impl RelationshipTable {
    /// Loads the table at `path`.
    ///
    /// A missing parent directory is created and a missing file yields an
    /// empty table.
    ///
    /// # Errors
    /// - Returns `RelsError::Io` when the directory cannot be created or the
    ///   file cannot be read.
    /// - Returns `RelsError::Malformed` when an existing file is not valid XML.
    pub fn load(path: impl AsRef<Path>) -> RelsResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RelsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        if !path.exists() {
            debug!("event=rels_load module=relationships status=ok entries=0 file=absent");
            return Ok(Self::empty(path));
        }

        let bytes = std::fs::read(&path).map_err(|source| RelsError::Io {
            path: path.clone(),
            source,
        })?;
        let table = Self::from_bytes(path, &bytes)?;
        debug!(
            "event=rels_load module=relationships status=ok entries={} next_id={:?}",
            table.entries.len(),
            table.next_id
        );
        Ok(table)
    }

    /// Builds a table from raw `.rels` content; `path` is where it persists.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> RelsResult<Self> {
        let document = XmlDocument::parse(bytes)?;
        let mut table = Self::empty(path.into());
        for element in document.root.children_named(ENTRY_ELEMENT) {
            table.insert(Relationship {
                id: element.attr("Id").unwrap_or_default().to_string(),
                rel_type: element.attr("Type").unwrap_or_default().to_string(),
                target: element.attr("Target").unwrap_or_default().to_string(),
                target_mode: element.attr("TargetMode").map(str::to_string),
            });
        }
        Ok(table)
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            entries: Vec::new(),
            next_id: Some(1),
        }
    }

    fn insert(&mut self, relationship: Relationship) {
        if let Some(number) = id_number(&relationship.id) {
            self.next_id = match (self.next_id, number.checked_add(1)) {
                (Some(current), Some(after)) => Some(current.max(after)),
                _ => None,
            };
        }
        self.entries.push(relationship);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Relationship] {
        &self.entries
    }

    /// Numeric suffix the next minted identifier will carry, or `None` when
    /// no larger number is left.
    pub fn next_id(&self) -> Option<u64> {
        self.next_id
    }

    /// Returns the id of the hyperlink entry targeting `url`, minting and
    /// persisting a new external hyperlink entry when none exists.
    ///
    /// URL comparison is exact and case-sensitive.
    ///
    /// # Errors
    /// - Returns `RelsError::IdSpaceExhausted` when a new entry is needed but
    ///   every larger identifier number is taken. Nothing is minted.
    /// - Returns `RelsError::Io` when persisting a new entry fails. The new
    ///   entry stays in memory so a later `persist` can retry.
    pub fn resolve_or_create(&mut self, url: &str) -> RelsResult<String> {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|entry| entry.is_hyperlink() && entry.target == url)
        {
            return Ok(existing.id.clone());
        }

        let Some(number) = self.next_id else {
            warn!(
                "event=rels_create module=relationships status=error error_code=id_space_exhausted entries={}",
                self.entries.len()
            );
            return Err(RelsError::IdSpaceExhausted);
        };
        let id = format!("{ID_PREFIX}{number}");
        self.next_id = number.checked_add(1);
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: HYPERLINK_RELATIONSHIP_TYPE.to_string(),
            target: url.to_string(),
            target_mode: Some(EXTERNAL_TARGET_MODE.to_string()),
        });
        info!(
            "event=rels_create module=relationships status=ok id={} entries={}",
            id,
            self.entries.len()
        );
        self.persist()?;
        Ok(id)
    }

    /// Serializes the table to its `.rels` XML form.
    pub fn to_xml_bytes(&self) -> RelsResult<Vec<u8>> {
        let mut root = Element::new(ROOT_ELEMENT).with_attr("xmlns", RELATIONSHIPS_NAMESPACE);
        for entry in &self.entries {
            root.push(entry.to_element());
        }
        Ok(XmlDocument::new(root).to_bytes()?)
    }

    /// Rewrites the whole file.
    ///
    /// Content goes to a sibling temporary file first and is renamed over the
    /// target, so readers never observe a half-written table.
    pub fn persist(&self) -> RelsResult<()> {
        let bytes = self.to_xml_bytes()?;
        let staging = self.path.with_extension("rels.tmp");
        std::fs::write(&staging, &bytes).map_err(|source| RelsError::Io {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, &self.path).map_err(|source| RelsError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            "event=rels_persist module=relationships status=ok entries={} bytes={}",
            self.entries.len(),
            bytes.len()
        );
        Ok(())
    }
}

impl RelationshipLookup for RelationshipTable {
    fn target_of(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.target.as_str())
    }
}

/// Builds an id → target index from raw `.rels` content.
///
/// Malformed content yields an empty index; unresolved ids then fall back to
/// placeholder targets during decode.
pub fn relationship_index(bytes: &[u8]) -> HashMap<String, String> {
    match XmlDocument::parse(bytes) {
        Ok(document) => document
            .root
            .children_named(ENTRY_ELEMENT)
            .filter_map(|element| {
                Some((
                    element.attr("Id")?.to_string(),
                    element.attr("Target")?.to_string(),
                ))
            })
            .collect(),
        Err(err) => {
            warn!(
                "event=rels_index module=relationships status=error error={}",
                err
            );
            HashMap::new()
        }
    }
}

fn id_number(id: &str) -> Option<u64> {
    ID_NUMBER_RE
        .find(id)
        .and_then(|found| found.as_str().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::{id_number, relationship_index, RelationshipLookup};

    #[test]
    fn id_number_takes_first_digit_run() {
        assert_eq!(id_number("rId12"), Some(12));
        assert_eq!(id_number("rIdX"), None);
    }

    #[test]
    fn index_maps_ids_to_targets() {
        let index = relationship_index(
            br#"<Relationships xmlns="x"><Relationship Id="rId2" Type="t" Target="https://a.org"/></Relationships>"#,
        );
        assert_eq!(index.target_of("rId2"), Some("https://a.org"));
        assert_eq!(index.target_of("rId3"), None);
    }

    #[test]
    fn index_of_garbage_is_empty() {
        assert!(relationship_index(b"not xml <").is_empty());
    }
}
