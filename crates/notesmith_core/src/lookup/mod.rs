//! Bibliographic/web metadata lookup boundary.
//!
//! # Responsibility
//! - Define the advisory `search(query) -> candidates` collaborator contract.
//! - Report whether candidates came from the source or from local heuristics.
//! - Provide the URL-derived heuristic candidate and publisher/agency tables.
//!
//! # Invariants
//! - Nothing here reads or writes package parts; lookups never affect
//!   round-trip correctness.
//! - A failed source is never swallowed silently: the outcome says
//!   `Heuristic`.

use crate::markup::search_term::is_url_like;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;

const GOVERNMENT_AUTHOR: &str = "U.S. Government";
const MIN_SLUG_TITLE_CHARS: usize = 5;
const DROPPED_EXTENSIONS: &[&str] = &[".pdf", ".html", ".htm", ".aspx", ".php"];

const PUBLISHER_PLACES: &[(&str, &str)] = &[
    ("Harvard University Press", "Cambridge, MA"),
    ("MIT Press", "Cambridge, MA"),
    ("Yale University Press", "New Haven"),
    ("Princeton University Press", "Princeton"),
    ("Stanford University Press", "Stanford"),
    ("University of California Press", "Berkeley"),
    ("University of Chicago Press", "Chicago"),
    ("Columbia University Press", "New York"),
    ("Oxford University Press", "Oxford"),
    ("Cambridge University Press", "Cambridge"),
    ("Penguin", "New York"),
    ("Random House", "New York"),
    ("HarperCollins", "New York"),
    ("Simon & Schuster", "New York"),
    ("Farrar, Straus and Giroux", "New York"),
    ("W. W. Norton", "New York"),
    ("Knopf", "New York"),
];

const GOVERNMENT_AGENCIES: &[(&str, &str)] = &[
    ("ferc.gov", "Federal Energy Regulatory Commission"),
    ("epa.gov", "Environmental Protection Agency"),
    ("energy.gov", "U.S. Department of Energy"),
    ("doi.gov", "U.S. Department of the Interior"),
    ("justice.gov", "U.S. Department of Justice"),
    ("regulations.gov", "U.S. Government"),
    ("fda.gov", "U.S. Food and Drug Administration"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The source could not be reached or answered with a failure.
    Unavailable(String),
    /// The source answered with something that is not a candidate list.
    InvalidResponse(String),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "metadata source unavailable: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "invalid metadata response: {message}")
            }
        }
    }
}

impl Error for LookupError {}

/// Origin category of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Book,
    Web,
    /// Web resource on a `.gov` domain.
    Gov,
}

/// One bibliographic suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub title: String,
    pub authors: Vec<String>,
    pub publisher: String,
    pub year: String,
    pub url: Option<String>,
}

/// External metadata service (book catalogue, page scraper, ...).
pub trait MetadataSource {
    fn search(&self, query: &str) -> Result<Vec<Candidate>, LookupError>;
}

/// Candidates tagged with how much they can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Fetched(Vec<Candidate>),
    /// The source failed; candidates (possibly none) were derived locally.
    Heuristic(Vec<Candidate>),
}

impl LookupOutcome {
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Fetched(candidates) | Self::Heuristic(candidates) => candidates,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// Queries `source`, falling back to the URL heuristic when it fails.
pub fn lookup<S>(source: &S, query: &str) -> LookupOutcome
where
    S: MetadataSource + ?Sized,
{
    match source.search(query) {
        Ok(candidates) => LookupOutcome::Fetched(candidates),
        Err(err) => {
            warn!(
                "event=metadata_lookup module=lookup status=error fallback=heuristic error={}",
                err
            );
            if is_url_like(query) {
                LookupOutcome::Heuristic(heuristic_web_candidate(query).into_iter().collect())
            } else {
                LookupOutcome::Heuristic(Vec::new())
            }
        }
    }
}

/// Builds a candidate from the URL alone.
///
/// Returns `None` when `raw_url` cannot be parsed as a URL with a host.
pub fn heuristic_web_candidate(raw_url: &str) -> Option<Candidate> {
    let raw_url = raw_url.trim();
    let normalized = if raw_url.starts_with("http") {
        raw_url.to_string()
    } else {
        format!("http://{raw_url}")
    };
    let parsed = Url::parse(&normalized).ok()?;
    let host = parsed.host_str()?;
    let domain = host.strip_prefix("www.").unwrap_or(host);
    let is_gov = domain.ends_with(".gov");

    let slug = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(slug_title)
        .unwrap_or_default();
    let title = if slug.chars().count() < MIN_SLUG_TITLE_CHARS {
        title_case(domain.split('.').next().unwrap_or(domain))
    } else {
        slug
    };

    Some(Candidate {
        kind: if is_gov {
            CandidateKind::Gov
        } else {
            CandidateKind::Web
        },
        title,
        authors: if is_gov {
            vec![agency_name(domain).to_string()]
        } else {
            Vec::new()
        },
        publisher: if is_gov {
            GOVERNMENT_AUTHOR.to_string()
        } else {
            String::new()
        },
        year: String::new(),
        url: Some(normalized),
    })
}

/// Agency credited as author for a `.gov` domain.
pub fn agency_name(domain: &str) -> &'static str {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() >= 2 {
        let root = format!("{}.{}", labels[labels.len() - 2], labels[labels.len() - 1]);
        if let Some((_, agency)) = GOVERNMENT_AGENCIES.iter().find(|(key, _)| *key == root) {
            return agency;
        }
    }
    GOVERNMENT_AUTHOR
}

/// Publication city of a well-known publisher.
pub fn publisher_place(publisher: &str) -> Option<&'static str> {
    let publisher = publisher.trim();
    PUBLISHER_PLACES
        .iter()
        .find(|(name, _)| *name == publisher)
        .map(|(_, place)| *place)
}

fn slug_title(segment: &str) -> String {
    let decoded = urlencoding::decode(segment)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let lower = decoded.to_ascii_lowercase();
    let stem = DROPPED_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| &decoded[..decoded.len() - ext.len()])
        .unwrap_or(&decoded);
    title_case(&stem.replace(['_', '-'], " ")).trim().to_string()
}

/// Capitalizes the first letter of every alphabetic run, lowercasing the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(ch);
            previous_alpha = false;
        }
    }
    out
}
