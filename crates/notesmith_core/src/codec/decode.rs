//! Notes part → editable notes.
//!
//! # Invariants
//! - Reserved ids (`-1`, `0`) and non-numeric ids are never returned.
//! - Output is sorted by numeric id.
//! - Runs carrying the reference marker never become editable text.
//! - An unresolved hyperlink id decodes with the `#` placeholder target.

use super::wordml::{run_is_italic, ATTR_ID, ATTR_REL_ID, HYPERLINK, PARAGRAPH, RUN, TEXT};
use crate::config::NoteKind;
use crate::markup::render_markup;
use crate::markup::search_term::derive_search_term;
use crate::model::note::{is_reserved_note_id, Note, NoteId, Span};
use crate::relationships::RelationshipLookup;
use crate::xml::{Element, XmlDocument};
use log::{debug, warn};

/// Target substituted for hyperlink wrappers whose id has no relationship.
pub const PLACEHOLDER_TARGET: &str = "#";

/// Decodes the raw notes part.
///
/// Malformed or empty input yields an empty list; a fresh document without
/// notes is a normal state.
pub fn decode_notes<L>(notes_part: &[u8], kind: NoteKind, relationships: &L) -> Vec<Note>
where
    L: RelationshipLookup + ?Sized,
{
    match XmlDocument::parse(notes_part) {
        Ok(document) => decode_notes_document(&document, kind, relationships),
        Err(err) => {
            warn!(
                "event=notes_decode module=codec status=skip reason=unparseable_part bytes={} error={}",
                notes_part.len(),
                err
            );
            Vec::new()
        }
    }
}

/// Decodes an already parsed notes part.
pub fn decode_notes_document<L>(
    document: &XmlDocument,
    kind: NoteKind,
    relationships: &L,
) -> Vec<Note>
where
    L: RelationshipLookup + ?Sized,
{
    let mut notes: Vec<Note> = document
        .root
        .children_named(kind.note_element())
        .filter_map(|element| {
            let id = parse_note_id(element)?;
            if is_reserved_note_id(id) {
                return None;
            }
            Some(decode_note(id, element, kind, relationships))
        })
        .collect();
    notes.sort_by_key(|note| note.id);

    debug!(
        "event=notes_decode module=codec status=ok kind={:?} notes={}",
        kind,
        notes.len()
    );
    notes
}

fn parse_note_id(element: &Element) -> Option<NoteId> {
    let raw = element.attr(ATTR_ID)?;
    match raw.trim().parse::<NoteId>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!(
                "event=notes_decode module=codec status=skip reason=non_numeric_id id_len={}",
                raw.len()
            );
            None
        }
    }
}

fn decode_note<L>(id: NoteId, element: &Element, kind: NoteKind, relationships: &L) -> Note
where
    L: RelationshipLookup + ?Sized,
{
    let spans = element
        .child(PARAGRAPH)
        .map(|paragraph| paragraph_spans(id, paragraph, kind, relationships))
        .unwrap_or_default();

    let markup = render_markup(&spans).trim().to_string();
    let full_text: String = spans.iter().map(|span| span.text.as_str()).collect();
    let search_term = derive_search_term(&full_text);

    Note {
        id,
        spans,
        markup,
        search_term,
    }
}

/// Walks the paragraph's direct children only. Hyperlink wrappers and plain
/// runs are siblings at this level, so this walk is what keeps their order.
fn paragraph_spans<L>(
    note_id: NoteId,
    paragraph: &Element,
    kind: NoteKind,
    relationships: &L,
) -> Vec<Span>
where
    L: RelationshipLookup + ?Sized,
{
    let mut spans = Vec::new();
    for child in paragraph.child_elements() {
        if child.is(RUN) {
            if child.contains_descendant(kind.reference_marker()) {
                continue;
            }
            let text = child.descendant_text(TEXT);
            if text.is_empty() {
                continue;
            }
            if run_is_italic(child) {
                spans.push(Span::emphasis(text));
            } else {
                spans.push(Span::plain(text));
            }
        } else if child.is(HYPERLINK) {
            let text = child.descendant_text(TEXT);
            // An empty wrapper only carries information through its target.
            if text.is_empty() && !has_resolved_target(child, relationships) {
                continue;
            }
            let target = hyperlink_target(note_id, child, relationships);
            spans.push(Span::hyperlink(target, text));
        }
    }
    spans
}

fn has_resolved_target<L>(hyperlink: &Element, relationships: &L) -> bool
where
    L: RelationshipLookup + ?Sized,
{
    hyperlink
        .attr(ATTR_REL_ID)
        .and_then(|rel_id| relationships.target_of(rel_id))
        .is_some()
}

fn hyperlink_target<L>(note_id: NoteId, hyperlink: &Element, relationships: &L) -> String
where
    L: RelationshipLookup + ?Sized,
{
    let resolved = hyperlink
        .attr(ATTR_REL_ID)
        .and_then(|rel_id| relationships.target_of(rel_id));
    match resolved {
        Some(target) => target.to_string(),
        None => {
            warn!(
                "event=notes_decode module=codec status=skip reason=unresolved_hyperlink note_id={} rel_id={}",
                note_id,
                hyperlink.attr(ATTR_REL_ID).unwrap_or("<none>")
            );
            PLACEHOLDER_TARGET.to_string()
        }
    }
}
