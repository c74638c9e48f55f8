//! Edited simplified markup → rewritten note fragment.
//!
//! # Responsibility
//! - Rebuild the primary paragraph of one note from edited markup.
//! - Register hyperlink targets in the relationship table as they are written.
//!
//! # Invariants
//! - The reference marker run survives the rewrite and keeps its style.
//! - Existing paragraph properties survive; only the style is forced.
//! - Paragraphs after the primary one keep their content.
//! - An unknown note id leaves the tree untouched.

use super::wordml::{
    text_leaf, ATTR_ASCII, ATTR_HANSI, ATTR_ID, ATTR_REL_ID, ATTR_VAL, COLOR, HYPERLINK,
    HYPERLINK_STYLE, ITALIC, PARAGRAPH, PARAGRAPH_PROPERTIES, PARAGRAPH_STYLE, REL_NAMESPACE,
    REL_NAMESPACE_ATTR, RUN, RUN_FONTS, RUN_PROPERTIES, RUN_STYLE, SINGLE_UNDERLINE, UNDERLINE,
};
use crate::config::{EditorConfig, NoteKind};
use crate::markup::parse_markup;
use crate::model::note::{NoteId, Span, SpanKind};
use crate::relationships::{RelationshipTable, RelsError};
use crate::xml::{Element, Node, XmlDocument};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EncodeResult<T> = Result<T, EncodeError>;

#[derive(Debug)]
pub enum EncodeError {
    /// A hyperlink target could not be registered.
    Relationships(RelsError),
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relationships(err) => write!(f, "failed to register hyperlink: {err}"),
        }
    }
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Relationships(err) => Some(err),
        }
    }
}

impl From<RelsError> for EncodeError {
    fn from(value: RelsError) -> Self {
        Self::Relationships(value)
    }
}

/// Result of one encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The note was rewritten.
    Rewritten { spans: usize, hyperlinks: usize },
    /// No note carries the requested id; nothing changed.
    NoteNotFound,
}

/// Rewrites note `note_id` of `document` from `markup`, in place.
///
/// Ids are compared numerically on both sides, so `" 07"` addresses the
/// note stored as `w:id="7"` and `"7"` addresses one stored as `w:id="07"`. Hyperlink spans are resolved through `relationships`, which
/// persists itself whenever it mints a new identifier.
///
/// # Errors
/// - Returns `EncodeError::Relationships` when a new relationship cannot be
///   persisted. Runs already appended stay in the tree.
pub fn encode_note(
    document: &mut XmlDocument,
    note_id: &str,
    markup: &str,
    relationships: &mut RelationshipTable,
    config: &EditorConfig,
) -> EncodeResult<EncodeOutcome> {
    let kind = config.note_kind;
    let Some(target_id) = parse_note_id(note_id) else {
        info!("event=note_encode module=codec status=skip reason=non_numeric_id");
        return Ok(EncodeOutcome::NoteNotFound);
    };

    let Some(note) = document.root.child_elements_mut().find(|element| {
        element.is(kind.note_element())
            && element.attr(ATTR_ID).and_then(parse_note_id) == Some(target_id)
    }) else {
        info!(
            "event=note_encode module=codec status=skip reason=note_not_found note_id={}",
            target_id
        );
        return Ok(EncodeOutcome::NoteNotFound);
    };

    let spans = parse_markup(markup);
    let hyperlinks = spans
        .iter()
        .filter(|span| matches!(span.kind, SpanKind::Hyperlink { .. }))
        .count();

    let position = note
        .children
        .iter()
        .position(|node| matches!(node, Node::Element(element) if element.is(PARAGRAPH)));
    let existing = position.and_then(|index| match &mut note.children[index] {
        Node::Element(element) => Some(std::mem::replace(element, Element::new(PARAGRAPH))),
        _ => None,
    });
    let mut rebuilt = start_paragraph(existing, kind);
    let appended = append_spans(&mut rebuilt, &spans, relationships, config);
    match position {
        Some(index) => note.children[index] = Node::Element(rebuilt),
        None => note.push(rebuilt),
    }
    style_trailing_paragraphs(note, kind);
    appended?;

    if hyperlinks > 0 && document.root.attr(REL_NAMESPACE_ATTR).is_none() {
        document.root.set_attr(REL_NAMESPACE_ATTR, REL_NAMESPACE);
    }

    debug!(
        "event=note_encode module=codec status=ok note_id={} spans={} hyperlinks={}",
        target_id,
        spans.len(),
        hyperlinks
    );
    Ok(EncodeOutcome::Rewritten {
        spans: spans.len(),
        hyperlinks,
    })
}

fn parse_note_id(raw: &str) -> Option<NoteId> {
    raw.trim().parse::<NoteId>().ok()
}

/// Fresh primary paragraph holding the properties block, the reference run
/// and its separating space. The properties block and the reference run are
/// detached from `existing`; the rest of its children are discarded.
fn start_paragraph(existing: Option<Element>, kind: NoteKind) -> Element {
    let mut paragraph = Element::new(PARAGRAPH);
    let mut properties = Element::new(PARAGRAPH_PROPERTIES);
    let mut reference_run = None;

    if let Some(mut existing) = existing {
        paragraph.attributes = std::mem::take(&mut existing.attributes);
        if let Some(current) = existing.take_child(|child| child.is(PARAGRAPH_PROPERTIES)) {
            properties = current;
        }
        let marker = kind.reference_marker();
        reference_run =
            existing.take_child(|child| child.is(RUN) && child.contains_descendant(marker));
    }

    set_paragraph_style(&mut properties, kind.body_style());
    paragraph.push(properties);

    if let Some(mut run) = reference_run {
        ensure_reference_style(&mut run, kind);
        paragraph.push(run);
        paragraph.push(Element::new(RUN).with_child(text_leaf(" ")));
    }
    paragraph
}

fn append_spans(
    paragraph: &mut Element,
    spans: &[Span],
    relationships: &mut RelationshipTable,
    config: &EditorConfig,
) -> EncodeResult<()> {
    for span in spans {
        match &span.kind {
            SpanKind::Hyperlink { target } => {
                let rel_id = relationships.resolve_or_create(target)?;
                paragraph.push(hyperlink_element(&rel_id, &span.text, config));
            }
            SpanKind::Emphasis => paragraph.push(text_run(&span.text, true, config)),
            SpanKind::Plain => paragraph.push(text_run(&span.text, false, config)),
        }
    }
    Ok(())
}

fn hyperlink_element(rel_id: &str, text: &str, config: &EditorConfig) -> Element {
    // Named style plus explicit colour and underline: some renderers ignore
    // the style reference.
    let properties = Element::new(RUN_PROPERTIES)
        .with_child(Element::new(RUN_STYLE).with_attr(ATTR_VAL, HYPERLINK_STYLE))
        .with_child(Element::new(COLOR).with_attr(ATTR_VAL, config.hyperlink_color.as_str()))
        .with_child(Element::new(UNDERLINE).with_attr(ATTR_VAL, SINGLE_UNDERLINE));
    let run = Element::new(RUN)
        .with_child(properties)
        .with_child(text_leaf(text));
    Element::new(HYPERLINK)
        .with_attr(ATTR_REL_ID, rel_id)
        .with_child(run)
}

fn text_run(text: &str, italic: bool, config: &EditorConfig) -> Element {
    let mut properties = Element::new(RUN_PROPERTIES).with_child(
        Element::new(RUN_FONTS)
            .with_attr(ATTR_ASCII, config.body_font.as_str())
            .with_attr(ATTR_HANSI, config.body_font.as_str()),
    );
    if italic {
        properties.push(Element::new(ITALIC));
    }
    Element::new(RUN)
        .with_child(properties)
        .with_child(text_leaf(text))
}

/// `w:pStyle` must be the first child of `w:pPr`.
fn set_paragraph_style(properties: &mut Element, style: &str) {
    if let Some(current) = properties.child_mut(PARAGRAPH_STYLE) {
        current.set_attr(ATTR_VAL, style);
        return;
    }
    properties.children.insert(
        0,
        Node::Element(Element::new(PARAGRAPH_STYLE).with_attr(ATTR_VAL, style)),
    );
}

fn ensure_reference_style(run: &mut Element, kind: NoteKind) {
    let style = Element::new(RUN_STYLE).with_attr(ATTR_VAL, kind.reference_style());
    match run.child_mut(RUN_PROPERTIES) {
        Some(properties) => {
            if properties.child(RUN_STYLE).is_none() {
                properties.children.insert(0, Node::Element(style));
            }
        }
        None => run.children.insert(
            0,
            Node::Element(Element::new(RUN_PROPERTIES).with_child(style)),
        ),
    }
}

/// Gives paragraphs after the primary one the body style when they have none.
fn style_trailing_paragraphs(note: &mut Element, kind: NoteKind) {
    for paragraph in note
        .child_elements_mut()
        .filter(|element| element.is(PARAGRAPH))
        .skip(1)
    {
        match paragraph.child_mut(PARAGRAPH_PROPERTIES) {
            Some(properties) => {
                if properties.child(PARAGRAPH_STYLE).is_none() {
                    set_paragraph_style(properties, kind.body_style());
                }
            }
            None => {
                let mut properties = Element::new(PARAGRAPH_PROPERTIES);
                set_paragraph_style(&mut properties, kind.body_style());
                paragraph.children.insert(0, Node::Element(properties));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_reference_style, parse_note_id, set_paragraph_style, start_paragraph};
    use crate::config::NoteKind;
    use crate::xml::Element;

    #[test]
    fn note_ids_parse_to_numeric_form() {
        assert_eq!(parse_note_id(" 07 "), Some(7));
        assert_eq!(parse_note_id("x"), None);
    }

    #[test]
    fn paragraph_style_goes_first_and_is_overwritten() {
        let mut properties = Element::new("w:pPr").with_child(Element::new("w:jc"));
        set_paragraph_style(&mut properties, "EndnoteText");
        assert_eq!(
            properties.child_elements().next().map(|el| el.name.as_str()),
            Some("w:pStyle")
        );

        set_paragraph_style(&mut properties, "FootnoteText");
        assert_eq!(properties.children_named("w:pStyle").count(), 1);
        assert_eq!(
            properties.child("w:pStyle").and_then(|el| el.attr("w:val")),
            Some("FootnoteText")
        );
    }

    #[test]
    fn start_paragraph_moves_properties_and_reference_run_only() {
        let existing = Element::new("w:p")
            .with_attr("w:rsidR", "00A1")
            .with_child(Element::new("w:r").with_child(Element::new("w:t")))
            .with_child(Element::new("w:pPr").with_child(Element::new("w:jc")))
            .with_child(Element::new("w:r").with_child(Element::new("w:endnoteRef")));

        let paragraph = start_paragraph(Some(existing), NoteKind::Endnote);
        assert_eq!(paragraph.attr("w:rsidR"), Some("00A1"));
        let names: Vec<&str> = paragraph
            .child_elements()
            .map(|el| el.name.as_str())
            .collect();
        assert_eq!(names, vec!["w:pPr", "w:r", "w:r"]);
        let properties = paragraph.child("w:pPr").unwrap();
        assert!(properties.child("w:jc").is_some());
        assert!(paragraph
            .children_named("w:r")
            .next()
            .unwrap()
            .contains_descendant("w:endnoteRef"));
        assert_eq!(paragraph.descendant_text("w:t"), " ");

        let fresh = start_paragraph(None, NoteKind::Footnote);
        assert_eq!(fresh.child_elements().count(), 1);
        assert_eq!(
            fresh
                .child("w:pPr")
                .and_then(|props| props.child("w:pStyle"))
                .and_then(|el| el.attr("w:val")),
            Some("FootnoteText")
        );
    }

    #[test]
    fn reference_style_is_recreated_when_missing() {
        let mut run = Element::new("w:r").with_child(Element::new("w:endnoteRef"));
        ensure_reference_style(&mut run, NoteKind::Endnote);
        let style = run
            .child("w:rPr")
            .and_then(|props| props.child("w:rStyle"))
            .and_then(|el| el.attr("w:val"));
        assert_eq!(style, Some("EndnoteReference"));
    }
}
