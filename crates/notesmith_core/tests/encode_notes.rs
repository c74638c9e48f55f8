use notesmith_core::codec::decode_notes_document;
use notesmith_core::xml::Element;
use notesmith_core::{
    encode_note, EditorConfig, EncodeOutcome, Note, NoteKind, RelationshipTable, Span,
    XmlDocument,
};
use std::path::PathBuf;
use tempfile::TempDir;

const HYPERLINK_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

const ENDNOTES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
    "<w:endnotes xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" ",
    "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
    "<w:endnote w:type=\"separator\" w:id=\"-1\"><w:p><w:r><w:separator/></w:r></w:p></w:endnote>",
    "<w:endnote w:id=\"1\"><w:p w:rsidR=\"00A1\"><w:pPr><w:pStyle w:val=\"Other\"/><w:jc w:val=\"both\"/></w:pPr>",
    "<w:r><w:rPr><w:rStyle w:val=\"EndnoteReference\"/></w:rPr><w:endnoteRef/></w:r>",
    "<w:r><w:t xml:space=\"preserve\"> </w:t></w:r>",
    "<w:r><w:t>Old text.</w:t></w:r>",
    "</w:p><w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p></w:endnote>",
    "<w:endnote w:id=\"2\"><w:p><w:pPr><w:pStyle w:val=\"EndnoteText\"/></w:pPr>",
    "<w:r><w:rPr><w:rStyle w:val=\"EndnoteReference\"/></w:rPr><w:endnoteRef/></w:r>",
    "<w:r><w:t xml:space=\"preserve\">See </w:t></w:r>",
    "<w:hyperlink r:id=\"rId5\"><w:r><w:t>site</w:t></w:r></w:hyperlink>",
    "<w:r><w:t xml:space=\"preserve\"> and </w:t></w:r>",
    "<w:r><w:rPr><w:i/></w:rPr><w:t>Title</w:t></w:r>",
    "</w:p></w:endnote>",
    "<w:endnote w:id=\"3\"><w:p><w:r><w:t>Untouched neighbour.</w:t></w:r></w:p></w:endnote>",
    "<w:endnote w:id=\"4\"><w:p><w:r><w:endnoteRef/></w:r><w:r><w:t>Bare reference.</w:t></w:r></w:p></w:endnote>",
    "<w:endnote w:id=\"5\"></w:endnote>",
    "</w:endnotes>"
);

const RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId5\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink\" Target=\"https://a.org\" TargetMode=\"External\"/>",
    "</Relationships>"
);

struct Fixture {
    _dir: TempDir,
    rels_path: PathBuf,
    document: XmlDocument,
    relationships: RelationshipTable,
    config: EditorConfig,
}

impl Fixture {
    fn new(notes_part: &str, rels: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let rels_path = dir.path().join("_rels").join("endnotes.xml.rels");
        if let Some(rels) = rels {
            std::fs::create_dir_all(rels_path.parent().unwrap()).unwrap();
            std::fs::write(&rels_path, rels).unwrap();
        }
        let relationships = RelationshipTable::load(&rels_path).unwrap();
        Self {
            _dir: dir,
            rels_path,
            document: XmlDocument::parse(notes_part.as_bytes()).unwrap(),
            relationships,
            config: EditorConfig::default(),
        }
    }

    fn encode(&mut self, note_id: &str, markup: &str) -> EncodeOutcome {
        encode_note(
            &mut self.document,
            note_id,
            markup,
            &mut self.relationships,
            &self.config,
        )
        .unwrap()
    }

    fn reparsed(&self) -> XmlDocument {
        XmlDocument::parse(&self.document.to_bytes().unwrap()).unwrap()
    }

    fn notes(&self) -> Vec<Note> {
        let reloaded = RelationshipTable::load(&self.rels_path).unwrap();
        decode_notes_document(&self.reparsed(), NoteKind::Endnote, &reloaded)
    }

    fn note(&self, id: i64) -> Note {
        self.notes().into_iter().find(|note| note.id == id).unwrap()
    }
}

fn note_element<'a>(document: &'a XmlDocument, id: &str) -> &'a Element {
    document
        .root
        .children_named("w:endnote")
        .find(|element| element.attr("w:id") == Some(id))
        .unwrap()
}

fn first_paragraph<'a>(document: &'a XmlDocument, id: &str) -> &'a Element {
    note_element(document, id).child("w:p").unwrap()
}

#[test]
fn decoded_markup_encodes_back_to_the_same_note() {
    let mut fixture = Fixture::new(ENDNOTES, Some(RELS));
    let before = fixture.note(2);

    let outcome = fixture.encode("2", &before.markup);
    assert_eq!(
        outcome,
        EncodeOutcome::Rewritten {
            spans: 4,
            hyperlinks: 1
        }
    );

    let after = fixture.note(2);
    assert_eq!(after.markup, before.markup);
    assert_eq!(
        after.markup,
        "See <a href=\"https://a.org\">site</a> and <em>Title</em>"
    );
    assert_eq!(fixture.relationships.entries().len(), 1);
    assert_eq!(std::fs::read_to_string(&fixture.rels_path).unwrap(), RELS);
}

#[test]
fn malformed_anchor_is_kept_as_literal_text() {
    let mut fixture = Fixture::new(ENDNOTES, None);

    fixture.encode("3", "Text <a href=\"x\">broken");

    assert!(fixture.relationships.entries().is_empty());
    assert!(!fixture.rels_path.exists());
    let note = fixture.note(3);
    assert_eq!(note.spans, vec![Span::plain("Text <a href=\"x\">broken")]);
    assert_eq!(note.markup, "Text <a href=\"x\">broken");
}

#[test]
fn new_hyperlink_targets_are_registered_once() {
    let mut fixture = Fixture::new(ENDNOTES, Some(RELS));

    let outcome = fixture.encode(
        "3",
        "<a href=\"https://b.org/report\">one</a> and <a href=\"https://b.org/report\">two</a> <a href=\"https://a.org\">old</a>",
    );
    assert_eq!(
        outcome,
        EncodeOutcome::Rewritten {
            spans: 5,
            hyperlinks: 3
        }
    );

    let entries = fixture.relationships.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].id, "rId6");
    assert_eq!(entries[1].target, "https://b.org/report");
    assert_eq!(entries[1].rel_type, HYPERLINK_TYPE);

    let reparsed = fixture.reparsed();
    let ids: Vec<&str> = first_paragraph(&reparsed, "3")
        .children_named("w:hyperlink")
        .filter_map(|link| link.attr("r:id"))
        .collect();
    assert_eq!(ids, vec!["rId6", "rId6", "rId5"]);

    let persisted = RelationshipTable::load(&fixture.rels_path).unwrap();
    assert_eq!(persisted.entries(), fixture.relationships.entries());
}

#[test]
fn rewritten_runs_carry_fonts_and_hyperlink_formatting() {
    let mut fixture = Fixture::new(ENDNOTES, None);
    fixture.encode("3", "Plain <em>Italic</em> <a href=\"https://c.org\">link</a>");

    let reparsed = fixture.reparsed();
    let paragraph = first_paragraph(&reparsed, "3");

    let runs: Vec<&Element> = paragraph.children_named("w:r").collect();
    let fonts = runs[0].child("w:rPr").and_then(|props| props.child("w:rFonts")).unwrap();
    assert_eq!(fonts.attr("w:ascii"), Some("Times New Roman"));
    assert_eq!(fonts.attr("w:hAnsi"), Some("Times New Roman"));
    assert!(runs[1].child("w:rPr").unwrap().child("w:i").is_some());

    let link_props = paragraph
        .child("w:hyperlink")
        .and_then(|link| link.child("w:r"))
        .and_then(|run| run.child("w:rPr"))
        .unwrap();
    assert_eq!(
        link_props.child("w:rStyle").and_then(|el| el.attr("w:val")),
        Some("Hyperlink")
    );
    assert_eq!(
        link_props.child("w:color").and_then(|el| el.attr("w:val")),
        Some("0000FF")
    );
    assert_eq!(
        link_props.child("w:u").and_then(|el| el.attr("w:val")),
        Some("single")
    );
}

#[test]
fn paragraph_properties_and_reference_run_survive() {
    let mut fixture = Fixture::new(ENDNOTES, None);
    fixture.encode("1", "New text.");

    let reparsed = fixture.reparsed();
    let paragraph = first_paragraph(&reparsed, "1");
    assert_eq!(paragraph.attr("w:rsidR"), Some("00A1"));

    let children: Vec<&str> = paragraph
        .child_elements()
        .map(|child| child.name.as_str())
        .collect();
    assert_eq!(children, vec!["w:pPr", "w:r", "w:r", "w:r"]);

    let properties = paragraph.child("w:pPr").unwrap();
    let property_names: Vec<&str> = properties
        .child_elements()
        .map(|child| child.name.as_str())
        .collect();
    assert_eq!(property_names, vec!["w:pStyle", "w:jc"]);
    assert_eq!(
        properties.child("w:pStyle").and_then(|el| el.attr("w:val")),
        Some("EndnoteText")
    );

    let reference = paragraph.child_elements().nth(1).unwrap();
    assert!(reference.contains_descendant("w:endnoteRef"));
    let spacer = paragraph.child_elements().nth(2).unwrap();
    assert_eq!(spacer.descendant_text("w:t"), " ");

    assert_eq!(fixture.note(1).markup, "New text.");
}

#[test]
fn missing_reference_style_is_restored() {
    let mut fixture = Fixture::new(ENDNOTES, None);
    fixture.encode("4", "Replaced.");

    let reparsed = fixture.reparsed();
    let reference = first_paragraph(&reparsed, "4")
        .children_named("w:r")
        .find(|run| run.contains_descendant("w:endnoteRef"))
        .unwrap();
    assert_eq!(
        reference
            .child("w:rPr")
            .and_then(|props| props.child("w:rStyle"))
            .and_then(|el| el.attr("w:val")),
        Some("EndnoteReference")
    );
}

#[test]
fn trailing_paragraphs_keep_content_and_gain_body_style() {
    let mut fixture = Fixture::new(ENDNOTES, None);
    fixture.encode("1", "New text.");

    let reparsed = fixture.reparsed();
    let paragraphs: Vec<&Element> = note_element(&reparsed, "1").children_named("w:p").collect();
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[1].descendant_text("w:t"), "Second paragraph.");
    assert_eq!(
        paragraphs[1]
            .child("w:pPr")
            .and_then(|props| props.child("w:pStyle"))
            .and_then(|el| el.attr("w:val")),
        Some("EndnoteText")
    );
}

#[test]
fn unknown_note_id_changes_nothing() {
    let mut fixture = Fixture::new(ENDNOTES, None);
    let before = fixture.document.clone();

    assert_eq!(fixture.encode("99", "ignored"), EncodeOutcome::NoteNotFound);
    assert_eq!(fixture.encode("x", "ignored"), EncodeOutcome::NoteNotFound);
    assert_eq!(fixture.document, before);
}

#[test]
fn other_notes_are_left_untouched() {
    let mut fixture = Fixture::new(ENDNOTES, Some(RELS));
    let before = fixture.document.clone();

    fixture.encode("2", "Only this one <a href=\"https://new.org\">changes</a>.");

    for id in ["-1", "1", "3", "4", "5"] {
        assert_eq!(note_element(&fixture.document, id), note_element(&before, id));
    }
}

#[test]
fn note_without_paragraph_gets_a_fresh_one() {
    let mut fixture = Fixture::new(ENDNOTES, None);
    fixture.encode("5", "Filled in.");

    let reparsed = fixture.reparsed();
    let paragraph = first_paragraph(&reparsed, "5");
    let children: Vec<&str> = paragraph
        .child_elements()
        .map(|child| child.name.as_str())
        .collect();
    // No reference run to keep, so no separating space either.
    assert_eq!(children, vec!["w:pPr", "w:r"]);
    assert_eq!(fixture.note(5).markup, "Filled in.");
}

#[test]
fn entities_and_edge_whitespace_are_preserved_in_text() {
    let mut fixture = Fixture::new(ENDNOTES, None);
    fixture.encode("3", "A&nbsp;&amp;&nbsp;B <em>C</em>");

    let note = fixture.note(3);
    assert_eq!(note.spans, vec![Span::plain("A & B "), Span::emphasis("C")]);

    let reparsed = fixture.reparsed();
    let leaf = first_paragraph(&reparsed, "3")
        .child("w:r")
        .and_then(|run| run.child("w:t"))
        .unwrap();
    assert_eq!(leaf.attr("xml:space"), Some("preserve"));
}

#[test]
fn relationship_namespace_is_declared_when_missing() {
    let part = concat!(
        "<w:endnotes xmlns:w=\"urn:w\">",
        "<w:endnote w:id=\"1\"><w:p><w:r><w:t>x</w:t></w:r></w:p></w:endnote>",
        "</w:endnotes>"
    );
    let mut fixture = Fixture::new(part, None);
    fixture.encode("1", "<a href=\"https://d.org\">d</a>");

    assert_eq!(
        fixture.document.root.attr("xmlns:r"),
        Some("http://schemas.openxmlformats.org/officeDocument/2006/relationships")
    );
}

#[test]
fn footnotes_use_footnote_styles() {
    let part = concat!(
        "<w:footnotes xmlns:w=\"urn:w\">",
        "<w:footnote w:id=\"1\"><w:p><w:r><w:footnoteRef/></w:r><w:r><w:t>x</w:t></w:r></w:p></w:footnote>",
        "</w:footnotes>"
    );
    let mut fixture = Fixture::new(part, None);
    fixture.config = EditorConfig::default().with_kind(NoteKind::Footnote);
    fixture.encode("1", "Footnote text");

    let paragraph = fixture
        .document
        .root
        .child("w:footnote")
        .and_then(|note| note.child("w:p"))
        .unwrap();
    assert_eq!(
        paragraph
            .child("w:pPr")
            .and_then(|props| props.child("w:pStyle"))
            .and_then(|el| el.attr("w:val")),
        Some("FootnoteText")
    );
    let reference = paragraph.child("w:r").unwrap();
    assert_eq!(
        reference
            .child("w:rPr")
            .and_then(|props| props.child("w:rStyle"))
            .and_then(|el| el.attr("w:val")),
        Some("FootnoteReference")
    );
}

#[test]
fn zero_padded_note_id_is_reachable_by_its_listed_id() {
    let part = ENDNOTES.replace("<w:endnote w:id=\"3\">", "<w:endnote w:id=\"07\">");
    let mut fixture = Fixture::new(&part, None);
    assert!(fixture.notes().iter().any(|note| note.id == 7));

    let outcome = fixture.encode("7", "Listed as seven.");
    assert_eq!(
        outcome,
        EncodeOutcome::Rewritten {
            spans: 1,
            hyperlinks: 0
        }
    );
    assert_eq!(fixture.note(7).markup, "Listed as seven.");

    fixture.encode("07", "Padded form too.");
    assert_eq!(fixture.note(7).markup, "Padded form too.");
    assert_eq!(
        first_paragraph(&fixture.reparsed(), "07").descendant_text("w:t"),
        "Padded form too."
    );
}

#[test]
fn empty_hyperlink_still_registers_its_target() {
    let mut fixture = Fixture::new(ENDNOTES, Some(RELS));

    let outcome = fixture.encode("3", "<a href=\"https://e.org/x\"></a>");
    assert_eq!(
        outcome,
        EncodeOutcome::Rewritten {
            spans: 1,
            hyperlinks: 1
        }
    );

    let entries = fixture.relationships.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].target, "https://e.org/x");

    let note = fixture.note(3);
    assert_eq!(note.spans, vec![Span::hyperlink("https://e.org/x", "")]);
    assert_eq!(note.markup, "<a href=\"https://e.org/x\"></a>");
}
