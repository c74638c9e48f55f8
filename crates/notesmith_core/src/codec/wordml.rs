//! WordprocessingML element and attribute names used by the codec.

use crate::xml::Element;

pub const PARAGRAPH: &str = "w:p";
pub const PARAGRAPH_PROPERTIES: &str = "w:pPr";
pub const PARAGRAPH_STYLE: &str = "w:pStyle";
pub const RUN: &str = "w:r";
pub const RUN_PROPERTIES: &str = "w:rPr";
pub const RUN_STYLE: &str = "w:rStyle";
pub const RUN_FONTS: &str = "w:rFonts";
pub const ITALIC: &str = "w:i";
pub const COLOR: &str = "w:color";
pub const UNDERLINE: &str = "w:u";
pub const TEXT: &str = "w:t";
pub const HYPERLINK: &str = "w:hyperlink";

pub const ATTR_ID: &str = "w:id";
pub const ATTR_VAL: &str = "w:val";
pub const ATTR_ASCII: &str = "w:ascii";
pub const ATTR_HANSI: &str = "w:hAnsi";
pub const ATTR_REL_ID: &str = "r:id";
pub const ATTR_XML_SPACE: &str = "xml:space";

pub const HYPERLINK_STYLE: &str = "Hyperlink";
pub const SINGLE_UNDERLINE: &str = "single";
pub const PRESERVE: &str = "preserve";

pub const REL_NAMESPACE_ATTR: &str = "xmlns:r";
pub const REL_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Whether a run carries an italic toggle that is switched on.
///
/// `<w:i/>` and `<w:i w:val="true"/>` are on; `0`, `false` and `off` are off.
pub fn run_is_italic(run: &Element) -> bool {
    run.child(RUN_PROPERTIES)
        .and_then(|props| props.child(ITALIC))
        .map(|italic| {
            !matches!(
                italic.attr(ATTR_VAL),
                Some("0") | Some("false") | Some("off")
            )
        })
        .unwrap_or(false)
}

/// `<w:t>` leaf, flagged space-preserving when `text` has edge whitespace.
pub fn text_leaf(text: &str) -> Element {
    let mut leaf = Element::new(TEXT);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        leaf.set_attr(ATTR_XML_SPACE, PRESERVE);
    }
    leaf.with_text(text)
}
