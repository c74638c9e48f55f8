use super::tree::{Declaration, Element, Node, XmlDocument};
use super::{XmlError, XmlResult};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

pub(super) fn parse_document(bytes: &[u8]) -> XmlResult<XmlDocument> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut declaration = None;
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| malformed(&reader, err))?;
        match event {
            Event::Decl(decl) => declaration = Some(read_declaration(&decl)?),
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            Event::Text(text) => {
                if !stack.is_empty() {
                    let value = text
                        .unescape()
                        .map_err(|err| XmlError::Malformed(err.to_string()))?;
                    attach(&mut stack, &mut root, Node::Text(value.into_owned()))?;
                }
            }
            Event::CData(data) => {
                if !stack.is_empty() {
                    let value = String::from_utf8_lossy(&data).into_owned();
                    attach(&mut stack, &mut root, Node::CData(value))?;
                }
            }
            Event::Comment(comment) => {
                if !stack.is_empty() {
                    let value = String::from_utf8_lossy(&comment).into_owned();
                    attach(&mut stack, &mut root, Node::Comment(value))?;
                }
            }
            Event::PI(instruction) => {
                if !stack.is_empty() {
                    let value = String::from_utf8_lossy(&instruction).into_owned();
                    attach(&mut stack, &mut root, Node::ProcessingInstruction(value))?;
                }
            }
            Event::Eof => break,
            // Prolog-only content: doctype, and anything outside the root.
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed(format!(
            "{} unclosed element(s) at end of input",
            stack.len()
        )));
    }

    let root = root.ok_or(XmlError::MissingRoot)?;
    Ok(XmlDocument { declaration, root })
}

pub(super) fn write_document(document: &XmlDocument) -> XmlResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    if let Some(decl) = &document.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new(
                decl.version.as_str(),
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))
            .map_err(|err| XmlError::Write(err.to_string()))?;
        writer.get_mut().extend_from_slice(b"\r\n");
    }
    write_element(&mut writer, &document.root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> XmlResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(inner) => write_element(writer, inner)?,
            Node::Text(text) => emit(writer, Event::Text(BytesText::new(text.as_str())))?,
            Node::CData(text) => emit(writer, Event::CData(BytesCData::new(text.as_str())))?,
            Node::ProcessingInstruction(text) => {
                emit(writer, Event::PI(BytesPI::new(text.as_str())))?
            }
            Node::Comment(text) => {
                emit(writer, Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
        }
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> XmlResult<()> {
    writer
        .write_event(event)
        .map_err(|err| XmlError::Write(err.to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, node: Node) -> XmlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }

    match node {
        Node::Element(element) if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        Node::Element(_) => Err(XmlError::Malformed(
            "more than one root element".to_string(),
        )),
        _ => Ok(()),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> XmlResult<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| XmlError::Malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| XmlError::Malformed(err.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>) -> XmlResult<Declaration> {
    let version = decl
        .version()
        .map_err(|err| XmlError::Malformed(err.to_string()))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|err| XmlError::Malformed(err.to_string()))?;
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|err| XmlError::Malformed(err.to_string()))?;

    Ok(Declaration {
        version: lossy(version),
        encoding: encoding.map(lossy),
        standalone: standalone.map(lossy),
    })
}

fn lossy(value: Cow<'_, [u8]>) -> String {
    String::from_utf8_lossy(&value).into_owned()
}

fn malformed(reader: &Reader<&[u8]>, err: quick_xml::Error) -> XmlError {
    XmlError::Malformed(format!(
        "{err} at byte {}",
        reader.buffer_position()
    ))
}
