use super::XmlResult;

/// `<?xml ...?>` declaration fields as found in the source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Declaration {
    /// Declaration Word writes at the top of every package part.
    pub fn office_default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some("yes".to_string()),
        }
    }
}

/// One child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// Target and content of `<?target content?>`, without the delimiters.
    ProcessingInstruction(String),
}

/// Element with qualified name, ordered attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute append.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text append.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces an existing attribute in place or appends a new one.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Direct child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First direct child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|element| element.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|element| element.is(name))
    }

    /// Direct child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements().filter(move |element| element.is(name))
    }

    /// Whether any element below this one (at any depth) has the given name.
    pub fn contains_descendant(&self, name: &str) -> bool {
        self.child_elements()
            .any(|element| element.is(name) || element.contains_descendant(name))
    }

    /// Concatenated text of every descendant element with the given name,
    /// in document order.
    pub fn descendant_text(&self, name: &str) -> String {
        let mut out = String::new();
        collect_text(self, name, &mut out);
        out
    }

    /// Concatenated text and CDATA content directly under this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                _ => {}
            }
        }
        out
    }

    /// Removes and returns the first direct child element matching `predicate`.
    pub fn take_child<F>(&mut self, predicate: F) -> Option<Element>
    where
        F: Fn(&Element) -> bool,
    {
        let index = self.children.iter().position(|node| match node {
            Node::Element(element) => predicate(element),
            _ => false,
        })?;
        match self.children.remove(index) {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

fn collect_text(element: &Element, name: &str, out: &mut String) {
    for child in element.child_elements() {
        if child.is(name) {
            out.push_str(&child.text());
        } else {
            collect_text(child, name, out);
        }
    }
}

/// Parsed package part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub declaration: Option<Declaration>,
    pub root: Element,
}

impl XmlDocument {
    /// Wraps a root element with the office default declaration.
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Some(Declaration::office_default()),
            root,
        }
    }

    pub fn parse(bytes: &[u8]) -> XmlResult<Self> {
        super::io::parse_document(bytes)
    }

    pub fn to_bytes(&self) -> XmlResult<Vec<u8>> {
        super::io::write_document(self)
    }
}
