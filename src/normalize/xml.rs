//! Minimal in-memory element tree over `quick-xml` events.
//!
//! Pages are bounded by the page size, so each one is read fully into a tree
//! and queried with descendant/child lookups in document order.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
}

/// Why a document could not be turned into a tree.
#[derive(Debug)]
pub(crate) enum TreeError {
    Xml(quick_xml::Error),
    Structure(String),
}

impl From<quick_xml::Error> for TreeError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error)
    }
}

impl From<quick_xml::events::attributes::AttrError> for TreeError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(error.into())
    }
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, TreeError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Value of attribute `key`, if present.
    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Direct child elements.
    pub(crate) fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First direct child named `name`.
    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Every descendant (not `self`) named `name`, in document order.
    pub(crate) fn descendants<'s>(&'s self, name: &str) -> impl Iterator<Item = &'s Element> {
        let mut stack: Vec<&Element> = self.child_elements().collect();
        stack.reverse();
        std::iter::from_fn(move || {
            while let Some(next) = stack.pop() {
                let before = stack.len();
                stack.extend(next.child_elements());
                stack[before..].reverse();
                if next.name == name {
                    return Some(next);
                }
            }
            None
        })
    }

    /// First descendant named `name`.
    pub(crate) fn find(&self, name: &str) -> Option<&Element> {
        self.descendants(name).next()
    }

    /// First `child` directly under any `parent` descendant, e.g. `Journal/Title`.
    pub(crate) fn find_path(&self, parent: &str, child: &str) -> Option<&Element> {
        self.descendants(parent).find_map(|p| p.child(child))
    }

    /// Concatenated text of this element and all its descendants.
    pub(crate) fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }
}

/// Parses a complete document and returns its root element.
pub(crate) fn parse_document(xml: &str) -> Result<Element, TreeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(TreeError::Structure("content after the root element".into()));
                }
                open.push(Element::open(&start)?);
            }
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                close(element, &mut open, &mut root)?;
            }
            Event::End(_) => {
                let element = open
                    .pop()
                    .ok_or_else(|| TreeError::Structure("closing tag without an open element".into()))?;
                close(element, &mut open, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                push_text(&mut open, &text)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_text(&mut open, &text)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(TreeError::Structure(format!(
            "document ended inside <{}>",
            unclosed.name
        )));
    }
    root.ok_or_else(|| TreeError::Structure("no root element".into()))
}

fn close(
    element: Element,
    open: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), TreeError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(Node::Element(element));
        Ok(())
    } else if root.is_some() {
        Err(TreeError::Structure("more than one root element".into()))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn push_text(open: &mut [Element], text: &str) -> Result<(), TreeError> {
    match open.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Text(text.to_string()));
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(TreeError::Structure("text outside the root element".into())),
    }
}
