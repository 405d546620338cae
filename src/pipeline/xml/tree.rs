//! Owned XML element tree with text/tail content, built from quick-xml events

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::PipelineError;

const INDENT: &str = "    ";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Raw comment body and the text following it
    Comment { content: String, tail: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attribute names and raw (still escaped) values, in document order
    pub attributes: Vec<(String, String)>,
    /// Unescaped text before the first child
    pub text: String,
    /// Unescaped text following this element's closing tag
    pub tail: String,
    pub children: Vec<Node>,
    /// Text arrived in a CDATA section
    pub had_cdata: bool,
    /// Written as `<Tag/>` in the source
    pub self_closing: bool,
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Self, PipelineError> {
        let name = utf8(start.name().as_ref())?;

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(PipelineError::xml)?;
            attributes.push((utf8(attr.key.as_ref())?, utf8(&attr.value)?));
        }

        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    /// `ignore="true"`, with both the name and the value compared case-insensitively.
    pub fn is_ignored(&self) -> bool {
        self.attributes.iter().any(|(key, value)| {
            key.eq_ignore_ascii_case("ignore") && value.trim().eq_ignore_ascii_case("true")
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Comment { .. } => None,
        })
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// Only child elements separated by whitespace; safe to re-indent.
    fn is_structural(&self) -> bool {
        !self.children.is_empty()
            && self.text.trim().is_empty()
            && self.children.iter().all(|node| match node {
                Node::Element(el) => el.tail.trim().is_empty(),
                Node::Comment { tail, .. } => tail.trim().is_empty(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Comments, processing instructions and doctype before the root, verbatim
    pub prolog: Vec<String>,
    pub root: Element,
    pub epilog: Vec<String>,
}

fn utf8(bytes: &[u8]) -> Result<String, PipelineError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(PipelineError::xml)
}

pub fn parse(xml: &str) -> Result<Document, PipelineError> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();

    loop {
        match reader.read_event().map_err(PipelineError::xml)? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let mut element = Element::from_start(&start)?;
                element.self_closing = true;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| PipelineError::xml("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(PipelineError::xml)?;
                push_text(&mut stack, &text, false)?;
            }
            Event::CData(cdata) => {
                let text = utf8(&cdata.into_inner())?;
                push_text(&mut stack, &text, true)?;
            }
            Event::Comment(comment) => {
                let content = utf8(&comment)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Comment {
                        content,
                        tail: String::new(),
                    }),
                    None if root.is_none() => prolog.push(format!("<!--{}-->", content)),
                    None => epilog.push(format!("<!--{}-->", content)),
                }
            }
            Event::PI(pi) => {
                let raw = format!("<?{}?>", utf8(&pi)?);
                if root.is_none() { prolog.push(raw) } else { epilog.push(raw) }
            }
            Event::DocType(doctype) => prolog.push(format!("<!DOCTYPE{}>", utf8(&doctype)?)),
            Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(PipelineError::xml(format!("unclosed element <{}>", open.name)));
    }

    let root = root.ok_or_else(|| PipelineError::xml("document has no root element"))?;
    Ok(Document {
        prolog,
        root,
        epilog,
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), PipelineError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => {
            return Err(PipelineError::xml(format!(
                "second root element <{}>",
                element.name
            )));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str, cdata: bool) -> Result<(), PipelineError> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(PipelineError::xml("text outside the root element"));
    };

    match parent.children.last_mut() {
        None => {
            parent.text.push_str(text);
            parent.had_cdata |= cdata;
        }
        Some(Node::Element(child)) => child.tail.push_str(text),
        Some(Node::Comment { tail, .. }) => tail.push_str(text),
    }
    Ok(())
}

/// Writes a document with a fresh declaration, four-space indentation for
/// purely structural elements, and mixed content kept inline.
pub struct XmlWriter<'a> {
    /// Elements whose quoted text is also CDATA-wrapped
    html_container: &'a dyn Fn(&str) -> bool,
}

impl<'a> XmlWriter<'a> {
    pub fn new(html_container: &'a dyn Fn(&str) -> bool) -> Self {
        Self { html_container }
    }

    pub fn write(&self, doc: &Document) -> String {
        let mut out = String::new();
        out.push_str(XML_DECLARATION);
        out.push('\n');

        for item in &doc.prolog {
            out.push_str(item);
            out.push('\n');
        }

        self.write_element(&mut out, &doc.root, 0, true);
        out.push('\n');

        for item in &doc.epilog {
            out.push_str(item);
            out.push('\n');
        }

        out
    }

    fn write_element(&self, out: &mut String, el: &Element, depth: usize, pretty: bool) {
        out.push('<');
        out.push_str(&el.name);
        for (key, value) in &el.attributes {
            if value.contains('"') {
                let _ = write!(out, " {}='{}'", key, value);
            } else {
                let _ = write!(out, " {}=\"{}\"", key, value);
            }
        }

        if el.self_closing {
            out.push_str("/>");
            return;
        }
        out.push('>');

        if pretty && el.is_structural() {
            for node in &el.children {
                out.push('\n');
                out.push_str(&INDENT.repeat(depth + 1));
                self.write_node(out, node, depth + 1, true);
            }
            out.push('\n');
            out.push_str(&INDENT.repeat(depth));
        } else if el.children.is_empty() {
            // Whitespace-only content collapses to `<Tag></Tag>`, never empty CDATA.
            if !el.text.trim().is_empty() {
                self.write_text(out, el);
            }
        } else {
            self.write_text(out, el);
            for node in &el.children {
                self.write_node(out, node, depth + 1, false);
                match node {
                    Node::Element(child) => out.push_str(&escape_text(&child.tail)),
                    Node::Comment { tail, .. } => out.push_str(&escape_text(tail)),
                }
            }
        }

        out.push_str("</");
        out.push_str(&el.name);
        out.push('>');
    }

    fn write_node(&self, out: &mut String, node: &Node, depth: usize, pretty: bool) {
        match node {
            Node::Element(el) => self.write_element(out, el, depth, pretty),
            Node::Comment { content, .. } => {
                let _ = write!(out, "<!--{}-->", content);
            }
        }
    }

    fn write_text(&self, out: &mut String, el: &Element) {
        if self.needs_cdata(el) {
            out.push_str(&wrap_cdata(&el.text));
        } else {
            out.push_str(&escape_text(&el.text));
        }
    }

    fn needs_cdata(&self, el: &Element) -> bool {
        let text = el.text.as_str();
        if text.trim().is_empty() {
            return false;
        }
        el.had_cdata
            || text.contains(['<', '>', '&'])
            || ((self.html_container)(&el.name) && text.contains(['"', '\'']))
    }
}

/// `]]>` cannot appear inside a CDATA section, so it is split across two.
fn wrap_cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
