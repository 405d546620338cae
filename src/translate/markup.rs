//! HTML-aware segmentation and reassembly
//!
//! Markup found in cells and element text comes in three shapes: raw HTML,
//! entity-escaped HTML (`&lt;p&gt;...`) and CDATA-wrapped HTML. The content is
//! unwrapped, parsed with html5ever, and only text leaves are handed to the
//! translator. The result is serialized and wrapped back into the shape it
//! arrived in.

use std::cell::RefCell;
use std::sync::LazyLock;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use regex::Regex;

use crate::error::PipelineError;

static RAW_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[!/]?[A-Za-z][^<>]*>").expect("valid regex"));
static ESCAPED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&lt;/?[A-Za-z][\s\S]*?&gt;").expect("valid regex"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("valid regex"));
static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(/?)([A-Za-z][A-Za-z0-9:_-]*)").expect("valid regex"));
static IGNORE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bignore\s*=\s*["']?\s*true\b"#).expect("valid regex")
});

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Containers whose text is never translated.
const OPAQUE_CONTAINERS: [&str; 4] = ["script", "style", "meta", "title"];

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Raw,
    EntityEscaped,
    Cdata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    TranslatableText,
    Ignored,
    Structural,
}

/// A text leaf of a markup fragment, as classified by [`segment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSpan {
    pub text: String,
    pub kind: SpanKind,
    pub preceding_whitespace: String,
    pub trailing_whitespace: String,
    pub representation: Representation,
}

/// Whether `text` carries markup in any of the supported representations.
pub fn is_html(text: &str) -> bool {
    text.contains(CDATA_OPEN) || RAW_TAG.is_match(text) || ESCAPED_TAG.is_match(text)
}

pub fn detect_representation(content: &str) -> Representation {
    Envelope::open(content).representation
}

/// Split `s` into leading whitespace, trimmed content and trailing whitespace.
pub fn split_padding(s: &str) -> (&str, &str, &str) {
    let trimmed_start = s.trim_start();
    let lead = &s[..s.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end();
    let trail = &trimmed_start[core.len()..];
    (lead, core, trail)
}

pub fn escape_markup(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn unescape_markup(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Content with its outer wrapping removed, plus what is needed to put it back.
struct Envelope<'a> {
    representation: Representation,
    lead: &'a str,
    trail: &'a str,
    inner: String,
}

impl<'a> Envelope<'a> {
    fn open(content: &'a str) -> Self {
        let (lead, core, trail) = split_padding(content);

        if core.len() >= CDATA_OPEN.len() + CDATA_CLOSE.len()
            && core.starts_with(CDATA_OPEN)
            && core.ends_with(CDATA_CLOSE)
        {
            let body = &core[CDATA_OPEN.len()..core.len() - CDATA_CLOSE.len()];
            let inner = if is_entity_escaped(body) {
                unescape_markup(body)
            } else {
                body.to_string()
            };
            return Self {
                representation: Representation::Cdata,
                lead,
                trail,
                inner,
            };
        }

        if is_entity_escaped(core) {
            return Self {
                representation: Representation::EntityEscaped,
                lead,
                trail,
                inner: unescape_markup(core),
            };
        }

        Self {
            representation: Representation::Raw,
            lead,
            trail,
            inner: core.to_string(),
        }
    }

    fn close(&self, translated: &str) -> String {
        let body = match self.representation {
            Representation::Raw => translated.to_string(),
            Representation::EntityEscaped => escape_markup(translated),
            Representation::Cdata => format!("{}{}{}", CDATA_OPEN, translated, CDATA_CLOSE),
        };
        format!("{}{}{}", self.lead, body, self.trail)
    }
}

fn is_entity_escaped(s: &str) -> bool {
    ESCAPED_TAG.is_match(s) && !RAW_TAG.is_match(s)
}

/// Translate the text leaves of a markup fragment.
///
/// `translate` receives trimmed text only; surrounding whitespace is put back
/// around its result. When the tree parser would not give back the same tags
/// (implied `tbody`, auto-closed paragraphs, `<br/>` written as `<br>`, ...) a
/// tag-by-tag regex pass is used instead, which keeps the markup byte for byte.
pub fn translate_markup<F>(content: &str, translate: F) -> Result<String, PipelineError>
where
    F: Fn(&str) -> String,
{
    let envelope = Envelope::open(content);
    let inner = envelope.inner.as_str();

    let translated = match translate_tree(inner, &translate) {
        Ok(Some(output)) => output,
        Ok(None) => {
            tracing::debug!("Tree parse would alter structure, using regex pass");
            translate_with_regex(inner, &translate)
        }
        Err(e) => {
            tracing::warn!("Tree-based markup translation failed ({}), using regex pass", e);
            translate_with_regex(inner, &translate)
        }
    };

    Ok(envelope.close(&translated))
}

/// Classify every text leaf of `content` without translating anything.
pub fn segment(content: &str) -> Vec<ContentSpan> {
    let envelope = Envelope::open(content);
    let dom = parse(&envelope.inner);
    let mut spans = Vec::new();

    for root in content_roots(&dom, &envelope.inner) {
        visit_text(&root, false, &mut |cell, kind| {
            let text = cell.borrow().to_string();
            let (lead, core, trail) = split_padding(&text);
            spans.push(ContentSpan {
                text: core.to_string(),
                kind,
                preceding_whitespace: lead.to_string(),
                trailing_whitespace: trail.to_string(),
                representation: envelope.representation,
            });
        });
    }

    spans
}

fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

/// `Ok(None)` means the parser would not reproduce the input's tags exactly.
fn translate_tree<F>(inner: &str, translate: &F) -> Result<Option<String>, PipelineError>
where
    F: Fn(&str) -> String,
{
    let dom = parse(inner);
    let roots = content_roots(&dom, inner);

    let untouched = serialize_roots(&roots)?;
    let reparsed_tags = ANY_TAG.find_iter(&untouched).map(|m| m.as_str());
    if !reparsed_tags.eq(ANY_TAG.find_iter(inner).map(|m| m.as_str())) {
        return Ok(None);
    }

    let mut changed = false;
    for root in &roots {
        visit_text(root, false, &mut |cell, kind| {
            if kind != SpanKind::TranslatableText {
                return;
            }
            let original = cell.borrow().to_string();
            if let Some(translated) = translate_padded(&original, translate) {
                if translated != original {
                    let mut contents = cell.borrow_mut();
                    contents.clear();
                    contents.push_slice(&translated);
                    changed = true;
                }
            }
        });
    }

    if !changed {
        return Ok(Some(inner.to_string()));
    }

    serialize_roots(&roots).map(Some)
}

/// Nodes whose children make up the fragment, skipping wrappers the parser
/// added on its own.
fn content_roots(dom: &RcDom, inner: &str) -> Vec<Handle> {
    let lower = inner.to_ascii_lowercase();
    if lower.contains("<html") {
        return vec![dom.document.clone()];
    }

    let Some(html) = find_child(&dom.document, "html") else {
        return vec![dom.document.clone()];
    };
    if lower.contains("<head") || lower.contains("<body") {
        return vec![html];
    }

    ["head", "body"]
        .iter()
        .filter_map(|name| find_child(&html, name))
        .collect()
}

fn find_child(node: &Handle, tag: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| element_name(child).is_some_and(|name| name == tag))
        .cloned()
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn has_ignore_attr(node: &Handle) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs.borrow().iter().any(|attr| {
            let name: &str = &attr.name.local;
            name.eq_ignore_ascii_case("ignore") && attr.value.trim().eq_ignore_ascii_case("true")
        }),
        _ => false,
    }
}

/// Walk text leaves in document order. `ignored` is inherited from ancestors
/// carrying `ignore="true"`.
fn visit_text<V>(node: &Handle, ignored: bool, visit: &mut V)
where
    V: FnMut(&RefCell<StrTendril>, SpanKind),
{
    let ignored = ignored || has_ignore_attr(node);
    let opaque = element_name(node)
        .is_some_and(|name| OPAQUE_CONTAINERS.contains(&name.as_str()));

    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let kind = if ignored || opaque {
                    SpanKind::Ignored
                } else if contents.borrow().trim().chars().count() <= 1 {
                    SpanKind::Structural
                } else {
                    SpanKind::TranslatableText
                };
                visit(contents, kind);
            }
            _ => visit_text(child, ignored, visit),
        }
    }
}

/// Translate the trimmed core of `text`, keeping its surrounding whitespace.
/// `None` for fragments too short to be worth a request.
fn translate_padded<F>(text: &str, translate: &F) -> Option<String>
where
    F: Fn(&str) -> String,
{
    let (lead, core, trail) = split_padding(text);
    if core.chars().count() <= 1 {
        return None;
    }
    Some(format!("{}{}{}", lead, translate(core), trail))
}

fn serialize_roots(roots: &[Handle]) -> Result<String, PipelineError> {
    let mut buf = Vec::new();
    for root in roots {
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        serialize(&mut buf, &SerializableHandle::from(root.clone()), opts)
            .map_err(|e| PipelineError::Markup(e.to_string()))?;
    }
    String::from_utf8(buf).map_err(|e| PipelineError::Markup(e.to_string()))
}

/// Degraded mode: translate the text between tags without building a tree.
fn translate_with_regex<F>(inner: &str, translate: &F) -> String
where
    F: Fn(&str) -> String,
{
    let mut out = String::with_capacity(inner.len());
    let mut skipping: Option<(String, usize)> = None;
    let mut last = 0;

    for tag in ANY_TAG.find_iter(inner) {
        push_text(&mut out, &inner[last..tag.start()], skipping.is_some(), translate);
        out.push_str(tag.as_str());
        track_skipped(&mut skipping, tag.as_str());
        last = tag.end();
    }
    push_text(&mut out, &inner[last..], skipping.is_some(), translate);

    out
}

fn push_text<F>(out: &mut String, text: &str, skip: bool, translate: &F)
where
    F: Fn(&str) -> String,
{
    match translate_padded(text, translate) {
        Some(translated) if !skip => out.push_str(&translated),
        _ => out.push_str(text),
    }
}

// Tracks the innermost ignored or opaque element so its text is left alone.
fn track_skipped(skipping: &mut Option<(String, usize)>, tag: &str) {
    let Some(caps) = TAG_NAME.captures(tag) else {
        return;
    };
    let closing = !caps[1].is_empty();
    let name = caps[2].to_ascii_lowercase();
    let self_closing = tag.ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str());

    match skipping {
        Some((skipped, depth)) if *skipped == name => {
            if closing {
                *depth -= 1;
                if *depth == 0 {
                    *skipping = None;
                }
            } else if !self_closing {
                *depth += 1;
            }
        }
        Some(_) => {}
        None => {
            if !closing
                && !self_closing
                && (OPAQUE_CONTAINERS.contains(&name.as_str()) || IGNORE_ATTR.is_match(tag))
            {
                *skipping = Some((name, 1));
            }
        }
    }
}
