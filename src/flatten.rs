//! First pass: DOM to a flat sequence of role-tagged events.
//!
//! Elements with a waiting role become element events; their trigger text
//! follows as a text event. The chapter lookahead for headings is computed
//! over this flat sequence rather than by walking DOM siblings.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::classify::{classify, ElementAttrs, Role};
use crate::profile::Profile;

/// Heading groups a lookahead may step over before giving up.
const MAX_SKIPPED_HEADINGS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Element { role: Role, leads_to_chapter: bool },
    Text(TextRun),
}

impl Event {
    pub fn element(role: Role) -> Self {
        Event::Element {
            role,
            leads_to_chapter: false,
        }
    }

    /// Plain text event with no surrounding whitespace.
    pub fn text(text: &str) -> Self {
        Event::Text(TextRun {
            text: text.to_string(),
            space_before: false,
            space_after: false,
        })
    }
}

/// A normalized, non-empty text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    /// The raw run started or ended with whitespace that trimming removed.
    pub space_before: bool,
    pub space_after: bool,
}

impl TextRun {
    pub fn new(raw: &str, strip_chars: &[char]) -> Option<Self> {
        let cleaned: String = raw.chars().filter(|c| !strip_chars.contains(c)).collect();
        let text = collapse_ws(&cleaned).trim().to_string();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text,
            space_before: cleaned.starts_with(char::is_whitespace),
            space_after: cleaned.ends_with(char::is_whitespace),
        })
    }
}

fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out
}

fn html5_parse(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

fn tag_lower(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

fn attr_get(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(name))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn is_blank_text(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { contents } => contents.borrow().trim().is_empty(),
        NodeData::Comment { .. } => true,
        _ => false,
    }
}

/// First child that is not whitespace or a comment is a `b`/`strong`.
fn first_child_bold(node: &Handle) -> bool {
    let children = node.children.borrow();
    let first = children.iter().find(|c| !is_blank_text(c));
    matches!(
        first.and_then(tag_lower).as_deref(),
        Some("b") | Some("strong")
    )
}

pub fn element_attrs(node: &Handle) -> Option<ElementAttrs> {
    let tag = tag_lower(node)?;
    Some(ElementAttrs {
        tag,
        size: attr_get(node, "size"),
        style: attr_get(node, "style"),
        class: attr_get(node, "class"),
        first_child_bold: first_child_bold(node),
    })
}

fn text_content(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { .. } | NodeData::Document => {
            for c in node.children.borrow().iter() {
                text_content(c, out);
            }
        }
        _ => {}
    }
}

fn find_element(node: &Handle, name: &str) -> Option<Handle> {
    if let Some(tag) = tag_lower(node) {
        if tag == name {
            return Some(node.clone());
        }
    }
    for c in node.children.borrow().iter() {
        if let Some(x) = find_element(c, name) {
            return Some(x);
        }
    }
    None
}

fn walk(node: &Handle, profile: &Profile, events: &mut Vec<Event>) {
    let role = match &node.data {
        NodeData::Document => Role::PlainText,
        NodeData::Element { .. } => {
            let Some(attrs) = element_attrs(node) else {
                return;
            };
            classify(&attrs, profile.rules)
        }
        _ => return,
    };

    if role.owns_subtree() {
        events.push(Event::element(role));
        let mut raw = String::new();
        text_content(node, &mut raw);
        if let Some(run) = TextRun::new(&raw, profile.strip_chars) {
            events.push(Event::Text(run));
        }
        return;
    }

    if role == Role::Paragraph {
        events.push(Event::element(role));
    }

    for c in node.children.borrow().iter() {
        match &c.data {
            NodeData::Text { contents } => {
                // Unclassified elements contribute no text of their own.
                if role == Role::Unclassified {
                    continue;
                }
                if let Some(run) = TextRun::new(&contents.borrow(), profile.strip_chars) {
                    events.push(Event::Text(run));
                }
            }
            _ => walk(c, profile, events),
        }
    }
}

/// Parses an HTML export and flattens it into transducer events.
pub fn flatten_html(html: &str, profile: &Profile) -> Vec<Event> {
    let dom = html5_parse(html);
    let root = find_element(&dom.document, "body").unwrap_or_else(|| dom.document.clone());
    let mut events = Vec::new();
    walk(&root, profile, &mut events);
    mark_chapter_preludes(&mut events);
    events
}

/// Sets `leads_to_chapter` on every heading element that introduces the
/// chapter following it.
pub fn mark_chapter_preludes(events: &mut [Event]) {
    for i in 0..events.len() {
        let is_heading = matches!(&events[i], Event::Element { role, .. } if role.is_heading());
        if !is_heading {
            continue;
        }
        let leads = leads_to_chapter(events, i);
        if let Event::Element {
            leads_to_chapter, ..
        } = &mut events[i]
        {
            *leads_to_chapter = leads;
        }
    }
}

fn skip_trigger_text(events: &[Event], i: usize) -> usize {
    match events.get(i) {
        Some(Event::Text(_)) => i + 1,
        _ => i,
    }
}

fn leads_to_chapter(events: &[Event], heading: usize) -> bool {
    let mut i = skip_trigger_text(events, heading + 1);
    let mut skipped = 0;
    while let Some(event) = events.get(i) {
        match event {
            Event::Element {
                role: Role::Paragraph,
                ..
            } => i += 1,
            Event::Element {
                role: Role::Chapter,
                ..
            } => return true,
            Event::Element { role, .. } if role.is_heading() => {
                if skipped == MAX_SKIPPED_HEADINGS {
                    return false;
                }
                skipped += 1;
                i = skip_trigger_text(events, i + 1);
            }
            _ => return false,
        }
    }
    false
}
