//! OSIS output tree, its builder, and serialization.

use crate::profile::Translation;

const OSIS_NS: &str = "http://www.bibletechnologies.net/2003/OSIS/namespace";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const OSIS_SCHEMA: &str = "http://www.bibletechnologies.net/osisCore.2.1.1.xsd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsisNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<OsisNode>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(OsisNode::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(OsisNode::Text(text.into()));
        self
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_div(&self, div_type: &str) -> bool {
        self.tag == "div" && self.attr_value("type") == Some(div_type)
    }

    /// At least one non-whitespace character or one child element.
    pub fn has_content(&self) -> bool {
        self.children.iter().any(|c| match c {
            OsisNode::Element(_) => true,
            OsisNode::Text(t) => !t.trim().is_empty(),
        })
    }

    /// The last inline content, looking past chapter and verse milestones,
    /// would run into the next word without a space.
    fn needs_separator(&self) -> bool {
        let last = self.children.iter().rev().find(|c| {
            !matches!(c, OsisNode::Element(e) if e.tag == "verse" || e.tag == "chapter")
        });
        match last {
            Some(OsisNode::Text(t)) => !t.ends_with(char::is_whitespace),
            Some(OsisNode::Element(e)) => e.tag == "b",
            None => false,
        }
    }

    /// Depth-first iterator over this element and all descendant elements.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        for c in &self.children {
            if let OsisNode::Element(e) = c {
                out.extend(e.descendants());
            }
        }
        out
    }
}

pub fn chapter_start(osis_id: &str) -> Element {
    Element::new("chapter")
        .attr("sID", osis_id)
        .attr("osisID", osis_id)
}

pub fn chapter_end(osis_id: &str) -> Element {
    Element::new("chapter").attr("eID", osis_id)
}

pub fn verse_start(osis_id: &str) -> Element {
    Element::new("verse").attr("sID", osis_id).attr("osisID", osis_id)
}

pub fn verse_end(osis_id: &str) -> Element {
    Element::new("verse").attr("eID", osis_id)
}

pub fn titled_div(div_type: &'static str, title: &str) -> Element {
    Element::new("div")
        .attr("type", div_type)
        .child(Element::new("title").text(title))
}

pub fn parallel_title(text: &str) -> Element {
    Element::new("title").attr("type", "parallel").text(text)
}

/// Builds the document through a stack of open elements. The bottom of the
/// stack is always the `osis` root; `finish` folds everything back into it.
#[derive(Debug)]
pub struct OsisBuilder {
    stack: Vec<Element>,
}

impl OsisBuilder {
    pub fn new(translation: &Translation) -> Self {
        let root = Element::new("osis")
            .attr("xmlns", OSIS_NS)
            .attr("xmlns:xsi", XSI_NS)
            .attr("xsi:schemaLocation", format!("{OSIS_NS} {OSIS_SCHEMA}"));

        let text = Element::new("osisText")
            .attr("osisIDWork", translation.code)
            .attr("osisRefWork", "bible")
            .attr("xml:lang", translation.language)
            .attr("canonical", "true")
            .child(
                Element::new("header").child(
                    Element::new("work")
                        .attr("osisWork", translation.code)
                        .child(Element::new("title").text(translation.title))
                        .child(
                            Element::new("refSystem")
                                .text(format!("Bible.{}", translation.ref_system)),
                        ),
                ),
            );

        let mut book_group = Element::new("div").attr("type", "bookGroup");
        if let Some(title) = translation.book_group_title {
            book_group = book_group.child(Element::new("title").text(title));
        }

        Self {
            stack: vec![root, text, book_group],
        }
    }

    fn top_mut(&mut self) -> &mut Element {
        // The root is never popped before `finish`.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    #[cfg(test)]
    fn top_tag(&self) -> &'static str {
        self.stack.last().map(|e| e.tag).unwrap_or("")
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn open(&mut self, element: Element) {
        self.stack.push(element);
    }

    /// Pops the innermost element into its parent. A `p` without content is
    /// dropped instead. Returns whether the element was kept.
    pub fn close(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        let Some(element) = self.stack.pop() else {
            return false;
        };
        if element.tag == "p" && !element.has_content() {
            return false;
        }
        self.top_mut().children.push(OsisNode::Element(element));
        true
    }

    pub fn push(&mut self, element: Element) {
        self.top_mut().children.push(OsisNode::Element(element));
    }

    /// Appends a text run. `separate` asks for a word space between this run
    /// and preceding inline content.
    pub fn push_text(&mut self, text: &str, separate: bool) {
        let top = self.top_mut();
        let space = separate && top.needs_separator();
        if let Some(OsisNode::Text(prev)) = top.children.last_mut() {
            if space {
                prev.push(' ');
            }
            prev.push_str(text);
            return;
        }
        let mut run = String::with_capacity(text.len() + 1);
        if space {
            run.push(' ');
        }
        run.push_str(text);
        top.children.push(OsisNode::Text(run));
    }

    pub fn push_inline(&mut self, element: Element, separate: bool) {
        if separate && self.top_mut().needs_separator() {
            self.push_text(" ", false);
        }
        self.push(element);
    }

    /// Nests a parallel-reference title into the most recent section of the
    /// current container. Returns false when there is no such section.
    pub fn nest_in_last_section(&mut self, title: Element) -> bool {
        let top = self.top_mut();
        let section = top.children.iter_mut().rev().find_map(|c| match c {
            OsisNode::Element(e) if e.is_div("section") => Some(e),
            _ => None,
        });
        match section {
            Some(section) => {
                section.children.push(OsisNode::Element(title));
                true
            }
            None => false,
        }
    }

    pub fn finish(mut self) -> Element {
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack.pop().unwrap_or_else(|| Element::new("osis"))
    }
}

fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn xml_escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn serialize_node(out: &mut String, node: &OsisNode) {
    match node {
        OsisNode::Text(t) => out.push_str(&xml_escape_text(t)),
        OsisNode::Element(e) => serialize_element(out, e),
    }
}

fn serialize_element(out: &mut String, e: &Element) {
    out.push('<');
    out.push_str(e.tag);
    for (k, v) in &e.attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&xml_escape_attr(v));
        out.push('"');
    }
    if e.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for c in &e.children {
        serialize_node(out, c);
    }
    out.push_str("</");
    out.push_str(e.tag);
    out.push('>');
}

pub fn serialize_document(root: &Element) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    serialize_element(&mut out, root);
    out
}
