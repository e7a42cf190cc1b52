//! Style classifier: maps one exported element to a node role.
//!
//! Word exports carry no semantic markup, so structure is recovered from
//! typography. Each export shape gets an ordered rule table; the first rule
//! whose predicates all hold decides the role.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Book,
    MajorSection,
    Section,
    ParallelReference,
    Chapter,
    Verse,
    Bold,
    Paragraph,
    PlainText,
    Unclassified,
}

impl Role {
    /// Roles that arm a flag in the transducer.
    pub fn is_waiting(self) -> bool {
        !matches!(self, Role::PlainText | Role::Unclassified)
    }

    /// Waiting roles whose whole subtree text is the trigger text.
    pub fn owns_subtree(self) -> bool {
        self.is_waiting() && self != Role::Paragraph
    }

    pub fn is_heading(self) -> bool {
        matches!(
            self,
            Role::MajorSection | Role::Section | Role::ParallelReference
        )
    }

    /// Position in the fixed evaluation order of rule tables.
    #[cfg(test)]
    fn priority(self) -> u8 {
        match self {
            Role::Book => 0,
            Role::MajorSection => 1,
            Role::Section => 2,
            Role::ParallelReference => 3,
            Role::Chapter => 4,
            Role::Bold => 5,
            Role::Paragraph => 6,
            Role::Verse => 7,
            Role::PlainText => 8,
            Role::Unclassified => 9,
        }
    }
}

/// The attributes of one element that classification looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttrs {
    /// Lowercased local name.
    pub tag: String,
    pub size: Option<String>,
    pub style: Option<String>,
    pub class: Option<String>,
    pub first_child_bold: bool,
}

#[cfg(test)]
impl ElementAttrs {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    fn with_size(mut self, size: &str) -> Self {
        self.size = Some(size.to_string());
        self
    }

    fn with_style(mut self, style: &str) -> Self {
        self.style = Some(style.to_string());
        self
    }

    fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    fn with_bold_child(mut self) -> Self {
        self.first_child_bold = true;
        self
    }
}

/// One row of a rule table. `None` predicates match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRule {
    pub role: Role,
    pub tag: Option<&'static str>,
    pub size: Option<&'static str>,
    pub style_contains: Option<&'static str>,
    pub class: Option<&'static str>,
    pub bold_child: Option<bool>,
}

impl StyleRule {
    const fn new(role: Role) -> Self {
        Self {
            role,
            tag: None,
            size: None,
            style_contains: None,
            class: None,
            bold_child: None,
        }
    }

    const fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    const fn size(mut self, size: &'static str) -> Self {
        self.size = Some(size);
        self
    }

    const fn style(mut self, needle: &'static str) -> Self {
        self.style_contains = Some(needle);
        self
    }

    const fn class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    const fn bold_child(mut self, bold: bool) -> Self {
        self.bold_child = Some(bold);
        self
    }

    pub fn matches(&self, attrs: &ElementAttrs) -> bool {
        if let Some(tag) = self.tag {
            if !attrs.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(size) = self.size {
            if attrs.size.as_deref().map(str::trim) != Some(size) {
                return false;
            }
        }
        if let Some(needle) = self.style_contains {
            let Some(style) = attrs.style.as_deref() else {
                return false;
            };
            if !compact_style(style).contains(needle) {
                return false;
            }
        }
        if let Some(class) = self.class {
            let Some(classes) = attrs.class.as_deref() else {
                return false;
            };
            if !classes.split_whitespace().any(|c| c == class) {
                return false;
            }
        }
        if let Some(bold) = self.bold_child {
            if attrs.first_child_bold != bold {
                return false;
            }
        }
        true
    }
}

/// Lowercase and strip whitespace so `font-size: 20pt` and `font-size:20pt`
/// compare equal.
fn compact_style(style: &str) -> String {
    style
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn classify(attrs: &ElementAttrs, rules: &[StyleRule]) -> Role {
    rules
        .iter()
        .find(|rule| rule.matches(attrs))
        .map(|rule| rule.role)
        .unwrap_or(Role::Unclassified)
}

/// Legacy export where every run sits in a `<font size=.. style=..>`.
pub const FONT_EXPORT_RULES: &[StyleRule] = &[
    StyleRule::new(Role::Book).tag("font").size("6").bold_child(true),
    StyleRule::new(Role::MajorSection).tag("font").size("5").bold_child(true),
    StyleRule::new(Role::Section).tag("font").size("4").bold_child(true),
    StyleRule::new(Role::ParallelReference)
        .tag("font")
        .size("3")
        .style("font-style:italic"),
    StyleRule::new(Role::Chapter).tag("font").size("6").bold_child(false),
    StyleRule::new(Role::Bold).tag("b"),
    StyleRule::new(Role::Paragraph).tag("p"),
    StyleRule::new(Role::Verse).tag("font").size("1"),
    StyleRule::new(Role::Verse)
        .tag("font")
        .style("vertical-align:super"),
    StyleRule::new(Role::PlainText).tag("font"),
    StyleRule::new(Role::PlainText).tag("span"),
    StyleRule::new(Role::PlainText).tag("i"),
    StyleRule::new(Role::PlainText).tag("u"),
    StyleRule::new(Role::PlainText).tag("a"),
    StyleRule::new(Role::PlainText).tag("div"),
    StyleRule::new(Role::PlainText).tag("body"),
];

/// Word export that keeps paragraph and character style names as classes.
pub const CLASS_EXPORT_RULES: &[StyleRule] = &[
    StyleRule::new(Role::Book).class("Kirjannimi"),
    StyleRule::new(Role::MajorSection).class("Vliotsikko2"),
    StyleRule::new(Role::Section).class("Vliotsikko3"),
    StyleRule::new(Role::Section).class("Vliotsikko3synoptinen"),
    StyleRule::new(Role::Section).class("Vliotsikko3synoptineneo"),
    StyleRule::new(Role::ParallelReference).class("Synoptinenviite"),
    StyleRule::new(Role::Chapter).class("Lukunumero"),
    StyleRule::new(Role::Paragraph).tag("p").class("MsoBodyText"),
    StyleRule::new(Role::Verse).class("Jaenumero"),
    StyleRule::new(Role::PlainText).tag("span"),
    StyleRule::new(Role::PlainText).tag("p"),
    StyleRule::new(Role::PlainText).tag("div"),
    StyleRule::new(Role::PlainText).tag("body"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: &str) -> ElementAttrs {
        ElementAttrs::new("FONT").with_size(size)
    }

    #[test]
    fn font_export_headings_need_bold_child() {
        let rules = FONT_EXPORT_RULES;
        assert_eq!(classify(&font("6").with_bold_child(), rules), Role::Book);
        assert_eq!(classify(&font("6"), rules), Role::Chapter);
        assert_eq!(
            classify(&font("5").with_bold_child(), rules),
            Role::MajorSection
        );
        assert_eq!(classify(&font("4").with_bold_child(), rules), Role::Section);
        assert_eq!(classify(&font("4"), rules), Role::PlainText);
    }

    #[test]
    fn style_substring_ignores_spacing_and_case() {
        let attrs = font("3").with_style("FONT-STYLE: italic; color: #333");
        assert_eq!(
            classify(&attrs, FONT_EXPORT_RULES),
            Role::ParallelReference
        );
        let sup = ElementAttrs::new("font").with_style("vertical-align: super");
        assert_eq!(classify(&sup, FONT_EXPORT_RULES), Role::Verse);
    }

    #[test]
    fn tags_are_case_insensitive() {
        assert_eq!(
            classify(&ElementAttrs::new("P"), FONT_EXPORT_RULES),
            Role::Paragraph
        );
        assert_eq!(
            classify(&ElementAttrs::new("B"), FONT_EXPORT_RULES),
            Role::Bold
        );
        assert_eq!(classify(&font("1"), FONT_EXPORT_RULES), Role::Verse);
    }

    #[test]
    fn unknown_elements_are_unclassified() {
        for tag in ["title", "style", "script", "o:p", "td"] {
            assert_eq!(
                classify(&ElementAttrs::new(tag), FONT_EXPORT_RULES),
                Role::Unclassified,
                "{tag}"
            );
        }
    }

    #[test]
    fn class_tokens_match_whole_words() {
        let rules = CLASS_EXPORT_RULES;
        let verse = ElementAttrs::new("span").with_class("Jaenumero");
        assert_eq!(classify(&verse, rules), Role::Verse);
        let body = ElementAttrs::new("p").with_class("MsoBodyText");
        assert_eq!(classify(&body, rules), Role::Paragraph);
        let synoptic = ElementAttrs::new("p").with_class("Vliotsikko3synoptinen");
        assert_eq!(classify(&synoptic, rules), Role::Section);
        let prefix = ElementAttrs::new("span").with_class("Jaenumero2");
        assert_eq!(classify(&prefix, rules), Role::PlainText);
    }

    #[test]
    fn rule_tables_follow_priority_order() {
        for rules in [FONT_EXPORT_RULES, CLASS_EXPORT_RULES] {
            let ranks: Vec<u8> = rules.iter().map(|r| r.role.priority()).collect();
            let mut sorted = ranks.clone();
            sorted.sort_unstable();
            assert_eq!(ranks, sorted);
        }
    }

    #[test]
    fn classification_is_repeatable() {
        let attrs = font("6").with_bold_child().with_style("color:red");
        let first = classify(&attrs, FONT_EXPORT_RULES);
        for _ in 0..10 {
            assert_eq!(classify(&attrs, FONT_EXPORT_RULES), first);
        }
    }
}
