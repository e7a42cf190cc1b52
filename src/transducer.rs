//! Second pass: the stateful event-to-OSIS transducer.
//!
//! Element events arm a flag; the next text event fires the highest-priority
//! armed flag and disarms it. All scope bookkeeping lives in
//! [`TransducerState`] so single transitions can be checked without a DOM.

use log::{debug, warn};

use crate::classify::Role;
use crate::flatten::{Event, TextRun};
use crate::osis::{
    chapter_end, chapter_start, parallel_title, titled_div, verse_end, verse_start, Element,
    OsisBuilder,
};
use crate::profile::{book_osis_id, HeadingPlacement, Profile, NT_BOOKS};

/// Fixed identifier for the verse the export prints at the head of John 8.
pub const JOHN_7_53: &str = "John.7.53";
const JOHN_ORDINAL: usize = 4;
const JOHN_7_53_CHAPTER: u32 = 8;

/// Latches set by element events. Heading latches carry the lookahead
/// result of the element that armed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Armed {
    pub book: bool,
    pub major_section: Option<bool>,
    pub section: Option<bool>,
    pub parallel: Option<bool>,
    pub chapter: bool,
    pub verse: bool,
    pub bold: bool,
}

/// Titles waiting for the chapter (or verse) they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pending {
    pub major_section: Option<String>,
    pub section: Option<String>,
    pub parallel: Option<String>,
}

impl Pending {
    pub fn is_empty(&self) -> bool {
        self.major_section.is_none() && self.section.is_none() && self.parallel.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransducerState {
    pub armed: Armed,
    pub pending: Pending,
    /// 1-based ordinal of the current (or last) book; 0 before the first.
    pub book: usize,
    pub book_open: bool,
    pub chapter: u32,
    pub chapter_open: bool,
    pub verse: u32,
    /// Identifier of the open verse milestone.
    pub open_verse: Option<String>,
    pub paragraph_open: bool,
    /// The last inserted run ended in whitespace.
    pub trailing_space: bool,
    pub john_7_53_done: bool,
    /// A book title past the last canonical book was seen; everything after
    /// it is ignored.
    pub past_canon: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub books: usize,
    pub chapters: usize,
    pub verses: usize,
    pub paragraphs: usize,
    pub headings: usize,
}

pub struct Transducer<'p> {
    profile: &'p Profile,
    state: TransducerState,
    out: OsisBuilder,
    stats: ConversionStats,
}

impl<'p> Transducer<'p> {
    pub fn new(profile: &'p Profile) -> Self {
        Self {
            profile,
            state: TransducerState::default(),
            out: OsisBuilder::new(&profile.translation),
            stats: ConversionStats::default(),
        }
    }

    #[cfg(test)]
    fn state(&self) -> &TransducerState {
        &self.state
    }

    pub fn run(profile: &'p Profile, events: &[Event]) -> (Element, ConversionStats) {
        let mut transducer = Self::new(profile);
        for event in events {
            transducer.step(event);
        }
        transducer.finish()
    }

    pub fn step(&mut self, event: &Event) {
        match event {
            Event::Element {
                role,
                leads_to_chapter,
            } => self.arm(*role, *leads_to_chapter),
            Event::Text(run) => self.fire(run),
        }
    }

    fn arm(&mut self, role: Role, leads_to_chapter: bool) {
        if role == Role::Paragraph {
            self.close_paragraph();
            return;
        }
        let armed = &mut self.state.armed;
        match role {
            Role::Book => armed.book = true,
            Role::MajorSection => armed.major_section = Some(leads_to_chapter),
            Role::Section => armed.section = Some(leads_to_chapter),
            Role::ParallelReference => armed.parallel = Some(leads_to_chapter),
            Role::Chapter => armed.chapter = true,
            Role::Verse => armed.verse = true,
            Role::Bold => armed.bold = true,
            Role::Paragraph | Role::PlainText | Role::Unclassified => {}
        }
    }

    fn fire(&mut self, run: &TextRun) {
        let text = run.text.as_str();
        if std::mem::take(&mut self.state.armed.book) {
            self.open_book(text);
        } else if let Some(leads) = self.state.armed.major_section.take() {
            self.heading(Role::MajorSection, text, leads);
        } else if let Some(leads) = self.state.armed.section.take() {
            self.heading(Role::Section, text, leads);
        } else if let Some(leads) = self.state.armed.parallel.take() {
            self.parallel_reference(text, leads);
        } else if std::mem::take(&mut self.state.armed.chapter) {
            self.chapter();
        } else if std::mem::take(&mut self.state.armed.verse) {
            self.verse();
        } else if std::mem::take(&mut self.state.armed.bold) {
            self.bold(run);
        } else {
            self.plain(run);
        }
    }

    pub fn finish(mut self) -> (Element, ConversionStats) {
        self.close_verse();
        self.close_paragraph();
        self.close_chapter();
        self.close_book();
        let pending = std::mem::take(&mut self.state.pending);
        if !pending.is_empty() {
            warn!("dropping titles with no chapter or verse after them: {pending:?}");
        }
        (self.out.finish(), self.stats)
    }

    fn book_id(&self) -> &'static str {
        book_osis_id(self.state.book).unwrap_or("")
    }

    fn chapter_id(&self) -> String {
        format!("{}.{}", self.book_id(), self.state.chapter)
    }

    fn open_book(&mut self, title: &str) {
        if self.state.past_canon {
            debug!("book title {title:?} past the canon; ignored");
            return;
        }
        self.close_verse();
        self.close_paragraph();
        self.close_chapter();
        self.close_book();

        let ordinal = self.state.book + 1;
        let Some(id) = book_osis_id(ordinal) else {
            warn!(
                "book title {title:?} past the {} canonical books; ignoring the rest of the input",
                NT_BOOKS.len()
            );
            self.state.past_canon = true;
            return;
        };

        self.state.book = ordinal;
        self.state.book_open = true;
        self.state.chapter = 0;
        self.out.open(
            Element::new("div")
                .attr("type", "book")
                .attr("osisID", id)
                .attr("canonical", "true")
                .child(Element::new("title").attr("type", "main").text(title)),
        );
        self.stats.books += 1;
        debug!("book {id}: {title}");
    }

    fn close_book(&mut self) {
        if self.state.book_open {
            self.out.close();
            self.state.book_open = false;
            self.state.chapter = 0;
        }
    }

    fn chapter(&mut self) {
        if !self.state.book_open {
            debug!("chapter number outside a book; ignored");
            return;
        }
        self.close_verse();
        self.close_paragraph();
        self.close_chapter();
        self.open_chapter();
    }

    fn open_chapter(&mut self) {
        self.close_paragraph();
        self.state.chapter += 1;
        self.state.chapter_open = true;
        self.state.verse = 0;
        let id = self.chapter_id();
        self.out.push(chapter_start(&id));
        self.stats.chapters += 1;
        debug!("chapter {id}");
        self.flush_pending();
    }

    fn close_chapter(&mut self) {
        if self.state.chapter_open {
            let id = self.chapter_id();
            self.out.push(chapter_end(&id));
            self.state.chapter_open = false;
            self.state.verse = 0;
        }
    }

    fn is_john_7_53(&self) -> bool {
        self.profile.john_7_53_in_chapter_8
            && !self.state.john_7_53_done
            && self.state.book == JOHN_ORDINAL
            && self.state.chapter == JOHN_7_53_CHAPTER
            && self.state.verse == 0
    }

    fn verse(&mut self) {
        if !self.state.book_open {
            debug!("verse number outside a book; ignored");
            return;
        }
        // Single-chapter books have no chapter number.
        if !self.state.chapter_open {
            self.open_chapter();
        }
        self.close_verse();
        if self.profile.flush_pending_on_verse {
            self.flush_pending();
        }
        let id = if self.is_john_7_53() {
            self.state.john_7_53_done = true;
            JOHN_7_53.to_string()
        } else {
            self.state.verse += 1;
            format!("{}.{}", self.chapter_id(), self.state.verse)
        };
        // The verse starts inside the paragraph its text goes to.
        self.open_paragraph();
        self.out.push(verse_start(&id));
        self.state.open_verse = Some(id);
        self.stats.verses += 1;
    }

    fn close_verse(&mut self) {
        if let Some(id) = self.state.open_verse.take() {
            self.out.push(verse_end(&id));
        }
    }

    fn open_paragraph(&mut self) {
        if !self.state.paragraph_open {
            self.out.open(Element::new("p"));
            self.state.paragraph_open = true;
            self.state.trailing_space = false;
        }
    }

    fn close_paragraph(&mut self) {
        if self.state.paragraph_open {
            if self.out.close() {
                self.stats.paragraphs += 1;
            }
            self.state.paragraph_open = false;
            self.state.trailing_space = false;
        }
    }

    fn defers_heading(&self, leads_to_chapter: bool) -> bool {
        self.profile.heading_placement == HeadingPlacement::Deferred
            || !self.state.chapter_open
            || leads_to_chapter
    }

    fn heading(&mut self, role: Role, text: &str, leads_to_chapter: bool) {
        if !self.state.book_open {
            debug!("heading {text:?} outside a book; ignored");
            return;
        }
        if self.profile.close_verse_on_heading {
            self.close_verse();
        }
        self.close_paragraph();

        let defer = self.defers_heading(leads_to_chapter);
        match role {
            Role::MajorSection => {
                if defer {
                    if self.state.pending.major_section.is_some() {
                        self.flush_pending();
                    }
                    self.state.pending.major_section = Some(text.to_string());
                } else {
                    self.flush_pending();
                    self.emit_title_div("majorSection", text);
                }
            }
            _ => {
                if defer || self.state.pending.major_section.is_some() {
                    if self.state.pending.section.is_some() {
                        self.flush_pending();
                    }
                    self.state.pending.section = Some(text.to_string());
                } else {
                    self.emit_title_div("section", text);
                }
            }
        }
    }

    fn parallel_reference(&mut self, text: &str, leads_to_chapter: bool) {
        if !self.state.book_open {
            debug!("parallel reference {text:?} outside a book; ignored");
            return;
        }
        let pending = &self.state.pending;
        let defer = self.defers_heading(leads_to_chapter)
            || pending.section.is_some()
            || pending.major_section.is_some();
        if defer {
            if self.state.pending.parallel.is_some() {
                self.flush_pending();
            }
            self.state.pending.parallel = Some(text.to_string());
        } else {
            self.nest_parallel(text);
        }
    }

    fn emit_title_div(&mut self, div_type: &'static str, text: &str) {
        self.out.push(titled_div(div_type, text));
        self.stats.headings += 1;
    }

    fn nest_parallel(&mut self, text: &str) {
        if !self.out.nest_in_last_section(parallel_title(text)) {
            warn!("parallel reference {text:?} has no section to attach to; dropped");
        }
    }

    /// Emits queued titles: major section, then section, then the parallel
    /// reference nested in that section.
    fn flush_pending(&mut self) {
        if self.state.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.state.pending);
        self.close_paragraph();
        if let Some(text) = pending.major_section {
            self.emit_title_div("majorSection", &text);
        }
        if let Some(text) = pending.section {
            self.emit_title_div("section", &text);
        }
        if let Some(text) = pending.parallel {
            self.nest_parallel(&text);
        }
    }

    fn bold(&mut self, run: &TextRun) {
        if self.state.open_verse.is_none() {
            debug!("bold run {:?} outside a verse; ignored", run.text);
            return;
        }
        if self.profile.flush_pending_on_verse {
            self.flush_pending();
        }
        self.open_paragraph();
        let separate = run.space_before || self.state.trailing_space;
        self.out
            .push_inline(Element::new("b").text(run.text.as_str()), separate);
        self.state.trailing_space = run.space_after;
    }

    fn plain(&mut self, run: &TextRun) {
        if !self.state.book_open {
            return;
        }
        if self.profile.text_requires_verse && self.state.open_verse.is_none() {
            return;
        }
        self.open_paragraph();
        let separate = run.space_before || self.state.trailing_space;
        self.out.push_text(&run.text, separate);
        self.state.trailing_space = run.space_after;
    }
}
