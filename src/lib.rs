//! Converts a Word-exported HTML New Testament into OSIS XML.
//!
//! The export carries no semantic markup, so structure is recovered from
//! typography in two passes: [`flatten`] turns the DOM into role-tagged
//! events and [`transducer`] replays them into an [`osis`] element tree.

pub mod classify;
pub mod flatten;
pub mod osis;
pub mod profile;
pub mod transducer;

use anyhow::{bail, Result};
use log::info;

pub use crate::profile::{Profile, ProfileKind, Translation};
pub use crate::transducer::ConversionStats;

#[derive(Debug, Clone)]
pub struct Conversion {
    pub xml: String,
    pub stats: ConversionStats,
}

pub fn convert_html(html: &str, profile: &Profile) -> Result<Conversion> {
    if html.trim().is_empty() {
        bail!("empty html");
    }
    let events = flatten::flatten_html(html, profile);
    let (root, stats) = transducer::Transducer::run(profile, &events);
    if stats.books == 0 {
        bail!("no books produced from input");
    }
    info!(
        "converted {} books, {} chapters, {} verses ({} paragraphs, {} headings)",
        stats.books, stats.chapters, stats.verses, stats.paragraphs, stats.headings
    );
    Ok(Conversion {
        xml: osis::serialize_document(&root),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATTHEW_HEAD: &str = concat!(
        r#"<p><font size="6"><b>MATTEUKSEN EVANKELIUMI</b></font></p>"#,
        r#"<p><font size="6">1</font></p>"#
    );

    fn font_export(body: &str) -> String {
        let html = format!("<html><body>{MATTHEW_HEAD}{body}</body></html>");
        convert_html(&html, &Profile::font_export())
            .expect("convert")
            .xml
    }

    #[test]
    fn first_verse_lands_in_matthew_1() {
        let xml = font_export(r#"<p><font size="1">1</font>In the beginning</p>"#);
        assert!(xml.contains(concat!(
            r#"<div type="book" osisID="Matt" canonical="true">"#,
            r#"<title type="main">MATTEUKSEN EVANKELIUMI</title>"#,
            r#"<chapter sID="Matt.1" osisID="Matt.1"/>"#,
            r#"<p><verse sID="Matt.1.1" osisID="Matt.1.1"/>"#,
            r#"In the beginning<verse eID="Matt.1.1"/></p>"#,
            r#"<chapter eID="Matt.1"/></div>"#
        )));
    }

    #[test]
    fn major_section_before_chapter_number_moves_into_that_chapter() {
        let xml = font_export(concat!(
            r#"<p><font size="1">1</font> <font>Alussa oli</font></p>"#,
            r#"<div><font size="5"><b>Jeesuksen syntymä</b></font>"#,
            r#"<p><font size="6">2</font></p></div>"#,
            r#"<p><font size="1">1</font> Kun Jeesus</p>"#
        ));
        assert!(xml.contains(concat!(
            r#"Alussa oli</p><verse eID="Matt.1.1"/><chapter eID="Matt.1"/>"#,
            r#"<chapter sID="Matt.2" osisID="Matt.2"/>"#,
            r#"<div type="majorSection"><title>Jeesuksen syntymä</title></div>"#,
            r#"<p><verse sID="Matt.2.1" osisID="Matt.2.1"/>Kun Jeesus"#
        )));
    }

    #[test]
    fn empty_paragraph_boundaries_leave_no_p() {
        let html = format!("<body>{MATTHEW_HEAD}<p></p><p>  </p></body>");
        let conversion = convert_html(&html, &Profile::font_export()).expect("convert");
        assert!(!conversion.xml.contains("<p"));
        assert_eq!(conversion.stats.paragraphs, 0);
        assert_eq!(conversion.stats.chapters, 1);
    }

    #[test]
    fn parallel_reference_nests_in_section_before_chapter() {
        let html = concat!(
            r#"<body><p><font size="6"><b>MATTEUKSEN EVANKELIUMI</b></font></p>"#,
            r#"<p><font size="4"><b>Vuorisaarna</b></font></p>"#,
            r#"<p><font size="3" style="font-style: italic">Luuk. 6:20-23</font></p>"#,
            r#"<p><font size="6">1</font></p>"#,
            r#"<p><font size="1">1</font>Nähdessään kansanjoukot</p></body>"#
        );
        let xml = convert_html(html, &Profile::font_export())
            .expect("convert")
            .xml;
        assert!(xml.contains(concat!(
            r#"<chapter sID="Matt.1" osisID="Matt.1"/>"#,
            r#"<div type="section"><title>Vuorisaarna</title>"#,
            r#"<title type="parallel">Luuk. 6:20-23</title></div>"#,
            r#"<p><verse sID="Matt.1.1" osisID="Matt.1.1"/>Nähdessään"#
        )));
    }

    #[test]
    fn bold_words_keep_their_spacing() {
        let xml = font_export(r#"<p><font size="1">3</font>Jeesus sanoi: <b>Autuaita</b> ovat</p>"#);
        assert!(xml.contains(r#"osisID="Matt.1.1"/>Jeesus sanoi: <b>Autuaita</b> ovat"#));
    }

    #[test]
    fn word_space_survives_next_verse_number() {
        let xml = font_export(
            r#"<p><font size="1">1</font>Alussa oli Sana. <font size="1">2</font>Hän oli</p>"#,
        );
        assert!(xml.contains(concat!(
            r#"Alussa oli Sana.<verse eID="Matt.1.1"/>"#,
            r#"<verse sID="Matt.1.2" osisID="Matt.1.2"/> Hän oli"#
        )));
    }

    #[test]
    fn class_export_reads_style_names() {
        let html = concat!(
            r#"<html><head><title>FinUT</title></head><body>"#,
            r#"<p class="Kirjannimi">MATTEUKSEN EVANKELIUMI</p>"#,
            r#"<p class="MsoBodyText">Johdanto ilman jaetta</p>"#,
            r#"<p class="Lukunumero">1</p>"#,
            r#"<p class="MsoBodyText"><span class="Jaenumero">1</span>Jeesuksen_ Kristuksen</p>"#,
            "</body></html>"
        );
        let conversion = convert_html(html, &Profile::class_export()).expect("convert");
        let xml = conversion.xml;
        assert!(!xml.contains("FinUT<"));
        assert!(!xml.contains("Johdanto"));
        assert!(xml.contains(concat!(
            r#"<p><verse sID="Matt.1.1" osisID="Matt.1.1"/>"#,
            r#"Jeesuksen Kristuksen<verse eID="Matt.1.1"/></p>"#
        )));
        assert_eq!(conversion.stats.verses, 1);
    }

    #[test]
    fn blank_input_is_an_error() {
        let err = convert_html(" \n ", &Profile::font_export()).unwrap_err();
        assert_eq!(err.to_string(), "empty html");
    }

    #[test]
    fn input_without_books_is_an_error() {
        let err = convert_html("<p>Sisällys</p>", &Profile::font_export()).unwrap_err();
        assert_eq!(err.to_string(), "no books produced from input");
    }
}
