//! The citation pass: number a page's citation markers and append the
//! reference list for the works they cite.
//!
//! The pass works on any [`CitationDocument`]. [`scanner`] numbers the
//! markers in first-occurrence order and [`assembler`] asks a
//! [`Formatter`](formatter::Formatter) for the entries and appends them.

pub mod assembler;
pub mod formatter;
pub mod scanner;

use crate::library::Library;
use ansi_term::Color;
use formatter::Formatter;
use scanner::CitationIndex;
use slog::{debug, error, o};
use std::fmt;

/// A citation marker found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationMarker<H> {
    /// The document's handle for the marker element.
    pub handle: H,
    /// The citation key read from the marker.
    pub key: String,
}

/// A reference entry ready to be appended to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub index: usize,
    pub key: String,
    pub anchor: String,
    pub markup: String,
}

/// A document the citation pass can read markers from and write to.
pub trait CitationDocument {
    type Handle: Copy;

    /// Every citation marker in document order.
    fn find_markers(&self) -> Vec<CitationMarker<Self::Handle>>;

    /// Replace the text of the marker's display slot.
    fn set_marker_text(&mut self, marker: &CitationMarker<Self::Handle>, text: &str);

    /// Replace the marker's display slot with a link to `anchor`.
    fn set_marker_link(
        &mut self,
        marker: &CitationMarker<Self::Handle>,
        text: &str,
        _anchor: &str,
    ) {
        self.set_marker_text(marker, text);
    }

    /// Append a heading and the reference list to the main content region.
    ///
    /// Nothing may be attached unless every entry can be.
    fn append_section(
        &mut self,
        heading: &str,
        entries: &[ReferenceEntry],
    ) -> Result<(), AssemblyError>;
}

/// Faults that abort a page's reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// A cited key has no record in the library.
    MissingRecord(String),
    /// The formatter failed or returned malformed entries.
    Formatter(String),
    /// The page has no element with the content class.
    MissingContainer(String),
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::MissingRecord(key) => {
                write!(f, "no library record for the citation key {}", key)
            }
            AssemblyError::Formatter(message) => write!(f, "formatter error—{}", message),
            AssemblyError::MissingContainer(class) => write!(
                f,
                "the page has no element with the class {} to append the bibliography to",
                class
            ),
        }
    }
}

impl std::error::Error for AssemblyError {}

/// Where a page's citation pass ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Scanned,
    Assembled,
    Skipped,
}

/// The outcome of a page's citation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub state: PassState,
    pub index: CitationIndex,
    pub fault: Option<AssemblyError>,
}

/// The anchor id of a key's reference entry.
///
/// `%`, whitespace, and control characters are percent-encoded, so distinct
/// keys always get distinct anchors.
pub fn anchor_id(key: &str) -> String {
    let mut anchor = String::with_capacity(key.len() + 5);
    anchor.push_str("cite-");

    for c in key.chars() {
        if c == '%' || c.is_whitespace() || c.is_control() {
            let mut buffer = [0; 4];
            for byte in c.encode_utf8(&mut buffer).bytes() {
                anchor.push_str(&format!("%{:02X}", byte));
            }
        } else {
            anchor.push(c);
        }
    }

    anchor
}

/// Run the citation pass over a document.
///
/// Marker numbers are set even when assembling the reference list fails. The
/// failure is returned in the report.
pub fn bibliography<D: CitationDocument>(
    document: &mut D,
    library: &Library,
    formatter: &dyn Formatter,
    heading: &str,
    link: bool,
) -> PassReport {
    let mut report = PassReport {
        state: PassState::Idle,
        index: CitationIndex::default(),
        fault: None,
    };

    let markers = document.find_markers();
    report.index = slog_scope::scope(&slog_scope::logger().new(o!("fn" => "scan()")), || {
        scanner::scan(&markers)
    });
    slog_scope::scope(
        &slog_scope::logger().new(o!("fn" => "number_markers()")),
        || scanner::number_markers(document, &markers, &report.index, link),
    );
    report.state = PassState::Scanned;

    match slog_scope::scope(&slog_scope::logger().new(o!("fn" => "assemble()")), || {
        assembler::assemble(document, &report.index, library, formatter, heading)
    }) {
        Ok(state) => report.state = state,
        Err(e) => {
            error!(slog_scope::logger(), "Bibliography error: {}", e);
            eprintln!("{} Bibliography error: {}", Color::Red.paint("ERRO"), e);
            report.fault = Some(e);
        }
    }

    debug!(
        slog_scope::logger(),
        "Citation pass ended {:?} with {} cited works",
        report.state,
        report.index.len()
    );
    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::formatter::{BibStyle, HtmlFormatter};
    use super::*;
    use crate::library::{build_library, LibraryFormat};

    pub(crate) fn markers(keys: &[&str]) -> Vec<CitationMarker<usize>> {
        keys.iter()
            .enumerate()
            .map(|(handle, key)| CitationMarker {
                handle,
                key: key.to_string(),
            })
            .collect()
    }

    /// A document that records what the pass does to it.
    pub(crate) struct MockDocument {
        pub keys: Vec<String>,
        pub texts: Vec<String>,
        pub links: Vec<String>,
        pub sections: Vec<(String, Vec<ReferenceEntry>)>,
        pub container: bool,
    }

    impl MockDocument {
        pub(crate) fn new(keys: &[&str]) -> MockDocument {
            MockDocument {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                texts: vec![String::new(); keys.len()],
                links: vec![String::new(); keys.len()],
                sections: Vec::new(),
                container: true,
            }
        }
    }

    impl CitationDocument for MockDocument {
        type Handle = usize;

        fn find_markers(&self) -> Vec<CitationMarker<usize>> {
            let keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
            markers(&keys)
        }

        fn set_marker_text(&mut self, marker: &CitationMarker<usize>, text: &str) {
            self.texts[marker.handle] = text.to_string();
        }

        fn set_marker_link(&mut self, marker: &CitationMarker<usize>, text: &str, anchor: &str) {
            self.texts[marker.handle] = text.to_string();
            self.links[marker.handle] = anchor.to_string();
        }

        fn append_section(
            &mut self,
            heading: &str,
            entries: &[ReferenceEntry],
        ) -> Result<(), AssemblyError> {
            if !self.container {
                return Err(AssemblyError::MissingContainer("contents".to_string()));
            }
            self.sections.push((heading.to_string(), entries.to_vec()));
            Ok(())
        }
    }

    const LIBRARY: &str = r#"
@article{A, title={Alpha}, author={Smith, Ann}, journal={J}, year={2001}}
@article{B, title={Beta}, author={Jones, Bob}, journal={J}, year={2002}}
@article{C, title={Gamma}, author={Brown, Cy}, journal={J}, year={2003}}
@book{X, title={Xylophones}, publisher={P}, year={1999}}
"#;

    fn run(keys: &[&str]) -> (MockDocument, PassReport) {
        let library = build_library(LIBRARY, LibraryFormat::BibTex).unwrap();
        let formatter = HtmlFormatter::new(BibStyle::Apa);
        let mut document = MockDocument::new(keys);
        let report = bibliography(&mut document, &library, &formatter, "Bibliography", false);
        (document, report)
    }

    #[test]
    fn repeated_citations() {
        let (document, report) = run(&["A", "B", "A", "C"]);

        assert_eq!(report.state, PassState::Assembled);
        assert_eq!(report.fault, None);
        assert_eq!(document.texts, vec!["[1]", "[2]", "[1]", "[3]"]);
        assert_eq!(document.sections.len(), 1);

        let (heading, entries) = &document.sections[0];
        assert_eq!(heading, "Bibliography");
        let summary: Vec<(usize, &str, &str)> = entries
            .iter()
            .map(|e| (e.index, e.key.as_str(), e.anchor.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(1, "A", "cite-A"), (2, "B", "cite-B"), (3, "C", "cite-C")]
        );
        assert!(entries[0].markup.contains(">[1] Smith, A. (2001). Alpha."));
        assert!(entries[2].markup.contains(">[3] Brown, C."));
    }

    #[test]
    fn one_work_cited_three_times() {
        let (document, report) = run(&["X", "X", "X"]);

        assert_eq!(report.state, PassState::Assembled);
        assert_eq!(document.texts, vec!["[1]", "[1]", "[1]"]);
        assert_eq!(document.sections[0].1.len(), 1);
        assert_eq!(document.sections[0].1[0].anchor, "cite-X");
    }

    #[test]
    fn missing_record() {
        let (document, report) = run(&["A", "Z"]);

        assert_eq!(report.state, PassState::Scanned);
        assert_eq!(
            report.fault,
            Some(AssemblyError::MissingRecord("Z".to_string()))
        );
        assert_eq!(document.texts, vec!["[1]", "[2]"]);
        assert!(document.sections.is_empty());
    }

    #[test]
    fn no_markers() {
        let (document, report) = run(&[]);

        assert_eq!(report.state, PassState::Skipped);
        assert!(report.index.is_empty());
        assert!(document.sections.is_empty());
    }

    #[test]
    fn missing_container() {
        let library = build_library(LIBRARY, LibraryFormat::BibTex).unwrap();
        let formatter = HtmlFormatter::new(BibStyle::Ieee);
        let mut document = MockDocument::new(&["B"]);
        document.container = false;

        let report = bibliography(&mut document, &library, &formatter, "References", true);

        assert_eq!(report.state, PassState::Scanned);
        assert!(matches!(
            report.fault,
            Some(AssemblyError::MissingContainer(_))
        ));
        assert_eq!(document.texts, vec!["[1]"]);
        assert_eq!(document.links, vec!["cite-B"]);
    }

    #[test]
    fn anchors() {
        assert_eq!(anchor_id("HHKPS01"), "cite-HHKPS01");
        assert_eq!(anchor_id("a:b/c-d"), "cite-a:b/c-d");
        assert_eq!(anchor_id("two words"), "cite-two%20words");
        assert_eq!(anchor_id("100%"), "cite-100%25");
        assert_eq!(anchor_id("tab\there"), "cite-tab%09here");
        assert_eq!(anchor_id("nb\u{a0}sp"), "cite-nb%C2%A0sp");
        assert_ne!(anchor_id("a b"), anchor_id("a%20b"));
        assert_ne!(anchor_id("a_b"), anchor_id("a b"));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            AssemblyError::MissingRecord("Z".to_string()).to_string(),
            "no library record for the citation key Z"
        );
        assert!(AssemblyError::MissingContainer("contents".to_string())
            .to_string()
            .contains("contents"));
    }
}
