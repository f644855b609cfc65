//! The page processor. Reads an HTML page, runs the citation pass over it, and
//! writes it back out.

mod adapter;
mod document;
pub(crate) mod entities;
mod lexer;
mod parser;
mod render;

pub use adapter::HtmlPage;
pub use document::HtmlDocument;

use crate::bibliography::{self, formatter::Formatter, PassReport};
use crate::config::PageSettings;
use crate::library::Library;
use slog::{debug, o};

/// A processed page.
#[derive(Debug)]
pub struct PageOutput {
    pub html: String,
    pub report: PassReport,
}

/// The page function.
pub fn page(
    input: &str,
    library: &Library,
    formatter: &dyn Formatter,
    settings: &PageSettings,
) -> Result<PageOutput, String> {
    debug!(slog_scope::logger(), "Starting page...");

    // Lex the page
    let tokens = slog_scope::scope(&slog_scope::logger().new(o!("fn" => "lexer()")), || {
        lexer::lexer(input)
    })?;

    // Parse the tokens into the syntax tree
    let document = slog_scope::scope(&slog_scope::logger().new(o!("fn" => "parser()")), || {
        parser::parser(&tokens)
    })?;

    let mut page = HtmlPage::new(document, settings);

    // Number the citations and append the bibliography
    let report = slog_scope::scope(
        &slog_scope::logger().new(o!("fn" => "bibliography()")),
        || {
            bibliography::bibliography(
                &mut page,
                library,
                formatter,
                &settings.heading,
                settings.link_markers,
            )
        },
    );

    page.set_project_number();

    // Render the output
    let html = slog_scope::scope(&slog_scope::logger().new(o!("fn" => "render()")), || {
        render::render(&page.document)
    });

    debug!(slog_scope::logger(), "Page complete");
    Ok(PageOutput { html, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::formatter::{BibStyle, HtmlFormatter};
    use crate::bibliography::{AssemblyError, PassState};
    use crate::library::{build_library, LibraryFormat};

    const LIBRARY: &str = r#"
@string{springer = "Springer Berlin Heidelberg"}

@InProceedings{HHKPS01,
  author="Hert, Susan and Hoffmann, Michael and Kettner, Lutz and Pion, Sylvain and Seel, Michael",
  title="An Adaptable and Extensible Geometry Kernel",
  booktitle="Algorithm Engineering",
  year="2001",
  publisher=springer,
  pages="79--90",
}

@article{BB2009,
  title={A Generic Geometry Library},
  author={Barend Gehrels and Bruno Lalande},
  journal={BoostCon\'09},
  year={2009}
}
"#;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>MoveTK</title></head>
<body>
<div id="top"><span id="projectnumber">&#160;0.9</span></div>
<div class="contents">
<p>Kernels follow <span class="citationjs" data-citeid="HHKPS01"><span class="ref-container"></span></span>.
Geometry types follow <span class="citationjs" data-citeid="BB2009"><span class="ref-container"></span></span>
and <span class="citationjs" data-citeid="HHKPS01"><span class="ref-container"></span></span>.</p>
</div>
<script>if (a < b && c > d) { go(); }</script>
</body></html>
"#;

    fn library() -> Library {
        build_library(LIBRARY, LibraryFormat::BibTex).unwrap()
    }

    #[test]
    fn full_page() {
        let settings = PageSettings::default();
        let formatter = HtmlFormatter::new(BibStyle::Apa);
        let output = page(PAGE, &library(), &formatter, &settings).unwrap();

        assert_eq!(output.report.state, PassState::Assembled);
        assert_eq!(output.report.index.keys(), &["HHKPS01", "BB2009"]);
        assert!(output
            .html
            .contains(r#"<span class="ref-container">[1]</span></span>.
Geometry types follow <span class="citationjs" data-citeid="BB2009"><span class="ref-container">[2]</span>"#));
        assert!(output
            .html
            .contains(r#"<div class="csl-entry" data-csl-entry-id="HHKPS01" id="cite-HHKPS01">[1] Hert, S., Hoffmann, M."#));
        assert!(output.html.contains(
            r#"<div class="csl-entry" data-csl-entry-id="BB2009" id="cite-BB2009">[2] Gehrels, B., &amp; Lalande, B. (2009). A Generic Geometry Library. <i>BoostCon'09</i>.</div>"#
        ));
        assert!(output
            .html
            .contains("</p>\n<h1>Bibliography</h1><div class=\"csl-bib-body\">"));
        assert!(output.html.contains(r#"<span id="projectnumber"> latest</span>"#));
        assert!(output
            .html
            .contains("<script>if (a < b && c > d) { go(); }</script>"));
        assert!(output.html.starts_with("<!DOCTYPE html>\n<html><head>"));
    }

    #[test]
    fn page_without_citations() {
        let settings = PageSettings {
            project_number: None,
            ..PageSettings::default()
        };
        let formatter = HtmlFormatter::new(BibStyle::Apa);
        let input = "<div class=\"contents\"><p>Nothing cited.</p></div>\n";
        let output = page(input, &library(), &formatter, &settings).unwrap();

        assert_eq!(output.report.state, PassState::Skipped);
        assert_eq!(output.html, input);
    }

    #[test]
    fn degraded_page() {
        let settings = PageSettings::default();
        let formatter = HtmlFormatter::new(BibStyle::Ieee);
        let input = r#"<div class="contents"><span class="citationjs" data-citeid="BB2009"></span><span class="citationjs" data-citeid="nope"></span></div>"#;
        let output = page(input, &library(), &formatter, &settings).unwrap();

        assert_eq!(output.report.state, PassState::Scanned);
        assert_eq!(
            output.report.fault,
            Some(AssemblyError::MissingRecord("nope".to_string()))
        );
        assert_eq!(
            output.html,
            r#"<div class="contents"><span class="citationjs" data-citeid="BB2009">[1]</span><span class="citationjs" data-citeid="nope">[2]</span></div>"#
        );
    }

    #[test]
    fn void_content_region() {
        let settings = PageSettings::default();
        let formatter = HtmlFormatter::new(BibStyle::Apa);
        let input = r#"<img class="contents"><span class="citationjs" data-citeid="BB2009"></span>"#;
        let output = page(input, &library(), &formatter, &settings).unwrap();

        assert_eq!(output.report.state, PassState::Scanned);
        assert_eq!(
            output.report.fault,
            Some(AssemblyError::MissingContainer("contents".to_string()))
        );
        assert_eq!(
            output.html,
            r#"<img class="contents"><span class="citationjs" data-citeid="BB2009">[1]</span>"#
        );
    }

    #[test]
    fn malformed_page() {
        let settings = PageSettings::default();
        let formatter = HtmlFormatter::new(BibStyle::Apa);

        assert!(page("<div class=\"contents\"", &library(), &formatter, &settings).is_err());
    }
}
