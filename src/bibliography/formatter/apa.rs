//! The APA reference-list style.

use super::{doi_url, edition, is_contained, page_range, terminate};
use super::names::{apa_authors, apa_editors};
use crate::library::csljson::CSLSource;
use crate::page::entities::escape_text;

/// Render one reference in APA style.
///
/// The order is author, date, title, then source: `Hert, S., & Kettner, L.
/// (2001). Title. In G. S. Brodal (Ed.), <i>Book</i> (pp. 79–90). Publisher.
/// https://doi.org/...`. Without authors, the title moves to the front.
pub fn render_entry(source: &CSLSource, title: &str) -> String {
    let mut entry = String::with_capacity(512);

    let year = source
        .issued
        .as_ref()
        .and_then(|d| d.year())
        .unwrap_or_else(|| "n.d.".to_string());
    let date = format!("({}).", escape_text(&year));
    let title = title_part(source, title);

    match source.author.as_deref().filter(|a| !a.is_empty()) {
        Some(authors) => {
            entry.push_str(&terminate(&escape_text(&apa_authors(authors))));
            entry.push(' ');
            entry.push_str(&date);
            entry.push(' ');
            entry.push_str(&title);
        }
        None => {
            entry.push_str(&title);
            entry.push(' ');
            entry.push_str(&date);
        }
    }

    let source_part = source_part(source);
    if !source_part.is_empty() {
        entry.push(' ');
        entry.push_str(&source_part);
    }

    if let Some(link) = link(source) {
        entry.push(' ');
        entry.push_str(&escape_text(&link));
    }

    entry
}

/// The title, italic unless the work is part of a larger one.
fn title_part(source: &CSLSource, title: &str) -> String {
    let title = escape_text(title);
    if is_contained(source) {
        return terminate(&title);
    }

    let mut part = format!("<i>{}</i>", title);
    if let Some(ed) = source.edition.as_deref().and_then(edition) {
        part.push_str(&format!(" ({} ed.)", escape_text(&ed)));
    }
    if title.ends_with('?') || title.ends_with('!') {
        part
    } else {
        part.push('.');
        part
    }
}

/// Where the work was published.
fn source_part(source: &CSLSource) -> String {
    let kind = source.source_type.as_deref().unwrap_or("");
    match kind {
        "article-journal" | "article-magazine" | "article-newspaper" => periodical(source),
        "chapter" | "paper-conference" | "entry-encyclopedia" | "entry-dictionary" => {
            let mut part = String::new();
            if let Some(container) = &source.container_title {
                part.push_str("In ");
                if let Some(editors) = source.editor.as_deref().filter(|e| !e.is_empty()) {
                    part.push_str(&escape_text(&apa_editors(editors)));
                    part.push_str(", ");
                }
                part.push_str(&format!("<i>{}</i>", escape_text(container)));
                if let Some(page) = &source.page {
                    part.push_str(&format!(" (pp. {})", escape_text(&page_range(page))));
                }
                part.push('.');
            }
            push_publisher(source, &mut part);
            part
        }
        "thesis" => {
            let pieces: Vec<String> = [&source.genre, &source.publisher]
                .into_iter()
                .flatten()
                .map(|p| escape_text(p))
                .collect();
            if pieces.is_empty() {
                String::new()
            } else {
                terminate(&pieces.join(", "))
            }
        }
        _ => {
            let mut part = String::new();
            push_publisher(source, &mut part);
            part
        }
    }
}

/// `<i>Journal</i>, <i>volume</i>(issue), pages.`
fn periodical(source: &CSLSource) -> String {
    let mut pieces: Vec<String> = Vec::new();

    if let Some(container) = &source.container_title {
        pieces.push(format!("<i>{}</i>", escape_text(container)));
    }

    let mut volume = String::new();
    if let Some(v) = &source.volume {
        volume.push_str(&format!("<i>{}</i>", escape_text(v)));
    }
    if let Some(i) = &source.issue {
        volume.push_str(&format!("({})", escape_text(i)));
    }
    if !volume.is_empty() {
        pieces.push(volume);
    }

    if let Some(page) = &source.page {
        pieces.push(escape_text(&page_range(page)));
    }

    if pieces.is_empty() {
        String::new()
    } else {
        format!("{}.", pieces.join(", "))
    }
}

fn push_publisher(source: &CSLSource, part: &mut String) {
    if let Some(publisher) = &source.publisher {
        if !part.is_empty() {
            part.push(' ');
        }
        part.push_str(&terminate(&escape_text(publisher)));
    }
}

fn link(source: &CSLSource) -> Option<String> {
    source
        .doi
        .as_deref()
        .map(doi_url)
        .or_else(|| source.url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::bibtex::build_bibtex_lib;

    fn render(bib: &str) -> String {
        let source = &build_bibtex_lib(bib).unwrap()[0];
        render_entry(source, source.title.as_deref().unwrap())
    }

    #[test]
    fn conference_paper() {
        let entry = render(
            r#"@InProceedings{HHKPS01,author="Hert, Susan and Hoffmann, Michael and Kettner, Lutz and Pion, Sylvain and Seel, Michael",editor="Brodal, Gerth St{\o}lting and Frigioni, Daniele and Marchetti-Spaccamela, Alberto",title="An Adaptable and Extensible Geometry Kernel",booktitle="Algorithm Engineering",year="2001",publisher="Springer Berlin Heidelberg",address="Berlin, Heidelberg",pages="79--90",doi ="https://doi.org/10.1007/3-540-44688-5_7"}"#,
        );

        assert_eq!(
            entry,
            "Hert, S., Hoffmann, M., Kettner, L., Pion, S., &amp; Seel, M. (2001). An Adaptable and Extensible Geometry Kernel. In G. S. Brodal, D. Frigioni, &amp; A. Marchetti-Spaccamela (Eds.), <i>Algorithm Engineering</i> (pp. 79–90). Springer Berlin Heidelberg. https://doi.org/10.1007/3-540-44688-5_7"
        );
    }

    #[test]
    fn journal_article() {
        let entry = render(
            "@article{alewijnse2018model, title={Model-based segmentation and classification of trajectories}, author={Alewijnse, Sander PA and Buchin, Kevin}, journal={Algorithmica}, volume={80}, number={8}, pages={2422--2452}, year={2018}, publisher={Springer}}",
        );

        assert_eq!(
            entry,
            "Alewijnse, S. P. A., &amp; Buchin, K. (2018). Model-based segmentation and classification of trajectories. <i>Algorithmica</i>, <i>80</i>(8), 2422–2452."
        );
    }

    #[test]
    fn journal_without_volume() {
        let entry = render(
            "@article{BB2009, title={A Generic Geometry Library}, author={Barend Gehrels and Bruno Lalande}, journal={BoostCon'09}, year={2009}}",
        );

        assert_eq!(
            entry,
            "Gehrels, B., &amp; Lalande, B. (2009). A Generic Geometry Library. <i>BoostCon'09</i>."
        );
    }

    #[test]
    fn book_without_author() {
        let entry = render(
            "@book{cgal, title={{CGAL} User and Reference Manual}, edition={5}, publisher={CGAL Editorial Board}}",
        );

        assert_eq!(
            entry,
            "<i>CGAL User and Reference Manual</i> (5th ed.). (n.d.). CGAL Editorial Board."
        );
    }

    #[test]
    fn escapes_text() {
        let entry = render("@misc{x, title={Less <than> \\& more}, author={Smith, J.}, year={2020}, url={https://example.com/?a=1&b=2}}");

        assert_eq!(
            entry,
            "Smith, J. (2020). <i>Less &lt;than&gt; &amp; more</i>. https://example.com/?a=1&amp;b=2"
        );
    }
}
