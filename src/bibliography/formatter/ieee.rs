//! The IEEE reference-list style.

use super::names::ieee_names;
use super::{edition, is_contained, page_range};
use crate::library::csljson::CSLSource;
use crate::page::entities::escape_text;

/// Render one reference in IEEE style.
///
/// `S. Hert and L. Kettner, “Title,” in <i>Book</i>, Place: Publisher,
/// 2001, pp. 79–90, doi: 10.1007/....`
pub fn render_entry(source: &CSLSource, title: &str) -> String {
    let mut entry = String::with_capacity(512);

    if let Some(authors) = source.author.as_deref().filter(|a| !a.is_empty()) {
        entry.push_str(&escape_text(&ieee_names(authors)));
        entry.push_str(", ");
    }

    let kind = source.source_type.as_deref().unwrap_or("");
    let contained = is_contained(source);
    let mut rest: Vec<String> = Vec::new();

    if let Some(container) = &source.container_title {
        if kind == "chapter" || kind == "paper-conference" {
            rest.push(format!("in <i>{}</i>", escape_text(container)));
        } else {
            rest.push(format!("<i>{}</i>", escape_text(container)));
        }
    }

    if !contained {
        if let Some(ed) = source.edition.as_deref().and_then(edition) {
            rest.push(format!("{} ed.", escape_text(&ed)));
        }
    }

    match (&source.publisher_place, &source.publisher) {
        (Some(place), Some(publisher)) => {
            rest.push(format!("{}: {}", escape_text(place), escape_text(publisher)))
        }
        (None, Some(publisher)) => rest.push(escape_text(publisher)),
        _ => {}
    }

    if let Some(volume) = &source.volume {
        rest.push(format!("vol. {}", escape_text(volume)));
    }
    if let Some(issue) = &source.issue {
        rest.push(format!("no. {}", escape_text(issue)));
    }
    if let Some(page) = &source.page {
        let page = page_range(page);
        let label = if page.contains('–') || page.contains(',') {
            "pp."
        } else {
            "p."
        };
        rest.push(format!("{} {}", label, escape_text(&page)));
    }
    if let Some(year) = source.issued.as_ref().and_then(|d| d.year()) {
        rest.push(escape_text(&year));
    }
    if let Some(doi) = &source.doi {
        let doi = doi
            .trim_start_matches("https://doi.org/")
            .trim_start_matches("http://dx.doi.org/");
        rest.push(format!("doi: {}", escape_text(doi)));
    } else if let Some(url) = &source.url {
        rest.push(format!("[Online]. Available: {}", escape_text(url)));
    }

    let title = escape_text(title);
    if contained {
        if rest.is_empty() {
            entry.push_str(&format!("\u{201c}{}.\u{201d}", title));
            return entry;
        }
        entry.push_str(&format!("\u{201c}{},\u{201d} ", title));
    } else {
        entry.push_str(&format!("<i>{}</i>", title));
        if rest.is_empty() {
            entry.push('.');
            return entry;
        }
        entry.push_str(", ");
    }

    entry.push_str(&rest.join(", "));
    if !entry.ends_with('.') {
        entry.push('.');
    }
    entry
}
