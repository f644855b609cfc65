//! This module connects a parsed page to the citation pass.

use super::document::{HtmlDocument, NodeId};
use super::entities::{escape_attribute, escape_text};
use crate::bibliography::{AssemblyError, CitationDocument, CitationMarker, ReferenceEntry};
use crate::config::PageSettings;
use ansi_term::Color;
use slog::{debug, trace, warn};

/// A page with the settings that say where its citations are.
pub struct HtmlPage<'s> {
    pub document: HtmlDocument,
    settings: &'s PageSettings,
}

impl<'s> HtmlPage<'s> {
    pub fn new(document: HtmlDocument, settings: &'s PageSettings) -> HtmlPage<'s> {
        HtmlPage { document, settings }
    }

    /// The element whose text shows a marker's number.
    fn slot(&self, marker: NodeId) -> NodeId {
        self.document
            .first_descendant_by_class(marker, &self.settings.slot_class)
            .unwrap_or(marker)
    }

    /// Set the project-number element's text, when configured.
    pub fn set_project_number(&mut self) {
        let text = match &self.settings.project_number {
            Some(t) => t,
            None => return,
        };

        match self.document.element_by_id(&self.settings.project_number_id) {
            Some(id) => {
                trace!(slog_scope::logger(), "Setting the project number");
                self.document.set_text(id, text);
            }
            None => warn!(
                slog_scope::logger(),
                "No element with the id {} for the project number", self.settings.project_number_id
            ),
        }
    }

    /// Parse one entry's markup and give its first element the entry's anchor.
    fn entry_nodes(&mut self, entry: &ReferenceEntry) -> Result<Vec<NodeId>, AssemblyError> {
        let nodes = self.document.parse_fragment(&entry.markup).map_err(|e| {
            AssemblyError::Formatter(format!("unreadable markup for {}—{}", entry.key, e))
        })?;

        let first = nodes
            .iter()
            .copied()
            .find(|&n| self.document.element(n).is_some())
            .ok_or_else(|| {
                AssemblyError::Formatter(format!("the entry for {} has no element", entry.key))
            })?;
        self.document.set_attribute(first, "id", &entry.anchor);

        Ok(nodes)
    }
}

impl CitationDocument for HtmlPage<'_> {
    type Handle = NodeId;

    fn find_markers(&self) -> Vec<CitationMarker<NodeId>> {
        let mut markers = Vec::new();

        for id in self.document.elements_by_class(&self.settings.marker_class) {
            match self.document.attribute(id, &self.settings.key_attribute) {
                Some(key) => markers.push(CitationMarker { handle: id, key }),
                None => {
                    warn!(
                        slog_scope::logger(),
                        "Skipping a citation marker without a {} attribute",
                        self.settings.key_attribute
                    );
                    eprintln!(
                        "  {} Skipping a citation marker without a {} attribute",
                        Color::Yellow.paint("WARN"),
                        Color::Blue.paint(self.settings.key_attribute.as_str())
                    );
                }
            }
        }

        debug!(
            slog_scope::logger(),
            "Found {} citation markers",
            markers.len()
        );
        markers
    }

    fn set_marker_text(&mut self, marker: &CitationMarker<NodeId>, text: &str) {
        let slot = self.slot(marker.handle);
        self.document.set_text(slot, text);
    }

    fn set_marker_link(&mut self, marker: &CitationMarker<NodeId>, text: &str, anchor: &str) {
        let markup = format!(
            "<a href=\"#{}\">{}</a>",
            escape_attribute(anchor),
            escape_text(text)
        );
        match self.document.parse_fragment(&markup) {
            Ok(link) => {
                let slot = self.slot(marker.handle);
                self.document.replace_children(slot, link);
            }
            Err(e) => {
                warn!(slog_scope::logger(), "Unable to link a marker: {}", e);
                self.set_marker_text(marker, text);
            }
        }
    }

    fn append_section(
        &mut self,
        heading: &str,
        entries: &[ReferenceEntry],
    ) -> Result<(), AssemblyError> {
        let contents = self
            .document
            .elements_by_class(&self.settings.contents_class)
            .into_iter()
            .next()
            .filter(|&id| self.document.accepts_children(id))
            .ok_or_else(|| AssemblyError::MissingContainer(self.settings.contents_class.clone()))?;

        // Everything is built detached and only attached once every entry
        // has parsed.
        let mut entry_nodes = Vec::new();
        for entry in entries {
            entry_nodes.extend(self.entry_nodes(entry)?);
        }

        let mut section = self
            .document
            .parse_fragment(&format!("<h1>{}</h1>", escape_text(heading)))
            .map_err(AssemblyError::Formatter)?;
        let body = self
            .document
            .parse_fragment("<div class=\"csl-bib-body\"></div>")
            .map_err(AssemblyError::Formatter)?;

        for &list in &body {
            self.document.append_children(list, &entry_nodes);
        }
        section.extend(body);
        self.document.append_children(contents, &section);

        debug!(
            slog_scope::logger(),
            "Appended {} entries under {}",
            entries.len(),
            Color::Blue.paint(heading)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::render::render;

    const PAGE: &str = r#"<div class="header"><span id="projectnumber">1.0</span></div>
<div class="contents"><p>Kernels <span class="citationjs" data-citeid="HHKPS01"><span class="ref-container">?</span></span> and
<span class="citationjs" data-citeid="BB2009"></span> and <span class="citationjs" data-citeid="HHKPS01"><span class="ref-container">?</span></span>.</p></div>
"#;

    fn entry(index: usize, key: &str, markup: &str) -> ReferenceEntry {
        ReferenceEntry {
            index,
            key: key.to_string(),
            anchor: format!("cite-{}", key),
            markup: markup.to_string(),
        }
    }

    #[test]
    fn markers_in_order() {
        let settings = PageSettings::default();
        let page = HtmlPage::new(HtmlDocument::parse(PAGE).unwrap(), &settings);
        let keys: Vec<String> = page.find_markers().into_iter().map(|m| m.key).collect();

        assert_eq!(keys, vec!["HHKPS01", "BB2009", "HHKPS01"]);
    }

    #[test]
    fn marker_without_key_is_skipped() {
        let settings = PageSettings::default();
        let document = HtmlDocument::parse(
            r#"<span class="citationjs"></span><span class="citationjs" data-citeid="a"></span>"#,
        )
        .unwrap();
        let page = HtmlPage::new(document, &settings);

        assert_eq!(page.find_markers().len(), 1);
    }

    #[test]
    fn slots_and_links() {
        let settings = PageSettings::default();
        let mut page = HtmlPage::new(HtmlDocument::parse(PAGE).unwrap(), &settings);
        let markers = page.find_markers();
        page.set_marker_text(&markers[0], "[1]");
        page.set_marker_text(&markers[1], "[2]");
        page.set_marker_link(&markers[2], "[1]", "cite-HHKPS01");

        let html = render(&page.document);
        assert!(html.contains(r#"data-citeid="HHKPS01"><span class="ref-container">[1]</span></span> and"#));
        assert!(html.contains(r#"data-citeid="BB2009">[2]</span>"#));
        assert!(html.contains(r##"<span class="ref-container"><a href="#cite-HHKPS01">[1]</a></span>"##));
    }

    #[test]
    fn section_is_appended() {
        let settings = PageSettings::default();
        let mut page = HtmlPage::new(HtmlDocument::parse(PAGE).unwrap(), &settings);
        let entries = vec![
            entry(1, "HHKPS01", r#"<div class="csl-entry">[1] Hert</div>"#),
            entry(2, "BB2009", r#"<div class="csl-entry">[2] Gehrels</div>"#),
        ];
        page.append_section("Bibliography", &entries).unwrap();

        let html = render(&page.document);
        assert!(html.ends_with(
            r#".</p><h1>Bibliography</h1><div class="csl-bib-body"><div class="csl-entry" id="cite-HHKPS01">[1] Hert</div><div class="csl-entry" id="cite-BB2009">[2] Gehrels</div></div></div>
"#
        ));
    }

    #[test]
    fn bad_entry_attaches_nothing() {
        let settings = PageSettings::default();
        let mut page = HtmlPage::new(HtmlDocument::parse(PAGE).unwrap(), &settings);
        let entries = vec![
            entry(1, "HHKPS01", r#"<div class="csl-entry">[1] Hert</div>"#),
            entry(2, "BB2009", "[2] just text"),
        ];

        let result = page.append_section("Bibliography", &entries);
        assert!(matches!(result, Err(AssemblyError::Formatter(_))));
        assert_eq!(render(&page.document), PAGE);
    }

    #[test]
    fn missing_container() {
        let settings = PageSettings::default();
        let mut page = HtmlPage::new(HtmlDocument::parse("<p>No contents</p>").unwrap(), &settings);

        let result = page.append_section("Bibliography", &[]);
        assert_eq!(
            result,
            Err(AssemblyError::MissingContainer("contents".to_string()))
        );
    }

    #[test]
    fn void_container() {
        let settings = PageSettings::default();
        let input = r#"<img class="contents"><div class="contents"></div>"#;
        let mut page = HtmlPage::new(HtmlDocument::parse(input).unwrap(), &settings);
        let entries = vec![entry(1, "A", r#"<div class="csl-entry">[1] A</div>"#)];

        let result = page.append_section("Bibliography", &entries);
        assert_eq!(
            result,
            Err(AssemblyError::MissingContainer("contents".to_string()))
        );
        assert_eq!(render(&page.document), input);
    }

    #[test]
    fn project_number() {
        let settings = PageSettings::default();
        let mut page = HtmlPage::new(HtmlDocument::parse(PAGE).unwrap(), &settings);
        page.set_project_number();

        assert!(render(&page.document).starts_with(
            r#"<div class="header"><span id="projectnumber"> latest</span></div>"#
        ));

        let settings = PageSettings {
            project_number: None,
            ..PageSettings::default()
        };
        let mut page = HtmlPage::new(HtmlDocument::parse(PAGE).unwrap(), &settings);
        page.set_project_number();
        assert_eq!(render(&page.document), PAGE);
    }
}
