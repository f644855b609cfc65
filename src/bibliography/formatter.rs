//! This module contains the built-in bibliography formatter.
//!
//! The formatter turns library records into HTML reference entries. Each
//! entry is one `div.csl-entry` element whose text starts with the prefix the
//! assembler asks for (`[n] `).

mod apa;
mod ieee;
mod names;

use super::AssemblyError;
use crate::library::{csljson::CSLSource, Library};
use crate::page::entities::{escape_attribute, escape_text};
use ansi_term::Color;
use slog::{debug, trace};

/// One rendered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEntry {
    pub key: String,
    pub markup: String,
}

/// Produces rendered records for a list of keys.
///
/// Implementations return exactly one entry per key, in the order given.
pub trait Formatter {
    fn format(
        &self,
        library: &Library,
        keys: &[String],
        prefix: &dyn Fn(&str) -> String,
    ) -> Result<Vec<FormattedEntry>, AssemblyError>;
}

/// The reference-list styles the built-in formatter knows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BibStyle {
    Apa,
    Ieee,
}

impl BibStyle {
    pub fn from_name(name: &str) -> Result<BibStyle, String> {
        match name.trim().to_lowercase().as_str() {
            "apa" => Ok(BibStyle::Apa),
            "ieee" => Ok(BibStyle::Ieee),
            _ => Err(format!(
                "unknown bibliography style {}. The available styles are apa and ieee",
                name
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BibStyle::Apa => "apa",
            BibStyle::Ieee => "ieee",
        }
    }
}

/// Renders records as HTML in one of the [`BibStyle`]s.
#[derive(Copy, Clone, Debug)]
pub struct HtmlFormatter {
    style: BibStyle,
}

impl HtmlFormatter {
    pub fn new(style: BibStyle) -> HtmlFormatter {
        HtmlFormatter { style }
    }

    fn render(&self, source: &CSLSource) -> Result<String, AssemblyError> {
        let title = source
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AssemblyError::Formatter(format!("{} does not have a title", source.id))
            })?;

        Ok(match self.style {
            BibStyle::Apa => apa::render_entry(source, title),
            BibStyle::Ieee => ieee::render_entry(source, title),
        })
    }
}

impl Formatter for HtmlFormatter {
    fn format(
        &self,
        library: &Library,
        keys: &[String],
        prefix: &dyn Fn(&str) -> String,
    ) -> Result<Vec<FormattedEntry>, AssemblyError> {
        debug!(
            slog_scope::logger(),
            "Formatting {} entries in {} style...",
            keys.len(),
            self.style.name()
        );

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let source = library
                .get(key)
                .ok_or_else(|| AssemblyError::MissingRecord(key.to_string()))?;
            let body = self.render(source)?;
            trace!(
                slog_scope::logger(),
                "Formatted {}",
                Color::Blue.paint(key.as_str())
            );
            entries.push(FormattedEntry {
                key: key.to_string(),
                markup: format!(
                    "<div class=\"csl-entry\" data-csl-entry-id=\"{}\">{}{}</div>",
                    escape_attribute(key),
                    escape_text(&prefix(key)),
                    body
                ),
            });
        }

        Ok(entries)
    }
}

/// End a sentence with a period unless it already ends with punctuation.
fn terminate(text: &str) -> String {
    if text.ends_with('.') || text.ends_with('?') || text.ends_with('!') {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

/// An edition as an ordinal: `5` becomes `5th`. Text editions pass through.
fn edition(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    match value.parse::<u32>() {
        Ok(n) => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            Some(format!("{}{}", n, suffix))
        }
        Err(_) => Some(value.to_string()),
    }
}

/// Whether the work is published inside a larger one.
fn is_contained(source: &CSLSource) -> bool {
    match source.source_type.as_deref() {
        Some(kind) => {
            kind.starts_with("article")
                || kind.starts_with("entry")
                || kind == "chapter"
                || kind == "paper-conference"
        }
        None => false,
    }
}

/// Page ranges use an en dash.
fn page_range(page: &str) -> String {
    page.replace("--", "\u{2013}").replace('-', "\u{2013}")
}

fn doi_url(doi: &str) -> String {
    if doi.starts_with("http") {
        doi.to_string()
    } else {
        format!("https://doi.org/{}", doi)
    }
}
