//! This module contains the bibliography assembler, which turns a page's
//! [`CitationIndex`] into an anchored reference list.

use super::formatter::{FormattedEntry, Formatter};
use super::scanner::CitationIndex;
use super::{anchor_id, AssemblyError, CitationDocument, PassState, ReferenceEntry};
use crate::library::Library;
use slog::{debug, trace};

/// Format the cited works and append them to the document.
///
/// Returns [`PassState::Skipped`] when nothing was cited and
/// [`PassState::Assembled`] once the section is attached.
pub fn assemble<D: CitationDocument>(
    document: &mut D,
    index: &CitationIndex,
    library: &Library,
    formatter: &dyn Formatter,
    heading: &str,
) -> Result<PassState, AssemblyError> {
    if index.is_empty() {
        debug!(slog_scope::logger(), "No citations; skipping the bibliography");
        return Ok(PassState::Skipped);
    }

    let prefix = |key: &str| match index.get(key) {
        Some(n) => format!("[{}] ", n),
        None => String::new(),
    };
    let formatted = formatter.format(library, index.keys(), &prefix)?;
    let entries = reference_entries(index, formatted)?;

    debug!(
        slog_scope::logger(),
        "Appending {} reference entries",
        entries.len()
    );
    document.append_section(heading, &entries)?;

    Ok(PassState::Assembled)
}

/// Pair formatted entries with their index and anchor.
///
/// The formatter must return one entry per key in index order.
fn reference_entries(
    index: &CitationIndex,
    formatted: Vec<FormattedEntry>,
) -> Result<Vec<ReferenceEntry>, AssemblyError> {
    if formatted.len() != index.len() {
        return Err(AssemblyError::Formatter(format!(
            "{} entries were returned for {} citation keys",
            formatted.len(),
            index.len()
        )));
    }

    let mut entries = Vec::with_capacity(formatted.len());
    for ((number, key), entry) in index.iter().zip(formatted) {
        if entry.key != key {
            return Err(AssemblyError::Formatter(format!(
                "entry {} is for {} instead of {}",
                number, entry.key, key
            )));
        }
        trace!(slog_scope::logger(), "[{}] {}", number, key);
        entries.push(ReferenceEntry {
            index: number,
            anchor: anchor_id(key),
            key: entry.key,
            markup: entry.markup,
        });
    }

    Ok(entries)
}
