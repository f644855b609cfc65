//! This module contains the marker scanner, which numbers the works cited on
//! a page in the order they are first cited.

use super::{anchor_id, CitationDocument, CitationMarker};
use ansi_term::Color;
use slog::{debug, trace};
use std::collections::HashMap;

/// The numbers assigned to a page's citation keys.
///
/// Built fresh for every page by [`scan`]. Indices are 1-based, dense, and
/// follow first-occurrence order: the k-th distinct key receives k.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CitationIndex {
    keys: Vec<String>,
    indices: HashMap<String, usize>,
}

impl CitationIndex {
    /// The index assigned to a key.
    pub fn get(&self, key: &str) -> Option<usize> {
        self.indices.get(key).copied()
    }

    /// The distinct keys in ascending index order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pairs of index and key, in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, key)| (i + 1, key.as_str()))
    }
}

/// Build the [`CitationIndex`] for markers in document order.
pub fn scan<H>(markers: &[CitationMarker<H>]) -> CitationIndex {
    debug!(
        slog_scope::logger(),
        "Scanning {} citation markers...",
        markers.len()
    );

    let mut index = CitationIndex::default();
    let mut count = 0;

    for marker in markers {
        if index.indices.contains_key(&marker.key) {
            continue;
        }
        count += 1;
        trace!(
            slog_scope::logger(),
            "Assigning [{}] to {}",
            count,
            Color::Blue.paint(marker.key.as_str())
        );
        index.indices.insert(marker.key.clone(), count);
        index.keys.push(marker.key.clone());
    }

    debug!(
        slog_scope::logger(),
        "Scan complete: {} distinct keys",
        index.len()
    );
    index
}

/// Set every marker's display slot to its key's `[index]`.
///
/// With `link` set, the number links to the key's reference entry.
pub fn number_markers<D: CitationDocument>(
    document: &mut D,
    markers: &[CitationMarker<D::Handle>],
    index: &CitationIndex,
    link: bool,
) {
    for marker in markers {
        let number = match index.get(&marker.key) {
            Some(n) => n,
            None => continue,
        };
        let text = format!("[{}]", number);
        if link {
            document.set_marker_link(marker, &text, &anchor_id(&marker.key));
        } else {
            document.set_marker_text(marker, &text);
        }
    }
}
