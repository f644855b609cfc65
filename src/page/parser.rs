//! This module contains the page parser. It converts a collection of tokens
//! into the page's syntax tree.
//!
//! The parser is forgiving in the way browsers are: an end tag closes the
//! nearest open element with the same name (implicitly closing everything
//! opened after it), and an end tag with no open counterpart is kept as raw
//! markup rather than rejected.

use super::document::{Attribute, CloseTag, Element, HtmlDocument, Node, NodeId};
use super::lexer::{tag_name, Token, TokenType, TAG_NAME};
use lazy_static::lazy_static;
use regex::Regex;
use slog::{debug, trace};

lazy_static! {
    /// Regex for one attribute inside a start tag.
    pub static ref ATTRIBUTE: Regex = Regex::new(
        r#"(?P<name>[^\s"'>/=]+)(?:\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'=<>`]+)))?"#
    )
    .unwrap();
}

/// Elements that never have contents or an end tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// The main parser function.
pub fn parser(tokens: &[Token]) -> Result<HtmlDocument, String> {
    debug!(slog_scope::logger(), "Starting parser...");

    let mut document = HtmlDocument::default();
    let roots = build(&mut document, tokens)?;
    document.set_roots(roots);

    debug!(slog_scope::logger(), "Parsing complete");
    Ok(document)
}

/// Add the nodes for a collection of tokens to a document.
///
/// Returns the top-level nodes, which are not attached to anything.
pub fn build(document: &mut HtmlDocument, tokens: &[Token]) -> Result<Vec<NodeId>, String> {
    let mut roots: Vec<NodeId> = Vec::new();
    let mut open: Vec<NodeId> = Vec::new();

    for token in tokens {
        match token.token_type {
            TokenType::Text => {
                attach(
                    document,
                    &open,
                    &mut roots,
                    Node::Text(token.contents.to_string()),
                );
            }
            TokenType::Comment | TokenType::Declaration | TokenType::RawText => {
                attach(
                    document,
                    &open,
                    &mut roots,
                    Node::Raw(token.contents.to_string()),
                );
            }
            TokenType::StartTag => {
                let element = start_element(token)?;
                let void = element.close_tag == CloseTag::Void;
                let id = attach(document, &open, &mut roots, Node::Element(element));
                if !void {
                    open.push(id);
                }
            }
            TokenType::EndTag => {
                let name = tag_name(token.contents).ok_or_else(|| {
                    format!("malformed end tag at byte {}", token.position)
                })?;

                let depth = open.iter().rposition(|&id| {
                    document
                        .element(id)
                        .map(|e| e.name == name)
                        .unwrap_or(false)
                });

                match depth {
                    Some(depth) => {
                        let id = open[depth];
                        open.truncate(depth);
                        document.close(id, token.contents);
                    }
                    None => {
                        trace!(
                            slog_scope::logger(),
                            "Stray end tag {} at byte {}",
                            token.contents,
                            token.position
                        );
                        attach(
                            document,
                            &open,
                            &mut roots,
                            Node::Raw(token.contents.to_string()),
                        );
                    }
                }
            }
        }
    }

    Ok(roots)
}

/// Add a node to the innermost open element, or to the roots.
fn attach(
    document: &mut HtmlDocument,
    open: &[NodeId],
    roots: &mut Vec<NodeId>,
    node: Node,
) -> NodeId {
    let id = document.push(node);
    match open.last() {
        Some(&parent) => document.append_children(parent, &[id]),
        None => roots.push(id),
    }
    id
}

/// Build an element from a start tag.
fn start_element(token: &Token) -> Result<Element, String> {
    let tag = token.contents;
    let name_match = TAG_NAME
        .captures(tag)
        .and_then(|c| c.name("name"))
        .ok_or_else(|| format!("malformed tag at byte {}", token.position))?;
    let name = name_match.as_str().to_ascii_lowercase();

    // Everything between the name and the closing `>`.
    let inner = &tag[name_match.end()..tag.len() - 1];
    let self_closing = inner.trim_end().ends_with('/');

    let attributes = ATTRIBUTE
        .captures_iter(inner)
        .map(|caps| Attribute {
            name: caps["name"].to_ascii_lowercase(),
            value: caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"))
                .map(|v| v.as_str().to_string()),
        })
        .collect();

    let close_tag = if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
        CloseTag::Void
    } else {
        CloseTag::Implicit
    };

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        open_tag: Some(tag.to_string()),
        self_closing,
        close_tag,
    })
}
