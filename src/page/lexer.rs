//! This module contains the page lexer. It converts a rendered HTML page into
//! a collection of tokens without losing a single byte, so that untouched
//! markup can be written back exactly as it was read.

use lazy_static::lazy_static;
use regex::Regex;
use slog::{debug, trace};

lazy_static! {
    /// Regex for the name of a start or end tag.
    pub static ref TAG_NAME: Regex = Regex::new(r"^</?(?P<name>[A-Za-z][A-Za-z0-9:_.-]*)").unwrap();
}

/// Elements whose contents are never markup.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// The lexer that works through the input string.
struct Lexer {
    start: usize,
    context: Context,
}

impl Lexer {
    /// Create a new lexer at the start of the input.
    fn new() -> Lexer {
        Lexer {
            start: 0,
            context: Context::Markup,
        }
    }
}

/// Whether the lexer is reading markup or the body of a raw-text element.
#[derive(Debug, PartialEq, Eq)]
enum Context {
    Markup,
    RawText(String),
}

/// The tokenized parts of the input string.
#[derive(Debug)]
pub struct Token<'a> {
    pub token_type: TokenType,
    pub contents: &'a str,
    pub position: usize,
}

impl Token<'_> {
    /// Creates a new [`Token`].
    pub fn new(token_type: TokenType, contents: &str, position: usize) -> Token {
        Token {
            token_type,
            contents,
            position,
        }
    }
}

/// The types of tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenType {
    Text,
    StartTag,
    EndTag,
    Comment,
    Declaration,
    RawText,
}

/// The main lexer function.
///
/// Splits the input into text, tags, comments, and declarations (doctypes,
/// processing instructions, CDATA). The contents of `<script>` and `<style>`
/// elements are emitted as a single [`TokenType::RawText`] token.
pub fn lexer(input: &str) -> Result<Vec<Token>, String> {
    debug!(slog_scope::logger(), "Starting lexer...");

    let mut lexer = Lexer::new();
    let mut tokens: Vec<Token> = Vec::new();

    while lexer.start < input.len() {
        let rest = &input[lexer.start..];

        if let Context::RawText(name) = &lexer.context {
            let len = raw_text_len(rest, name);
            if len > 0 {
                tokens.push(Token::new(
                    TokenType::RawText,
                    &rest[..len],
                    lexer.start,
                ));
            }
            lexer.start += len;
            lexer.context = Context::Markup;
            continue;
        }

        let (token_type, len) = if rest.starts_with("<!--") {
            match rest[4..].find("-->") {
                Some(end) => (TokenType::Comment, end + 7),
                None => return Err(unterminated("comment", lexer.start)),
            }
        } else if starts_declaration(rest) {
            match rest.find('>') {
                Some(end) => (TokenType::Declaration, end + 1),
                None => return Err(unterminated("declaration", lexer.start)),
            }
        } else if starts_end_tag(rest) {
            match rest.find('>') {
                Some(end) => (TokenType::EndTag, end + 1),
                None => return Err(unterminated("end tag", lexer.start)),
            }
        } else if starts_start_tag(rest) {
            match start_tag_len(rest) {
                Some(len) => (TokenType::StartTag, len),
                None => return Err(unterminated("tag", lexer.start)),
            }
        } else {
            (TokenType::Text, text_len(rest))
        };

        let contents = &rest[..len];
        trace!(
            slog_scope::logger(),
            "Token {:?} at {}: {:?}",
            token_type,
            lexer.start,
            contents
        );

        if token_type == TokenType::StartTag && !contents.ends_with("/>") {
            if let Some(name) = tag_name(contents) {
                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    lexer.context = Context::RawText(name);
                }
            }
        }

        tokens.push(Token::new(token_type, contents, lexer.start));
        lexer.start += len;
    }

    debug!(
        slog_scope::logger(),
        "Lexing complete: {} tokens",
        tokens.len()
    );
    Ok(tokens)
}

/// Returns the lowercase name of a start or end tag.
pub fn tag_name(tag: &str) -> Option<String> {
    TAG_NAME
        .captures(tag)
        .map(|c| c["name"].to_ascii_lowercase())
}

fn unterminated(what: &str, position: usize) -> String {
    format!("unterminated {} starting at byte {}", what, position)
}

fn starts_declaration(rest: &str) -> bool {
    rest.starts_with("<!") || rest.starts_with("<?")
}

fn starts_end_tag(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    bytes.len() > 2 && bytes[0] == b'<' && bytes[1] == b'/' && bytes[2].is_ascii_alphabetic()
}

fn starts_start_tag(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    bytes.len() > 1 && bytes[0] == b'<' && bytes[1].is_ascii_alphabetic()
}

/// Whether markup (rather than a literal `<`) starts here.
fn starts_markup(rest: &str) -> bool {
    starts_declaration(rest) || starts_end_tag(rest) || starts_start_tag(rest)
}

/// The length of a start tag, skipping any `>` inside quoted attribute values.
fn start_tag_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut quote: Option<u8> = None;
    let mut last_significant = b'<';

    for (i, &b) in bytes.iter().enumerate().skip(1) {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                    last_significant = b;
                }
            }
            None => {
                if b == b'>' {
                    return Some(i + 1);
                }
                if (b == b'"' || b == b'\'') && last_significant == b'=' {
                    quote = Some(b);
                } else if !b.is_ascii_whitespace() {
                    last_significant = b;
                }
            }
        }
    }

    None
}

/// The length of a run of text, which ends where markup begins.
fn text_len(rest: &str) -> usize {
    let mut from = rest.chars().next().map_or(1, char::len_utf8);
    while let Some(offset) = rest[from..].find('<') {
        let i = from + offset;
        if starts_markup(&rest[i..]) {
            return i;
        }
        from = i + 1;
    }
    rest.len()
}

/// The length of a raw-text body, which ends at its closing tag.
fn raw_text_len(rest: &str, name: &str) -> usize {
    let lower = rest.to_ascii_lowercase();
    let close = format!("</{}", name);
    lower.find(&close).unwrap_or(rest.len())
}
