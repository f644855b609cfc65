//! This module contains the BibTeX reader. It parses a `.bib` file into
//! entries and converts each entry into a [`CSLSource`].

use super::csljson::{CSLSource, DateVariable, NameVariable};
use super::latex;
use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;
use slog::{debug, trace, warn};
use std::collections::HashMap;

lazy_static! {
    /// Regex for runs of whitespace, which BibTeX treats as a single space.
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// The predefined month macros.
static MONTH_MACROS: phf::Map<&'static str, &'static str> = phf_map! {
    "jan" => "January", "feb" => "February", "mar" => "March", "apr" => "April",
    "may" => "May", "jun" => "June", "jul" => "July", "aug" => "August",
    "sep" => "September", "oct" => "October", "nov" => "November", "dec" => "December",
};

/// Month names and abbreviations, for building dates.
static MONTHS: phf::Map<&'static str, i32> = phf_map! {
    "jan" => 1, "january" => 1, "feb" => 2, "february" => 2, "mar" => 3, "march" => 3,
    "apr" => 4, "april" => 4, "may" => 5, "jun" => 6, "june" => 6, "jul" => 7, "july" => 7,
    "aug" => 8, "august" => 8, "sep" => 9, "sept" => 9, "september" => 9,
    "oct" => 10, "october" => 10, "nov" => 11, "november" => 11, "dec" => 12, "december" => 12,
};

/// One entry of a `.bib` file, with its values still in LaTeX.
#[derive(Debug, PartialEq, Eq)]
pub struct BibEntry {
    pub entry_type: String,
    pub key: String,
    pub fields: Vec<(String, String)>,
}

impl BibEntry {
    /// The raw value of a field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The decoded value of a field.
    fn text(&self, name: &str) -> Option<String> {
        self.field(name).map(|v| latex::decode(v).trim().to_string())
    }

    /// The value of a field with only its braces removed, for identifiers
    /// and links.
    fn verbatim(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(|v| v.replace(['{', '}'], "").trim().to_string())
    }
}

/// The BibTeX reader's position in the input.
struct Reader<'a> {
    input: &'a str,
    pos: usize,
    strings: HashMap<String, String>,
}

impl Reader<'_> {
    fn new(input: &str) -> Reader {
        Reader {
            input,
            pos: 0,
            strings: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn line(&self) -> usize {
        self.input[..self.pos].matches('\n').count() + 1
    }

    fn error(&self, message: &str) -> String {
        format!("BibTeX error on line {}—{}", self.line(), message)
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(&format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(&format!("expected '{}', found the end of the file", expected))),
        }
    }

    /// Read an identifier: an entry type, field name, or macro name.
    fn identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || "{}(),=#\"".contains(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.input[start..self.pos].to_string()
    }

    /// Read the contents of a braced group, after its opening brace.
    fn braced(&mut self) -> Result<String, String> {
        let start = self.pos;
        let mut depth = 0;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return Ok(self.input[start..self.pos - 1].to_string()),
                '}' => depth -= 1,
                _ => {}
            }
        }
        Err(self.error("unbalanced braces"))
    }

    /// Read the contents of a quoted value, after its opening quote.
    fn quoted(&mut self) -> Result<String, String> {
        let start = self.pos;
        let mut depth = 0;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                '"' if depth == 0 => return Ok(self.input[start..self.pos - 1].to_string()),
                _ => {}
            }
        }
        Err(self.error("unterminated quoted value"))
    }

    /// Read a value: one or more parts joined with `#`.
    fn value(&mut self) -> Result<String, String> {
        let mut value = String::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('{') => {
                    self.bump();
                    value.push_str(&self.braced()?);
                }
                Some('"') => {
                    self.bump();
                    value.push_str(&self.quoted()?);
                }
                Some(c) if c.is_ascii_digit() => {
                    value.push_str(&self.identifier());
                }
                Some(_) => {
                    let name = self.identifier();
                    if name.is_empty() {
                        return Err(self.error("expected a value"));
                    }
                    value.push_str(&self.resolve(&name));
                }
                None => return Err(self.error("expected a value, found the end of the file")),
            }

            self.skip_whitespace();
            if self.peek() == Some('#') {
                self.bump();
            } else {
                break;
            }
        }

        Ok(WHITESPACE.replace_all(value.trim(), " ").to_string())
    }

    /// Look up a macro.
    fn resolve(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        if let Some(s) = self.strings.get(&lower) {
            return s.clone();
        }
        if let Some(m) = MONTH_MACROS.get(lower.as_str()) {
            return m.to_string();
        }
        warn!(
            slog_scope::logger(),
            "Undefined BibTeX macro {} on line {}",
            name,
            self.line()
        );
        String::new()
    }

    /// Skip the body of a `@comment` or `@preamble`.
    fn skip_group(&mut self, close: char) -> Result<(), String> {
        if close == '}' {
            self.braced()?;
        } else {
            let mut depth = 0;
            loop {
                match self.bump() {
                    Some('(') => depth += 1,
                    Some(')') if depth == 0 => break,
                    Some(')') => depth -= 1,
                    Some(_) => {}
                    None => return Err(self.error("unbalanced parentheses")),
                }
            }
        }
        Ok(())
    }

    /// Read a `@string` definition.
    fn string_definition(&mut self, close: char) -> Result<(), String> {
        self.skip_whitespace();
        let name = self.identifier().to_lowercase();
        self.expect('=')?;
        let value = self.value()?;
        self.expect(close)?;
        trace!(slog_scope::logger(), "@string {} = {:?}", name, value);
        self.strings.insert(name, value);
        Ok(())
    }

    /// Read an entry's key and fields.
    fn entry(&mut self, entry_type: String, close: char) -> Result<BibEntry, String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ',' || c == close || c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        let key = self.input[start..self.pos].to_string();
        if key.is_empty() {
            return Err(self.error(&format!("@{} entry without a key", entry_type)));
        }

        let mut fields = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(c) if c == close => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    let name = self.identifier().to_lowercase();
                    if name.is_empty() {
                        return Err(self.error(&format!("malformed field in {}", key)));
                    }
                    self.expect('=')?;
                    let value = self.value()?;
                    fields.push((name, value));
                }
                None => return Err(self.error(&format!("unterminated entry {}", key))),
            }
        }

        Ok(BibEntry {
            entry_type,
            key,
            fields,
        })
    }
}

/// Parse a BibTeX file into its entries.
///
/// Text outside entries is ignored, as BibTeX does. `@string` macros are
/// expanded, `@comment` and `@preamble` are skipped.
pub fn parse_bibtex(input: &str) -> Result<Vec<BibEntry>, String> {
    debug!(slog_scope::logger(), "Starting BibTeX parsing...");

    let mut reader = Reader::new(input);
    let mut entries = Vec::new();

    while let Some(offset) = reader.input[reader.pos..].find('@') {
        reader.pos += offset + 1;
        reader.skip_whitespace();
        let entry_type = reader.identifier().to_lowercase();
        reader.skip_whitespace();

        let close = match reader.bump() {
            Some('{') => '}',
            Some('(') => ')',
            _ => {
                return Err(reader.error(&format!("expected '{{' after @{}", entry_type)));
            }
        };

        match entry_type.as_str() {
            "comment" | "preamble" => reader.skip_group(close)?,
            "string" => reader.string_definition(close)?,
            _ => {
                let entry = reader.entry(entry_type, close)?;
                trace!(slog_scope::logger(), "Parsed entry {}", entry.key);
                entries.push(entry);
            }
        }
    }

    debug!(
        slog_scope::logger(),
        "BibTeX parsed: {} entries",
        entries.len()
    );
    Ok(entries)
}

/// Deserialize a BibTeX library into [`CSLSource`]s.
pub fn build_bibtex_lib(input: &str) -> Result<Vec<CSLSource>, String> {
    Ok(parse_bibtex(input)?.iter().map(to_csl).collect())
}

/// Convert a BibTeX entry to a [`CSLSource`].
pub fn to_csl(entry: &BibEntry) -> CSLSource {
    let source_type = csl_type(&entry.entry_type);

    // Journals and book titles both become the container.
    let container_title = entry
        .text("journal")
        .or_else(|| entry.text("journaltitle"))
        .or_else(|| entry.text("booktitle"));

    // Theses and reports name their institution instead of a publisher.
    let publisher = entry
        .text("publisher")
        .or_else(|| entry.text("school"))
        .or_else(|| entry.text("institution"))
        .or_else(|| entry.text("organization"));

    // Articles use `number` for the issue.
    let (issue, number) = if source_type == "article-journal" {
        (entry.text("issue").or_else(|| entry.text("number")), None)
    } else {
        (entry.text("issue"), entry.text("number"))
    };

    let genre = match entry.entry_type.as_str() {
        "phdthesis" => Some("Doctoral dissertation".to_string()),
        "mastersthesis" => Some("Master's thesis".to_string()),
        _ => entry.text("type"),
    };

    CSLSource {
        id: entry.key.clone(),
        source_type: Some(source_type.to_string()),
        author: entry.field("author").map(parse_names),
        editor: entry.field("editor").map(parse_names),
        translator: entry.field("translator").map(parse_names),
        issued: issued(entry),
        title: entry.text("title"),
        title_short: entry.text("shorttitle"),
        container_title,
        container_title_short: entry.text("shortjournal"),
        collection_title: entry.text("series"),
        edition: entry.text("edition"),
        volume: entry.text("volume"),
        issue,
        number,
        page: entry.text("pages"),
        publisher,
        publisher_place: entry.text("address").or_else(|| entry.text("location")),
        genre,
        doi: entry.verbatim("doi"),
        isbn: entry.verbatim("isbn"),
        url: entry.verbatim("url"),
    }
}

/// The CSL type for a BibTeX entry type.
fn csl_type(entry_type: &str) -> &'static str {
    match entry_type {
        "article" => "article-journal",
        "book" | "booklet" => "book",
        "inbook" | "incollection" => "chapter",
        "inproceedings" | "conference" => "paper-conference",
        "proceedings" => "book",
        "phdthesis" | "mastersthesis" | "thesis" => "thesis",
        "techreport" | "report" | "manual" => "report",
        "unpublished" => "manuscript",
        "online" | "electronic" => "webpage",
        _ => "document",
    }
}

/// Build the issued date from `year` and `month` (or a biblatex `date`).
fn issued(entry: &BibEntry) -> Option<DateVariable> {
    let year = entry.text("year");
    let date = entry.text("date");

    let year = match (year, &date) {
        (Some(y), _) => y,
        (None, Some(d)) => d.split('-').next().unwrap_or_default().to_string(),
        (None, None) => return None,
    };

    let year_number = match year.trim().parse::<i32>() {
        Ok(y) => y,
        Err(_) => {
            return Some(DateVariable {
                literal: Some(year),
                ..Default::default()
            })
        }
    };

    let mut parts = vec![year_number];
    if let Some(month) = entry.text("month").and_then(|m| month_number(&m)) {
        parts.push(month);
    }

    Some(DateVariable {
        date_parts: Some(vec![parts]),
        ..Default::default()
    })
}

fn month_number(month: &str) -> Option<i32> {
    let month = month.trim().trim_end_matches('.').to_lowercase();
    match month.parse::<i32>() {
        Ok(m) if (1..=12).contains(&m) => Some(m),
        Ok(_) => None,
        Err(_) => MONTHS.get(month.as_str()).copied(),
    }
}

/// Split a raw value into words at brace depth zero.
fn words(raw: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut depth = 0;
    let mut start: Option<usize> = None;

    for (i, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                words.push(&raw[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push(&raw[s..]);
    }

    words
}

/// Whether a word is a lowercase "von" particle.
fn is_particle(word: &str) -> bool {
    if word.starts_with('{') {
        return false;
    }
    word.chars()
        .find(|c| c.is_alphabetic())
        .map(|c| c.is_lowercase())
        .unwrap_or(false)
}

/// Parse a BibTeX name list (`A and B and C`).
///
/// Each name may be written `First von Last`, `von Last, First`, or
/// `von Last, Jr, First`. A name wrapped entirely in braces is a literal.
pub fn parse_names(raw: &str) -> Vec<NameVariable> {
    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in words(raw) {
        if word.eq_ignore_ascii_case("and") {
            names.extend(parse_name(&current));
            current.clear();
        } else {
            current.push(word);
        }
    }
    names.extend(parse_name(&current));

    names
}

fn parse_name(words: &[&str]) -> Option<NameVariable> {
    if words.is_empty() {
        return None;
    }
    if words.len() == 1 && words[0] == "others" {
        trace!(slog_scope::logger(), "Skipping \"others\" in a name list");
        return None;
    }
    if words.len() == 1 && words[0].starts_with('{') && words[0].ends_with('}') {
        return Some(NameVariable {
            literal: Some(decode_words(words)),
            ..Default::default()
        });
    }

    // Split into comma-separated parts at the word level.
    let mut parts: Vec<Vec<&str>> = vec![Vec::new()];
    for word in words {
        let mut word = *word;
        let trailing_comma = word.ends_with(',') && !word.ends_with("\\,");
        if trailing_comma {
            word = &word[..word.len() - 1];
        }
        if !word.is_empty() {
            if let Some(last) = parts.last_mut() {
                last.push(word);
            }
        }
        if trailing_comma {
            parts.push(Vec::new());
        }
    }
    parts.retain(|p| !p.is_empty());

    let (first, von, last, jr): (&[&str], &[&str], &[&str], &[&str]) = match parts.len() {
        0 => return None,
        1 => {
            let all = &parts[0][..];
            match all.iter().position(|w| is_particle(w)) {
                Some(p) if p < all.len() - 1 => {
                    let von_end = all[p..all.len() - 1]
                        .iter()
                        .rposition(|w| is_particle(w))
                        .map(|r| p + r + 1)
                        .unwrap_or(p + 1);
                    (&all[..p], &all[p..von_end], &all[von_end..], &[])
                }
                _ => (&all[..all.len() - 1], &[], &all[all.len() - 1..], &[]),
            }
        }
        n => {
            let (von, last) = split_von(&parts[0]);
            let jr: &[&str] = if n > 2 { &parts[1] } else { &[] };
            (&parts[n - 1][..], von, last, jr)
        }
    };

    Some(NameVariable {
        family: non_empty(decode_words(last)),
        given: non_empty(decode_words(first)),
        non_dropping_particle: non_empty(decode_words(von)),
        dropping_particle: None,
        suffix: non_empty(decode_words(jr)),
        literal: None,
    })
}

/// Split `von Last` into its particle and family parts.
fn split_von<'a, 'b>(part: &'b [&'a str]) -> (&'b [&'a str], &'b [&'a str]) {
    let mut von_end = 0;
    for (i, word) in part.iter().enumerate() {
        if i < part.len() - 1 && is_particle(word) {
            von_end = i + 1;
        }
    }
    (&part[..von_end], &part[von_end..])
}

fn decode_words(words: &[&str]) -> String {
    latex::decode(&words.join(" ")).trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
