//! Escaping and unescaping of HTML text and attribute values.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Regex for a character reference, named or numeric.
    pub static ref ENTITY: Regex =
        Regex::new(r"&(?P<ref>#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]*);").unwrap();
}

/// Decode the character references in text or an attribute value.
///
/// Only the handful of named references that show up in generated
/// documentation are known. Anything else is left as written.
pub fn decode(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    ENTITY
        .replace_all(input, |caps: &Captures| {
            let reference = &caps["ref"];
            let decoded = if let Some(hex) = reference
                .strip_prefix("#x")
                .or_else(|| reference.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = reference.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named(reference)
            };

            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

fn named(reference: &str) -> Option<char> {
    match reference {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        _ => None,
    }
}

/// Escape text for use between tags.
pub fn escape_text(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
    output
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attribute(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_references() {
        assert_eq!(decode("Fabri &amp; Giezeman"), "Fabri & Giezeman");
        assert_eq!(decode("&lt;b&gt;"), "<b>");
        assert_eq!(decode("Sch&#246;nherr"), "Schönherr");
        assert_eq!(decode("Sch&#xF6;nherr"), "Schönherr");
        assert_eq!(decode("&unknown; &amp"), "&unknown; &amp");
    }

    #[test]
    fn escapes() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_text("\"quoted\""), "\"quoted\"");
        assert_eq!(escape_attribute("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; &lt;go&gt;");
    }

    #[test]
    fn escape_then_decode() {
        let raw = "Kettner & Pion <\"CGAL\">";
        assert_eq!(decode(&escape_attribute(raw)), raw);
    }
}
