//! This module contains tools for formatting names.

use crate::library::csljson::NameVariable;

/// Initials for one or more given names.
///
/// `Sander P. A.` and `Sander PA` both become `S. P. A.`, and hyphenated
/// names keep their hyphen (`Geert-Jan` becomes `G.-J.`).
pub fn initials(given: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for word in given.split_whitespace() {
        let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
        let all_caps = letters.len() > 1
            && letters.len() <= 3
            && !word.contains('.')
            && !word.contains('-')
            && letters.iter().all(|c| c.is_uppercase());

        if all_caps {
            for letter in letters {
                parts.push(format!("{}.", letter));
            }
        } else if word.contains('-') {
            let hyphenated: Vec<String> = word.split('-').filter_map(initial).collect();
            if !hyphenated.is_empty() {
                parts.push(hyphenated.join("-"));
            }
        } else if let Some(i) = initial(word) {
            parts.push(i);
        }
    }

    parts.join(" ")
}

fn initial(word: &str) -> Option<String> {
    word.chars()
        .find(|c| c.is_alphabetic())
        .map(|c| format!("{}.", c.to_uppercase()))
}

/// The family name with its particle (`van Beethoven`).
pub fn family(name: &NameVariable) -> String {
    let mut family = String::new();
    for part in [&name.non_dropping_particle, &name.family].into_iter().flatten() {
        if !family.is_empty() {
            family.push(' ');
        }
        family.push_str(part);
    }
    family
}

/// A name in inverted form: `Family, G. I., Jr.`
pub fn inverted(name: &NameVariable) -> String {
    if let Some(literal) = &name.literal {
        return literal.to_string();
    }

    let mut output = family(name);
    if let Some(given) = name.given.as_deref().map(initials).filter(|g| !g.is_empty()) {
        output.push_str(", ");
        if let Some(particle) = &name.dropping_particle {
            output.push_str(&given);
            output.push(' ');
            output.push_str(particle);
        } else {
            output.push_str(&given);
        }
    }
    if let Some(suffix) = &name.suffix {
        output.push_str(", ");
        output.push_str(suffix);
        if !suffix.ends_with('.') && suffix.len() <= 2 {
            output.push('.');
        }
    }
    output
}

/// A name with initials first: `G. I. Family, Jr.`
pub fn initials_first(name: &NameVariable) -> String {
    if let Some(literal) = &name.literal {
        return literal.to_string();
    }

    let mut output = String::new();
    if let Some(given) = name.given.as_deref().map(initials).filter(|g| !g.is_empty()) {
        output.push_str(&given);
        output.push(' ');
    }
    if let Some(particle) = &name.dropping_particle {
        output.push_str(particle);
        output.push(' ');
    }
    output.push_str(&family(name));
    if let Some(suffix) = &name.suffix {
        output.push_str(", ");
        output.push_str(suffix);
    }
    output
}

/// An APA author list: up to twenty names, the last joined with `&`.
pub fn apa_authors(names: &[NameVariable]) -> String {
    let formatted: Vec<String> = names.iter().map(inverted).collect();
    match formatted.len() {
        0 => String::new(),
        1 => formatted[0].clone(),
        n if n <= 20 => format!("{}, & {}", formatted[..n - 1].join(", "), formatted[n - 1]),
        n => format!("{}, . . . {}", formatted[..19].join(", "), formatted[n - 1]),
    }
}

/// An APA editor list, names not inverted: `G. S. Brodal & D. Frigioni (Eds.)`
pub fn apa_editors(names: &[NameVariable]) -> String {
    let formatted: Vec<String> = names.iter().map(initials_first).collect();
    let list = match formatted.len() {
        0 => return String::new(),
        1 => formatted[0].clone(),
        2 => format!("{} & {}", formatted[0], formatted[1]),
        n => format!("{}, & {}", formatted[..n - 1].join(", "), formatted[n - 1]),
    };
    let label = if formatted.len() == 1 { "Ed." } else { "Eds." };
    format!("{} ({})", list, label)
}

/// An IEEE name list: up to six names, more become `et al.`
pub fn ieee_names(names: &[NameVariable]) -> String {
    let formatted: Vec<String> = names.iter().map(initials_first).collect();
    match formatted.len() {
        0 => String::new(),
        1 => formatted[0].clone(),
        2 => format!("{} and {}", formatted[0], formatted[1]),
        n if n <= 6 => format!("{}, and {}", formatted[..n - 1].join(", "), formatted[n - 1]),
        _ => format!("{} et al.", formatted[0]),
    }
}
