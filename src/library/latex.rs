//! This module contains functionality for turning the LaTeX found in BibTeX
//! values into plain Unicode text.

use phf::phf_map;

/// Accented letters, keyed by the accent command and the base letter.
static ACCENTS: phf::Map<&'static str, char> = phf_map! {
    "'a" => 'á', "'e" => 'é', "'i" => 'í', "'o" => 'ó', "'u" => 'ú', "'y" => 'ý',
    "'c" => 'ć', "'n" => 'ń', "'s" => 'ś', "'z" => 'ź',
    "'A" => 'Á', "'E" => 'É', "'I" => 'Í', "'O" => 'Ó', "'U" => 'Ú', "'Y" => 'Ý',
    "'C" => 'Ć', "'N" => 'Ń', "'S" => 'Ś', "'Z" => 'Ź',
    "`a" => 'à', "`e" => 'è', "`i" => 'ì', "`o" => 'ò', "`u" => 'ù',
    "`A" => 'À', "`E" => 'È', "`I" => 'Ì', "`O" => 'Ò', "`U" => 'Ù',
    "^a" => 'â', "^e" => 'ê', "^i" => 'î', "^o" => 'ô', "^u" => 'û',
    "^A" => 'Â', "^E" => 'Ê', "^I" => 'Î', "^O" => 'Ô', "^U" => 'Û',
    "\"a" => 'ä', "\"e" => 'ë', "\"i" => 'ï', "\"o" => 'ö', "\"u" => 'ü', "\"y" => 'ÿ',
    "\"A" => 'Ä', "\"E" => 'Ë', "\"I" => 'Ï', "\"O" => 'Ö', "\"U" => 'Ü',
    "~a" => 'ã', "~n" => 'ñ', "~o" => 'õ', "~A" => 'Ã', "~N" => 'Ñ', "~O" => 'Õ',
    "=a" => 'ā', "=e" => 'ē', "=i" => 'ī', "=o" => 'ō', "=u" => 'ū',
    ".e" => 'ė', ".z" => 'ż', ".Z" => 'Ż',
    "cc" => 'ç', "cC" => 'Ç', "cs" => 'ş', "cS" => 'Ş',
    "vc" => 'č', "vs" => 'š', "vz" => 'ž', "vr" => 'ř', "ve" => 'ě',
    "vC" => 'Č', "vS" => 'Š', "vZ" => 'Ž', "vR" => 'Ř', "vE" => 'Ě',
    "ua" => 'ă', "ug" => 'ğ', "uA" => 'Ă', "uG" => 'Ğ',
    "Ho" => 'ő', "Hu" => 'ű', "HO" => 'Ő', "HU" => 'Ű',
    "ka" => 'ą', "ke" => 'ę', "kA" => 'Ą', "kE" => 'Ę',
    "ra" => 'å', "rA" => 'Å', "ru" => 'ů',
};

/// Letters and symbols produced by control words.
static SYMBOLS: phf::Map<&'static str, &'static str> = phf_map! {
    "o" => "ø", "O" => "Ø", "ss" => "ß", "ae" => "æ", "AE" => "Æ",
    "oe" => "œ", "OE" => "Œ", "aa" => "å", "AA" => "Å", "l" => "ł", "L" => "Ł",
    "i" => "ı", "j" => "ȷ",
    "textendash" => "–", "textemdash" => "—", "ldots" => "…", "dots" => "…",
    "textquoteright" => "’", "textquoteleft" => "‘", "textasciitilde" => "~",
    "textbackslash" => "\\", "textbar" => "|", "S" => "§", "P" => "¶",
    "TeX" => "TeX", "LaTeX" => "LaTeX",
};

/// Accents written with a punctuation character, as in `\"o`.
const PUNCTUATION_ACCENTS: [char; 7] = ['\'', '`', '^', '"', '~', '=', '.'];

/// Accents written with a letter, as in `\c{c}`.
const LETTER_ACCENTS: [&str; 6] = ["c", "v", "u", "H", "k", "r"];

/// Decode LaTeX markup into plain text.
///
/// Accent commands and named letters become Unicode, escaped characters are
/// unescaped, grouping braces are dropped, `--` and `---` become dashes, and
/// `~` becomes a non-breaking space. Unknown commands are dropped but their
/// arguments are kept.
pub fn decode(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut output = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => i = command(&chars, i, &mut output),
            '{' | '}' => i += 1,
            '~' => {
                output.push('\u{a0}');
                i += 1;
            }
            '-' => {
                if chars.get(i + 1) == Some(&'-') && chars.get(i + 2) == Some(&'-') {
                    output.push('—');
                    i += 3;
                } else if chars.get(i + 1) == Some(&'-') {
                    output.push('–');
                    i += 2;
                } else {
                    output.push('-');
                    i += 1;
                }
            }
            c => {
                output.push(c);
                i += 1;
            }
        }
    }

    output
}

/// Decode the command starting at the backslash at `start`, returning the
/// index just past it.
fn command(chars: &[char], start: usize, output: &mut String) -> usize {
    let next = match chars.get(start + 1) {
        Some(&c) => c,
        None => {
            output.push('\\');
            return start + 1;
        }
    };

    if PUNCTUATION_ACCENTS.contains(&next) {
        return match accent_target(chars, start + 2) {
            Some((letter, end)) => {
                output.push(accented(next, letter));
                end
            }
            None => {
                output.push(next);
                start + 2
            }
        };
    }

    if next.is_ascii_alphabetic() {
        let mut end = start + 1;
        while end < chars.len() && chars[end].is_ascii_alphabetic() {
            end += 1;
        }
        let name: String = chars[start + 1..end].iter().collect();

        if LETTER_ACCENTS.contains(&name.as_str()) {
            let mut target = end;
            while target < chars.len() && chars[target] == ' ' {
                target += 1;
            }
            if let Some((letter, after)) = accent_target(chars, target) {
                output.push(accented(next, letter));
                return after;
            }
        }

        if let Some(symbol) = SYMBOLS.get(name.as_str()) {
            output.push_str(symbol);
            while end < chars.len() && chars[end] == ' ' {
                end += 1;
            }
        }

        return end;
    }

    // An escaped character such as `\&` or `\%`.
    output.push(next);
    start + 2
}

/// The letter an accent applies to, and the index just past it.
fn accent_target(chars: &[char], at: usize) -> Option<(char, usize)> {
    match chars.get(at) {
        Some('{') => {
            let (letter, after) = bare_target(chars, at + 1)?;
            if chars.get(after) == Some(&'}') {
                Some((letter, after + 1))
            } else {
                Some((letter, after))
            }
        }
        _ => bare_target(chars, at),
    }
}

fn bare_target(chars: &[char], at: usize) -> Option<(char, usize)> {
    match (chars.get(at), chars.get(at + 1)) {
        (Some('\\'), Some(&c)) if c == 'i' || c == 'j' => Some((c, at + 2)),
        (Some(&c), _) if c.is_alphabetic() => Some((c, at + 1)),
        _ => None,
    }
}

fn accented(accent: char, letter: char) -> char {
    let key = format!("{}{}", accent, letter);
    ACCENTS.get(key.as_str()).copied().unwrap_or(letter)
}
