//! Text normalization applied to documents before chunking and to queries
//! before retrieval. Both sides must run the identical pipeline or
//! relevance degrades silently.

use std::collections::HashSet;
use std::sync::OnceLock;

use unicode_normalization::UnicodeNormalization;

/// Uninformative words removed from cleaned text when stopword filtering
/// is enabled.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "in", "on", "at", "for", "to", "from", "by", "with",
    "is", "are", "was", "were", "be", "been", "of", "that", "this", "it", "as", "but",
    "if", "then", "so", "not", "no", "yes", "do", "does", "did", "doing", "have", "has",
    "had",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Decode the common named HTML entities plus numeric `&#NNN;` / `&#xHH;`
/// references. Unknown entities are left untouched.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // An entity is at most ~10 chars; give up past that.
        match tail[1..].find(';').filter(|&semi| semi <= 10) {
            Some(semi) => {
                let name = &tail[1..semi + 1];
                let decoded = match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "ndash" => Some('-'),
                    "mdash" => Some('-'),
                    "rsquo" | "lsquo" => Some('\''),
                    "rdquo" | "ldquo" => Some('"'),
                    "hellip" => Some('.'),
                    _ => {
                        if let Some(num) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
                            u32::from_str_radix(num, 16).ok().and_then(char::from_u32)
                        } else if let Some(num) = name.strip_prefix('#') {
                            num.parse::<u32>().ok().and_then(char::from_u32)
                        } else {
                            None
                        }
                    }
                };
                match decoded {
                    Some(c) => {
                        out.push(c);
                        rest = &tail[semi + 2..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Fold typographic quotes and dashes to their ASCII equivalents and drop
/// soft hyphens and zero-width format characters.
fn fold_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => out.push('-'),
            // Soft hyphen and zero-width/formatting characters.
            '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{2060}' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Collapse runs of 3+ newlines to exactly two and turn a lone newline
/// into a space, preserving paragraph breaks.
fn collapse_line_breaks(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\n' {
            out.push(c);
            continue;
        }
        let mut run = 1usize;
        while chars.peek() == Some(&'\n') {
            chars.next();
            run += 1;
        }
        if run == 1 {
            out.push(' ');
        } else {
            out.push_str("\n\n");
        }
    }
    out
}

fn keep_char(c: char) -> bool {
    c.is_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        || matches!(c, '.' | ',' | ':' | ';' | '?' | '!' | '\'' | '-')
}

/// Full cleaning pipeline: entity decode, NFC, character folding, line-break
/// collapsing, character whitelist, lowercase, whitespace collapse, and
/// optional stopword removal.
pub fn clean_text(text: &str, remove_stopwords: bool) -> String {
    let text = decode_entities(text);
    let text: String = text.nfc().collect();
    let text = fold_chars(&text);
    let text = collapse_line_breaks(&text);
    let text: String = text
        .chars()
        .map(|c| if keep_char(c) { c } else { ' ' })
        .collect();
    let text = text.to_lowercase();

    let words = text.split_whitespace();
    let cleaned: Vec<&str> = if remove_stopwords {
        let stop = stopword_set();
        words.filter(|w| !stop.contains(w)).collect()
    } else {
        words.collect()
    };
    cleaned.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(decode_entities("salt &amp; pepper"), "salt & pepper");
        assert_eq!(decode_entities("&#77;ars"), "Mars");
        assert_eq!(decode_entities("&#x4D;ars"), "Mars");
        // Unknown entity is left as-is.
        assert_eq!(decode_entities("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn folds_smart_punctuation() {
        assert_eq!(fold_chars("\u{201C}quoted\u{201D} \u{2014} done"), "\"quoted\" - done");
        assert_eq!(fold_chars("co\u{00AD}operate"), "cooperate");
    }

    #[test]
    fn collapses_line_breaks() {
        assert_eq!(collapse_line_breaks("a\nb"), "a b");
        assert_eq!(collapse_line_breaks("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_line_breaks("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn clean_lowercases_and_strips() {
        let cleaned = clean_text("Mars (the red planet) has TWO moons!", false);
        assert_eq!(cleaned, "mars the red planet has two moons!");
    }

    #[test]
    fn clean_removes_stopwords_when_asked() {
        let cleaned = clean_text("The Moon orbits the Earth", true);
        assert_eq!(cleaned, "moon orbits earth");
    }

    #[test]
    fn clean_of_whitespace_only_is_empty() {
        assert_eq!(clean_text("  \n\t ", true), "");
    }
}
