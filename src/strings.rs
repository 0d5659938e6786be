//! Casing and whitespace helpers for derived names.
//!
//! `pascal_case` mirrors the naming the docs-derived identifiers depend on:
//! `/`, `-` and `_` act as word breaks, other punctuation is dropped, and
//! interior capitals are preserved ("foo/getStatus" → "FooGetStatus").

/// Remove every whitespace character (cell text in the docs is littered
/// with layout whitespace).
pub fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Split free-text documentation into trimmed, non-empty lines.
pub fn doc_lines(s: &str) -> Vec<String> {
    s.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c == '/' || c == '-' || c == '_' || c.is_whitespace() {
            at_word_start = true;
        } else if !c.is_alphanumeric() {
            // dropped, does not break the word ("com.webos" → "Comwebos")
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut cur = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !cur.is_empty() {
                words.push(std::mem::take(&mut cur));
            }
            continue;
        }
        if let Some(prev) = cur.chars().last() {
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_numeric())
                || (prev.is_numeric() && c.is_alphabetic())
                // tail of an acronym run: "DRMStatus" → drm_status
                || (prev.is_uppercase() && c.is_uppercase() && next_lower);
            if boundary {
                words.push(std::mem::take(&mut cur));
            }
        }
        cur.push(c);
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    words
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Enum member name from an error message: "Bad Input" → "BAD_INPUT".
pub fn enum_member(message: &str) -> String {
    snake_case(message).to_uppercase()
}
