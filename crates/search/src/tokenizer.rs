//! Tokenizers for object names and queries
//!
//! Object names follow DNS subdomain rules: dot- and hyphen-separated
//! fragments, at most 253 bytes. Both the fragments and the whole name are
//! indexed so that `web` and `web-frontend` each find `web-frontend`.

/// Longest identifier that is tokenized; longer input is truncated.
pub const MAX_IDENTIFIER_LEN: usize = 253;

const SEPARATORS: [char; 2] = ['.', '-'];

/// Tokenize an identifier (namespace or object name).
///
/// - Truncate to [`MAX_IDENTIFIER_LEN`] bytes
/// - Split on `.` and `-`, dropping empty fragments
/// - If more than one fragment remains, append the whole text as a final term
///
/// # Example
///
/// ```
/// use kubesearch_search::tokenizer::tokenize_identifier;
///
/// let tokens = tokenize_identifier("dns.sub-domain.name");
/// assert_eq!(tokens, vec!["dns", "sub", "domain", "name", "dns.sub-domain.name"]);
/// ```
pub fn tokenize_identifier(text: &str) -> Vec<String> {
    let text = truncate(text, MAX_IDENTIFIER_LEN);

    let mut terms: Vec<String> = text
        .split(SEPARATORS)
        .filter(|fragment| !fragment.is_empty())
        .map(String::from)
        .collect();

    if terms.len() > 1 {
        terms.push(text.to_string());
    }

    terms
}

/// Tokenize a free-text query.
///
/// Splits on whitespace and runs each word through [`tokenize_identifier`],
/// keeping the order of first occurrence.
///
/// # Example
///
/// ```
/// use kubesearch_search::tokenizer::tokenize_query;
///
/// let tokens = tokenize_query("  blargle   flargle ");
/// assert_eq!(tokens, vec!["blargle", "flargle"]);
/// ```
pub fn tokenize_query(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .flat_map(tokenize_identifier)
        .collect()
}

/// Longest prefix of `text` that fits in `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
