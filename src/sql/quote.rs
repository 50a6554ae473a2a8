//! Identifier and literal quoting.
//!
//! A token is wrapped in double quotes iff it contains a space or a hyphen and
//! is not already quoted. Column paths (`table.column`) are quoted per segment.

/// Characters that force a token into double quotes.
const QUOTE_CHARS: [char; 2] = [' ', '-'];

/// Does this token carry its own surrounding double quotes?
pub fn is_quoted(token: &str) -> bool {
    token.len() >= 2 && token.starts_with('"') && token.ends_with('"')
}

/// Quote a single token (identifier or value), never splitting on dots.
pub fn quote_ident(token: &str) -> String {
    if token.contains(QUOTE_CHARS) && !is_quoted(token) {
        format!("\"{}\"", token)
    } else {
        token.to_string()
    }
}

/// Quote a column path segment by segment: `Test-1.Unique ID` becomes
/// `"Test-1"."Unique ID"`.
pub fn quote_path(path: &str) -> String {
    match split_path(path) {
        (Some(table), column) => format!("{}.{}", quote_ident(table), quote_ident(column)),
        (None, column) => quote_ident(column),
    }
}

/// Remove every double quote from a token.
pub fn unquote(token: &str) -> String {
    token.replace('"', "")
}

/// Split a column path at its first dot that is not inside double quotes.
///
/// Returns `(None, path)` when the path has no table segment.
pub fn split_path(path: &str) -> (Option<&str>, &str) {
    let mut in_quotes = false;
    for (idx, ch) in path.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => return (Some(&path[..idx]), &path[idx + 1..]),
            _ => {}
        }
    }
    (None, path)
}

/// `?, ?, ?` with one placeholder per value.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
