//! SQL utility functions

/// Escape LIKE metacharacters (`%`, `_`, `\`) so a user-typed search term
/// matches literally inside a `LIKE ? ESCAPE '\'` pattern.
///
/// ```
/// use taskdesk_server::utils::sql::escape_like_pattern;
///
/// assert_eq!(escape_like_pattern("50%_done"), "50\\%\\_done");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wrap a search term as a substring pattern.
pub fn contains_pattern(s: &str) -> String {
    format!("%{}%", escape_like_pattern(s))
}
