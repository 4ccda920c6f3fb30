//! String utility functions

/// Title-case a label: the first letter of every alphabetic run is upper-cased
/// and the rest of the run lower-cased.
///
/// Any non-alphabetic character (space, digit, apostrophe) starts a new run, so
/// `"hours required"` becomes `"Hours Required"` and `"o'neil"` becomes `"O'Neil"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Split a comma-separated string into trimmed, non-empty parts.
pub fn split_clauses(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Check whether `s` is usable as a bare SQL column identifier.
pub fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_simple() {
        assert_eq!(title_case("hours required"), "Hours Required");
        assert_eq!(title_case("TITLE"), "Title");
        assert_eq!(title_case("Send Email"), "Send Email");
    }

    #[test]
    fn test_title_case_non_alpha_boundaries() {
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("task2name"), "Task2Name");
        assert_eq!(title_case("  last   updated "), "  Last   Updated ");
    }

    #[test]
    fn test_title_case_empty() {
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_split_clauses_trims_and_drops_empty() {
        assert_eq!(
            split_clauses(" Title contains foo ,, Status=open ,  "),
            vec!["Title contains foo", "Status=open"]
        );
    }

    #[test]
    fn test_split_clauses_blank() {
        assert!(split_clauses("").is_empty());
        assert!(split_clauses(" , ,").is_empty());
    }

    #[test]
    fn test_is_sql_identifier() {
        assert!(is_sql_identifier("hours_required"));
        assert!(is_sql_identifier("_id"));
        assert!(!is_sql_identifier("1col"));
        assert!(!is_sql_identifier("name; DROP TABLE users"));
        assert!(!is_sql_identifier(""));
    }
}
