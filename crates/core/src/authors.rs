//! Author name handling.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedAuthorName {
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Split a report's free-text author name: the first word is the first
/// name, the last word the last name, anything in between is dropped.
/// Returns `None` for blank input.
pub fn parse_author_name(name: &str) -> Option<ParsedAuthorName> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [] => None,
        [only] => Some(ParsedAuthorName {
            first_name: only.to_string(),
            last_name: None,
        }),
        [first, .., last] => Some(ParsedAuthorName {
            first_name: first.to_string(),
            last_name: Some(last.to_string()),
        }),
    }
}

/// Join the non-empty name parts with single spaces.
pub fn display_name(
    prefix: Option<&str>,
    first_name: &str,
    middle_name: Option<&str>,
    last_name: Option<&str>,
    suffix: Option<&str>,
) -> String {
    [prefix, Some(first_name), middle_name, last_name, suffix]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_word() {
        let parsed = parse_author_name("  Ada  Byron Quill ").unwrap();
        assert_eq!(parsed.first_name, "Ada");
        assert_eq!(parsed.last_name.as_deref(), Some("Quill"));
    }

    #[test]
    fn single_word_is_first_name() {
        let parsed = parse_author_name("Madonna").unwrap();
        assert_eq!(parsed.first_name, "Madonna");
        assert_eq!(parsed.last_name, None);
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(parse_author_name("   "), None);
    }

    #[test]
    fn display_skips_missing_parts() {
        assert_eq!(
            display_name(Some("Dr."), "Ada", None, Some("Quill"), Some("")),
            "Dr. Ada Quill"
        );
    }
}
