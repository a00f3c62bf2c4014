//! Query-string helpers shared by the list endpoints.

use serde::Deserialize;

/// Sort direction for list endpoints. Newest-first is the default everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recency {
    #[default]
    Newest,
    Oldest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// `None`, blank and `"all"` all mean "no filter".
pub fn optional_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

/// Case-insensitive substring test. An empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Builds an ILIKE `%needle%` pattern with LIKE metacharacters escaped.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_filter_treats_all_as_none() {
        assert_eq!(optional_filter(Some("all")), None);
        assert_eq!(optional_filter(Some("ALL")), None);
        assert_eq!(optional_filter(Some("  ")), None);
        assert_eq!(optional_filter(None), None);
        assert_eq!(
            optional_filter(Some(" Engineering ")),
            Some("Engineering".to_string())
        );
    }

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("Rust Backend", "backend"));
        assert!(contains_ci("anything", ""));
        assert!(!contains_ci("Rust", "go"));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("react"), "%react%");
        assert_eq!(like_pattern("100%_x"), "%100\\%\\_x%");
    }
}
