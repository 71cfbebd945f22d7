//! Static regex and CSS selector construction shared by the extractor and model.

use regex::Regex;
use scraper::Selector;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Parses a CSS selector at static init; panics on invalid selector.
pub(crate) fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e}"))
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub(crate) fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("  Tampa \n\t - Davis  "), "Tampa - Davis");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_static_builders_accept_valid_patterns() {
        let re = compile_static_regex(r"\d+");
        assert!(re.is_match("12"));
        let _selector = compile_static_selector("div[onclick]");
    }
}
