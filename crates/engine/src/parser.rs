//! Seed identifier parsing
//!
//! Extracts an ordered sequence of seed identifiers (e.g. DOIs) from
//! free-form multi-line input. No deduplication here; duplicate ids
//! collapse at the graph layer.

use citegraph_common::errors::{EngineError, Result};

/// Split raw multi-line input into trimmed, non-empty seed identifiers.
///
/// Order is preserved. Empty input yields an empty list, which is a valid
/// "no seeds" state handled by the coordinator.
pub fn parse_seed_ids(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse seeds for an explicit build action, where blank input is a user
/// error rather than a "show nothing" state.
pub fn require_seed_ids(input: &str) -> Result<Vec<String>> {
    let seeds = parse_seed_ids(input);
    if seeds.is_empty() {
        return Err(EngineError::InvalidInput {
            message: "Enter at least one paper identifier, one per line.".to_string(),
        });
    }
    Ok(seeds)
}

/// Sanitize a single identifier that arrived embedded in a page address.
///
/// Percent-decodes when the escapes are well formed; malformed escapes
/// fall back to the raw trimmed string rather than erroring.
pub fn sanitize_seed_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match urlencoding::decode(trimmed) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiline() {
        let ids = parse_seed_ids("10.1/abc\n10.2/def");
        assert_eq!(ids, vec!["10.1/abc", "10.2/def"]);
    }

    #[test]
    fn test_parse_trims_and_drops_blanks() {
        let ids = parse_seed_ids("  10.1/abc  \n\n   \n10.2/def\n");
        assert_eq!(ids, vec!["10.1/abc", "10.2/def"]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_seed_ids("").is_empty());
        assert!(parse_seed_ids("   \n  \n").is_empty());
    }

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let ids = parse_seed_ids("b\na\nb");
        assert_eq!(ids, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_require_seeds_rejects_blank_input() {
        assert!(require_seed_ids("  \n \n").is_err());
        assert_eq!(require_seed_ids("10.1/abc").unwrap(), vec!["10.1/abc"]);
    }

    #[test]
    fn test_sanitize_percent_decodes() {
        assert_eq!(sanitize_seed_id("10.1234%2Fabc "), "10.1234/abc");
    }

    #[test]
    fn test_sanitize_malformed_falls_back() {
        assert_eq!(sanitize_seed_id("10.1/%zz"), "10.1/%zz");
    }
}
