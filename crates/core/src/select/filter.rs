//! Incremental candidate filtering
//!
//! The query is a regular expression searched anywhere in each label. A query
//! that does not compile as a regular expression is matched literally instead,
//! with the same case sensitivity.

use regex::{Regex, RegexBuilder};

/// Build the matcher for a query
///
/// `None` only if even the escaped query fails to compile (size limits).
pub fn matcher(query: &str, ignore_case: bool) -> Option<Regex> {
    let build = |pattern: &str| {
        RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
    };
    build(query)
        .or_else(|e| {
            tracing::debug!(query, "query is not a valid pattern, matching literally: {e}");
            build(&regex::escape(query))
        })
        .ok()
}

/// Indices of the candidates matching `query`, in original order
pub fn filter<S: AsRef<str>>(candidates: &[S], query: &str, ignore_case: bool) -> Vec<usize> {
    if query.is_empty() {
        return (0..candidates.len()).collect();
    }
    let Some(regex) = matcher(query, ignore_case) else {
        return Vec::new();
    };
    candidates
        .iter()
        .enumerate()
        .filter(|(_, label)| regex.is_match(label.as_ref()))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &[&str] = &["a", "b", "c", "aa"];

    fn labels(indices: &[usize], candidates: &[&'static str]) -> Vec<&'static str> {
        indices.iter().map(|&i| candidates[i]).collect()
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        assert_eq!(filter(LABELS, "", true), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_substring_match_keeps_order() {
        assert_eq!(labels(&filter(LABELS, "a", true), LABELS), vec!["a", "aa"]);
        assert!(filter(LABELS, "z", true).is_empty());
    }

    #[test]
    fn test_regex_query() {
        let candidates = ["report-2023.csv", "report-2024.csv", "notes.md"];
        let hits = filter(&candidates, r"20\d4", true);
        assert_eq!(hits, vec![1]);
        assert_eq!(filter(&candidates, "^notes", true), vec![2]);
    }

    #[test]
    fn test_case_sensitivity() {
        let candidates = ["README.md", "readme.txt"];
        assert_eq!(filter(&candidates, "readme", true), vec![0, 1]);
        assert_eq!(filter(&candidates, "readme", false), vec![1]);
    }

    #[test]
    fn test_invalid_pattern_matches_literally() {
        let candidates = ["a(b", "ab", "A(B"];
        assert_eq!(filter(&candidates, "a(", true), vec![0, 2]);
        assert_eq!(filter(&candidates, "a(", false), vec![0]);
        assert!(filter(&candidates, "[", true).is_empty());
    }

    #[test]
    fn test_result_is_matching_subsequence() {
        let candidates = ["logs", "Log.txt", "blog/", "data", "catalog", "LOG"];
        for query in ["log", "^l", "g$", "x", "o+", "(", "."] {
            for ignore_case in [true, false] {
                let hits = filter(&candidates, query, ignore_case);
                assert!(hits.windows(2).all(|w| w[0] < w[1]));
                let regex = matcher(query, ignore_case).unwrap();
                for (i, label) in candidates.iter().enumerate() {
                    assert_eq!(hits.contains(&i), regex.is_match(label));
                }
            }
        }
    }
}
