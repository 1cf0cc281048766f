//! "Did you mean" lookup for unknown commands and options.

use strsim::levenshtein;

/// Return every candidate that looks like a plausible replacement for
/// `query`.
///
/// A candidate matches when it contains `query` (ignoring case) or when its
/// edit distance to `query` is at most a third of the query's length.
/// Candidates keep their input order.
pub fn find_alternatives<I, S>(query: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let query_lower = query.to_lowercase();
    let threshold = query_lower.chars().count() as f64 / 3.0;

    candidates
        .into_iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let candidate_lower = candidate.to_lowercase();
            let close = candidate_lower.contains(&query_lower)
                || levenshtein(&query_lower, &candidate_lower) as f64 <= threshold;
            close.then(|| candidate.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typos_within_threshold() {
        let found = find_alternatives("command", ["commnd", "comman", "unrelated"]);
        assert_eq!(found, vec!["commnd", "comman"]);
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let found = find_alternatives("Build", ["prebuild-assets", "deploy"]);
        assert_eq!(found, vec!["prebuild-assets"]);
    }

    #[test]
    fn test_short_queries_need_exact_or_substring() {
        // a two-letter query allows no edits at all
        let found = find_alternatives("ls", ["lx", "list", "als"]);
        assert_eq!(found, vec!["als"]);
    }

    #[test]
    fn test_no_candidates() {
        let empty: Vec<String> = Vec::new();
        assert!(find_alternatives("deploy", empty).is_empty());
    }
}
