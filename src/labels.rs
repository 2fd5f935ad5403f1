//! Label classification

use regex::Regex;
use std::sync::LazyLock;

static DO_NOT_MERGE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new("^dono?tmerge$").unwrap()
});

/// Lowercase `label` and drop everything that is not alphanumeric
fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Whether `label` vetoes a merge
///
/// Matches the configured block-list ignoring case (GitHub label names are
/// case-insensitive), or fuzzily against "do not merge" spellings such as
/// `do-not-merge` and `don't merge`.
pub fn is_do_not_merge_label(label: &str, configured: &[String]) -> bool {
    configured.iter().any(|l| l.eq_ignore_ascii_case(label))
        || DO_NOT_MERGE.is_match(&normalize(label))
}

/// Required labels that are not applied, compared ignoring case
pub fn missing_required_labels<'a>(applied: &[String], required: &'a [String]) -> Vec<&'a str> {
    required
        .iter()
        .filter(|label| !applied.iter().any(|a| a.eq_ignore_ascii_case(label)))
        .map(String::as_str)
        .collect()
}
