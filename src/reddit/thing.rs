//! Reddit "thing" identifiers
//!
//! Every content item is addressed by a fullname: a type prefix plus the base-36
//! id, e.g. `t3_abc123` for a submission.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fullname prefix for submissions (top-level posts)
pub const SUBMISSION_PREFIX: &str = "t3_";

static BARE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z0-9]+$").expect("valid regex"));

static COMMENTS_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/comments/([a-z0-9]+)").expect("valid regex"));

/// Extract the submission id from a bare id or a thread URL
///
/// A bare alphanumeric id is returned as is; otherwise the segment right after
/// `/comments/` is used; anything else is returned verbatim.
#[must_use]
pub fn extract_post_id(target: &str) -> &str {
    if BARE_ID.is_match(target) {
        return target;
    }

    COMMENTS_SEGMENT
        .captures(target)
        .and_then(|captures| captures.get(1))
        .map_or(target, |m| m.as_str())
}

/// Fullname of the submission referenced by `target`
#[must_use]
pub fn submission_fullname(target: &str) -> String {
    format!("{SUBMISSION_PREFIX}{}", extract_post_id(target))
}
