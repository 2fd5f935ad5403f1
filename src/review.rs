//! Review classification and approval aggregation
//!
//! Pure functions over already-fetched reviews. No I/O happens here.

use crate::types::{AuthorAssociation, PullRequest, Review, ReviewState};
use std::collections::HashSet;
use tracing::debug;

/// Login of the automation bot whose reviews are always trusted
pub const AUTOMATION_BOT_LOGIN: &str = "github-actions[bot]";

/// Anything with an author and an author association
pub trait Authored {
    /// Login of the author, if known
    fn author_login(&self) -> Option<&str>;
    /// Association of the author with the repository, if recorded
    fn author_association(&self) -> Option<&AuthorAssociation>;
}

impl Authored for PullRequest {
    fn author_login(&self) -> Option<&str> {
        self.author.as_deref()
    }

    fn author_association(&self) -> Option<&AuthorAssociation> {
        self.author_association.as_ref()
    }
}

impl Authored for Review {
    fn author_login(&self) -> Option<&str> {
        self.author.as_deref()
    }

    fn author_association(&self) -> Option<&AuthorAssociation> {
        self.author_association.as_ref()
    }
}

/// Whether the review is an approval
pub fn is_approval(review: &Review) -> bool {
    review.state == ReviewState::Approved
}

/// Whether the review requests changes
pub fn is_changes_requested(review: &Review) -> bool {
    review.state == ReviewState::ChangesRequested
}

/// Whether the author of `entity` is allowed by `allowed`
///
/// The automation bot is always allowed. An entity without a recorded
/// association is never allowed.
pub fn is_author_allowed<A: Authored + ?Sized>(entity: &A, allowed: &[AuthorAssociation]) -> bool {
    if entity.author_login() == Some(AUTOMATION_BOT_LOGIN) {
        return true;
    }

    entity
        .author_association()
        .is_some_and(|association| allowed.contains(association))
}

/// [`is_author_allowed`] for reviews, with a debug note on rejection
pub fn is_review_author_allowed(review: &Review, allowed: &[AuthorAssociation]) -> bool {
    let is_allowed = is_author_allowed(review, allowed);
    if !is_allowed {
        debug!(
            review_id = review.id,
            author = review.author.as_deref().unwrap_or("(unknown)"),
            association = ?review.author_association,
            "review author is not allowed"
        );
    }
    is_allowed
}

/// Whether the review is an approval by an allowed author
pub fn is_approved_by_allowed_author(review: &Review, allowed: &[AuthorAssociation]) -> bool {
    is_approval(review) && is_review_author_allowed(review, allowed)
}

/// Latest approval/changes-request per allowed reviewer on `commit_sha`
///
/// The result is in chronological order (oldest first), with at most one
/// review per author login. Reviews without a login are kept individually.
pub fn relevant_reviews_for_commit<'a>(
    reviews: &'a [Review],
    allowed: &[AuthorAssociation],
    commit_sha: &str,
) -> Vec<&'a Review> {
    let mut relevant: Vec<&Review> = reviews
        .iter()
        .filter(|r| r.commit_id.as_deref() == Some(commit_sha))
        .filter(|r| {
            (is_approval(r) || is_changes_requested(r)) && is_review_author_allowed(r, allowed)
        })
        .collect();

    // Newest first. Missing timestamps sort after every real one.
    relevant.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    let mut seen_authors = HashSet::new();
    let mut latest: Vec<&Review> = relevant
        .into_iter()
        .filter(|r| match r.author.as_deref() {
            Some(login) => seen_authors.insert(login),
            None => true,
        })
        .collect();

    latest.reverse();
    latest
}

/// Whether the last `minimum` relevant reviews on `commit_sha` are all approvals
pub fn commit_has_minimum_approvals(
    reviews: &[Review],
    allowed: &[AuthorAssociation],
    commit_sha: &str,
    minimum: usize,
) -> bool {
    let relevant = relevant_reviews_for_commit(reviews, allowed, commit_sha);
    if relevant.len() < minimum {
        return false;
    }

    relevant[relevant.len() - minimum..]
        .iter()
        .all(|r| is_approval(r))
}
