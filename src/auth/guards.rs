//! Role and ownership evaluators.
//!
//! Each evaluator answers one question about an already-resolved identity. A negative
//! answer is a plain `false`/`NotAuthor`, which the pipeline turns into `Forbidden`;
//! `Err` is reserved for lookups that make the question unanswerable.

use crate::{
    errors::AuthError,
    models::{BlogEntry, User, UserRole},
    repository::Repository,
};

/// `identity.role ∈ required`. No role implies another.
pub fn has_role(identity: &User, required: &[UserRole]) -> bool {
    required.contains(&identity.role)
}

/// Result of the delegated ownership check.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorship {
    /// The identity authored the entry; the loaded entry is handed on so the handler
    /// does not fetch it again.
    Author(BlogEntry),
    NotAuthor,
}

/// Loads the identity again instead of trusting the snapshot resolved at the start of
/// the request, so the decision is made against current data.
async fn re_resolve(repo: &dyn Repository, identity: &User) -> Result<User, AuthError> {
    repo.get_user(identity.id)
        .await
        .ok_or(AuthError::Unauthenticated)
}

/// Self-ownership: true iff the current identity's id equals `target_id`.
pub async fn is_self(
    repo: &dyn Repository,
    identity: &User,
    target_id: i64,
) -> Result<bool, AuthError> {
    let current = re_resolve(repo, identity).await?;
    Ok(current.id == target_id)
}

/// Delegated ownership: fetches the entry and compares its author to the identity.
///
/// Fails with `NotFound` when the entry does not exist; ownership is not evaluated then.
pub async fn is_author(
    repo: &dyn Repository,
    identity: &User,
    entry_id: i64,
) -> Result<Authorship, AuthError> {
    let current = re_resolve(repo, identity).await?;
    let entry = repo
        .get_blog_entry(entry_id)
        .await
        .ok_or(AuthError::NotFound)?;

    if entry.author_id == current.id {
        Ok(Authorship::Author(entry))
    } else {
        Ok(Authorship::NotAuthor)
    }
}
