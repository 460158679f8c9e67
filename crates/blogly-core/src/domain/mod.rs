//! Domain entities - the core business objects.

mod post;
mod tag;
mod user;

pub use post::{DEFAULT_RECENT_LIMIT, NewPost, Post, PostChanges, PostDraft};
pub use tag::{NewTag, Tag, TagChanges, TagDraft};
pub use user::{DEFAULT_IMAGE_URL, NewUser, User, UserChanges, UserDraft};

use crate::error::DomainError;

/// Trim a required text field, rejecting it when nothing is left.
pub(crate) fn required(field: &str, value: String) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Sort and deduplicate a list of referenced ids so that every
/// (post, tag) pair is stored at most once.
pub(crate) fn normalize_ids(mut ids: Vec<i32>) -> Vec<i32> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("title", "  Hi ".into()).unwrap(), "Hi");
        assert_eq!(required("title", "Hi".into()).unwrap(), "Hi");
    }

    #[test]
    fn test_required_rejects_blank() {
        let err = required("title", "   ".into()).unwrap_err();
        assert_eq!(err, DomainError::Validation("title must not be empty".into()));
    }

    #[test]
    fn test_normalize_ids() {
        assert_eq!(normalize_ids(vec![3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(normalize_ids(Vec::new()).is_empty());
    }
}
