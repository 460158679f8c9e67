use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize_ids, required};
use crate::error::DomainError;

/// How many posts the "recent activity" listing shows by default.
pub const DEFAULT_RECENT_LIMIT: u64 = 5;

/// Post entity - a blog post written by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Ids of the tags attached to this post, ascending.
    pub tag_ids: Vec<i32>,
}

impl Post {
    /// `created_at` for humans, e.g. `Tue Mar 5 2024, 2:07 PM`.
    pub fn pretty_date(&self) -> String {
        self.created_at.format("%a %b %-d %Y, %-I:%M %p").to_string()
    }
}

/// Request to create a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    /// Creation time; the current time is used when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tag_ids: Vec<i32>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Validate and resolve the creation timestamp.
    pub fn validate(self) -> Result<(PostDraft, DateTime<Utc>), DomainError> {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let draft = PostDraft::build(self.title, self.content, self.tag_ids)?;
        Ok((draft, created_at))
    }
}

/// Full replacement of a post's title, content and tag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
}

impl PostChanges {
    pub fn validate(self) -> Result<PostDraft, DomainError> {
        PostDraft::build(self.title, self.content, self.tag_ids)
    }
}

/// Validated post fields. `tag_ids` are deduplicated but not yet resolved
/// against existing tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub tag_ids: Vec<i32>,
}

impl PostDraft {
    fn build(title: String, content: String, tag_ids: Vec<i32>) -> Result<Self, DomainError> {
        Ok(Self {
            title: required("title", title)?,
            content: required("content", content)?,
            tag_ids: normalize_ids(tag_ids),
        })
    }
}
