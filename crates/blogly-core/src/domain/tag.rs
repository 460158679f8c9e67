use serde::{Deserialize, Serialize};

use super::{normalize_ids, required};
use crate::error::DomainError;

/// Tag entity - a globally unique label shared by many posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    /// Ids of the posts carrying this tag, ascending.
    pub post_ids: Vec<i32>,
}

/// Request to create a tag, optionally attached to existing posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTag {
    pub name: String,
    #[serde(default)]
    pub post_ids: Vec<i32>,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            post_ids: Vec::new(),
        }
    }

    pub fn with_posts(mut self, post_ids: Vec<i32>) -> Self {
        self.post_ids = post_ids;
        self
    }

    pub fn validate(self) -> Result<TagDraft, DomainError> {
        TagDraft::build(self.name, self.post_ids)
    }
}

/// Full replacement of a tag's name and post set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagChanges {
    pub name: String,
    #[serde(default)]
    pub post_ids: Vec<i32>,
}

impl TagChanges {
    pub fn validate(self) -> Result<TagDraft, DomainError> {
        TagDraft::build(self.name, self.post_ids)
    }
}

/// Validated tag fields. Name uniqueness is checked by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDraft {
    pub name: String,
    pub post_ids: Vec<i32>,
}

impl TagDraft {
    fn build(name: String, post_ids: Vec<i32>) -> Result<Self, DomainError> {
        Ok(Self {
            name: required("name", name)?,
            post_ids: normalize_ids(post_ids),
        })
    }

    pub fn name_taken(&self) -> DomainError {
        DomainError::Validation(format!("tag name '{}' is already taken", self.name))
    }
}
