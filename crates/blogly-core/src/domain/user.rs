use serde::{Deserialize, Serialize};

use super::required;
use crate::error::DomainError;

/// Placeholder avatar used when a user has no image of their own.
pub const DEFAULT_IMAGE_URL: &str =
    "https://unsplash.com/photos/black-framed-sunglasses-on-white-surface-lSl94SZHRgA";

/// User entity - an author who owns posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
}

impl User {
    pub fn from_draft(id: i32, draft: UserDraft) -> Self {
        Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            image_url: draft.image_url,
        }
    }

    /// First and last name joined by a single space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Request to create a user. The image is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewUser {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn validate(self) -> Result<UserDraft, DomainError> {
        UserDraft::build(self.first_name, self.last_name, self.image_url)
    }
}

/// Full replacement of a user's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserChanges {
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
}

impl UserChanges {
    pub fn validate(self) -> Result<UserDraft, DomainError> {
        UserDraft::build(self.first_name, self.last_name, Some(self.image_url))
    }
}

/// Validated user fields, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
}

impl UserDraft {
    fn build(
        first_name: String,
        last_name: String,
        image_url: Option<String>,
    ) -> Result<Self, DomainError> {
        let image_url = image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string());

        Ok(Self {
            first_name: required("first_name", first_name)?,
            last_name: required("last_name", last_name)?,
            image_url,
        })
    }
}
