//! Data Transfer Objects - entity views for callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use blogly_core::domain::{Post, Tag, User};

/// A user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub image_url: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            image_url: user.image_url,
        }
    }
}

/// A post with both its raw and human-readable timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub pretty_date: String,
    pub tag_ids: Vec<i32>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            pretty_date: post.pretty_date(),
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            tag_ids: post.tag_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub post_ids: Vec<i32>,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            post_ids: tag.post_ids,
        }
    }
}
