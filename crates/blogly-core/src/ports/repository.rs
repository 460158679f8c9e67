use async_trait::async_trait;

use crate::domain::{NewPost, NewTag, NewUser, Post, PostChanges, Tag, TagChanges, User, UserChanges};
use crate::error::DomainError;

/// Operations shared by every entity repository.
///
/// Each write runs as one atomic unit: either every cascading effect is
/// visible afterwards or none is.
#[async_trait]
pub trait BaseRepository<T>: Send + Sync {
    /// List every entity in the repository's natural order.
    async fn list_all(&self) -> Result<Vec<T>, DomainError>;

    /// Fetch an entity, failing with `NotFound` when the id is unknown.
    async fn get_by_id(&self, id: i32) -> Result<T, DomainError>;

    /// Delete an entity and its dependents, returning what was removed.
    async fn delete(&self, id: i32) -> Result<T, DomainError>;
}

/// User repository. `list_all` orders by last name, then first name.
///
/// Deleting a user also deletes the user's posts and their tag associations.
#[async_trait]
pub trait UserRepository: BaseRepository<User> {
    async fn create(&self, new_user: NewUser) -> Result<User, DomainError>;

    /// Overwrite all editable fields.
    async fn update(&self, id: i32, changes: UserChanges) -> Result<User, DomainError>;
}

/// Post repository.
///
/// Unknown tag ids passed to `create`/`update` are dropped, not rejected.
#[async_trait]
pub trait PostRepository: BaseRepository<Post> {
    /// Newest posts first (ties by id, newest first), at most `limit`.
    async fn list_recent(&self, limit: u64) -> Result<Vec<Post>, DomainError>;

    /// Posts owned by `user_id`, newest first. `NotFound` if the user is unknown.
    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Post>, DomainError>;

    async fn create(&self, user_id: i32, new_post: NewPost) -> Result<Post, DomainError>;

    /// Overwrite title and content and replace the whole tag set.
    async fn update(&self, id: i32, changes: PostChanges) -> Result<Post, DomainError>;
}

/// Tag repository. Deleting a tag never deletes the posts it labelled.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag> {
    async fn create(&self, new_tag: NewTag) -> Result<Tag, DomainError>;

    /// Rename the tag and replace the whole post set.
    async fn update(&self, id: i32, changes: TagChanges) -> Result<Tag, DomainError>;
}
