//! In-memory repositories - used when no database is configured, and in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use blogly_core::DomainError;
use blogly_core::domain::{
    NewPost, NewTag, NewUser, Post, PostChanges, Tag, TagChanges, User, UserChanges,
};
use blogly_core::ports::{BaseRepository, PostRepository, TagRepository, UserRepository};

struct PostRow {
    user_id: i32,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    posts: BTreeMap<i32, PostRow>,
    tags: BTreeMap<i32, String>,
    /// (post_id, tag_id) pairs.
    links: BTreeSet<(i32, i32)>,
    last_user_id: i32,
    last_post_id: i32,
    last_tag_id: i32,
}

impl Tables {
    fn user(&self, id: i32) -> Result<&User, DomainError> {
        self.users
            .get(&id)
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    fn post(&self, id: i32) -> Result<Post, DomainError> {
        let row = self
            .posts
            .get(&id)
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        Ok(Post {
            id,
            user_id: row.user_id,
            title: row.title.clone(),
            content: row.content.clone(),
            created_at: row.created_at,
            tag_ids: self.tag_ids_of(id),
        })
    }

    fn tag(&self, id: i32) -> Result<Tag, DomainError> {
        let name = self
            .tags
            .get(&id)
            .ok_or_else(|| DomainError::not_found("Tag", id))?;
        Ok(Tag {
            id,
            name: name.clone(),
            post_ids: self.post_ids_of(id),
        })
    }

    fn tag_ids_of(&self, post_id: i32) -> Vec<i32> {
        self.links
            .range((post_id, i32::MIN)..=(post_id, i32::MAX))
            .map(|&(_, tag_id)| tag_id)
            .collect()
    }

    fn post_ids_of(&self, tag_id: i32) -> Vec<i32> {
        // Ascending because links iterate in post_id order.
        self.links
            .iter()
            .filter(|&&(_, t)| t == tag_id)
            .map(|&(post_id, _)| post_id)
            .collect()
    }

    /// Posts matching `keep`, newest first, ties by id newest first.
    fn posts_newest_first(&self, keep: impl Fn(&PostRow) -> bool) -> Vec<i32> {
        let mut ids: Vec<(DateTime<Utc>, i32)> = self
            .posts
            .iter()
            .filter(|(_, row)| keep(row))
            .map(|(&id, row)| (row.created_at, id))
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    fn existing_tags(&self, requested: &[i32]) -> Vec<i32> {
        let found: Vec<i32> = requested
            .iter()
            .copied()
            .filter(|id| self.tags.contains_key(id))
            .collect();
        if found.len() < requested.len() {
            tracing::warn!(?requested, ?found, "Ignoring unknown tag ids");
        }
        found
    }

    fn existing_posts(&self, requested: &[i32]) -> Vec<i32> {
        let found: Vec<i32> = requested
            .iter()
            .copied()
            .filter(|id| self.posts.contains_key(id))
            .collect();
        if found.len() < requested.len() {
            tracing::warn!(?requested, ?found, "Ignoring unknown post ids");
        }
        found
    }

    fn name_is_free(&self, name: &str, except: Option<i32>) -> bool {
        !self
            .tags
            .iter()
            .any(|(&id, existing)| existing == name && Some(id) != except)
    }

    fn remove_post(&mut self, post_id: i32) {
        self.posts.remove(&post_id);
        self.links.retain(|&(p, _)| p != post_id);
    }
}

/// Shared in-memory storage backing the three in-memory repositories.
///
/// A single async `RwLock` guards every table, so each write checks its
/// preconditions and applies all of its effects under one guard.
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// In-memory user repository.
pub struct InMemoryUserRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryUserRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

/// In-memory post repository.
pub struct InMemoryPostRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryPostRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

/// In-memory tag repository.
pub struct InMemoryTagRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryTagRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User> for InMemoryUserRepository {
    async fn list_all(&self) -> Result<Vec<User>, DomainError> {
        let tables = self.store.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(users)
    }

    async fn get_by_id(&self, id: i32) -> Result<User, DomainError> {
        let tables = self.store.tables.read().await;
        tables.user(id).cloned()
    }

    async fn delete(&self, id: i32) -> Result<User, DomainError> {
        let mut tables = self.store.tables.write().await;
        let user = tables.user(id)?.clone();

        let owned: Vec<i32> = tables
            .posts
            .iter()
            .filter(|(_, row)| row.user_id == id)
            .map(|(&post_id, _)| post_id)
            .collect();
        for post_id in &owned {
            tables.remove_post(*post_id);
        }
        tables.users.remove(&id);

        tracing::info!(user_id = id, posts_removed = owned.len(), "User deleted");
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, DomainError> {
        let draft = new_user.validate()?;
        let mut tables = self.store.tables.write().await;

        tables.last_user_id += 1;
        let user = User::from_draft(tables.last_user_id, draft);
        tables.users.insert(user.id, user.clone());

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<User, DomainError> {
        let draft = changes.validate()?;
        let mut tables = self.store.tables.write().await;
        tables.user(id)?;

        let user = User::from_draft(id, draft);
        tables.users.insert(id, user.clone());

        tracing::info!(user_id = id, "User updated");
        Ok(user)
    }
}

#[async_trait]
impl BaseRepository<Post> for InMemoryPostRepository {
    async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        let tables = self.store.tables.read().await;
        tables.posts.keys().map(|&id| tables.post(id)).collect()
    }

    async fn get_by_id(&self, id: i32) -> Result<Post, DomainError> {
        let tables = self.store.tables.read().await;
        tables.post(id)
    }

    async fn delete(&self, id: i32) -> Result<Post, DomainError> {
        let mut tables = self.store.tables.write().await;
        let post = tables.post(id)?;
        tables.remove_post(id);

        tracing::info!(post_id = id, "Post deleted");
        Ok(post)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_recent(&self, limit: u64) -> Result<Vec<Post>, DomainError> {
        let tables = self.store.tables.read().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        tables
            .posts_newest_first(|_| true)
            .into_iter()
            .take(limit)
            .map(|id| tables.post(id))
            .collect()
    }

    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Post>, DomainError> {
        let tables = self.store.tables.read().await;
        tables.user(user_id)?;
        tables
            .posts_newest_first(|row| row.user_id == user_id)
            .into_iter()
            .map(|id| tables.post(id))
            .collect()
    }

    async fn create(&self, user_id: i32, new_post: NewPost) -> Result<Post, DomainError> {
        let (draft, created_at) = new_post.validate()?;
        let mut tables = self.store.tables.write().await;
        tables.user(user_id)?;
        let tag_ids = tables.existing_tags(&draft.tag_ids);

        tables.last_post_id += 1;
        let id = tables.last_post_id;
        tables.posts.insert(
            id,
            PostRow {
                user_id,
                title: draft.title,
                content: draft.content,
                created_at,
            },
        );
        tables.links.extend(tag_ids.iter().map(|&tag_id| (id, tag_id)));

        tracing::info!(post_id = id, user_id, tags = tag_ids.len(), "Post created");
        tables.post(id)
    }

    async fn update(&self, id: i32, changes: PostChanges) -> Result<Post, DomainError> {
        let draft = changes.validate()?;
        let mut tables = self.store.tables.write().await;
        tables.post(id)?;
        let tag_ids = tables.existing_tags(&draft.tag_ids);

        if let Some(row) = tables.posts.get_mut(&id) {
            row.title = draft.title;
            row.content = draft.content;
        }
        tables.links.retain(|&(p, _)| p != id);
        tables.links.extend(tag_ids.iter().map(|&tag_id| (id, tag_id)));

        tracing::info!(post_id = id, tags = tag_ids.len(), "Post updated");
        tables.post(id)
    }
}

#[async_trait]
impl BaseRepository<Tag> for InMemoryTagRepository {
    async fn list_all(&self) -> Result<Vec<Tag>, DomainError> {
        let tables = self.store.tables.read().await;
        let mut tags = tables
            .tags
            .keys()
            .map(|&id| tables.tag(id))
            .collect::<Result<Vec<_>, _>>()?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get_by_id(&self, id: i32) -> Result<Tag, DomainError> {
        let tables = self.store.tables.read().await;
        tables.tag(id)
    }

    async fn delete(&self, id: i32) -> Result<Tag, DomainError> {
        let mut tables = self.store.tables.write().await;
        let tag = tables.tag(id)?;

        // Association rows only; the posts themselves stay.
        tables.links.retain(|&(_, t)| t != id);
        tables.tags.remove(&id);

        tracing::info!(tag_id = id, untagged_posts = tag.post_ids.len(), "Tag deleted");
        Ok(tag)
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn create(&self, new_tag: NewTag) -> Result<Tag, DomainError> {
        let draft = new_tag.validate()?;
        let mut tables = self.store.tables.write().await;
        if !tables.name_is_free(&draft.name, None) {
            return Err(draft.name_taken());
        }
        let post_ids = tables.existing_posts(&draft.post_ids);

        tables.last_tag_id += 1;
        let id = tables.last_tag_id;
        tables.tags.insert(id, draft.name);
        tables.links.extend(post_ids.iter().map(|&post_id| (post_id, id)));

        tracing::info!(tag_id = id, posts = post_ids.len(), "Tag created");
        tables.tag(id)
    }

    async fn update(&self, id: i32, changes: TagChanges) -> Result<Tag, DomainError> {
        let draft = changes.validate()?;
        let mut tables = self.store.tables.write().await;
        tables.tag(id)?;
        if !tables.name_is_free(&draft.name, Some(id)) {
            return Err(draft.name_taken());
        }
        let post_ids = tables.existing_posts(&draft.post_ids);

        tables.tags.insert(id, draft.name);
        tables.links.retain(|&(_, t)| t != id);
        tables.links.extend(post_ids.iter().map(|&post_id| (post_id, id)));

        tracing::info!(tag_id = id, posts = post_ids.len(), "Tag updated");
        tables.tag(id)
    }
}
