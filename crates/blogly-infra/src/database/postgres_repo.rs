//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use blogly_core::DomainError;
use blogly_core::domain::{
    NewPost, NewTag, NewUser, Post, PostChanges, Tag, TagChanges, User, UserChanges,
};
use blogly_core::ports::{BaseRepository, PostRepository, TagRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

// --- Association helpers ---

/// Tag ids for each of `post_ids`, ascending.
async fn tag_ids_by_post<C: ConnectionTrait>(
    conn: &C,
    post_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<i32>>, DomainError> {
    let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
    if post_ids.is_empty() {
        return Ok(map);
    }

    let rows = PostTagEntity::find()
        .filter(post_tag::Column::PostId.is_in(post_ids))
        .order_by_asc(post_tag::Column::TagId)
        .all(conn)
        .await
        .map_err(db_err)?;

    for row in rows {
        map.entry(row.post_id).or_default().push(row.tag_id);
    }
    Ok(map)
}

/// Post ids for each of `tag_ids`, ascending.
async fn post_ids_by_tag<C: ConnectionTrait>(
    conn: &C,
    tag_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<i32>>, DomainError> {
    let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
    if tag_ids.is_empty() {
        return Ok(map);
    }

    let rows = PostTagEntity::find()
        .filter(post_tag::Column::TagId.is_in(tag_ids))
        .order_by_asc(post_tag::Column::PostId)
        .all(conn)
        .await
        .map_err(db_err)?;

    for row in rows {
        map.entry(row.tag_id).or_default().push(row.post_id);
    }
    Ok(map)
}

async fn posts_with_tags<C: ConnectionTrait>(
    conn: &C,
    models: Vec<post::Model>,
) -> Result<Vec<Post>, DomainError> {
    let mut tags = tag_ids_by_post(conn, models.iter().map(|m| m.id).collect()).await?;
    Ok(models
        .into_iter()
        .map(|m| {
            let tag_ids = tags.remove(&m.id).unwrap_or_default();
            m.into_domain(tag_ids)
        })
        .collect())
}

async fn tags_with_posts<C: ConnectionTrait>(
    conn: &C,
    models: Vec<tag::Model>,
) -> Result<Vec<Tag>, DomainError> {
    let mut posts = post_ids_by_tag(conn, models.iter().map(|m| m.id).collect()).await?;
    Ok(models
        .into_iter()
        .map(|m| {
            let post_ids = posts.remove(&m.id).unwrap_or_default();
            m.into_domain(post_ids)
        })
        .collect())
}

/// Keep only the requested tag ids that exist. Unknown ids are dropped.
async fn existing_tag_ids<C: ConnectionTrait>(
    conn: &C,
    requested: &[i32],
) -> Result<Vec<i32>, DomainError> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let found: Vec<i32> = TagEntity::find()
        .filter(tag::Column::Id.is_in(requested.iter().copied()))
        .order_by_asc(tag::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|t| t.id)
        .collect();

    if found.len() < requested.len() {
        tracing::warn!(?requested, ?found, "Ignoring unknown tag ids");
    }
    Ok(found)
}

/// Keep only the requested post ids that exist. Unknown ids are dropped.
async fn existing_post_ids<C: ConnectionTrait>(
    conn: &C,
    requested: &[i32],
) -> Result<Vec<i32>, DomainError> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let found: Vec<i32> = PostEntity::find()
        .filter(post::Column::Id.is_in(requested.iter().copied()))
        .order_by_asc(post::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|p| p.id)
        .collect();

    if found.len() < requested.len() {
        tracing::warn!(?requested, ?found, "Ignoring unknown post ids");
    }
    Ok(found)
}

async fn insert_links<C: ConnectionTrait>(
    conn: &C,
    links: Vec<post_tag::ActiveModel>,
) -> Result<(), DomainError> {
    if links.is_empty() {
        return Ok(());
    }
    PostTagEntity::insert_many(links)
        .exec_without_returning(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

fn link(post_id: i32, tag_id: i32) -> post_tag::ActiveModel {
    post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(tag_id),
    }
}

/// Replace every tag on `post_id` with `tag_ids`.
async fn replace_post_tags<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
    tag_ids: &[i32],
) -> Result<(), DomainError> {
    PostTagEntity::delete_many()
        .filter(post_tag::Column::PostId.eq(post_id))
        .exec(conn)
        .await
        .map_err(db_err)?;

    insert_links(conn, tag_ids.iter().map(|&tag_id| link(post_id, tag_id)).collect()).await
}

/// Replace every post on `tag_id` with `post_ids`.
async fn replace_tag_posts<C: ConnectionTrait>(
    conn: &C,
    tag_id: i32,
    post_ids: &[i32],
) -> Result<(), DomainError> {
    PostTagEntity::delete_many()
        .filter(post_tag::Column::TagId.eq(tag_id))
        .exec(conn)
        .await
        .map_err(db_err)?;

    insert_links(conn, post_ids.iter().map(|&post_id| link(post_id, tag_id)).collect()).await
}

/// Whether `name` is unused by every tag other than `except`.
async fn name_is_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except: Option<i32>,
) -> Result<bool, DomainError> {
    let mut query = TagEntity::find().filter(tag::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(tag::Column::Id.ne(id));
    }
    let existing = query.one(conn).await.map_err(db_err)?;
    Ok(existing.is_none())
}

// --- Users ---

#[async_trait]
impl BaseRepository<User> for PostgresUserRepository {
    async fn list_all(&self) -> Result<Vec<User>, DomainError> {
        let users = UserEntity::find()
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName)
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, id: i32) -> Result<User, DomainError> {
        tracing::debug!(user_id = id, "Finding user by id");
        Ok(Self::fetch(&self.db, id, "User").await?.into())
    }

    async fn delete(&self, id: i32) -> Result<User, DomainError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let user = Self::fetch(&txn, id, "User").await?;
        let post_ids: Vec<i32> = PostEntity::find()
            .filter(post::Column::UserId.eq(id))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|p| p.id)
            .collect();

        if !post_ids.is_empty() {
            PostTagEntity::delete_many()
                .filter(post_tag::Column::PostId.is_in(post_ids.clone()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
            PostEntity::delete_many()
                .filter(post::Column::UserId.eq(id))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }
        UserEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(user_id = id, posts_removed = post_ids.len(), "User deleted");

        Ok(user.into())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, DomainError> {
        let draft = new_user.validate()?;
        let model = user::ActiveModel::from(draft)
            .insert(&self.db)
            .await
            .map_err(db_err)?;

        tracing::info!(user_id = model.id, "User created");
        Ok(model.into())
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<User, DomainError> {
        let draft = changes.validate()?;
        let txn = self.db.begin().await.map_err(db_err)?;

        let mut active = Self::fetch(&txn, id, "User").await?.into_active_model();
        active.first_name = Set(draft.first_name);
        active.last_name = Set(draft.last_name);
        active.image_url = Set(draft.image_url);
        let model = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(user_id = id, "User updated");
        Ok(model.into())
    }
}

// --- Posts ---

#[async_trait]
impl BaseRepository<Post> for PostgresPostRepository {
    async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        let txn = self.snapshot().await?;
        let posts = PostEntity::find()
            .order_by_asc(post::Column::Id)
            .all(&txn)
            .await
            .map_err(db_err)?;

        let posts = posts_with_tags(&txn, posts).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(posts)
    }

    async fn get_by_id(&self, id: i32) -> Result<Post, DomainError> {
        tracing::debug!(post_id = id, "Finding post by id");
        let txn = self.snapshot().await?;
        let model = Self::fetch(&txn, id, "Post").await?;
        let mut posts = posts_with_tags(&txn, vec![model]).await?;
        txn.commit().await.map_err(db_err)?;
        posts
            .pop()
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    async fn delete(&self, id: i32) -> Result<Post, DomainError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = Self::fetch(&txn, id, "Post").await?;
        let tag_ids = tag_ids_by_post(&txn, vec![id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(post_id = id, "Post deleted");
        Ok(model.into_domain(tag_ids))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_recent(&self, limit: u64) -> Result<Vec<Post>, DomainError> {
        let txn = self.snapshot().await?;
        let posts = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(limit)
            .all(&txn)
            .await
            .map_err(db_err)?;

        let posts = posts_with_tags(&txn, posts).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(posts)
    }

    async fn list_by_user(&self, user_id: i32) -> Result<Vec<Post>, DomainError> {
        let txn = self.snapshot().await?;
        PostgresUserRepository::fetch(&txn, user_id, "User").await?;

        let posts = PostEntity::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&txn)
            .await
            .map_err(db_err)?;

        let posts = posts_with_tags(&txn, posts).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(posts)
    }

    async fn create(&self, user_id: i32, new_post: NewPost) -> Result<Post, DomainError> {
        let (draft, created_at) = new_post.validate()?;
        let txn = self.db.begin().await.map_err(db_err)?;

        PostgresUserRepository::fetch(&txn, user_id, "User").await?;
        let tag_ids = existing_tag_ids(&txn, &draft.tag_ids).await?;

        let model = post::ActiveModel {
            title: Set(draft.title),
            content: Set(draft.content),
            created_at: Set(created_at.into()),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        insert_links(&txn, tag_ids.iter().map(|&tag_id| link(model.id, tag_id)).collect()).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(post_id = model.id, user_id, tags = tag_ids.len(), "Post created");
        Ok(model.into_domain(tag_ids))
    }

    async fn update(&self, id: i32, changes: PostChanges) -> Result<Post, DomainError> {
        let draft = changes.validate()?;
        let txn = self.db.begin().await.map_err(db_err)?;

        let mut active = Self::fetch(&txn, id, "Post").await?.into_active_model();
        let tag_ids = existing_tag_ids(&txn, &draft.tag_ids).await?;

        active.title = Set(draft.title);
        active.content = Set(draft.content);
        let model = active.update(&txn).await.map_err(db_err)?;
        replace_post_tags(&txn, id, &tag_ids).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(post_id = id, tags = tag_ids.len(), "Post updated");
        Ok(model.into_domain(tag_ids))
    }
}

// --- Tags ---

#[async_trait]
impl BaseRepository<Tag> for PostgresTagRepository {
    async fn list_all(&self) -> Result<Vec<Tag>, DomainError> {
        let txn = self.snapshot().await?;
        let tags = TagEntity::find()
            .order_by_asc(tag::Column::Name)
            .all(&txn)
            .await
            .map_err(db_err)?;

        let tags = tags_with_posts(&txn, tags).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(tags)
    }

    async fn get_by_id(&self, id: i32) -> Result<Tag, DomainError> {
        tracing::debug!(tag_id = id, "Finding tag by id");
        let txn = self.snapshot().await?;
        let model = Self::fetch(&txn, id, "Tag").await?;
        let mut tags = tags_with_posts(&txn, vec![model]).await?;
        txn.commit().await.map_err(db_err)?;
        tags.pop().ok_or_else(|| DomainError::not_found("Tag", id))
    }

    async fn delete(&self, id: i32) -> Result<Tag, DomainError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = Self::fetch(&txn, id, "Tag").await?;
        let post_ids = post_ids_by_tag(&txn, vec![id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        // Association rows only; the posts themselves stay.
        PostTagEntity::delete_many()
            .filter(post_tag::Column::TagId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        TagEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(tag_id = id, untagged_posts = post_ids.len(), "Tag deleted");
        Ok(model.into_domain(post_ids))
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn create(&self, new_tag: NewTag) -> Result<Tag, DomainError> {
        let draft = new_tag.validate()?;
        let txn = self.db.begin().await.map_err(db_err)?;

        if !name_is_free(&txn, &draft.name, None).await? {
            return Err(draft.name_taken());
        }
        let post_ids = existing_post_ids(&txn, &draft.post_ids).await?;

        let model = tag::ActiveModel {
            name: Set(draft.name),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        insert_links(&txn, post_ids.iter().map(|&post_id| link(post_id, model.id)).collect()).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(tag_id = model.id, posts = post_ids.len(), "Tag created");
        Ok(model.into_domain(post_ids))
    }

    async fn update(&self, id: i32, changes: TagChanges) -> Result<Tag, DomainError> {
        let draft = changes.validate()?;
        let txn = self.db.begin().await.map_err(db_err)?;

        let mut active = Self::fetch(&txn, id, "Tag").await?.into_active_model();
        if !name_is_free(&txn, &draft.name, Some(id)).await? {
            return Err(draft.name_taken());
        }
        let post_ids = existing_post_ids(&txn, &draft.post_ids).await?;

        active.name = Set(draft.name);
        let model = active.update(&txn).await.map_err(db_err)?;
        replace_tag_posts(&txn, id, &post_ids).await?;

        txn.commit().await.map_err(db_err)?;
        tracing::info!(tag_id = id, posts = post_ids.len(), "Tag updated");
        Ok(model.into_domain(post_ids))
    }
}
