//! `blogly posts ...`

use clap::{Args, Subcommand};
use serde_json::Value;

use blogly_core::domain::{DEFAULT_RECENT_LIMIT, NewPost, Post, PostChanges};
use blogly_core::ports::{BaseRepository, PostRepository};
use blogly_shared::PostResponse;

use super::{respond, respond_all};
use crate::error::CliResult;
use crate::state::AppState;

#[derive(Args, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub command: PostsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PostsCommand {
    /// Most recent posts, newest first
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: u64,
    },
    /// Every post, by id
    List,
    /// Posts written by one user, newest first
    ByUser { user_id: i32 },
    /// Show one post
    Show { id: i32 },
    /// Write a post for a user
    Create {
        user_id: i32,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Tag id to attach (repeatable; unknown ids are ignored)
        #[arg(long = "tag")]
        tags: Vec<i32>,
    },
    /// Overwrite a post's title, content and tags
    Update {
        id: i32,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Tag id to attach (repeatable; replaces the current tags)
        #[arg(long = "tag")]
        tags: Vec<i32>,
    },
    /// Delete a post
    Delete { id: i32 },
}

pub async fn run(state: &AppState, args: PostsArgs) -> CliResult<Value> {
    match args.command {
        PostsCommand::Recent { limit } => {
            respond_all::<Post, PostResponse>(state.posts.list_recent(limit).await?)
        }
        PostsCommand::List => respond_all::<Post, PostResponse>(state.posts.list_all().await?),
        PostsCommand::ByUser { user_id } => {
            respond_all::<Post, PostResponse>(state.posts.list_by_user(user_id).await?)
        }
        PostsCommand::Show { id } => respond(PostResponse::from(state.posts.get_by_id(id).await?)),
        PostsCommand::Create {
            user_id,
            title,
            content,
            tags,
        } => {
            let new_post = NewPost::new(title, content).with_tags(tags);
            respond(PostResponse::from(state.posts.create(user_id, new_post).await?))
        }
        PostsCommand::Update {
            id,
            title,
            content,
            tags,
        } => {
            let changes = PostChanges {
                title,
                content,
                tag_ids: tags,
            };
            respond(PostResponse::from(state.posts.update(id, changes).await?))
        }
        PostsCommand::Delete { id } => respond(PostResponse::from(state.posts.delete(id).await?)),
    }
}
