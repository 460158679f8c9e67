//! `blogly tags ...`

use clap::{Args, Subcommand};
use serde_json::Value;

use blogly_core::domain::{NewTag, Tag, TagChanges};
use blogly_core::ports::{BaseRepository, TagRepository};
use blogly_shared::TagResponse;

use super::{respond, respond_all};
use crate::error::CliResult;
use crate::state::AppState;

#[derive(Args, Debug)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(Subcommand, Debug)]
pub enum TagsCommand {
    /// List every tag
    List,
    /// Show one tag and the posts carrying it
    Show { id: i32 },
    /// Create a tag, optionally attached to posts
    Create {
        name: String,
        /// Post id to tag (repeatable; unknown ids are ignored)
        #[arg(long = "post")]
        posts: Vec<i32>,
    },
    /// Rename a tag and replace its posts
    Update {
        id: i32,
        name: String,
        #[arg(long = "post")]
        posts: Vec<i32>,
    },
    /// Delete a tag; the posts it labelled are kept
    Delete { id: i32 },
}

pub async fn run(state: &AppState, args: TagsArgs) -> CliResult<Value> {
    match args.command {
        TagsCommand::List => respond_all::<Tag, TagResponse>(state.tags.list_all().await?),
        TagsCommand::Show { id } => respond(TagResponse::from(state.tags.get_by_id(id).await?)),
        TagsCommand::Create { name, posts } => {
            let new_tag = NewTag::new(name).with_posts(posts);
            respond(TagResponse::from(state.tags.create(new_tag).await?))
        }
        TagsCommand::Update { id, name, posts } => {
            let changes = TagChanges {
                name,
                post_ids: posts,
            };
            respond(TagResponse::from(state.tags.update(id, changes).await?))
        }
        TagsCommand::Delete { id } => respond(TagResponse::from(state.tags.delete(id).await?)),
    }
}
