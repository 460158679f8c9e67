//! `blogly users ...`

use clap::{Args, Subcommand};
use serde_json::Value;

use blogly_core::domain::{NewUser, User, UserChanges};
use blogly_core::ports::{BaseRepository, UserRepository};
use blogly_shared::UserResponse;

use super::{respond, respond_all};
use crate::error::CliResult;
use crate::state::AppState;

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users by last name, then first name
    List,
    /// Show one user
    Show { id: i32 },
    /// Create a user (the image falls back to a placeholder)
    Create {
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Overwrite every field of a user
    Update {
        id: i32,
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        /// New image URL; an empty value restores the placeholder
        #[arg(long)]
        image: String,
    },
    /// Delete a user along with all of their posts
    Delete { id: i32 },
}

pub async fn run(state: &AppState, args: UsersArgs) -> CliResult<Value> {
    match args.command {
        UsersCommand::List => respond_all::<User, UserResponse>(state.users.list_all().await?),
        UsersCommand::Show { id } => respond(UserResponse::from(state.users.get_by_id(id).await?)),
        UsersCommand::Create { first, last, image } => {
            let new_user = NewUser {
                first_name: first,
                last_name: last,
                image_url: image,
            };
            respond(UserResponse::from(state.users.create(new_user).await?))
        }
        UsersCommand::Update {
            id,
            first,
            last,
            image,
        } => {
            let changes = UserChanges {
                first_name: first,
                last_name: last,
                image_url: image,
            };
            respond(UserResponse::from(state.users.update(id, changes).await?))
        }
        UsersCommand::Delete { id } => respond(UserResponse::from(state.users.delete(id).await?)),
    }
}
