//! # Blogly CLI
//!
//! Runs one repository operation per invocation and prints the result as JSON.
//! Every command runs against the PostgreSQL database named by `DATABASE_URL`.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

mod commands;
mod config;
mod error;
mod state;
mod telemetry;

use config::AppConfig;
use error::CliResult;
use state::AppState;
use telemetry::TelemetryConfig;

#[derive(Parser, Debug)]
#[command(
    name = "blogly",
    author,
    version,
    about = "Manage Blogly users, posts and tags"
)]
struct Cli {
    /// Show debug logs on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending schema migrations to DATABASE_URL
    Migrate,
    #[command(flatten)]
    Entity(EntityCommand),
}

#[derive(Subcommand, Debug)]
enum EntityCommand {
    /// Create, inspect, edit and delete users
    Users(commands::users::UsersArgs),
    /// Create, inspect, edit and delete posts
    Posts(commands::posts::PostsArgs),
    /// Create, inspect, edit and delete tags
    Tags(commands::tags::TagsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    telemetry::init_telemetry(&TelemetryConfig::from_env(cli.verbose));

    let config = AppConfig::from_env();
    let state = AppState::new(config.database.as_ref()).await?;

    let command = match cli.command {
        Commands::Migrate => {
            use migration::MigratorTrait;

            migration::Migrator::up(&state.database()?, None).await?;
            tracing::info!("Migrations applied");
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Entity(command) => command,
    };

    match execute(&state, command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!(error = %err, "Command failed");
            println!("{}", serde_json::to_string_pretty(&err.to_response())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Run one entity command against the configured repositories.
async fn execute(state: &AppState, command: EntityCommand) -> CliResult<Value> {
    match command {
        EntityCommand::Users(args) => commands::users::run(state, args).await,
        EntityCommand::Posts(args) => commands::posts::run(state, args).await,
        EntityCommand::Tags(args) => commands::tags::run(state, args).await,
    }
}
