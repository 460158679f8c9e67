//! Applies or rolls back the Blogly schema against `DATABASE_URL`.
//!
//! `cargo run -p migration -- up`, `down`, `status`, `fresh` and friends come
//! from the SeaORM migration CLI, which also installs its own log subscriber
//! (`-v` for SQL).

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(migration::Migrator).await;
}
