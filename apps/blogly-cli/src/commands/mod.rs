//! Subcommands, one module per entity.

pub mod posts;
pub mod tags;
pub mod users;

use blogly_shared::ApiResponse;
use serde::Serialize;
use serde_json::Value;

use crate::error::CliResult;

/// Wrap a view in the standard success envelope.
fn respond<T: Serialize>(data: T) -> CliResult<Value> {
    Ok(serde_json::to_value(ApiResponse::ok(data))?)
}

/// Map a list of entities to their views.
fn respond_all<E, V>(items: Vec<E>) -> CliResult<Value>
where
    V: From<E> + Serialize,
{
    respond(items.into_iter().map(V::from).collect::<Vec<V>>())
}
