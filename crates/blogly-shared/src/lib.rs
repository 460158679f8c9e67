//! # Blogly Shared
//!
//! Serializable views of the blog entities, derived fields included,
//! plus the error body handed to whatever presents them.

pub mod dto;
pub mod response;

pub use dto::{PostResponse, TagResponse, UserResponse};
pub use response::{ApiResponse, ErrorResponse};
