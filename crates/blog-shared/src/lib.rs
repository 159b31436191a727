//! # Blog Shared
//!
//! Wire types of the blog HTTP API, shared by the server and any Rust client.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, FieldErrors};
