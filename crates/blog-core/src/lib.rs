//! # Blog Core
//!
//! The domain layer of the blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, ports, form validation, pagination and search scoring.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;
pub mod search;
pub mod slug;

pub use error::DomainError;
