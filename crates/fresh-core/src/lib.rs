//! Core types and trait definitions for the Fresh digest bot.
//!
//! This crate is free of HTTP and database dependencies. The store backend,
//! the digest renderer and the bot binary all depend on it.

pub mod error;
pub mod forum;
pub mod limits;
pub mod post;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
