//! Core types and trait definitions for Moodly.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the domain model, form validation, the visibility rules that decide what a
//! viewer may see of an entry, and the aggregations behind the history and
//! team dashboard views.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod category;
pub mod entry;
pub mod error;
pub mod history;
pub mod store;
pub mod team;
pub mod user;
pub mod validate;
pub mod visibility;

pub use error::{Error, Result};
