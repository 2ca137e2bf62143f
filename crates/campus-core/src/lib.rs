//! Core types and trait definitions for the Campus school administration
//! service.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement the traits in [`store`]; the API layer depends only on
//! those traits, the pure document engine in [`render`] / [`compose`], and the
//! helpers in [`metrics`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod class;
pub mod compose;
pub mod document;
pub mod error;
pub mod grade;
pub mod import;
pub mod metrics;
pub mod nav;
mod patch;
pub mod render;
pub mod store;
pub mod student;
pub mod teacher;
pub mod template;
pub mod term;
pub mod user;

pub use error::{Error, Result};
