//! Core types and trait definitions for the operations portal.
//!
//! Covers the request lifecycle (creation, review decisions, listing), the
//! interval-overlap rule for exclusive resource types, and the role-based
//! authorization gate consulted by every lifecycle operation.
//!
//! This crate has no HTTP or database dependencies.

// Native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod overlap;
pub mod request;
pub mod role;
pub mod store;
pub mod timestamp;
pub mod user;

pub use error::{Error, Result};
