//! # Lieutenant Core
//!
//! Shared, runtime-agnostic logic for Lieutenant: the error taxonomy,
//! records and their content-hash identity, the store and embedding traits,
//! role normalization, and retrieval augmentation.
//!
//! This crate contains no tokio, sqlx, HTTP client, or filesystem I/O.

pub mod chat;
pub mod embedding;
pub mod error;
pub mod models;
pub mod retrieval;
pub mod store;

pub use error::{Error, Result};
