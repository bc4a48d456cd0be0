//! SQLite backend for the Bastion storage collaborator.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every unit of work is one
//! `BEGIN IMMEDIATE` transaction on that thread.

mod encode;
mod schema;
mod store;
mod unit;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
