//! Core types and trait definitions for Bastion.
//!
//! This crate holds the data-only entity records, the role model and gate,
//! the result envelope, and the storage collaborator interface. It is
//! deliberately free of database, token and transport dependencies.

pub mod account;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod gate;
pub mod role;
pub mod store;
pub mod substance;
pub mod task;

pub use envelope::{Envelope, Extra, Indicator};
pub use error::{Error, Result, StorageError};
pub use role::{AccountKind, Identity, Role};
