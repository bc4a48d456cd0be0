//! Error type for `bastion-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("storage error: {0}")]
  Storage(#[from] bastion_core::StorageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
