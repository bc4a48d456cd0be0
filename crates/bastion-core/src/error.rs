//! Error types for `bastion-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown account kind: {0:?}")]
  UnknownAccountKind(String),

  #[error("unknown difficulty level: {0:?}")]
  UnknownDifficulty(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The narrow set of failures a storage collaborator may report from inside a
/// unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
  /// A uniqueness or primary-key constraint rejected the write.
  #[error("conflict: {0}")]
  Conflict(String),

  /// The backend failed for a reason unrelated to the data.
  #[error("backend error: {0}")]
  Backend(String),

  /// A stored value could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
