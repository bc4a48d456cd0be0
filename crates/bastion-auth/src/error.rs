//! Error type for `bastion-auth`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("token signing secret is missing or empty")]
  MissingSecret,

  #[error("token signing failed: {0}")]
  Signing(#[from] jsonwebtoken::errors::Error),

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("invalid anonymous role partition: {0}")]
  Partition(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
