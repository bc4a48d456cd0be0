//! Error type for `bastion-service`.
//!
//! None of these cross an operation boundary: operations turn them into an
//! `INTERNAL_ERROR` envelope. They surface directly only at start-up.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error(transparent)]
  Auth(#[from] bastion_auth::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("blocking task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
