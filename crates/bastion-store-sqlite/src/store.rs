//! The SQLite implementation of [`Store`].

use std::path::Path;

use bastion_core::store::{Settle, Store, UnitOfWork, Work};
use rusqlite::TransactionBehavior;

use crate::{Error, Result, schema::SCHEMA, unit::SqliteUnit};

/// A Bastion store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All units of
/// work run one at a time on the connection's thread, each inside a
/// `BEGIN IMMEDIATE` transaction, so the write lock is held from the first
/// check to the commit.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Store impl ──────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;

  async fn transact<F, R>(&self, work: F) -> Result<R>
  where
    F: FnOnce(&mut dyn UnitOfWork) -> Work<R> + Send + 'static,
    R: Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut unit = SqliteUnit::new(&tx);
        match work(&mut unit as &mut dyn UnitOfWork) {
          Ok(Settle::Commit(value)) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Ok(Settle::Rollback(value)) => {
            tx.rollback()?;
            Ok(Ok(value))
          }
          Err(e) => {
            tx.rollback()?;
            Ok(Err(e))
          }
        }
      })
      .await?;

    outcome.map_err(|e| {
      tracing::debug!(error = %e, "unit of work rolled back");
      Error::Storage(e)
    })
  }
}
