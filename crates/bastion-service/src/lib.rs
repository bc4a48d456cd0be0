//! The guarded-mutation coordinator and the Bastion operation catalogue.
//!
//! Every operation follows the same path: the caller's [`Identity`] (resolved
//! once per request) passes the role gate, then the operation's checks, write
//! and read-back run as one closure inside [`Store::transact`]. A closure
//! that short-circuits returns [`Settle::Rollback`] with a failure envelope,
//! so no partial write survives. Whatever happens, the caller gets exactly
//! one [`Envelope`].

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod operation;
pub mod tasks;

pub use crate::config::ServiceConfig;
pub use error::{Error, Result};
pub use operation::Operation;

use std::sync::Arc;

use bastion_auth::{Credentials, TokenService};
use bastion_core::{
  Envelope, Extra, Identity, Indicator, StorageError,
  account::Account,
  gate,
  store::{Settle, Store, UnitOfWork, Work},
};
use uuid::Uuid;


// ─── Request context ─────────────────────────────────────────────────────────

/// Everything an operation knows about its caller. Built once per request and
/// passed explicitly.
#[derive(Debug, Clone)]
pub struct RequestContext {
  identity: Identity,
}

impl RequestContext {
  pub fn new(identity: Identity) -> Self { Self { identity } }

  pub fn identity(&self) -> &Identity { &self.identity }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Runs operations against a store. Cheap to clone.
pub struct Service<S: Store> {
  store:       Arc<S>,
  tokens:      Arc<TokenService>,
  credentials: Credentials,
}

impl<S: Store> Clone for Service<S> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      tokens:      self.tokens.clone(),
      credentials: self.credentials.clone(),
    }
  }
}

impl<S: Store> Service<S> {
  pub fn new(
    store: Arc<S>,
    tokens: Arc<TokenService>,
    credentials: Credentials,
  ) -> Self {
    Self { store, tokens, credentials }
  }

  pub fn tokens(&self) -> &TokenService { &self.tokens }

  /// Role gate. Runs before anything touches storage.
  fn admit<T>(
    &self,
    ctx: &RequestContext,
    op: Operation,
  ) -> Result<(), Envelope<T>> {
    let required = op.required_role();
    if gate::authorize(Some(ctx.identity()), required).is_allowed() {
      return Ok(());
    }
    tracing::warn!(
      operation = %op,
      subject = %ctx.identity().subject_id,
      role = %ctx.identity().role,
      %required,
      "operation denied"
    );
    Err(Envelope::failure(Indicator::Unauthorized))
  }

  /// Run `work` as one atomic unit and collapse every outcome into an
  /// envelope.
  async fn run<T, F>(&self, op: Operation, work: F) -> Envelope<T>
  where
    F: FnOnce(&mut dyn UnitOfWork) -> Work<Envelope<T>> + Send + 'static,
    T: Send + 'static,
  {
    let envelope = self.fetch(op, work).await;
    report(op, envelope)
  }

  /// Like [`run`](Self::run) but leaves outcome logging to the caller. Used
  /// for lookups that are only one step of an operation.
  async fn fetch<T, F>(&self, op: Operation, work: F) -> Envelope<T>
  where
    F: FnOnce(&mut dyn UnitOfWork) -> Work<Envelope<T>> + Send + 'static,
    T: Send + 'static,
  {
    match self.store.transact(work).await {
      Ok(envelope) => envelope,
      Err(e) => {
        let e = Error::Store(Box::new(e));
        tracing::error!(operation = %op, error = %e, "operation failed");
        Envelope::internal(e)
      }
    }
  }

  /// [`admit`](Self::admit) followed by [`run`](Self::run).
  async fn guarded<T, F>(
    &self,
    ctx: &RequestContext,
    op: Operation,
    work: F,
  ) -> Envelope<T>
  where
    F: FnOnce(&mut dyn UnitOfWork) -> Work<Envelope<T>> + Send + 'static,
    T: Send + 'static,
  {
    if let Err(denied) = self.admit(ctx, op) {
      return denied;
    }
    self.run(op, work).await
  }

  /// Hash a new secret off the async runtime.
  async fn hash_secret(&self, password: &str) -> Result<String> {
    let credentials = self.credentials.clone();
    let password = password.to_owned();
    let hash =
      tokio::task::spawn_blocking(move || credentials.hash(&password)).await??;
    Ok(hash)
  }

  /// Check a secret against its stored hash off the async runtime, so the
  /// store is never held while argon2 runs.
  async fn verify_secret(&self, password: &str, hash: &str) -> Result<bool> {
    let credentials = self.credentials.clone();
    let password = password.to_owned();
    let hash = hash.to_owned();
    let matches =
      tokio::task::spawn_blocking(move || credentials.verify(&password, &hash)).await?;
    Ok(matches)
  }

  /// Attach a freshly minted token for the account in a successful envelope.
  fn with_token(&self, op: Operation, envelope: Envelope<Account>) -> Envelope<Account> {
    if !envelope.is_success() {
      return envelope;
    }
    let Some(account) = envelope.data().first() else {
      return envelope;
    };
    match self.tokens.issue(&account.account_name, account.account_kind) {
      Ok(token) => envelope.with_extra(Extra::Token(token)),
      Err(e) => {
        tracing::error!(operation = %op, error = %e, "token issuance failed");
        Envelope::internal(e)
      }
    }
  }
}

/// Log how an operation ended and hand its envelope back.
fn report<T>(op: Operation, envelope: Envelope<T>) -> Envelope<T> {
  match envelope.indicator() {
    Indicator::Success => tracing::info!(operation = %op, "operation succeeded"),
    Indicator::InternalError => {}
    indicator => tracing::debug!(operation = %op, %indicator, "operation short-circuited"),
  }
  envelope
}

// ─── Unit-of-work helpers ────────────────────────────────────────────────────

/// Roll back and report `indicator`.
fn abort<T>(indicator: Indicator) -> Work<Envelope<T>> {
  Ok(Settle::Rollback(Envelope::failure(indicator)))
}

/// Roll back and report `indicator` with the records that caused it.
fn abort_with<T>(indicator: Indicator, data: Vec<T>) -> Work<Envelope<T>> {
  Ok(Settle::Rollback(Envelope::failure_with(indicator, data)))
}

/// Commit and report success.
fn commit<T>(data: Vec<T>) -> Work<Envelope<T>> {
  Ok(Settle::Commit(Envelope::success(data)))
}

/// `None` when the store rejected an insert as a duplicate.
fn unless_conflict(inserted: Result<Uuid, StorageError>) -> Result<Option<Uuid>, StorageError> {
  match inserted {
    Ok(key) => Ok(Some(key)),
    Err(StorageError::Conflict(reason)) => {
      tracing::debug!(%reason, "insert rejected by unique constraint");
      Ok(None)
    }
    Err(e) => Err(e),
  }
}

/// Read back a record after a write. A missing record means something removed
/// it inside this unit, so the whole write is reported as `NOT_FOUND`.
fn read_back<T>(found: Option<T>) -> Work<Envelope<T>> {
  match found {
    Some(record) => commit(vec![record]),
    None => abort(Indicator::NotFound),
  }
}
