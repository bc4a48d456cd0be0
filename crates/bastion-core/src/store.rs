//! The storage collaborator interface.
//!
//! Storage backends (e.g. `bastion-store-sqlite`) implement [`Store`] and
//! [`UnitOfWork`]. Every read and write happens inside [`Store::transact`],
//! which hands a closure one unit of work bound to a single atomic
//! transaction. The closure decides whether the transaction commits by
//! returning [`Settle::Commit`] or [`Settle::Rollback`].

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{Account, AccountFilter, AccountPatch, NewAccount},
  error::StorageResult,
  executor::{Executor, ExecutorFilter, NewExecutor},
  substance::{NewSubstance, Substance, SubstanceFilter},
  task::{NewTask, Task, TaskFilter, TaskPatch, TaskRelations},
  StorageError,
};

// ─── Entity capabilities ─────────────────────────────────────────────────────

/// Associates an entity record with the shapes used to query and change it.
pub trait Entity: Sized + Send + 'static {
  type New: Send;
  type Patch: Send;
  type Filter: Send;
  /// Relation-inclusion hints; `()` for entities without relations.
  type Include: Default + Send;
}

/// Capability-scoped operations for one entity kind, bound to the enclosing
/// unit of work.
pub trait Table<E: Entity> {
  fn find_by_key(
    &mut self,
    key: Uuid,
    include: &E::Include,
  ) -> StorageResult<Option<E>>;

  fn find_by(
    &mut self,
    filter: &E::Filter,
    include: &E::Include,
  ) -> StorageResult<Vec<E>>;

  /// Insert a record and return its generated key. A uniqueness violation is
  /// reported as [`StorageError::Conflict`].
  fn insert(&mut self, new: E::New) -> StorageResult<Uuid>;

  /// Apply `patch`; `Ok(false)` means no row matched `key`.
  fn update(&mut self, key: Uuid, patch: E::Patch) -> StorageResult<bool>;

  /// Delete the row; `Ok(false)` means no row matched `key`.
  fn delete(&mut self, key: Uuid) -> StorageResult<bool>;
}

/// One atomic unit of work spanning every entity table.
pub trait UnitOfWork {
  fn accounts(&mut self) -> &mut dyn Table<Account>;
  fn tasks(&mut self) -> &mut dyn Table<Task>;
  fn executors(&mut self) -> &mut dyn Table<Executor>;
  fn substances(&mut self) -> &mut dyn Table<Substance>;
}

impl Entity for Account {
  type New = NewAccount;
  type Patch = AccountPatch;
  type Filter = AccountFilter;
  type Include = ();
}

impl Entity for Task {
  type New = NewTask;
  type Patch = TaskPatch;
  type Filter = TaskFilter;
  type Include = TaskRelations;
}

impl Entity for Executor {
  type New = NewExecutor;
  type Patch = ();
  type Filter = ExecutorFilter;
  type Include = ();
}

impl Entity for Substance {
  type New = NewSubstance;
  type Patch = ();
  type Filter = SubstanceFilter;
  type Include = ();
}

// ─── Transactions ────────────────────────────────────────────────────────────

/// How a unit of work ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Settle<T> {
  Commit(T),
  Rollback(T),
}

/// Result type of a closure passed to [`Store::transact`].
pub type Work<R> = Result<Settle<R>, StorageError>;

/// Abstraction over a Bastion storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run `work` inside one transaction isolated from concurrent writers.
  ///
  /// The transaction commits only when `work` returns `Ok(Settle::Commit)`;
  /// `Settle::Rollback` and `Err` both discard every write made by `work`.
  /// A `StorageError` returned by `work` surfaces as `Self::Error`.
  fn transact<F, R>(
    &self,
    work: F,
  ) -> impl Future<Output = Result<R, Self::Error>> + Send + '_
  where
    F: FnOnce(&mut dyn UnitOfWork) -> Work<R> + Send + 'static,
    R: Send + 'static;
}
