//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings (microsecond precision, `Z`
//! suffix). Enums are stored by their `SCREAMING_SNAKE_CASE` names. UUIDs are
//! hyphenated lowercase strings. Booleans are `0`/`1` integers.

use bastion_core::{
  AccountKind, StorageError,
  account::Account,
  error::StorageResult,
  executor::Executor,
  substance::Substance,
  task::{Difficulty, Task},
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Row, ffi};
use uuid::Uuid;

// ─── rusqlite errors ─────────────────────────────────────────────────────────

/// Classify a rusqlite error. Unique and primary-key violations become
/// [`StorageError::Conflict`]; SQLite's message names the constraint, never
/// the offending values.
pub fn storage_err(e: rusqlite::Error) -> StorageError {
  match &e {
    rusqlite::Error::SqliteFailure(failure, _)
      if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
    {
      StorageError::Conflict(e.to_string())
    }
    _ => StorageError::Backend(e.to_string()),
  }
}

/// `.db()?` shorthand for mapping rusqlite results into storage results.
pub trait Db<T> {
  fn db(self) -> StorageResult<T>;
}

impl<T> Db<T> for rusqlite::Result<T> {
  fn db(self) -> StorageResult<T> { self.map_err(storage_err) }
}

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> StorageResult<Uuid> {
  Uuid::parse_str(s).map_err(|e| StorageError::Decode(format!("uuid {s:?}: {e}")))
}

fn decode_opt_uuid(s: Option<String>) -> StorageResult<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> StorageResult<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StorageError::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn decode_kind(s: &str) -> StorageResult<AccountKind> {
  AccountKind::parse(s).map_err(|e| StorageError::Decode(e.to_string()))
}

pub fn decode_level(s: &str) -> StorageResult<Difficulty> {
  Difficulty::parse(s).map_err(|e| StorageError::Decode(e.to_string()))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str =
  "account_id, account_name, password_hash, account_kind, registered_at, updated_at";

pub struct RawAccount {
  pub account_id:    String,
  pub account_name:  String,
  pub password_hash: String,
  pub account_kind:  String,
  pub registered_at: String,
  pub updated_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      account_name:  row.get(1)?,
      password_hash: row.get(2)?,
      account_kind:  row.get(3)?,
      registered_at: row.get(4)?,
      updated_at:    row.get(5)?,
    })
  }

  pub fn into_account(self) -> StorageResult<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      account_name:  self.account_name,
      password_hash: self.password_hash,
      account_kind:  decode_kind(&self.account_kind)?,
      registered_at: decode_dt(&self.registered_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const SUBSTANCE_COLUMNS: &str = "substance_id, name, description, created_at";

pub struct RawSubstance {
  pub substance_id: String,
  pub name:         String,
  pub description:  Option<String>,
  pub created_at:   String,
}

impl RawSubstance {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      substance_id: row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      created_at:   row.get(3)?,
    })
  }

  pub fn into_substance(self) -> StorageResult<Substance> {
    Ok(Substance {
      substance_id: decode_uuid(&self.substance_id)?,
      name:         self.name,
      description:  self.description,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const EXECUTOR_COLUMNS: &str = "uid, name, job, created_at";

pub struct RawExecutor {
  pub uid:        String,
  pub name:       String,
  pub job:        Option<String>,
  pub created_at: String,
}

impl RawExecutor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uid:        row.get(0)?,
      name:       row.get(1)?,
      job:        row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_executor(self) -> StorageResult<Executor> {
    Ok(Executor {
      uid:        decode_uuid(&self.uid)?,
      name:       self.name,
      job:        self.job,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const TASK_COLUMNS: &str = "task_id, title, content, reward, rate, level, \
  accomplished, available, substance_id, assignee_id, created_at, updated_at";

pub struct RawTask {
  pub task_id:      String,
  pub title:        String,
  pub content:      String,
  pub reward:       i64,
  pub rate:         i64,
  pub level:        String,
  pub accomplished: bool,
  pub available:    bool,
  pub substance_id: Option<String>,
  pub assignee_id:  Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawTask {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      task_id:      row.get(0)?,
      title:        row.get(1)?,
      content:      row.get(2)?,
      reward:       row.get(3)?,
      rate:         row.get(4)?,
      level:        row.get(5)?,
      accomplished: row.get(6)?,
      available:    row.get(7)?,
      substance_id: row.get(8)?,
      assignee_id:  row.get(9)?,
      created_at:   row.get(10)?,
      updated_at:   row.get(11)?,
    })
  }

  /// Relations are left empty; the caller loads them on request.
  pub fn into_task(self) -> StorageResult<Task> {
    Ok(Task {
      task_id:      decode_uuid(&self.task_id)?,
      title:        self.title,
      content:      self.content,
      reward:       self.reward,
      rate:         self.rate,
      level:        decode_level(&self.level)?,
      accomplished: self.accomplished,
      available:    self.available,
      substance_id: decode_opt_uuid(self.substance_id)?,
      assignee_id:  decode_opt_uuid(self.assignee_id)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
      substance:    None,
      assignee:     None,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
    assert_eq!(encode_dt(a).len(), encode_dt(b).len());
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn bad_values_are_decode_errors() {
    assert!(matches!(decode_uuid("nope"), Err(StorageError::Decode(_))));
    assert!(matches!(decode_kind("ROOT"), Err(StorageError::Decode(_))));
    assert!(matches!(decode_dt("yesterday"), Err(StorageError::Decode(_))));
  }
}
