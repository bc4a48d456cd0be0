//! One open transaction exposed as a [`UnitOfWork`].
//!
//! Everything here is synchronous: it runs on the connection thread owned by
//! `tokio_rusqlite`, inside the transaction opened by `SqliteStore::transact`.

use bastion_core::{
  account::{Account, AccountFilter, AccountPatch, NewAccount},
  error::StorageResult,
  executor::{Executor, ExecutorFilter, NewExecutor},
  store::{Table, UnitOfWork},
  substance::{NewSubstance, Substance, SubstanceFilter},
  task::{NewTask, Task, TaskFilter, TaskPatch, TaskRelations},
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params_from_iter, types::Value};
use uuid::Uuid;

use crate::encode::{
  ACCOUNT_COLUMNS, Db, EXECUTOR_COLUMNS, RawAccount, RawExecutor,
  RawSubstance, RawTask, SUBSTANCE_COLUMNS, TASK_COLUMNS, encode_dt,
  encode_uuid,
};

pub struct SqliteUnit<'t> {
  conn: &'t Connection,
}

impl<'t> SqliteUnit<'t> {
  /// `conn` must be a transaction (it derefs to `Connection`).
  pub fn new(conn: &'t Connection) -> Self { Self { conn } }

  fn select<R>(
    &self,
    sql: &str,
    args: Vec<Value>,
    map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
  ) -> StorageResult<Vec<R>> {
    let mut stmt = self.conn.prepare(sql).db()?;
    let rows = stmt
      .query_map(params_from_iter(args), map)
      .db()?
      .collect::<rusqlite::Result<Vec<_>>>()
      .db()?;
    Ok(rows)
  }

  fn select_one<R>(
    &self,
    sql: &str,
    key: Uuid,
    map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
  ) -> StorageResult<Option<R>> {
    self
      .conn
      .query_row(sql, [encode_uuid(key)], map)
      .optional()
      .db()
  }

  /// `UPDATE table SET ... WHERE key_column = ?`; returns whether a row
  /// matched.
  fn update_columns(
    &self,
    table: &str,
    key_column: &str,
    key: Uuid,
    mut sets: Vec<(&'static str, Value)>,
    touch: bool,
  ) -> StorageResult<bool> {
    if touch {
      sets.push(("updated_at", Value::Text(encode_dt(Utc::now()))));
    }
    if sets.is_empty() {
      return self.exists(table, key_column, key);
    }

    let assignments = sets
      .iter()
      .map(|(column, _)| format!("{column} = ?"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!("UPDATE {table} SET {assignments} WHERE {key_column} = ?");

    let mut args: Vec<Value> = sets.into_iter().map(|(_, v)| v).collect();
    args.push(Value::Text(encode_uuid(key)));

    let changed = self.conn.execute(&sql, params_from_iter(args)).db()?;
    Ok(changed > 0)
  }

  fn delete_row(&self, table: &str, key_column: &str, key: Uuid) -> StorageResult<bool> {
    let sql = format!("DELETE FROM {table} WHERE {key_column} = ?1");
    let changed = self.conn.execute(&sql, [encode_uuid(key)]).db()?;
    Ok(changed > 0)
  }

  fn exists(&self, table: &str, key_column: &str, key: Uuid) -> StorageResult<bool> {
    let sql = format!("SELECT 1 FROM {table} WHERE {key_column} = ?1");
    Ok(
      self
        .conn
        .query_row(&sql, [encode_uuid(key)], |_| Ok(()))
        .optional()
        .db()?
        .is_some(),
    )
  }

  fn load_relations(&mut self, task: &mut Task, include: &TaskRelations) -> StorageResult<()> {
    if include.substance
      && let Some(id) = task.substance_id
    {
      task.substance = Table::<Substance>::find_by_key(self, id, &())?;
    }
    if include.assignee
      && let Some(uid) = task.assignee_id
    {
      task.assignee = Table::<Executor>::find_by_key(self, uid, &())?;
    }
    Ok(())
  }
}

fn where_clause(conds: &[&str]) -> String {
  if conds.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", conds.join(" AND "))
  }
}

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

// ─── UnitOfWork ──────────────────────────────────────────────────────────────

impl UnitOfWork for SqliteUnit<'_> {
  fn accounts(&mut self) -> &mut dyn Table<Account> { self }

  fn tasks(&mut self) -> &mut dyn Table<Task> { self }

  fn executors(&mut self) -> &mut dyn Table<Executor> { self }

  fn substances(&mut self) -> &mut dyn Table<Substance> { self }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

impl Table<Account> for SqliteUnit<'_> {
  fn find_by_key(&mut self, key: Uuid, _: &()) -> StorageResult<Option<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1");
    self
      .select_one(&sql, key, RawAccount::from_row)?
      .map(RawAccount::into_account)
      .transpose()
  }

  fn find_by(&mut self, filter: &AccountFilter, _: &()) -> StorageResult<Vec<Account>> {
    let mut conds = Vec::new();
    let mut args = Vec::new();
    if let Some(name) = &filter.account_name {
      conds.push("account_name = ?");
      args.push(text(name));
    }
    if let Some(kind) = filter.account_kind {
      conds.push("account_kind = ?");
      args.push(Value::Text(kind.to_string()));
    }

    let sql = format!(
      "SELECT {ACCOUNT_COLUMNS} FROM accounts{} ORDER BY rowid",
      where_clause(&conds)
    );
    self
      .select(&sql, args, RawAccount::from_row)?
      .into_iter()
      .map(RawAccount::into_account)
      .collect()
  }

  fn insert(&mut self, new: NewAccount) -> StorageResult<Uuid> {
    let id = Uuid::new_v4();
    let now = encode_dt(Utc::now());
    self
      .conn
      .execute(
        "INSERT INTO accounts (
           account_id, account_name, password_hash, account_kind,
           registered_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        rusqlite::params![
          encode_uuid(id),
          new.account_name,
          new.password_hash,
          new.account_kind.to_string(),
          now,
        ],
      )
      .db()?;
    Ok(id)
  }

  fn update(&mut self, key: Uuid, patch: AccountPatch) -> StorageResult<bool> {
    let mut sets = Vec::new();
    if let Some(hash) = patch.password_hash {
      sets.push(("password_hash", Value::Text(hash)));
    }
    if let Some(kind) = patch.account_kind {
      sets.push(("account_kind", Value::Text(kind.to_string())));
    }
    self.update_columns("accounts", "account_id", key, sets, true)
  }

  fn delete(&mut self, key: Uuid) -> StorageResult<bool> {
    self.delete_row("accounts", "account_id", key)
  }
}

// ─── Substances ──────────────────────────────────────────────────────────────

impl Table<Substance> for SqliteUnit<'_> {
  fn find_by_key(&mut self, key: Uuid, _: &()) -> StorageResult<Option<Substance>> {
    let sql =
      format!("SELECT {SUBSTANCE_COLUMNS} FROM substances WHERE substance_id = ?1");
    self
      .select_one(&sql, key, RawSubstance::from_row)?
      .map(RawSubstance::into_substance)
      .transpose()
  }

  fn find_by(&mut self, filter: &SubstanceFilter, _: &()) -> StorageResult<Vec<Substance>> {
    let mut conds = Vec::new();
    let mut args = Vec::new();
    if let Some(name) = &filter.name {
      conds.push("name = ?");
      args.push(text(name));
    }
    let sql = format!(
      "SELECT {SUBSTANCE_COLUMNS} FROM substances{} ORDER BY rowid",
      where_clause(&conds)
    );
    self
      .select(&sql, args, RawSubstance::from_row)?
      .into_iter()
      .map(RawSubstance::into_substance)
      .collect()
  }

  fn insert(&mut self, new: NewSubstance) -> StorageResult<Uuid> {
    let id = Uuid::new_v4();
    self
      .conn
      .execute(
        "INSERT INTO substances (substance_id, name, description, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
          encode_uuid(id),
          new.name,
          new.description,
          encode_dt(Utc::now()),
        ],
      )
      .db()?;
    Ok(id)
  }

  fn update(&mut self, key: Uuid, _: ()) -> StorageResult<bool> {
    self.update_columns("substances", "substance_id", key, Vec::new(), false)
  }

  fn delete(&mut self, key: Uuid) -> StorageResult<bool> {
    self.delete_row("substances", "substance_id", key)
  }
}

// ─── Executors ───────────────────────────────────────────────────────────────

impl Table<Executor> for SqliteUnit<'_> {
  fn find_by_key(&mut self, key: Uuid, _: &()) -> StorageResult<Option<Executor>> {
    let sql = format!("SELECT {EXECUTOR_COLUMNS} FROM executors WHERE uid = ?1");
    self
      .select_one(&sql, key, RawExecutor::from_row)?
      .map(RawExecutor::into_executor)
      .transpose()
  }

  fn find_by(&mut self, filter: &ExecutorFilter, _: &()) -> StorageResult<Vec<Executor>> {
    let mut conds = Vec::new();
    let mut args = Vec::new();
    if let Some(name) = &filter.name {
      conds.push("name = ?");
      args.push(text(name));
    }
    let sql = format!(
      "SELECT {EXECUTOR_COLUMNS} FROM executors{} ORDER BY rowid",
      where_clause(&conds)
    );
    self
      .select(&sql, args, RawExecutor::from_row)?
      .into_iter()
      .map(RawExecutor::into_executor)
      .collect()
  }

  fn insert(&mut self, new: NewExecutor) -> StorageResult<Uuid> {
    let uid = Uuid::new_v4();
    self
      .conn
      .execute(
        "INSERT INTO executors (uid, name, job, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![encode_uuid(uid), new.name, new.job, encode_dt(Utc::now())],
      )
      .db()?;
    Ok(uid)
  }

  fn update(&mut self, key: Uuid, _: ()) -> StorageResult<bool> {
    self.update_columns("executors", "uid", key, Vec::new(), false)
  }

  fn delete(&mut self, key: Uuid) -> StorageResult<bool> {
    self.delete_row("executors", "uid", key)
  }
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

impl Table<Task> for SqliteUnit<'_> {
  fn find_by_key(&mut self, key: Uuid, include: &TaskRelations) -> StorageResult<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?1");
    let Some(raw) = self.select_one(&sql, key, RawTask::from_row)? else {
      return Ok(None);
    };
    let mut task = raw.into_task()?;
    self.load_relations(&mut task, include)?;
    Ok(Some(task))
  }

  fn find_by(&mut self, filter: &TaskFilter, include: &TaskRelations) -> StorageResult<Vec<Task>> {
    let mut conds = Vec::new();
    let mut args = Vec::new();
    if let Some(title) = &filter.title {
      conds.push("title = ?");
      args.push(text(title));
    }
    if let Some(uid) = filter.assignee_id {
      conds.push("assignee_id = ?");
      args.push(Value::Text(encode_uuid(uid)));
    }

    let mut sql = format!(
      "SELECT {TASK_COLUMNS} FROM tasks{} ORDER BY rowid",
      where_clause(&conds)
    );
    if let Some(page) = filter.page {
      sql.push_str(" LIMIT ? OFFSET ?");
      args.push(Value::Integer(page.limit as i64));
      args.push(Value::Integer(page.cursor as i64));
    }

    let raws = self.select(&sql, args, RawTask::from_row)?;
    let mut tasks = Vec::with_capacity(raws.len());
    for raw in raws {
      let mut task = raw.into_task()?;
      self.load_relations(&mut task, include)?;
      tasks.push(task);
    }
    Ok(tasks)
  }

  fn insert(&mut self, new: NewTask) -> StorageResult<Uuid> {
    let id = Uuid::new_v4();
    let now = encode_dt(Utc::now());

    let mut columns = vec![
      "task_id",
      "title",
      "content",
      "reward",
      "rate",
      "substance_id",
      "created_at",
      "updated_at",
    ];
    let mut args = vec![
      Value::Text(encode_uuid(id)),
      Value::Text(new.title),
      Value::Text(new.content),
      Value::Integer(new.reward),
      Value::Integer(new.rate),
      Value::Text(encode_uuid(new.substance_id)),
      Value::Text(now.clone()),
      Value::Text(now),
    ];
    // Omitted columns take the schema default.
    if let Some(level) = new.level {
      columns.push("level");
      args.push(Value::Text(level.to_string()));
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
      "INSERT INTO tasks ({}) VALUES ({placeholders})",
      columns.join(", ")
    );
    self.conn.execute(&sql, params_from_iter(args)).db()?;
    Ok(id)
  }

  fn update(&mut self, key: Uuid, patch: TaskPatch) -> StorageResult<bool> {
    let mut sets = Vec::new();
    if let Some(title) = patch.title {
      sets.push(("title", Value::Text(title)));
    }
    if let Some(content) = patch.content {
      sets.push(("content", Value::Text(content)));
    }
    if let Some(reward) = patch.reward {
      sets.push(("reward", Value::Integer(reward)));
    }
    if let Some(rate) = patch.rate {
      sets.push(("rate", Value::Integer(rate)));
    }
    if let Some(level) = patch.level {
      sets.push(("level", Value::Text(level.to_string())));
    }
    if let Some(accomplished) = patch.accomplished {
      sets.push(("accomplished", Value::Integer(i64::from(accomplished))));
    }
    if let Some(available) = patch.available {
      sets.push(("available", Value::Integer(i64::from(available))));
    }
    if let Some(uid) = patch.assignee_id {
      sets.push(("assignee_id", Value::Text(encode_uuid(uid))));
    }
    self.update_columns("tasks", "task_id", key, sets, true)
  }

  fn delete(&mut self, key: Uuid) -> StorageResult<bool> {
    self.delete_row("tasks", "task_id", key)
  }
}
