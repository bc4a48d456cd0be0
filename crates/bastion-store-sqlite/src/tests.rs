//! Integration tests for `SqliteStore` against an in-memory database.

use bastion_core::{
  AccountKind, StorageError,
  account::{AccountFilter, AccountPatch, NewAccount},
  executor::NewExecutor,
  store::{Settle, Store},
  substance::NewSubstance,
  task::{Difficulty, NewTask, Page, Task, TaskFilter, TaskPatch, TaskRelations},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_account(name: &str) -> NewAccount {
  NewAccount {
    account_name:  name.into(),
    password_hash: "$argon2id$stub".into(),
    account_kind:  AccountKind::Visitor,
  }
}

fn new_task(title: &str, substance_id: Uuid) -> NewTask {
  NewTask {
    title: title.into(),
    content: format!("{title} content"),
    reward: 1000,
    rate: 1,
    level: None,
    substance_id,
  }
}

/// Create a substance and return its id.
async fn seed_substance(s: &SqliteStore, name: &'static str) -> Uuid {
  s.transact(move |uow| {
    let id = uow.substances().insert(NewSubstance { name: name.into(), description: None })?;
    Ok(Settle::Commit(id))
  })
  .await
  .unwrap()
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_find_account() {
  let s = store().await;

  let (id, found) = s
    .transact(|uow| {
      let id = uow.accounts().insert(new_account("alice"))?;
      let found = uow.accounts().find_by_key(id, &())?;
      Ok(Settle::Commit((id, found)))
    })
    .await
    .unwrap();

  let found = found.expect("read back");
  assert_eq!(found.account_id, id);
  assert_eq!(found.account_name, "alice");
  assert_eq!(found.account_kind, AccountKind::Visitor);
  assert_eq!(found.registered_at, found.updated_at);
}

#[tokio::test]
async fn duplicate_name_is_a_conflict() {
  let s = store().await;
  s.transact(|uow| Ok(Settle::Commit(uow.accounts().insert(new_account("alice"))?)))
    .await
    .unwrap();

  let second = s
    .transact(|uow| Ok(Settle::Commit(uow.accounts().insert(new_account("alice"))?)))
    .await;
  assert!(matches!(second, Err(Error::Storage(StorageError::Conflict(_)))));

  let all = s
    .transact(|uow| Ok(Settle::Commit(uow.accounts().find_by(&AccountFilter::default(), &())?)))
    .await
    .unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn rollback_discards_writes() {
  let s = store().await;

  s.transact(|uow| {
    uow.accounts().insert(new_account("ghost"))?;
    Ok(Settle::Rollback(()))
  })
  .await
  .unwrap();

  let found = s
    .transact(|uow| {
      Ok(Settle::Commit(uow.accounts().find_by(&AccountFilter::by_name("ghost"), &())?))
    })
    .await
    .unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn error_inside_work_discards_earlier_writes() {
  let s = store().await;
  s.transact(|uow| Ok(Settle::Commit(uow.accounts().insert(new_account("alice"))?)))
    .await
    .unwrap();

  // The first insert succeeds, the second conflicts; neither may persist.
  let result = s
    .transact(|uow| {
      uow.accounts().insert(new_account("bob"))?;
      uow.accounts().insert(new_account("alice"))?;
      Ok(Settle::Commit(()))
    })
    .await;
  assert!(result.is_err());

  let bob = s
    .transact(|uow| Ok(Settle::Commit(uow.accounts().find_by(&AccountFilter::by_name("bob"), &())?)))
    .await
    .unwrap();
  assert!(bob.is_empty());
}

#[tokio::test]
async fn update_and_delete_report_missing_rows() {
  let s = store().await;
  let (updated, deleted) = s
    .transact(|uow| {
      let missing = Uuid::new_v4();
      let updated = uow.accounts().update(
        missing,
        AccountPatch { account_kind: Some(AccountKind::Admin), ..AccountPatch::default() },
      )?;
      let deleted = uow.accounts().delete(missing)?;
      Ok(Settle::Commit((updated, deleted)))
    })
    .await
    .unwrap();
  assert!(!updated);
  assert!(!deleted);
}

#[tokio::test]
async fn update_changes_kind_and_touches_timestamp() {
  let s = store().await;
  let account = s
    .transact(|uow| {
      let id = uow.accounts().insert(new_account("alice"))?;
      let changed = uow.accounts().update(
        id,
        AccountPatch { account_kind: Some(AccountKind::Admin), ..AccountPatch::default() },
      )?;
      assert!(changed);
      Ok(Settle::Commit(uow.accounts().find_by_key(id, &())?))
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(account.account_kind, AccountKind::Admin);
  assert!(account.updated_at >= account.registered_at);
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn task_defaults_come_from_the_store() {
  let s = store().await;
  let substance_id = seed_substance(&s, "garden").await;

  let task = s
    .transact(move |uow| {
      let id = uow.tasks().insert(new_task("water", substance_id))?;
      Ok(Settle::Commit(uow.tasks().find_by_key(id, &TaskRelations::default())?))
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(task.level, Difficulty::Normal);
  assert!(!task.accomplished);
  assert!(task.available);
  assert_eq!(task.substance_id, Some(substance_id));
  assert!(task.substance.is_none());
  assert!(task.assignee.is_none());
}

#[tokio::test]
async fn relations_load_only_when_requested() {
  let s = store().await;
  let substance_id = seed_substance(&s, "garden").await;

  let (bare, full) = s
    .transact(move |uow| {
      let uid = uow.executors().insert(NewExecutor { name: "bob".into(), job: None })?;
      let id = uow.tasks().insert(new_task("water", substance_id))?;
      uow.tasks().update(id, TaskPatch { assignee_id: Some(uid), ..TaskPatch::default() })?;
      let bare = uow.tasks().find_by_key(id, &TaskRelations::default())?;
      let full = uow.tasks().find_by_key(id, &TaskRelations::all())?;
      Ok(Settle::Commit((bare, full)))
    })
    .await
    .unwrap();

  let bare = bare.unwrap();
  assert!(bare.assignee_id.is_some());
  assert!(bare.assignee.is_none());
  assert!(bare.substance.is_none());

  let full = full.unwrap();
  assert_eq!(full.assignee.as_ref().map(|e| e.name.as_str()), Some("bob"));
  assert_eq!(full.substance.as_ref().map(|s| s.name.as_str()), Some("garden"));
}

#[tokio::test]
async fn paging_and_assignee_filter() {
  let s = store().await;
  let substance_id = seed_substance(&s, "garden").await;

  let (page, assigned): (Vec<Task>, Vec<Task>) = s
    .transact(move |uow| {
      let uid = uow.executors().insert(NewExecutor { name: "bob".into(), job: None })?;
      for title in ["t1", "t2", "t3", "t4"] {
        let id = uow.tasks().insert(new_task(title, substance_id))?;
        if title == "t3" {
          uow.tasks().update(id, TaskPatch { assignee_id: Some(uid), ..TaskPatch::default() })?;
        }
      }
      let page = uow.tasks().find_by(
        &TaskFilter { page: Some(Page { cursor: 1, limit: 2 }), ..TaskFilter::default() },
        &TaskRelations::default(),
      )?;
      let assigned = uow.tasks().find_by(&TaskFilter::by_assignee(uid), &TaskRelations::default())?;
      Ok(Settle::Commit((page, assigned)))
    })
    .await
    .unwrap();

  let titles: Vec<_> = page.iter().map(|t| t.title.as_str()).collect();
  assert_eq!(titles, ["t2", "t3"]);
  assert_eq!(assigned.len(), 1);
  assert_eq!(assigned[0].title, "t3");
}

#[tokio::test]
async fn explicit_level_overrides_default() {
  let s = store().await;
  let substance_id = seed_substance(&s, "garden").await;

  let task = s
    .transact(move |uow| {
      let mut input = new_task("prune", substance_id);
      input.level = Some(Difficulty::Expert);
      let id = uow.tasks().insert(input)?;
      Ok(Settle::Commit(uow.tasks().find_by_key(id, &TaskRelations::default())?))
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(task.level, Difficulty::Expert);
}

#[tokio::test]
async fn duplicate_title_is_a_conflict() {
  let s = store().await;
  let substance_id = seed_substance(&s, "garden").await;

  let result = s
    .transact(move |uow| {
      uow.tasks().insert(new_task("water", substance_id))?;
      uow.tasks().insert(new_task("water", substance_id))?;
      Ok(Settle::Commit(()))
    })
    .await;
  assert!(matches!(result, Err(Error::Storage(StorageError::Conflict(_)))));
}

#[tokio::test]
async fn file_backed_store_persists_across_reopen() {
  let dir = std::env::temp_dir().join(format!("bastion-store-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("bastion.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.transact(|uow| Ok(Settle::Commit(uow.accounts().insert(new_account("alice"))?)))
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let found = s
    .transact(|uow| Ok(Settle::Commit(uow.accounts().find_by(&AccountFilter::by_name("alice"), &())?)))
    .await
    .unwrap();
  assert_eq!(found.len(), 1);

  std::fs::remove_dir_all(&dir).ok();
}
