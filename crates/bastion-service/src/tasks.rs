//! Task queries and guarded task mutations.

use bastion_core::{
  Envelope, Indicator, StorageError,
  store::{Store, UnitOfWork, Work},
  task::{Difficulty, NewTask, Page, Task, TaskFilter, TaskPatch, TaskRelations},
};
use uuid::Uuid;

use crate::{
  Operation, RequestContext, Service, abort, abort_with, commit, read_back,
  unless_conflict,
};

/// Editable task fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
  pub task_id: Uuid,
  pub title:   Option<String>,
  pub content: Option<String>,
  pub reward:  Option<i64>,
  pub rate:    Option<i64>,
}

impl TaskUpdate {
  fn into_patch(self) -> TaskPatch {
    TaskPatch {
      title: self.title,
      content: self.content,
      reward: self.reward,
      rate: self.rate,
      ..TaskPatch::default()
    }
  }
}

/// Apply `patch` to an existing task and read it back. Zero affected rows
/// count as `NOT_FOUND`.
fn patch_task(
  uow: &mut dyn UnitOfWork,
  task_id: Uuid,
  patch: TaskPatch,
  include: TaskRelations,
) -> Work<Envelope<Task>> {
  if !uow.tasks().update(task_id, patch)? {
    return abort(Indicator::NotFound);
  }
  read_back(uow.tasks().find_by_key(task_id, &include)?)
}

/// Tasks other than `task_id` whose title is `title`.
fn title_holders(
  uow: &mut dyn UnitOfWork,
  title: &str,
  task_id: Uuid,
) -> Result<Vec<Task>, StorageError> {
  let holders = uow
    .tasks()
    .find_by(&TaskFilter::by_title(title.to_owned()), &TaskRelations::default())?
    .into_iter()
    .filter(|holder| holder.task_id != task_id)
    .collect();
  Ok(holders)
}

impl<S: Store> Service<S> {
  /// One page of tasks in creation order. The default page is the first 20.
  pub async fn query_all_tasks(
    &self,
    ctx: &RequestContext,
    page: Option<Page>,
    relations: TaskRelations,
  ) -> Envelope<Task> {
    let filter = TaskFilter { page: Some(page.unwrap_or_default()), ..TaskFilter::default() };
    self
      .guarded(ctx, Operation::QueryAllTasks, move |uow| {
        commit(uow.tasks().find_by(&filter, &relations)?)
      })
      .await
  }

  pub async fn query_task_by_id(
    &self,
    ctx: &RequestContext,
    task_id: Uuid,
    relations: TaskRelations,
  ) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::QueryTaskById, move |uow| {
        match uow.tasks().find_by_key(task_id, &relations)? {
          Some(task) => commit(vec![task]),
          None => abort(Indicator::NotFound),
        }
      })
      .await
  }

  /// Tasks currently assigned to executor `uid`.
  pub async fn query_executor_tasks(
    &self,
    ctx: &RequestContext,
    uid: Uuid,
    relations: TaskRelations,
  ) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::QueryExecutorTasks, move |uow| {
        if uow.executors().find_by_key(uid, &())?.is_none() {
          return abort(Indicator::NotFound);
        }
        commit(uow.tasks().find_by(&TaskFilter::by_assignee(uid), &relations)?)
      })
      .await
  }

  /// Create a task attached to an existing substance. A title already in use
  /// yields `EXISTED` with the task holding it.
  pub async fn create_task(&self, ctx: &RequestContext, input: NewTask) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::CreateTask, move |uow| {
        if uow.substances().find_by_key(input.substance_id, &())?.is_none() {
          return abort(Indicator::NotFound);
        }
        let by_title = TaskFilter::by_title(input.title.clone());
        let holders = uow.tasks().find_by(&by_title, &TaskRelations::default())?;
        if !holders.is_empty() {
          return abort_with(Indicator::Existed, holders);
        }
        let Some(task_id) = unless_conflict(uow.tasks().insert(input))? else {
          let holders = uow.tasks().find_by(&by_title, &TaskRelations::default())?;
          return abort_with(Indicator::Existed, holders);
        };
        let include = TaskRelations { substance: true, ..TaskRelations::default() };
        read_back(uow.tasks().find_by_key(task_id, &include)?)
      })
      .await
  }

  /// Renaming onto a title another task holds yields `EXISTED` with that
  /// task; keeping the current title is not a conflict.
  pub async fn update_task_info(
    &self,
    ctx: &RequestContext,
    update: TaskUpdate,
  ) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::UpdateTaskInfo, move |uow| {
        let task_id = update.task_id;
        if uow.tasks().find_by_key(task_id, &TaskRelations::default())?.is_none() {
          return abort(Indicator::NotFound);
        }
        let title = update.title.clone();
        if let Some(title) = &title {
          let holders = title_holders(uow, title, task_id)?;
          if !holders.is_empty() {
            return abort_with(Indicator::Existed, holders);
          }
        }
        match uow.tasks().update(task_id, update.into_patch()) {
          Ok(true) => read_back(uow.tasks().find_by_key(task_id, &TaskRelations::default())?),
          Ok(false) => abort(Indicator::NotFound),
          Err(StorageError::Conflict(_)) => {
            let holders = match &title {
              Some(title) => title_holders(uow, title, task_id)?,
              None => Vec::new(),
            };
            abort_with(Indicator::Existed, holders)
          }
          Err(e) => Err(e),
        }
      })
      .await
  }

  /// Flip `accomplished`.
  pub async fn toggle_task_status(&self, ctx: &RequestContext, task_id: Uuid) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::ToggleTaskStatus, move |uow| {
        let Some(task) = uow.tasks().find_by_key(task_id, &TaskRelations::default())? else {
          return abort(Indicator::NotFound);
        };
        let patch = TaskPatch { accomplished: Some(!task.accomplished), ..TaskPatch::default() };
        patch_task(uow, task_id, patch, TaskRelations::default())
      })
      .await
  }

  pub async fn mutate_task_level(
    &self,
    ctx: &RequestContext,
    task_id: Uuid,
    level: Difficulty,
  ) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::MutateTaskLevel, move |uow| {
        if uow.tasks().find_by_key(task_id, &TaskRelations::default())?.is_none() {
          return abort(Indicator::NotFound);
        }
        let patch = TaskPatch { level: Some(level), ..TaskPatch::default() };
        patch_task(uow, task_id, patch, TaskRelations::default())
      })
      .await
  }

  /// Attach executor `uid` to a task that has no assignee yet. If one is
  /// already attached the task is returned unchanged under `EXISTED`.
  pub async fn assign_task(
    &self,
    ctx: &RequestContext,
    task_id: Uuid,
    uid: Uuid,
  ) -> Envelope<Task> {
    let include = TaskRelations { assignee: true, ..TaskRelations::default() };
    self
      .guarded(ctx, Operation::AssignTask, move |uow| {
        if uow.executors().find_by_key(uid, &())?.is_none() {
          return abort(Indicator::NotFound);
        }
        let Some(task) = uow.tasks().find_by_key(task_id, &include)? else {
          return abort(Indicator::NotFound);
        };
        if task.assignee_id.is_some() {
          return abort_with(Indicator::Existed, vec![task]);
        }
        let patch = TaskPatch { assignee_id: Some(uid), ..TaskPatch::default() };
        patch_task(uow, task_id, patch, include)
      })
      .await
  }

  /// Mark a task unavailable. There is no operation that reverses this.
  pub async fn freeze_task(&self, ctx: &RequestContext, task_id: Uuid) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::FreezeTask, move |uow| {
        if uow.tasks().find_by_key(task_id, &TaskRelations::default())?.is_none() {
          return abort(Indicator::NotFound);
        }
        let patch = TaskPatch { available: Some(false), ..TaskPatch::default() };
        patch_task(uow, task_id, patch, TaskRelations::default())
      })
      .await
  }

  pub async fn delete_task(&self, ctx: &RequestContext, task_id: Uuid) -> Envelope<Task> {
    self
      .guarded(ctx, Operation::DeleteTask, move |uow| {
        if uow.tasks().find_by_key(task_id, &TaskRelations::default())?.is_none() {
          return abort(Indicator::NotFound);
        }
        if !uow.tasks().delete(task_id)? {
          return abort(Indicator::NotFound);
        }
        commit(Vec::new())
      })
      .await
  }
}
