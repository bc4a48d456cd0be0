//! Task records, relation hints, and paging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, executor::Executor, substance::Substance};

/// How demanding a task is.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
  Easy,
  #[default]
  Normal,
  Hard,
  Expert,
}

impl Difficulty {
  pub fn parse(name: &str) -> Result<Self> {
    name
      .parse()
      .map_err(|_| Error::UnknownDifficulty(name.to_owned()))
  }
}

/// A unit of work attached to a substance and optionally assigned to one
/// executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub task_id:      Uuid,
  pub title:        String,
  pub content:      String,
  pub reward:       i64,
  pub rate:         i64,
  pub level:        Difficulty,
  pub accomplished: bool,
  /// Cleared by freezing; never set back.
  pub available:    bool,
  pub substance_id: Option<Uuid>,
  pub assignee_id:  Option<Uuid>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  /// Populated only when [`TaskRelations::substance`] is requested.
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub substance:    Option<Substance>,
  /// Populated only when [`TaskRelations::assignee`] is requested.
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub assignee:     Option<Executor>,
}

/// Input to `Table<Task>::insert`.
#[derive(Debug, Clone)]
pub struct NewTask {
  pub title:        String,
  pub content:      String,
  pub reward:       i64,
  pub rate:         i64,
  /// `None` takes the stored default.
  pub level:        Option<Difficulty>,
  pub substance_id: Uuid,
}

/// Fields to change; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
  pub title:        Option<String>,
  pub content:      Option<String>,
  pub reward:       Option<i64>,
  pub rate:         Option<i64>,
  pub level:        Option<Difficulty>,
  pub accomplished: Option<bool>,
  pub available:    Option<bool>,
  pub assignee_id:  Option<Uuid>,
}

/// Relation-inclusion hints derived from boolean request flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRelations {
  #[serde(default)]
  pub substance: bool,
  #[serde(default)]
  pub assignee:  bool,
}

impl TaskRelations {
  pub fn all() -> Self { Self { substance: true, assignee: true } }
}

/// Offset paging. `cursor` rows are skipped, at most `limit` are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub cursor: usize,
  pub limit:  usize,
}

impl Default for Page {
  fn default() -> Self { Self { cursor: 0, limit: 20 } }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
  pub title:       Option<String>,
  pub assignee_id: Option<Uuid>,
  pub page:        Option<Page>,
}

impl TaskFilter {
  pub fn by_title(title: impl Into<String>) -> Self {
    Self { title: Some(title.into()), ..Self::default() }
  }

  pub fn by_assignee(uid: Uuid) -> Self {
    Self { assignee_id: Some(uid), ..Self::default() }
  }
}
