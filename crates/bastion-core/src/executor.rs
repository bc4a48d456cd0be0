//! Executors: the parties tasks can be assigned to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executor {
  pub uid:        Uuid,
  pub name:       String,
  pub job:        Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExecutor {
  pub name: String,
  pub job:  Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutorFilter {
  pub name: Option<String>,
}
