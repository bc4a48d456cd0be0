//! Substances: the things tasks are about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substance {
  pub substance_id: Uuid,
  pub name:         String,
  pub description:  Option<String>,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubstance {
  pub name:        String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubstanceFilter {
  pub name: Option<String>,
}
