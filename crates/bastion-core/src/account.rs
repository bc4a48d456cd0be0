//! Account records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::AccountKind;

/// A registered account. The password hash is never serialised and is
/// redacted from `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
  pub account_id:    Uuid,
  pub account_name:  String,
  /// PHC string produced by argon2.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub account_kind:  AccountKind,
  /// Server-assigned; never changes after creation.
  pub registered_at: DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl fmt::Debug for Account {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Account")
      .field("account_id", &self.account_id)
      .field("account_name", &self.account_name)
      .field("password_hash", &"<redacted>")
      .field("account_kind", &self.account_kind)
      .field("registered_at", &self.registered_at)
      .field("updated_at", &self.updated_at)
      .finish()
  }
}

/// Input to `Table<Account>::insert`. The store assigns the id and
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub account_name:  String,
  pub password_hash: String,
  pub account_kind:  AccountKind,
}

/// Fields to change; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
  pub password_hash: Option<String>,
  pub account_kind:  Option<AccountKind>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
  pub account_name: Option<String>,
  pub account_kind: Option<AccountKind>,
}

impl AccountFilter {
  pub fn by_name(name: impl Into<String>) -> Self {
    Self { account_name: Some(name.into()), ..Self::default() }
  }
}
