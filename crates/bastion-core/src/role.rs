//! Roles, account kinds, and the per-request caller identity.
//!
//! Two separate vocabularies live here. [`Role`] is a total order used for
//! hierarchical `>=` checks. [`AccountKind`] is a discrete set stored on an
//! account and compared only by equality (e.g. the login type must match the
//! stored kind exactly).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

// ─── Role ────────────────────────────────────────────────────────────────────

/// Account-level authority. Variants are declared in ascending order and the
/// derived `Ord` is the role-order table: `UN_LOGIN < COMMON < ADMIN`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  UnLogin,
  Common,
  Admin,
}

impl Role {
  /// Parse a role name such as `"COMMON"`.
  pub fn parse(name: &str) -> Result<Self> {
    name.parse().map_err(|_| Error::UnknownRole(name.to_owned()))
  }
}

// ─── AccountKind ─────────────────────────────────────────────────────────────

/// The kind recorded on an account at registration.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
  #[default]
  Visitor,
  Admin,
}

impl AccountKind {
  pub fn parse(name: &str) -> Result<Self> {
    name
      .parse()
      .map_err(|_| Error::UnknownAccountKind(name.to_owned()))
  }

  /// The hierarchical role an authenticated holder of this kind receives.
  pub fn role(self) -> Role {
    match self {
      Self::Visitor => Role::Common,
      Self::Admin => Role::Admin,
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The caller of one request. Resolved once, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub subject_id:   String,
  /// `None` for anonymous callers that presented no token.
  pub account_kind: Option<AccountKind>,
  pub role:         Role,
}

impl Identity {
  /// Identity for a caller holding a valid token for an account.
  pub fn authenticated(subject_id: impl Into<String>, kind: AccountKind) -> Self {
    Self {
      subject_id:   subject_id.into(),
      account_kind: Some(kind),
      role:         kind.role(),
    }
  }

  /// Identity for a caller without an account.
  pub fn anonymous(subject_id: impl Into<String>, role: Role) -> Self {
    Self { subject_id: subject_id.into(), account_kind: None, role }
  }

  pub fn is_authenticated(&self) -> bool { self.account_kind.is_some() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_order_is_ascending() {
    assert!(Role::UnLogin < Role::Common);
    assert!(Role::Common < Role::Admin);
  }

  #[test]
  fn names_round_trip_through_display() {
    for role in [Role::UnLogin, Role::Common, Role::Admin] {
      assert_eq!(Role::parse(&role.to_string()).unwrap(), role);
    }
    assert_eq!(Role::UnLogin.to_string(), "UN_LOGIN");
    assert_eq!(AccountKind::parse("VISITOR").unwrap(), AccountKind::Visitor);
  }

  #[test]
  fn unknown_names_are_rejected() {
    assert!(matches!(Role::parse("ROOT"), Err(Error::UnknownRole(_))));
    assert!(matches!(
      AccountKind::parse("admin"),
      Err(Error::UnknownAccountKind(_))
    ));
  }

  #[test]
  fn account_kinds_map_to_roles() {
    let visitor = Identity::authenticated("alice", AccountKind::Visitor);
    assert_eq!(visitor.role, Role::Common);
    assert!(visitor.is_authenticated());

    let anon = Identity::anonymous("anonymous-7", Role::UnLogin);
    assert!(!anon.is_authenticated());
  }
}
