//! The role gate: admits or rejects an operation before it touches state.
//!
//! Fail-closed: a missing identity, an unparseable role, or an unrecognised
//! required role all yield [`Decision::Denied`]. Hierarchy checks (`>=`) and
//! account-kind checks (`==`) are separate predicates.

use crate::role::{AccountKind, Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allowed,
  Denied,
}

impl Decision {
  pub fn is_allowed(self) -> bool { matches!(self, Self::Allowed) }
}

/// `Allowed` iff an identity is present and its role is at least `required`.
pub fn authorize(identity: Option<&Identity>, required: Role) -> Decision {
  match identity {
    Some(identity) if identity.role >= required => Decision::Allowed,
    _ => Decision::Denied,
  }
}

/// Like [`authorize`], with the required role given by name.
pub fn authorize_named(identity: Option<&Identity>, required: &str) -> Decision {
  match Role::parse(required) {
    Ok(required) => authorize(identity, required),
    Err(_) => Decision::Denied,
  }
}

/// Both sides given by name, e.g. a role claim against operation metadata.
pub fn authorize_raw(role: &str, required: &str) -> Decision {
  match (Role::parse(role), Role::parse(required)) {
    (Ok(role), Ok(required)) if role >= required => Decision::Allowed,
    _ => Decision::Denied,
  }
}

/// Account-kind match for login: the requested kind must equal the stored one.
pub fn kind_matches(stored: AccountKind, requested: AccountKind) -> bool {
  stored == requested
}

#[cfg(test)]
mod tests {
  use super::*;

  const ROLES: [Role; 3] = [Role::UnLogin, Role::Common, Role::Admin];

  #[test]
  fn hierarchy_matrix() {
    for held in ROLES {
      let identity = Identity::anonymous("caller", held);
      for required in ROLES {
        let expected = if held >= required {
          Decision::Allowed
        } else {
          Decision::Denied
        };
        assert_eq!(
          authorize(Some(&identity), required),
          expected,
          "{held} against {required}"
        );
      }
    }
  }

  #[test]
  fn missing_identity_is_denied() {
    assert_eq!(authorize(None, Role::UnLogin), Decision::Denied);
  }

  #[test]
  fn unknown_required_role_is_denied() {
    let admin = Identity::anonymous("root", Role::Admin);
    assert_eq!(authorize_named(Some(&admin), "SUPERUSER"), Decision::Denied);
    assert_eq!(authorize_named(Some(&admin), "COMMON"), Decision::Allowed);
  }

  #[test]
  fn unparseable_held_role_is_denied() {
    assert_eq!(authorize_raw("admin?", "UN_LOGIN"), Decision::Denied);
    assert_eq!(authorize_raw("ADMIN", "COMMON"), Decision::Allowed);
    assert_eq!(authorize_raw("COMMON", "ADMIN"), Decision::Denied);
  }

  #[test]
  fn kind_check_is_equality_not_order() {
    assert!(kind_matches(AccountKind::Visitor, AccountKind::Visitor));
    assert!(!kind_matches(AccountKind::Visitor, AccountKind::Admin));
    assert!(!kind_matches(AccountKind::Admin, AccountKind::Visitor));
  }
}
