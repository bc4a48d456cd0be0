//! Per-request caller identity resolution.

use std::sync::Arc;

use bastion_core::Identity;

use crate::{
  anonymous::AnonymousIdentities,
  token::{TokenService, Verdict},
};

/// Resolves the caller of a request exactly once, from a bearer token if one
/// is presented and from the anonymous generator otherwise.
#[derive(Clone)]
pub struct IdentityResolver {
  tokens:    Arc<TokenService>,
  anonymous: AnonymousIdentities,
}

impl IdentityResolver {
  pub fn new(tokens: Arc<TokenService>, anonymous: AnonymousIdentities) -> Self {
    Self { tokens, anonymous }
  }

  /// `bearer` may carry a `Bearer ` prefix. A presented token that fails
  /// validation yields the lowest-privilege anonymous identity rather than a
  /// randomly drawn one.
  pub fn resolve(&self, bearer: Option<&str>) -> Identity {
    let Some(raw) = bearer.map(str::trim).filter(|t| !t.is_empty()) else {
      return self.anonymous.generate();
    };
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);

    match self.tokens.validate(token) {
      Verdict::Valid(valid) => {
        Identity::authenticated(valid.subject_id, valid.account_kind)
      }
      Verdict::Invalid(rejection) => {
        tracing::info!(?rejection, "bearer token rejected; continuing as anonymous");
        self.anonymous.rejected()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use bastion_core::{AccountKind, Role};
  use chrono::Duration;

  use super::*;

  fn resolver() -> (IdentityResolver, Arc<TokenService>) {
    let tokens = Arc::new(TokenService::new("secret", Duration::hours(1)).unwrap());
    (IdentityResolver::new(tokens.clone(), AnonymousIdentities::default()), tokens)
  }

  #[test]
  fn valid_token_resolves_to_account() {
    let (r, tokens) = resolver();
    let token = tokens.issue("alice", AccountKind::Admin).unwrap();
    let identity = r.resolve(Some(&format!("Bearer {token}")));
    assert_eq!(identity, Identity::authenticated("alice", AccountKind::Admin));
    assert_eq!(identity.role, Role::Admin);
  }

  #[test]
  fn rejected_token_is_lowest_privilege() {
    let (r, _) = resolver();
    let identity = r.resolve(Some("forged"));
    assert_eq!(identity.role, Role::UnLogin);
    assert!(!identity.is_authenticated());
  }

  #[test]
  fn missing_token_is_anonymous() {
    let (r, _) = resolver();
    assert!(!r.resolve(None).is_authenticated());
    assert!(!r.resolve(Some("   ")).is_authenticated());
  }
}
