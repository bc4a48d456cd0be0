//! Signed, time-bound bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the account name, account kind, issue time
//! and expiry (seconds since the Unix epoch). A token is valid iff its
//! signature verifies and `now < exp`. The signature is checked first, so an
//! expired token that was not tampered with is always reported as
//! [`Rejection::Expired`].

use std::collections::HashSet;

use bastion_core::AccountKind;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
  errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub:  String,
  kind: AccountKind,
  iat:  i64,
  exp:  i64,
}

/// A token that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidToken {
  pub subject_id:   String,
  pub account_kind: AccountKind,
  pub issued_at:    i64,
  pub expires_at:   i64,
}

/// Why a token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  Expired,
  Malformed,
  BadSignature,
}

/// Outcome of [`TokenService::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  Valid(ValidToken),
  Invalid(Rejection),
}

/// Issues and validates tokens with a process-wide secret.
pub struct TokenService {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl TokenService {
  /// An empty secret is a start-up error, never a per-call one.
  pub fn new(secret: &str, ttl: Duration) -> Result<Self> {
    if secret.trim().is_empty() {
      return Err(Error::MissingSecret);
    }

    // Expiry is checked by hand so that `exp == now` counts as expired and
    // expiry is reported separately from signature failures.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation.required_spec_claims =
      HashSet::from(["exp".to_owned(), "sub".to_owned()]);

    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      ttl,
    })
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  pub fn issue(&self, subject_id: &str, kind: AccountKind) -> Result<String> {
    self.issue_at(subject_id, kind, Utc::now())
  }

  pub fn issue_at(
    &self,
    subject_id: &str,
    kind: AccountKind,
    now: DateTime<Utc>,
  ) -> Result<String> {
    let claims = Claims {
      sub: subject_id.to_owned(),
      kind,
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
    };
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
  }

  pub fn validate(&self, token: &str) -> Verdict {
    self.validate_at(token, Utc::now())
  }

  /// Never fails; every problem becomes a [`Rejection`].
  pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Verdict {
    let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
      Ok(data) => data.claims,
      Err(e) => {
        let rejection = match e.kind() {
          ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            Rejection::BadSignature
          }
          _ => Rejection::Malformed,
        };
        tracing::debug!(error = %e, ?rejection, "token rejected");
        return Verdict::Invalid(rejection);
      }
    };

    if now.timestamp() >= claims.exp {
      return Verdict::Invalid(Rejection::Expired);
    }

    Verdict::Valid(ValidToken {
      subject_id:   claims.sub,
      account_kind: claims.kind,
      issued_at:    claims.iat,
      expires_at:   claims.exp,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn service() -> TokenService {
    TokenService::new("test-secret", Duration::hours(1)).unwrap()
  }

  fn t0() -> DateTime<Utc> { Utc.timestamp_opt(1_700_000_000, 0).unwrap() }

  #[test]
  fn issued_tokens_validate_before_expiry() {
    let s = service();
    for kind in [AccountKind::Visitor, AccountKind::Admin] {
      let token = s.issue_at("alice", kind, t0()).unwrap();
      for offset in [0, 1, 1800, 3599] {
        let now = t0() + Duration::seconds(offset);
        assert_eq!(
          s.validate_at(&token, now),
          Verdict::Valid(ValidToken {
            subject_id:   "alice".into(),
            account_kind: kind,
            issued_at:    t0().timestamp(),
            expires_at:   t0().timestamp() + 3600,
          })
        );
      }
    }
  }

  #[test]
  fn expiry_is_strict() {
    let s = service();
    let token = s.issue_at("alice", AccountKind::Visitor, t0()).unwrap();
    for offset in [3600, 3601, 86_400] {
      let now = t0() + Duration::seconds(offset);
      assert_eq!(s.validate_at(&token, now), Verdict::Invalid(Rejection::Expired));
    }
  }

  #[test]
  fn foreign_secret_is_a_bad_signature() {
    let other = TokenService::new("other-secret", Duration::hours(1)).unwrap();
    let token = other.issue_at("alice", AccountKind::Admin, t0()).unwrap();
    assert_eq!(
      service().validate_at(&token, t0()),
      Verdict::Invalid(Rejection::BadSignature)
    );
  }

  #[test]
  fn tampered_signature_is_detected_even_after_expiry() {
    let s = service();
    let token = s.issue_at("alice", AccountKind::Visitor, t0()).unwrap();
    let (head, sig) = token.rsplit_once('.').unwrap();
    let first = if sig.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{head}.{first}{}", &sig[1..]);

    assert_eq!(
      s.validate_at(&tampered, t0()),
      Verdict::Invalid(Rejection::BadSignature)
    );
    assert_eq!(
      s.validate_at(&tampered, t0() + Duration::days(2)),
      Verdict::Invalid(Rejection::BadSignature)
    );
  }

  #[test]
  fn garbage_is_malformed() {
    let s = service();
    for token in ["", "not-a-token", "a.b.c"] {
      assert_eq!(s.validate_at(token, t0()), Verdict::Invalid(Rejection::Malformed));
    }
  }

  #[test]
  fn empty_secret_is_fatal() {
    assert!(matches!(
      TokenService::new("  ", Duration::hours(1)),
      Err(Error::MissingSecret)
    ));
  }
}
