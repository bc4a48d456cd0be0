//! The uniform result envelope returned by every operation.
//!
//! Success, structured failure, and unexpected failure all collapse into one
//! shape. Callers tell outcomes apart by [`Indicator`] alone.

use std::fmt;

use serde::Serialize;
use strum::Display;

/// Machine-readable outcome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Indicator {
  Success,
  NotFound,
  Existed,
  IncorrectPwd,
  InvalidLoginType,
  TokenExpired,
  /// The token was tampered with or could not be parsed.
  InvalidToken,
  /// The role gate or an ownership check denied the caller.
  Unauthorized,
  InternalError,
}

/// Auxiliary payload attached next to `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Extra {
  /// A freshly minted bearer token.
  Token(String),
  /// Token expiry in seconds since the Unix epoch (`-1` when unknown).
  ExpiresAt(i64),
  /// Diagnostic text for `INTERNAL_ERROR`.
  Message(String),
}

/// `success == true` iff `indicator == SUCCESS`. Fields are private so the
/// invariant can only be established through the constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
  success:   bool,
  indicator: Indicator,
  data:      Vec<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  extra:     Option<Extra>,
}

impl<T> Envelope<T> {
  pub fn success(data: Vec<T>) -> Self {
    Self { success: true, indicator: Indicator::Success, data, extra: None }
  }

  /// A failure with empty data.
  pub fn failure(indicator: Indicator) -> Self {
    Self::failure_with(indicator, Vec::new())
  }

  /// A failure that carries context for the client, such as the record that
  /// caused a conflict.
  pub fn failure_with(indicator: Indicator, data: Vec<T>) -> Self {
    debug_assert_ne!(indicator, Indicator::Success);
    let indicator = match indicator {
      Indicator::Success => Indicator::InternalError,
      other => other,
    };
    Self { success: false, indicator, data, extra: None }
  }

  /// `INTERNAL_ERROR` with the cause rendered as diagnostic text.
  pub fn internal(cause: impl fmt::Display) -> Self {
    Self::failure(Indicator::InternalError)
      .with_extra(Extra::Message(cause.to_string()))
  }

  pub fn with_extra(mut self, extra: Extra) -> Self {
    self.extra = Some(extra);
    self
  }

  pub fn is_success(&self) -> bool { self.success }

  pub fn indicator(&self) -> Indicator { self.indicator }

  pub fn data(&self) -> &[T] { &self.data }

  pub fn extra(&self) -> Option<&Extra> { self.extra.as_ref() }

  pub fn into_data(self) -> Vec<T> { self.data }

  /// The minted token, if one is attached.
  pub fn token(&self) -> Option<&str> {
    match &self.extra {
      Some(Extra::Token(token)) => Some(token),
      _ => None,
    }
  }
}
