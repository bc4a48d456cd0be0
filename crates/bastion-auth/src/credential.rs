//! Password hashing and comparison.

use argon2::{
  Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
  Version, password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hashes secrets into argon2 PHC strings and compares candidates against
/// stored hashes. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Credentials {
  argon2: Argon2<'static>,
}

impl Credentials {
  /// Argon2id with explicit cost parameters (memory in KiB, iterations,
  /// lanes). Lower costs keep test suites fast.
  pub fn with_params(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self> {
    let params = Params::new(memory_kib, iterations, lanes, None)
      .map_err(|e| Error::Hash(e.to_string()))?;
    Ok(Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
  }

  /// Hash `password` with a fresh random salt.
  pub fn hash(&self, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    self
      .argon2
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| Error::Hash(e.to_string()))
  }

  /// `true` iff `password` matches `stored`. A malformed stored hash never
  /// matches.
  pub fn verify(&self, password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
      tracing::warn!("stored password hash is not a valid PHC string");
      return false;
    };
    self
      .argon2
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  }
}
