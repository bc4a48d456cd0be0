//! Identities for callers that present no token.
//!
//! Each anonymous caller receives a pseudo-random subject id and a role drawn
//! from a configured partition of `0..=100`. This is a test affordance for
//! exercising the role gate, not a security mechanism.

use bastion_core::{Identity, Role};
use rand_core::{OsRng, RngCore};

use crate::{Error, Result};

/// Splits draws from `0..=100` into role bands:
/// `0..=un_login_max` → `UN_LOGIN`, `..=common_max` → `COMMON`, the rest →
/// `ADMIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePartition {
  un_login_max: u8,
  common_max:   u8,
}

impl RolePartition {
  pub const SPAN: u32 = 101;

  pub fn new(un_login_max: u8, common_max: u8) -> Result<Self> {
    if un_login_max > common_max || common_max > 100 {
      return Err(Error::Partition(format!(
        "expected un_login_max <= common_max <= 100, got {un_login_max} and {common_max}"
      )));
    }
    Ok(Self { un_login_max, common_max })
  }

  pub fn role_for(&self, draw: u8) -> Role {
    if draw <= self.un_login_max {
      Role::UnLogin
    } else if draw <= self.common_max {
      Role::Common
    } else {
      Role::Admin
    }
  }
}

impl Default for RolePartition {
  fn default() -> Self { Self { un_login_max: 30, common_max: 60 } }
}

/// Generates anonymous identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentities {
  partition: RolePartition,
}

impl AnonymousIdentities {
  pub fn new(partition: RolePartition) -> Self { Self { partition } }

  pub fn generate(&self) -> Identity { self.generate_with(&mut OsRng) }

  pub fn generate_with(&self, rng: &mut impl RngCore) -> Identity {
    let seed = rng.next_u32();
    let draw = (seed % RolePartition::SPAN) as u8;
    Identity::anonymous(format!("anonymous-{seed:08x}"), self.partition.role_for(draw))
  }

  /// The identity given to callers whose token was rejected: no account,
  /// lowest role.
  pub fn rejected(&self) -> Identity { Identity::anonymous("anonymous", Role::UnLogin) }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Yields a fixed sequence of `u32`s.
  struct Sequence(Vec<u32>);

  impl RngCore for Sequence {
    fn next_u32(&mut self) -> u32 { self.0.remove(0) }

    fn next_u64(&mut self) -> u64 { u64::from(self.next_u32()) }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
      for byte in dest {
        *byte = self.next_u32() as u8;
      }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
      self.fill_bytes(dest);
      Ok(())
    }
  }

  #[test]
  fn default_bands() {
    let p = RolePartition::default();
    assert_eq!(p.role_for(0), Role::UnLogin);
    assert_eq!(p.role_for(30), Role::UnLogin);
    assert_eq!(p.role_for(31), Role::Common);
    assert_eq!(p.role_for(60), Role::Common);
    assert_eq!(p.role_for(61), Role::Admin);
    assert_eq!(p.role_for(100), Role::Admin);
  }

  #[test]
  fn draws_wrap_into_span() {
    let anon = AnonymousIdentities::default();
    // 101 % 101 == 0, 162 % 101 == 61
    let mut rng = Sequence(vec![101, 162]);
    let first = anon.generate_with(&mut rng);
    let second = anon.generate_with(&mut rng);
    assert_eq!(first.role, Role::UnLogin);
    assert_eq!(second.role, Role::Admin);
    assert!(first.account_kind.is_none());
    assert_ne!(first.subject_id, second.subject_id);
  }

  #[test]
  fn everyone_can_be_locked_out_of_admin() {
    let anon = AnonymousIdentities::new(RolePartition::new(50, 100).unwrap());
    let mut rng = Sequence(vec![100, 50, 51]);
    assert_eq!(anon.generate_with(&mut rng).role, Role::Common);
    assert_eq!(anon.generate_with(&mut rng).role, Role::UnLogin);
    assert_eq!(anon.generate_with(&mut rng).role, Role::Common);
  }

  #[test]
  fn inverted_bands_are_rejected() {
    assert!(RolePartition::new(61, 60).is_err());
    assert!(RolePartition::new(10, 101).is_err());
  }

  #[test]
  fn generated_identities_are_anonymous() {
    let identity = AnonymousIdentities::default().generate();
    assert!(!identity.is_authenticated());
    assert!(identity.subject_id.starts_with("anonymous-"));
  }
}
