//! Credentials, bearer tokens, and caller identity resolution for Bastion.
//!
//! Nothing here touches storage. Tokens are stateless: validity is recomputed
//! from the signature and expiry on every use.

pub mod anonymous;
pub mod credential;
pub mod error;
pub mod identity;
pub mod token;

pub use anonymous::{AnonymousIdentities, RolePartition};
pub use credential::Credentials;
pub use error::{Error, Result};
pub use identity::IdentityResolver;
pub use token::{Rejection, TokenService, ValidToken, Verdict};
