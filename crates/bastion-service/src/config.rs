//! Runtime configuration.
//!
//! Read from an optional TOML file, then overridden by `BASTION_*`
//! environment variables. Nested keys use a double underscore, so
//! `BASTION_TOKEN__SECRET` sets `token.secret`.

use std::path::{Path, PathBuf};

use bastion_auth::{RolePartition, TokenService};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub token:      TokenConfig,
  #[serde(default)]
  pub anonymous:  AnonymousConfig,
}

#[derive(Clone, Deserialize)]
pub struct TokenConfig {
  /// HS256 signing secret. Start-up fails when it is empty.
  #[serde(default)]
  pub secret:   String,
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u32,
}

/// Role partition for callers that present no token. Draws in
/// `0..=un_login_max` get `UN_LOGIN`, up to `common_max` get `COMMON`, the
/// rest up to 100 get `ADMIN`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymousConfig {
  #[serde(default = "default_un_login_max")]
  pub un_login_max: u8,
  #[serde(default = "default_common_max")]
  pub common_max:   u8,
}

fn default_store_path() -> PathBuf { PathBuf::from("bastion.db") }

fn default_ttl_secs() -> u32 { 86_400 }

fn default_un_login_max() -> u8 { 30 }

fn default_common_max() -> u8 { 60 }

impl Default for TokenConfig {
  fn default() -> Self {
    Self { secret: String::new(), ttl_secs: default_ttl_secs() }
  }
}

impl std::fmt::Debug for TokenConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenConfig")
      .field("secret", &"<redacted>")
      .field("ttl_secs", &self.ttl_secs)
      .finish()
  }
}

impl Default for AnonymousConfig {
  fn default() -> Self {
    Self {
      un_login_max: default_un_login_max(),
      common_max:   default_common_max(),
    }
  }
}

impl ServiceConfig {
  /// Layer the file at `path` (if it exists) under the process environment.
  pub fn load(path: &Path) -> Result<Self> { Self::load_with_env(path, None) }

  /// As [`load`](Self::load), reading variables from `env` instead of the
  /// process environment when given.
  fn load_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
  ) -> Result<Self> {
    let environment = config::Environment::with_prefix("BASTION")
      .prefix_separator("_")
      .separator("__")
      .source(env);
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(environment)
      .build()?;
    Ok(settings.try_deserialize()?)
  }
}

impl TokenConfig {
  pub fn token_service(&self) -> Result<TokenService> {
    let ttl = chrono::Duration::seconds(i64::from(self.ttl_secs));
    Ok(TokenService::new(&self.secret, ttl)?)
  }
}

impl AnonymousConfig {
  pub fn partition(&self) -> Result<RolePartition> {
    Ok(RolePartition::new(self.un_login_max, self.common_max)?)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use bastion_core::Role;

  use super::*;

  fn write_config(contents: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("bastion-config-{}.toml", uuid::Uuid::new_v4()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
  }

  #[test]
  fn missing_file_uses_defaults() {
    let cfg = ServiceConfig::load_with_env(
      Path::new("/nonexistent/bastion.toml"),
      Some(config::Map::new()),
    )
    .unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("bastion.db"));
    assert_eq!(cfg.token.ttl_secs, 86_400);
    assert_eq!(cfg.anonymous.un_login_max, 30);
    assert_eq!(cfg.anonymous.common_max, 60);
  }

  #[test]
  fn empty_secret_is_rejected_at_startup() {
    let cfg = TokenConfig::default();
    assert!(matches!(
      cfg.token_service(),
      Err(crate::Error::Auth(bastion_auth::Error::MissingSecret))
    ));
  }

  #[test]
  fn file_values_are_read() {
    let path = write_config(
      r#"
store_path = "/tmp/bastion-test.db"

[token]
secret = "s3cret"
ttl_secs = 60

[anonymous]
un_login_max = 100
common_max = 100
"#,
    );
    let cfg = ServiceConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.store_path, PathBuf::from("/tmp/bastion-test.db"));
    let tokens = cfg.token.token_service().unwrap();
    assert_eq!(tokens.ttl(), chrono::Duration::seconds(60));

    let partition = cfg.anonymous.partition().unwrap();
    assert_eq!(partition.role_for(100), Role::UnLogin);
  }

  #[test]
  fn environment_overrides_file() {
    let path = write_config(
      r#"
[token]
secret = "from-file"

[anonymous]
common_max = 70
"#,
    );
    let env = config::Map::from([
      ("BASTION_TOKEN__SECRET".to_owned(), "from-env".to_owned()),
      ("BASTION_TOKEN__TTL_SECS".to_owned(), "120".to_owned()),
      ("BASTION_ANONYMOUS__COMMON_MAX".to_owned(), "50".to_owned()),
      ("BASTION_STORE_PATH".to_owned(), "/tmp/bastion-env.db".to_owned()),
    ]);
    let cfg = ServiceConfig::load_with_env(&path, Some(env)).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.token.secret, "from-env");
    assert_eq!(cfg.token.ttl_secs, 120);
    assert_eq!(cfg.anonymous.common_max, 50);
    assert_eq!(cfg.anonymous.un_login_max, 30);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/bastion-env.db"));
  }

  #[test]
  fn unprefixed_variables_are_ignored() {
    let env = config::Map::from([
      ("TOKEN__SECRET".to_owned(), "stray".to_owned()),
      ("BASTIONTOKEN__SECRET".to_owned(), "stray".to_owned()),
    ]);
    let cfg =
      ServiceConfig::load_with_env(Path::new("/nonexistent/bastion.toml"), Some(env))
        .unwrap();
    assert_eq!(cfg.token.secret, "");
  }

  #[test]
  fn secret_is_redacted_from_debug() {
    let cfg = TokenConfig { secret: "s3cret".into(), ttl_secs: 1 };
    assert!(!format!("{cfg:?}").contains("s3cret"));
  }
}
