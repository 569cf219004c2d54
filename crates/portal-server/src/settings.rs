//! Runtime configuration, deserialised from `config.toml` layered with
//! `PORTAL_*` environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use portal_core::overlap::OverlapPolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// HS256 signing secret. Required.
  pub jwt_secret:           String,
  #[serde(default = "default_token_ttl")]
  pub token_ttl_secs:       u64,
  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs: u64,
  /// Request types whose intervals may not overlap.
  #[serde(default = "default_exclusive_types")]
  pub exclusive_types:      Vec<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("portal.db") }
fn default_token_ttl() -> u64 { 86_400 }
fn default_request_timeout() -> u64 { 30 }
fn default_exclusive_types() -> Vec<String> {
  vec![OverlapPolicy::DEFAULT_TYPE.to_string()]
}

impl ServerConfig {
  /// Load from an optional TOML file, then the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("PORTAL")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("exclusive_types"),
      )
      .build()
      .context("failed to read config file")?;
    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    if cfg.jwt_secret.trim().is_empty() {
      anyhow::bail!("jwt_secret must not be empty");
    }
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn token_ttl(&self) -> Duration { Duration::from_secs(self.token_ttl_secs) }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn overlap_policy(&self) -> OverlapPolicy {
    OverlapPolicy::new(self.exclusive_types.iter().cloned())
  }
}
