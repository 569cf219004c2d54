//! Portal accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::{Role, Subject};

/// A stored account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:            Uuid,
  pub name:          String,
  /// Stored lower-cased; unique.
  pub email:         String,
  #[serde(skip)]
  pub password_hash: String,
  pub role:          Role,
  pub manager_id:    Option<Uuid>,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn subject(&self) -> Subject { Subject::new(self.id, self.role) }
}

/// Input for [`UserStore::create_user`](crate::store::UserStore::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  /// argon2 PHC string.
  pub password_hash: String,
  pub role:          Role,
  pub manager_id:    Option<Uuid>,
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
