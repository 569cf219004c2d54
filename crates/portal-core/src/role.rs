//! Roles and the authenticated subject.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// The role claim carried by a verified identity.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Employee,
  Manager,
  Admin,
}

impl Role {
  /// Managers and admins review requests.
  pub fn is_reviewer(self) -> bool { matches!(self, Self::Manager | Self::Admin) }
}

/// The authenticated identity making a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:   Uuid,
  pub role: Role,
}

impl Subject {
  pub fn new(id: Uuid, role: Role) -> Self { Self { id, role } }
}
