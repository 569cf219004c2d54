//! Request types: the central entity of the portal.
//!
//! A request is created `pending` by an employee and decided exactly once by a
//! reviewer. The creator never chooses the status; the decision fields are
//! written together with the terminal status.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, overlap::Interval, timestamp};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a request is in its lifecycle.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl RequestStatus {
  /// Whether a request in this status holds its interval against others of
  /// the same exclusive type. Rejected requests never block.
  pub fn holds_interval(self) -> bool {
    matches!(self, Self::Pending | Self::Approved)
  }
}

/// The outcome a reviewer may choose. `pending` is not a verdict.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Verdict {
  Approved,
  Rejected,
}

impl Verdict {
  /// Parse a wire value, mapping anything other than `approved`/`rejected`
  /// to [`Error::InvalidInput`].
  pub fn parse(value: &str) -> Result<Self> {
    Self::from_str(value).map_err(|_| {
      Error::InvalidInput(format!(
        "status must be \"approved\" or \"rejected\", got {value:?}"
      ))
    })
  }
}

impl From<Verdict> for RequestStatus {
  fn from(v: Verdict) -> Self {
    match v {
      Verdict::Approved => Self::Approved,
      Verdict::Rejected => Self::Rejected,
    }
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A persisted request row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
  pub id:            Uuid,
  /// Resource category, e.g. `"equipment"` or `"leave"`.
  #[serde(rename = "type")]
  pub kind:          String,
  pub title:         String,
  pub description:   Option<String>,
  pub status:        RequestStatus,
  pub created_by:    Uuid,
  /// Reserved for routing; never written by the lifecycle.
  pub assigned_to:   Option<Uuid>,
  pub decision_by:   Option<Uuid>,
  pub decision_note: Option<String>,
  pub start_at:      Option<DateTime<Utc>>,
  pub end_at:        Option<DateTime<Utc>>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Caller-supplied fields for a new request, as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInput {
  #[serde(rename = "type", default)]
  pub kind:        String,
  #[serde(default)]
  pub title:       String,
  pub description: Option<String>,
  #[serde(default, deserialize_with = "timestamp::optional")]
  pub start_at:    Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "timestamp::optional")]
  pub end_at:      Option<DateTime<Utc>>,
}

impl RequestInput {
  pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
    Self {
      kind: kind.into(),
      title: title.into(),
      ..Self::default()
    }
  }

  pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    self.start_at = Some(start);
    self.end_at = Some(end);
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Validate the input and bind it to its creator.
  ///
  /// `type` and `title` must be non-blank. The interval endpoints must be
  /// given together and in order.
  pub fn validate(self, created_by: Uuid) -> Result<NewRequest> {
    let kind = self.kind.trim();
    if kind.is_empty() {
      return Err(Error::InvalidInput("type must not be empty".into()));
    }
    let title = self.title.trim();
    if title.is_empty() {
      return Err(Error::InvalidInput("title must not be empty".into()));
    }

    let window = match (self.start_at, self.end_at) {
      (Some(start), Some(end)) => Some(Interval::new(start, end)?),
      (None, None) => None,
      _ => {
        return Err(Error::InvalidInput(
          "startAt and endAt must be given together".into(),
        ));
      }
    };

    Ok(NewRequest {
      kind: kind.to_owned(),
      title: title.to_owned(),
      description: self.description,
      created_by,
      window,
    })
  }
}

/// A validated request ready to be persisted. The store assigns `id`,
/// timestamps and the initial `pending` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
  pub kind:        String,
  pub title:       String,
  pub description: Option<String>,
  pub created_by:  Uuid,
  pub window:      Option<Interval>,
}

/// A reviewer's decision, applied atomically to a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
  pub verdict:    Verdict,
  pub decided_by: Uuid,
  pub note:       Option<String>,
}
