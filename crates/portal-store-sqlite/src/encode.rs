//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings. Timestamps are stored as
//! `YYYY-MM-DDTHH:MM:SS.ffffffZ`; the fixed width is what makes the overlap
//! and ordering queries correct.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Timelike as _, Utc};
use portal_core::{
  request::{Request, RequestStatus},
  role::Role,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Truncate to the precision the store keeps, so values handed back from a
/// write compare equal to the same row read later.
pub fn stored_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
  let micros = dt.timestamp_subsec_micros();
  dt.with_nanosecond(micros * 1_000).unwrap_or(dt)
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<RequestStatus> {
  RequestStatus::from_str(s).map_err(|_| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

pub fn decode_role(s: &str) -> Result<Role> {
  Role::from_str(s).map_err(|_| Error::UnknownValue {
    column: "role",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRequest::from_row`].
pub const REQUEST_COLUMNS: &str = "id, type, title, description, status,
  created_by, assigned_to, decision_by, decision_note,
  start_at, end_at, created_at, updated_at";

/// Raw strings read directly from a `requests` row.
pub struct RawRequest {
  pub id:            String,
  pub kind:          String,
  pub title:         String,
  pub description:   Option<String>,
  pub status:        String,
  pub created_by:    String,
  pub assigned_to:   Option<String>,
  pub decision_by:   Option<String>,
  pub decision_note: Option<String>,
  pub start_at:      Option<String>,
  pub end_at:        Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawRequest {
  /// Read a row selected with [`REQUEST_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      kind:          row.get(1)?,
      title:         row.get(2)?,
      description:   row.get(3)?,
      status:        row.get(4)?,
      created_by:    row.get(5)?,
      assigned_to:   row.get(6)?,
      decision_by:   row.get(7)?,
      decision_note: row.get(8)?,
      start_at:      row.get(9)?,
      end_at:        row.get(10)?,
      created_at:    row.get(11)?,
      updated_at:    row.get(12)?,
    })
  }

  pub fn into_request(self) -> Result<Request> {
    Ok(Request {
      id:            decode_uuid(&self.id)?,
      kind:          self.kind,
      title:         self.title,
      description:   self.description,
      status:        decode_status(&self.status)?,
      created_by:    decode_uuid(&self.created_by)?,
      assigned_to:   self.assigned_to.as_deref().map(decode_uuid).transpose()?,
      decision_by:   self.decision_by.as_deref().map(decode_uuid).transpose()?,
      decision_note: self.decision_note,
      start_at:      self.start_at.as_deref().map(decode_dt).transpose()?,
      end_at:        self.end_at.as_deref().map(decode_dt).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str =
  "id, name, email, password_hash, role, manager_id, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub id:            String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub manager_id:    Option<String>,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      manager_id:    row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            decode_uuid(&self.id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      manager_id:    self.manager_id.as_deref().map(decode_uuid).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
