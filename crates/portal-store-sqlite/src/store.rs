//! [`SqliteStore`]: the SQLite implementation of [`RequestStore`] and
//! [`UserStore`].

use std::{path::Path, sync::LazyLock};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use strum::IntoEnumIterator;
use uuid::Uuid;

use portal_core::{
  overlap::Interval,
  request::{Decision, NewRequest, Request, RequestStatus},
  role::Role,
  store::{Admission, DecisionOutcome, Insertion, RequestStore, UserInsertion, UserStore},
  user::{NewUser, User, normalize_email},
};

use crate::{
  Result,
  encode::{
    REQUEST_COLUMNS, RawRequest, RawUser, USER_COLUMNS, decode_status, decode_uuid,
    encode_dt, encode_uuid, stored_precision,
  },
  schema::SCHEMA,
};

/// Blocking rows: same type, in a status that holds its interval,
/// intersecting `[?3, ?2)`.
static OVERLAP_QUERY: LazyLock<String> = LazyLock::new(|| {
  let holding = RequestStatus::iter()
    .filter(|status| status.holds_interval())
    .map(|status| format!("'{status}'"))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "SELECT id FROM requests
     WHERE type = ?1
       AND status IN ({holding})
       AND start_at IS NOT NULL
       AND end_at IS NOT NULL
       AND start_at < ?2
       AND end_at > ?3
     LIMIT 1"
  )
});

// ─── Store ───────────────────────────────────────────────────────────────────

/// A portal store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_requests(
    &self,
    sql: &'static str,
    creator: Option<String>,
  ) -> Result<Vec<Request>> {
    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = match creator {
          Some(c) => stmt
            .query_map(rusqlite::params![c], RawRequest::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], RawRequest::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }
}

/// What the decision transaction found.
enum RawDecision {
  Decided(RawRequest),
  Missing,
  Terminal(String),
}

// ─── RequestStore impl ───────────────────────────────────────────────────────

impl RequestStore for SqliteStore {
  type Error = crate::Error;

  async fn insert(&self, new: NewRequest, admission: Admission) -> Result<Insertion> {
    let now = stored_precision(Utc::now());
    let request = Request {
      id:            Uuid::new_v4(),
      kind:          new.kind,
      title:         new.title,
      description:   new.description,
      status:        RequestStatus::Pending,
      created_by:    new.created_by,
      assigned_to:   None,
      decision_by:   None,
      decision_note: None,
      start_at:      new.window.map(|w| stored_precision(w.start())),
      end_at:        new.window.map(|w| stored_precision(w.end())),
      created_at:    now,
      updated_at:    now,
    };

    let check         = admission == Admission::Exclusive && new.window.is_some();
    let id_str        = encode_uuid(request.id);
    let kind          = request.kind.clone();
    let title         = request.title.clone();
    let description   = request.description.clone();
    let created_by    = encode_uuid(request.created_by);
    let start_str     = request.start_at.map(encode_dt);
    let end_str       = request.end_at.map(encode_dt);
    let now_str       = encode_dt(now);

    let blocking: Option<String> = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so no other writer can
        // slip a row in between the overlap query and the insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if check {
          let blocking: Option<String> = tx
            .query_row(
              OVERLAP_QUERY.as_str(),
              rusqlite::params![kind, end_str, start_str],
              |row| row.get(0),
            )
            .optional()?;
          if blocking.is_some() {
            return Ok(blocking);
          }
        }

        tx.execute(
          "INSERT INTO requests (
             id, type, title, description, status, created_by,
             start_at, end_at, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            id_str,
            kind,
            title,
            description,
            created_by,
            start_str,
            end_str,
            now_str,
          ],
        )?;
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match blocking {
      Some(id) => Ok(Insertion::Overlaps(decode_uuid(&id)?)),
      None => Ok(Insertion::Created(request)),
    }
  }

  async fn get(&self, id: Uuid) -> Result<Option<Request>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1"),
              rusqlite::params![id_str],
              RawRequest::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  async fn list_by_creator(&self, creator: Uuid) -> Result<Vec<Request>> {
    const SQL: &str = "
      SELECT id, type, title, description, status,
             created_by, assigned_to, decision_by, decision_note,
             start_at, end_at, created_at, updated_at
      FROM requests
      WHERE created_by = ?1
      ORDER BY created_at DESC, rowid DESC";
    self.query_requests(SQL, Some(encode_uuid(creator))).await
  }

  async fn list_all(&self) -> Result<Vec<Request>> {
    const SQL: &str = "
      SELECT id, type, title, description, status,
             created_by, assigned_to, decision_by, decision_note,
             start_at, end_at, created_at, updated_at
      FROM requests
      ORDER BY created_at DESC, rowid DESC";
    self.query_requests(SQL, None).await
  }

  async fn find_overlap(&self, kind: &str, window: Interval) -> Result<Option<Uuid>> {
    let kind      = kind.to_owned();
    let start_str = encode_dt(window.start());
    let end_str   = encode_dt(window.end());

    let blocking: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              OVERLAP_QUERY.as_str(),
              rusqlite::params![kind, end_str, start_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    blocking.as_deref().map(decode_uuid).transpose()
  }

  async fn decide(&self, id: Uuid, decision: Decision) -> Result<DecisionOutcome> {
    let id_str     = encode_uuid(id);
    let status_str = RequestStatus::from(decision.verdict).to_string();
    let by_str     = encode_uuid(decision.decided_by);
    let note       = decision.note;
    let now_str    = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
          "UPDATE requests
           SET status = ?1, decision_by = ?2, decision_note = ?3, updated_at = ?4
           WHERE id = ?5 AND status = 'pending'",
          rusqlite::params![status_str, by_str, note, now_str, id_str],
        )?;

        let outcome = if changed == 0 {
          let current: Option<String> = tx
            .query_row(
              "SELECT status FROM requests WHERE id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?;
          match current {
            Some(status) => RawDecision::Terminal(status),
            None => RawDecision::Missing,
          }
        } else {
          RawDecision::Decided(tx.query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1"),
            rusqlite::params![id_str],
            RawRequest::from_row,
          )?)
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    match outcome {
      RawDecision::Decided(raw) => Ok(DecisionOutcome::Decided(raw.into_request()?)),
      RawDecision::Missing => Ok(DecisionOutcome::NotFound),
      RawDecision::Terminal(status) => {
        Ok(DecisionOutcome::AlreadyDecided(decode_status(&status)?))
      }
    }
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = crate::Error;

  async fn create_user(&self, new: NewUser) -> Result<UserInsertion> {
    let user = User {
      id:            Uuid::new_v4(),
      name:          new.name,
      email:         normalize_email(&new.email),
      password_hash: new.password_hash,
      role:          new.role,
      manager_id:    new.manager_id,
      created_at:    stored_precision(Utc::now()),
    };

    let id_str      = encode_uuid(user.id);
    let name        = user.name.clone();
    let email       = user.email.clone();
    let hash        = user.password_hash.clone();
    let role_str    = user.role.to_string();
    let manager_str = user.manager_id.map(encode_uuid);
    let at_str      = encode_dt(user.created_at);

    let created: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO users (id, name, email, password_hash, role, manager_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, name, email, hash, role_str, manager_str, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if created {
      Ok(UserInsertion::Created(user))
    } else {
      Ok(UserInsertion::EmailTaken)
    }
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = normalize_email(email);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              rusqlite::params![email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn set_role(&self, email: &str, role: Role) -> Result<Option<User>> {
    let email    = normalize_email(email);
    let role_str = role.to_string();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET role = ?1 WHERE email = ?2",
          rusqlite::params![role_str, email],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
          rusqlite::params![email],
          RawUser::from_row,
        )?))
      })
      .await?;

    if let Some(raw) = &raw {
      tracing::info!(email = %raw.email, %role, "role changed");
    }
    raw.map(RawUser::into_user).transpose()
  }
}
