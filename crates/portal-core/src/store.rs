//! The `RequestStore` and `UserStore` traits and their outcome types.
//!
//! The traits are implemented by storage backends (e.g.
//! `portal-store-sqlite`). The lifecycle manager and the HTTP layer depend on
//! this abstraction, not on any concrete backend.
//!
//! Every read reflects the store's state at call time; implementations must
//! not cache rows across calls.

use std::future::Future;

use uuid::Uuid;

use crate::{
  overlap::Interval,
  request::{Decision, NewRequest, Request, RequestStatus},
  role::Role,
  user::{NewUser, User},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// How a new request is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
  /// Insert without consulting other rows.
  Unchecked,
  /// Look for a blocking request of the same type and insert only if there is
  /// none, as a single atomic unit of work.
  Exclusive,
}

/// Result of [`RequestStore::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
  Created(Request),
  /// Not inserted; the request with this id holds an overlapping interval.
  Overlaps(Uuid),
}

/// Result of [`RequestStore::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
  Decided(Request),
  NotFound,
  /// The row exists but is no longer pending; it was left untouched.
  AlreadyDecided(RequestStatus),
}

/// Result of [`UserStore::create_user`].
#[derive(Debug, Clone)]
pub enum UserInsertion {
  Created(User),
  EmailTaken,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Durable storage for requests.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RequestStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `new` as a `pending` request with a fresh id and timestamps.
  ///
  /// With [`Admission::Exclusive`] and a window present, the overlap query
  /// and the insert run in one transaction so that two concurrent inserts
  /// cannot both pass.
  fn insert(
    &self,
    new: NewRequest,
    admission: Admission,
  ) -> impl Future<Output = Result<Insertion, Self::Error>> + Send + '_;

  /// Retrieve a request by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Request>, Self::Error>> + Send + '_;

  /// Requests created by `creator`, newest `created_at` first.
  fn list_by_creator(
    &self,
    creator: Uuid,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + '_;

  /// Every request, newest `created_at` first.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + '_;

  /// The id of some `pending`/`approved` request of `kind` whose interval
  /// overlaps `window`, if any.
  fn find_overlap<'a>(
    &'a self,
    kind: &'a str,
    window: Interval,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  /// Apply `decision` to request `id` only if it is still `pending`. Sets
  /// status, `decision_by`, `decision_note` and `updated_at` together and
  /// nothing else.
  fn decide(
    &self,
    id: Uuid,
    decision: Decision,
  ) -> impl Future<Output = Result<DecisionOutcome, Self::Error>> + Send + '_;
}

/// Durable storage for accounts.
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create an account. Emails are compared case-insensitively.
  fn create_user(
    &self,
    new: NewUser,
  ) -> impl Future<Output = Result<UserInsertion, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Change a user's role. Returns the updated user, or `None` if no account
  /// has that email.
  fn set_role<'a>(
    &'a self,
    email: &'a str,
    role: Role,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;
}
