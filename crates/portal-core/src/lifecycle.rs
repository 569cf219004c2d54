//! The request lifecycle manager.
//!
//! Every operation authorizes the caller through the [gate](crate::gate),
//! validates its input, and delegates persistence to a [`RequestStore`]. The
//! manager holds no per-request state; coordination between concurrent calls
//! is the store's job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  gate::{self, Operation},
  overlap::{Interval, OverlapPolicy},
  request::{Decision, Request, RequestInput, Verdict},
  role::Subject,
  store::{Admission, DecisionOutcome, Insertion, RequestStore},
};

/// Orchestrates creation, review and listing of requests over a store.
pub struct RequestLifecycle<S> {
  store:  Arc<S>,
  policy: OverlapPolicy,
}

impl<S> Clone for RequestLifecycle<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      policy: self.policy.clone(),
    }
  }
}

impl<S: RequestStore> RequestLifecycle<S> {
  pub fn new(store: Arc<S>, policy: OverlapPolicy) -> Self { Self { store, policy } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Create a `pending` request owned by `caller`.
  ///
  /// Requests of an exclusive type that carry an interval are admitted only
  /// if no `pending`/`approved` request of the same type overlaps it.
  pub async fn create(&self, caller: &Subject, input: RequestInput) -> Result<Request> {
    gate::authorize(caller, Operation::CreateRequest)?;
    let new = input.validate(caller.id)?;

    let admission = if new.window.is_some() && self.policy.is_exclusive(&new.kind) {
      Admission::Exclusive
    } else {
      Admission::Unchecked
    };

    match self.store.insert(new, admission).await.map_err(Error::storage)? {
      Insertion::Created(request) => {
        tracing::info!(
          request = %request.id,
          kind = %request.kind,
          creator = %caller.id,
          "request created"
        );
        Ok(request)
      }
      Insertion::Overlaps(blocking) => {
        tracing::warn!(creator = %caller.id, %blocking, "request overlaps existing booking");
        Err(Error::Overlap(blocking))
      }
    }
  }

  /// Approve or reject a pending request. `status` is the raw wire value;
  /// anything but `approved`/`rejected` is refused before the store is
  /// touched.
  pub async fn decide(
    &self,
    caller: &Subject,
    id: Uuid,
    status: &str,
    note: Option<String>,
  ) -> Result<Request> {
    gate::authorize(caller, Operation::DecideRequest)?;
    let verdict = Verdict::parse(status)?;

    let decision = Decision {
      verdict,
      decided_by: caller.id,
      note,
    };

    match self.store.decide(id, decision).await.map_err(Error::storage)? {
      DecisionOutcome::Decided(request) => {
        tracing::info!(request = %id, reviewer = %caller.id, %verdict, "request decided");
        Ok(request)
      }
      DecisionOutcome::NotFound => Err(Error::NotFound(id)),
      DecisionOutcome::AlreadyDecided(status) => {
        tracing::warn!(request = %id, reviewer = %caller.id, %status, "request already decided");
        Err(Error::AlreadyDecided { id, status })
      }
    }
  }

  /// The caller's own requests, newest first.
  pub async fn list_mine(&self, caller: &Subject) -> Result<Vec<Request>> {
    gate::authorize(caller, Operation::ListOwnRequests)?;
    self.store.list_by_creator(caller.id).await.map_err(Error::storage)
  }

  /// Every request, newest first. Reviewers only.
  pub async fn list_all(&self, caller: &Subject) -> Result<Vec<Request>> {
    gate::authorize(caller, Operation::ListAllRequests)?;
    self.store.list_all().await.map_err(Error::storage)
  }

  /// Whether `[start, end)` is already held by a `pending`/`approved` request
  /// of `kind`. Types outside the exclusivity policy never overlap.
  pub async fn has_overlap(
    &self,
    caller: &Subject,
    kind: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<bool> {
    gate::authorize(caller, Operation::CheckAvailability)?;
    let window = Interval::new(start, end)?;
    if !self.policy.is_exclusive(kind) {
      return Ok(false);
    }
    let blocking = self
      .store
      .find_overlap(kind, window)
      .await
      .map_err(Error::storage)?;
    Ok(blocking.is_some())
  }
}
