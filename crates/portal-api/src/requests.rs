//! Handlers for `/requests` endpoints.
//!
//! | Method  | Path | Roles | Notes |
//! |---------|------|-------|-------|
//! | `POST`  | `/requests` | employee | Body: [`RequestInput`]; 409 on overlap |
//! | `GET`   | `/requests/mine` | employee | Caller's own requests, newest first |
//! | `GET`   | `/requests` | manager, admin | Every request, newest first |
//! | `PATCH` | `/requests/{id}` | manager, admin | Body: [`DecisionBody`]; 204 |
//! | `GET`   | `/requests/availability` | any | `?type=&startAt=&endAt=` |
//!
//! Role checks happen inside the lifecycle manager, not here.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use portal_core::{
  request::{Request, RequestInput},
  timestamp,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState, JsonBody, PathParam, PortalStore, QueryParams, error::ApiError, identity::Caller,
};

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /requests`: returns the stored request with status `pending`.
pub async fn create<S: PortalStore>(
  State(state): State<AppState<S>>,
  Caller(caller): Caller,
  JsonBody(input): JsonBody<RequestInput>,
) -> Result<Json<Request>, ApiError> {
  let request = state.requests.create(&caller, input).await?;
  Ok(Json(request))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /requests/mine`
pub async fn list_mine<S: PortalStore>(
  State(state): State<AppState<S>>,
  Caller(caller): Caller,
) -> Result<Json<Vec<Request>>, ApiError> {
  Ok(Json(state.requests.list_mine(&caller).await?))
}

/// `GET /requests`
pub async fn list_all<S: PortalStore>(
  State(state): State<AppState<S>>,
  Caller(caller): Caller,
) -> Result<Json<Vec<Request>>, ApiError> {
  Ok(Json(state.requests.list_all(&caller).await?))
}

// ─── Decide ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /requests/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBody {
  /// `"approved"` or `"rejected"`; anything else is a 400.
  #[serde(default)]
  pub status:        String,
  pub decision_note: Option<String>,
}

/// `PATCH /requests/{id}`: 204 on success, 409 if already decided.
pub async fn decide<S: PortalStore>(
  State(state): State<AppState<S>>,
  Caller(caller): Caller,
  PathParam(id): PathParam<Uuid>,
  JsonBody(body): JsonBody<DecisionBody>,
) -> Result<StatusCode, ApiError> {
  state
    .requests
    .decide(&caller, id, &body.status, body.decision_note)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Availability ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
  #[serde(rename = "type")]
  pub kind:     String,
  #[serde(deserialize_with = "timestamp::required")]
  pub start_at: DateTime<Utc>,
  #[serde(deserialize_with = "timestamp::required")]
  pub end_at:   DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Availability {
  pub available: bool,
}

/// `GET /requests/availability?type=equipment&startAt=...&endAt=...`
pub async fn availability<S: PortalStore>(
  State(state): State<AppState<S>>,
  Caller(caller): Caller,
  QueryParams(params): QueryParams<AvailabilityParams>,
) -> Result<Json<Availability>, ApiError> {
  let taken = state
    .requests
    .has_overlap(&caller, &params.kind, params.start_at, params.end_at)
    .await?;
  Ok(Json(Availability { available: !taken }))
}
