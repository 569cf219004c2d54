//! JSON REST API for the operations portal.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`RequestStore`] and [`UserStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", portal_api::api_router(state))
//! ```

pub mod accounts;
pub mod error;
pub mod identity;
pub mod requests;

use std::sync::Arc;

use axum::{
  Router,
  extract::{FromRequest, FromRequestParts},
  routing::{get, patch, post},
};
use portal_core::{
  lifecycle::RequestLifecycle,
  overlap::OverlapPolicy,
  store::{RequestStore, UserStore},
};

pub use error::ApiError;
pub use identity::IdentityKeys;

/// Everything the router needs from a storage backend.
pub trait PortalStore: RequestStore + UserStore + 'static {}

impl<T: RequestStore + UserStore + 'static> PortalStore for T {}

/// Shared handler state.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub requests: RequestLifecycle<S>,
  pub identity: Arc<IdentityKeys>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      requests: self.requests.clone(),
      identity: Arc::clone(&self.identity),
    }
  }
}

impl<S: PortalStore> AppState<S> {
  pub fn new(store: Arc<S>, policy: OverlapPolicy, identity: IdentityKeys) -> Self {
    Self {
      requests: RequestLifecycle::new(Arc::clone(&store), policy),
      store,
      identity: Arc::new(identity),
    }
  }
}

/// `axum::Json` with malformed bodies reported as 400 in the API's error
/// shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path`, rejected as 400 in the API's error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// `axum::extract::Query`, rejected as 400 in the API's error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

async fn health() -> &'static str { "OK" }

/// Build a fully-materialised API router over `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: PortalStore>(state: AppState<S>) -> Router<()> {
  Router::new()
    .route("/health", get(health))
    // Accounts
    .route("/auth/signup", post(accounts::signup::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/logout", post(accounts::logout))
    .route("/auth/me", get(accounts::me::<S>))
    // Requests
    .route(
      "/requests",
      get(requests::list_all::<S>).post(requests::create::<S>),
    )
    .route("/requests/mine", get(requests::list_mine::<S>))
    .route("/requests/availability", get(requests::availability::<S>))
    .route("/requests/{id}", patch(requests::decide::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use portal_core::{
    role::{Role, Subject},
    store::UserInsertion,
    user::NewUser,
  };
  use portal_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(
      Arc::new(store),
      OverlapPolicy::default(),
      IdentityKeys::new(b"router-test-secret", Duration::from_secs(3600)),
    )
  }

  fn token(state: &AppState<SqliteStore>, role: Role) -> (Uuid, String) {
    let id = Uuid::new_v4();
    let token = state.identity.issue(&Subject::new(id, role)).unwrap();
    (id, token)
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    token:  Option<&str>,
    body:   Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn laptop(start: &str, end: &str) -> Value {
    json!({ "type": "equipment", "title": "Laptop", "startAt": start, "endAt": end })
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_token() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
  }

  // ── Lifecycle over HTTP ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn booking_conflict_then_approval() {
    let state = make_state().await;
    let (e, e_token) = token(&state, Role::Employee);
    let (_, f_token) = token(&state, Role::Employee);
    let (m, m_token) = token(&state, Role::Manager);

    let resp = send(
      &state,
      "POST",
      "/requests",
      Some(&e_token),
      Some(laptop("2024-01-01T09:00Z", "2024-01-01T11:00Z")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created = json_body(resp).await;
    assert_eq!(created["status"], "pending");
    assert_eq!(created["type"], "equipment");
    assert_eq!(created["createdBy"], e.to_string());
    let id = created["id"].as_str().unwrap().to_owned();

    let resp = send(
      &state,
      "POST",
      "/requests",
      Some(&f_token),
      Some(laptop("2024-01-01T10:00Z", "2024-01-01T12:00Z")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(json_body(resp).await["error"].is_string());

    let resp = send(
      &state,
      "PATCH",
      &format!("/requests/{id}"),
      Some(&m_token),
      Some(json!({ "status": "approved", "decisionNote": "enjoy" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&state, "GET", "/requests", Some(&m_token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let all = json_body(resp).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["status"], "approved");
    assert_eq!(all[0]["decisionBy"], m.to_string());
    assert_eq!(all[0]["decisionNote"], "enjoy");
  }

  #[tokio::test]
  async fn missing_token_is_401() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/requests/mine", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&state, "GET", "/requests/mine", Some("garbage"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn roles_are_enforced() {
    let state = make_state().await;
    let (_, e_token) = token(&state, Role::Employee);
    let (_, m_token) = token(&state, Role::Manager);

    let resp = send(&state, "GET", "/requests", Some(&e_token), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
      &state,
      "PATCH",
      &format!("/requests/{}", Uuid::new_v4()),
      Some(&e_token),
      Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&state, "GET", "/requests/mine", Some(&m_token), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn invalid_bodies_are_400() {
    let state = make_state().await;
    let (_, e_token) = token(&state, Role::Employee);

    let resp = send(
      &state,
      "POST",
      "/requests",
      Some(&e_token),
      Some(json!({ "type": "", "title": "Laptop" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
      &state,
      "POST",
      "/requests",
      Some(&e_token),
      Some(laptop("2026-03-01T12:00:00Z", "2026-03-01T09:00:00Z")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = Request::builder()
      .method("POST")
      .uri("/requests")
      .header(header::AUTHORIZATION, format!("Bearer {e_token}"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = api_router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "invalid request body");
  }

  #[tokio::test]
  async fn decision_errors() {
    let state = make_state().await;
    let (_, e_token) = token(&state, Role::Employee);
    let (_, m_token) = token(&state, Role::Manager);
    let (_, a_token) = token(&state, Role::Admin);

    let resp = send(
      &state,
      "POST",
      "/requests",
      Some(&e_token),
      Some(json!({ "type": "leave", "title": "Holiday" })),
    )
    .await;
    let id = json_body(resp).await["id"].as_str().unwrap().to_owned();
    let uri = format!("/requests/{id}");

    let resp = send(&state, "PATCH", &uri, Some(&m_token), Some(json!({ "status": "pending" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
      &state,
      "PATCH",
      &format!("/requests/{}", Uuid::new_v4()),
      Some(&m_token),
      Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&state, "PATCH", &uri, Some(&m_token), Some(json!({ "status": "rejected" }))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&state, "PATCH", &uri, Some(&a_token), Some(json!({ "status": "approved" }))).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(&state, "GET", "/requests/mine", Some(&e_token), None).await;
    let mine = json_body(resp).await;
    assert_eq!(mine[0]["status"], "rejected");
  }

  #[tokio::test]
  async fn malformed_path_and_query_are_json_400s() {
    let state = make_state().await;
    let (_, e_token) = token(&state, Role::Employee);
    let (_, m_token) = token(&state, Role::Manager);

    let resp = send(
      &state,
      "PATCH",
      "/requests/not-a-uuid",
      Some(&m_token),
      Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "invalid path parameter");

    let resp = send(
      &state,
      "GET",
      "/requests/availability?type=equipment&startAt=2024-01-01T09:00Z",
      Some(&e_token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "invalid query parameters");
  }

  #[tokio::test]
  async fn out_of_range_year_is_400_and_lists_still_work() {
    let state = make_state().await;
    let (_, e_token) = token(&state, Role::Employee);
    let (_, m_token) = token(&state, Role::Manager);

    let resp = send(
      &state,
      "POST",
      "/requests",
      Some(&e_token),
      Some(laptop("9999-12-31T22:00:00-01:00", "9999-12-31T23:30:00-01:00")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
      &state,
      "POST",
      "/requests",
      Some(&e_token),
      Some(laptop("2024-01-01T09:00Z", "2024-01-01T11:00Z")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&state, "GET", "/requests/mine", Some(&e_token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

    let resp = send(&state, "GET", "/requests", Some(&m_token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn availability_reflects_bookings() {
    let state = make_state().await;
    let (_, e_token) = token(&state, Role::Employee);

    send(
      &state,
      "POST",
      "/requests",
      Some(&e_token),
      Some(laptop("2026-03-01T09:00:00Z", "2026-03-01T12:00:00Z")),
    )
    .await;

    let uri = "/requests/availability?type=equipment\
               &startAt=2026-03-01T11:00:00Z&endAt=2026-03-01T13:00:00Z";
    let resp = send(&state, "GET", uri, Some(&e_token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["available"], false);

    let uri = "/requests/availability?type=equipment\
               &startAt=2026-03-01T12:00:00Z&endAt=2026-03-01T13:00:00Z";
    let resp = send(&state, "GET", uri, Some(&e_token), None).await;
    assert_eq!(json_body(resp).await["available"], true);
  }

  // ── Accounts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn signup_login_me() {
    let state = make_state().await;
    let signup = json!({ "name": "Ada", "email": "Ada@Example.com", "password": "pw" });

    let resp = send(&state, "POST", "/auth/signup", None, Some(signup.clone())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let resp = send(&state, "POST", "/auth/signup", None, Some(signup)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": "ada@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": "ada@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = json_body(resp).await["token"].as_str().unwrap().to_owned();

    let resp = send(&state, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await;
    assert_eq!(me["user"]["email"], "ada@example.com");
    assert_eq!(me["user"]["role"], "employee");
    assert!(me["user"].get("passwordHash").is_none());
  }

  #[tokio::test]
  async fn signup_requires_fields() {
    let state = make_state().await;
    let resp = send(
      &state,
      "POST",
      "/auth/signup",
      None,
      Some(json!({ "name": "", "email": "x@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn cookie_authenticates_and_logout_clears_it() {
    let state = make_state().await;
    let created = state
      .store
      .create_user(NewUser {
        name:          "Grace".into(),
        email:         "grace@example.com".into(),
        password_hash: accounts::hash_password("pw").unwrap(),
        role:          Role::Manager,
        manager_id:    None,
      })
      .await
      .unwrap();
    let UserInsertion::Created(user) = created else {
      panic!("expected a new user");
    };
    let token = state.identity.issue(&user.subject()).unwrap();

    let req = Request::builder()
      .uri("/auth/me")
      .header(header::COOKIE, format!("access_token={token}"))
      .body(Body::empty())
      .unwrap();
    let resp = api_router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["user"]["role"], "manager");

    let resp = send(&state, "POST", "/auth/logout", None, None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cleared = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
  }
}
