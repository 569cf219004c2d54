//! Account endpoints: signup, login, logout and the caller's profile.
//!
//! Passwords are stored as argon2 PHC strings. Signup always creates an
//! `employee`; reviewers are promoted out of band.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::State,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use portal_core::{
  Error as CoreError,
  gate::{self, Operation},
  role::Role,
  store::{UserInsertion, UserStore},
  user::{NewUser, User, normalize_email},
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{
  AppState, JsonBody, PortalStore,
  error::ApiError,
  identity::{Caller, expired_cookie},
};

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  #[serde(default)]
  pub name:     String,
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
  pub user: User,
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

/// 200 with `{token}` in the body and the same token in the cookie.
fn issue<S: PortalStore>(state: &AppState<S>, user: &User) -> Result<Response, ApiError> {
  let token = state.identity.issue(&user.subject())?;
  let cookie = state.identity.cookie(&token);
  Ok(
    (
      StatusCode::OK,
      [(header::SET_COOKIE, cookie)],
      Json(TokenResponse { token }),
    )
      .into_response(),
  )
}

/// `POST /auth/signup`, body: `{"name","email","password"}`.
pub async fn signup<S: PortalStore>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<SignupBody>,
) -> Result<Response, ApiError> {
  let name = body.name.trim();
  let email = normalize_email(&body.email);
  if name.is_empty() || body.password.is_empty() || !email.contains('@') {
    return Err(CoreError::InvalidInput("name, email and password are required".into()).into());
  }

  let new = NewUser {
    name: name.to_owned(),
    email,
    password_hash: hash_password(&body.password)?,
    role: Role::Employee,
    manager_id: None,
  };

  match state.store.create_user(new).await.map_err(CoreError::storage)? {
    UserInsertion::Created(user) => {
      tracing::info!(user = %user.id, "account created");
      issue(&state, &user)
    }
    UserInsertion::EmailTaken => Err(ApiError::EmailTaken),
  }
}

/// `POST /auth/login`, body: `{"email","password"}`.
pub async fn login<S: PortalStore>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Response, ApiError> {
  let user = state
    .store
    .get_user_by_email(&body.email)
    .await
    .map_err(CoreError::storage)?
    .ok_or(ApiError::InvalidCredentials)?;

  if !verify_password(&body.password, &user.password_hash) {
    tracing::info!(user = %user.id, "login failed");
    return Err(ApiError::InvalidCredentials);
  }

  issue(&state, &user)
}

/// `POST /auth/logout` clears the token cookie.
pub async fn logout() -> impl IntoResponse {
  (StatusCode::NO_CONTENT, [(header::SET_COOKIE, expired_cookie())])
}

/// `GET /auth/me`
pub async fn me<S: PortalStore>(
  State(state): State<AppState<S>>,
  Caller(caller): Caller,
) -> Result<Json<MeResponse>, ApiError> {
  gate::authorize(&caller, Operation::ViewProfile)?;
  let user = state
    .store
    .get_user(caller.id)
    .await
    .map_err(CoreError::storage)?
    .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
  Ok(Json(MeResponse { user }))
}
