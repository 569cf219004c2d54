//! Identity assertion: HS256 bearer tokens carrying `(subject id, role)`.
//!
//! The signing secret is loaded once at startup into [`IdentityKeys`] and
//! shared through [`AppState`]; nothing here reads the environment.

use std::time::Duration;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use portal_core::{
  gate,
  role::{Role, Subject},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, PortalStore, error::ApiError};

/// Name of the cookie set on signup/login.
pub const TOKEN_COOKIE: &str = "access_token";

/// Registered + private claims of a portal token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub:  Uuid,
  pub role: Role,
  pub iat:  i64,
  pub exp:  i64,
}

/// Signing and verification keys plus token lifetime.
pub struct IdentityKeys {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl IdentityKeys {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation: Validation::new(Algorithm::HS256),
      ttl,
    }
  }

  /// Issue a token for `subject`, valid for the configured lifetime.
  pub fn issue(&self, subject: &Subject) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
    self.encode(&Claims {
      sub:  subject.id,
      role: subject.role,
      iat:  now,
      exp:  now.saturating_add(ttl),
    })
  }

  pub(crate) fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
  }

  /// Verify signature and expiry, yielding the asserted subject.
  pub fn verify(&self, token: &str) -> Option<Subject> {
    match jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation) {
      Ok(data) => Some(Subject::new(data.claims.sub, data.claims.role)),
      Err(e) => {
        tracing::debug!(error = %e, "token rejected");
        None
      }
    }
  }

  /// `Set-Cookie` value carrying `token`.
  pub fn cookie(&self, token: &str) -> String {
    format!(
      "{TOKEN_COOKIE}={token}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
      self.ttl.as_secs()
    )
  }
}

/// `Set-Cookie` value that removes the token cookie.
pub fn expired_cookie() -> String {
  format!("{TOKEN_COOKIE}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0")
}

/// The bearer token, from `Authorization: Bearer …` or the token cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  if bearer.is_some() {
    return bearer;
  }

  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
    .map(|(_, value)| value)
}

/// A verified caller. Extraction fails with 401 when no valid token is
/// present.
pub struct Caller(pub Subject);

impl<S: PortalStore> FromRequestParts<AppState<S>> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let subject = token_from_headers(&parts.headers).and_then(|t| state.identity.verify(t));
    Ok(Caller(gate::authenticate(subject)?))
  }
}
