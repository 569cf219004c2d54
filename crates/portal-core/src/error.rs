//! Error types for `portal-core`.
//!
//! Each variant corresponds to exactly one externally visible failure kind;
//! the boundary layer maps them to transport status codes.

use thiserror::Error;
use uuid::Uuid;

use crate::{gate::Operation, request::RequestStatus, role::Role};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("no verified identity")]
  Unauthenticated,

  #[error("role {role} may not perform {operation}")]
  Forbidden { role: Role, operation: Operation },

  #[error("request not found: {0}")]
  NotFound(Uuid),

  #[error("interval overlaps request {0}")]
  Overlap(Uuid),

  #[error("request {id} is already {status}")]
  AlreadyDecided { id: Uuid, status: RequestStatus },

  #[error("storage failure: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from any store implementation.
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
