//! The authorization gate: a static role → operation table consulted once per
//! lifecycle operation.

use serde::Serialize;
use strum::{Display, EnumIter};

use crate::{
  Error, Result,
  role::{Role, Subject},
};

/// Every gated operation in the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
  CreateRequest,
  ListOwnRequests,
  ListAllRequests,
  DecideRequest,
  CheckAvailability,
  ViewProfile,
}

const EMPLOYEE: &[Operation] = &[
  Operation::CreateRequest,
  Operation::ListOwnRequests,
  Operation::CheckAvailability,
  Operation::ViewProfile,
];

const REVIEWER: &[Operation] = &[
  Operation::ListAllRequests,
  Operation::DecideRequest,
  Operation::CheckAvailability,
  Operation::ViewProfile,
];

/// The operations `role` may perform.
pub fn permitted(role: Role) -> &'static [Operation] {
  if role.is_reviewer() { REVIEWER } else { EMPLOYEE }
}

pub fn permits(role: Role, operation: Operation) -> bool {
  permitted(role).contains(&operation)
}

/// Turn an optional verified identity into a subject, or
/// [`Error::Unauthenticated`].
pub fn authenticate(subject: Option<Subject>) -> Result<Subject> {
  subject.ok_or(Error::Unauthenticated)
}

/// Fail with [`Error::Forbidden`] unless the subject's role permits
/// `operation`.
pub fn authorize(subject: &Subject, operation: Operation) -> Result<()> {
  if permits(subject.role, operation) {
    Ok(())
  } else {
    tracing::debug!(
      subject = %subject.id,
      role = %subject.role,
      %operation,
      "operation denied"
    );
    Err(Error::Forbidden { role: subject.role, operation })
  }
}
