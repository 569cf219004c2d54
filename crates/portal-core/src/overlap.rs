//! Half-open booking intervals and the exclusivity policy.
//!
//! Two requests of an exclusive type conflict when both hold their interval
//! (status `pending` or `approved`) and the intervals intersect. The
//! persisted-state query lives behind
//! [`RequestStore::find_overlap`](crate::store::RequestStore::find_overlap);
//! this module holds the pure rule.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike as _, Utc};

use crate::{Error, Result};

/// Years the store can represent as fixed-width `YYYY` text.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// A non-empty half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
  start: DateTime<Utc>,
  end:   DateTime<Utc>,
}

impl Interval {
  /// Fails with [`Error::InvalidInput`] unless `start < end` and both
  /// endpoints fall in years `0000..=9999` once converted to UTC.
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
    for endpoint in [start, end] {
      if !YEARS.contains(&endpoint.year()) {
        return Err(Error::InvalidInput(format!(
          "timestamp {endpoint} is outside years 0000-9999"
        )));
      }
    }
    if start >= end {
      return Err(Error::InvalidInput(format!(
        "interval start {start} must be before end {end}"
      )));
    }
    Ok(Self { start, end })
  }

  pub fn start(&self) -> DateTime<Utc> { self.start }

  pub fn end(&self) -> DateTime<Utc> { self.end }

  /// `s1 < e2 && e1 > s2`. Touching endpoints do not overlap.
  pub fn overlaps(&self, other: &Interval) -> bool {
    self.start < other.end && self.end > other.start
  }
}

/// The set of resource types whose intervals are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapPolicy {
  exclusive: BTreeSet<String>,
}

impl OverlapPolicy {
  pub const DEFAULT_TYPE: &'static str = "equipment";

  pub fn new<I, T>(types: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    Self {
      exclusive: types.into_iter().map(Into::into).collect(),
    }
  }

  /// Whether requests of `kind` are checked for overlap.
  pub fn is_exclusive(&self, kind: &str) -> bool { self.exclusive.contains(kind) }

}

impl Default for OverlapPolicy {
  fn default() -> Self { Self::new([Self::DEFAULT_TYPE]) }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn iv(start: u32, end: u32) -> Interval {
    let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
    Interval::new(at(start), at(end)).unwrap()
  }

  #[test]
  fn partial_overlap() {
    assert!(iv(9, 11).overlaps(&iv(10, 12)));
    assert!(iv(10, 12).overlaps(&iv(9, 11)));
  }

  #[test]
  fn containment_overlaps() {
    assert!(iv(8, 18).overlaps(&iv(10, 11)));
    assert!(iv(10, 11).overlaps(&iv(8, 18)));
    assert!(iv(9, 11).overlaps(&iv(9, 11)));
  }

  #[test]
  fn adjacent_intervals_do_not_overlap() {
    assert!(!iv(9, 11).overlaps(&iv(11, 12)));
    assert!(!iv(11, 12).overlaps(&iv(9, 11)));
  }

  #[test]
  fn disjoint_intervals_do_not_overlap() {
    assert!(!iv(9, 10).overlaps(&iv(14, 15)));
  }

  #[test]
  fn empty_interval_is_rejected() {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    assert!(matches!(Interval::new(t, t), Err(Error::InvalidInput(_))));
  }

  #[test]
  fn endpoints_outside_four_digit_years_are_rejected() {
    let start = Utc.with_ymd_and_hms(9999, 12, 31, 23, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(10000, 1, 1, 0, 30, 0).unwrap();
    assert!(matches!(Interval::new(start, end), Err(Error::InvalidInput(_))));

    let start = Utc.with_ymd_and_hms(-1, 12, 31, 23, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(0, 1, 1, 1, 0, 0).unwrap();
    assert!(matches!(Interval::new(start, end), Err(Error::InvalidInput(_))));

    let start = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
    assert!(Interval::new(start, end).is_ok());
  }

  #[test]
  fn default_policy_covers_equipment_only() {
    let policy = OverlapPolicy::default();
    assert!(policy.is_exclusive("equipment"));
    assert!(!policy.is_exclusive("leave"));
    assert!(!policy.is_exclusive("Equipment"));
  }
}
