//! HTTP status filters.
//!
//! A [`StatusFilter`] matches response statuses against a [`StatusSpec`]: every status,
//! a range, or an explicit set of codes. Symbolic names (`"unauthorized"`,
//! `"unprocessable_entity"`, ...) resolve to their numeric code, both in specs and in
//! matched statuses.
//!
//! # Example
//!
//! ```
//! use herald_core::{Status, StatusFilter, StatusSpec};
//!
//! let filter = StatusFilter::only(StatusSpec::codes(["unauthorized".into(), Status::from(403)]))
//!     .expect("known statuses");
//!
//! assert!(filter.matches(401));
//! assert!(filter.matches("forbidden"));
//! assert!(!filter.matches(422));
//! ```

use std::ops::{Range, RangeFrom, RangeInclusive};
use std::sync::LazyLock;

use crate::{Error, Result};

/// Lowest status matched by [`StatusSpec::Any`].
pub const MIN_STATUS: u16 = 100;
/// Highest status matched by [`StatusSpec::Any`].
pub const MAX_STATUS: u16 = 599;

/// `snake_case` status names, derived from the canonical reason phrases.
static STATUS_NAMES: LazyLock<Vec<(String, u16)>> = LazyLock::new(|| {
    (MIN_STATUS..=MAX_STATUS)
        .filter_map(|code| {
            let reason = http::StatusCode::from_u16(code).ok()?.canonical_reason()?;
            let name = reason
                .to_ascii_lowercase()
                .replace([' ', '-', '\''], "_");
            Some((name, code))
        })
        .collect()
});

/// Resolve a symbolic status name to its code.
#[must_use]
pub fn status_code(name: &str) -> Option<u16> {
    STATUS_NAMES
        .iter()
        .find(|(known, _)| known == name)
        .map(|(_, code)| *code)
}

/// Integer literals default to `i32`; out-of-range values saturate.
fn clamp_code(code: i32) -> u16 {
    u16::try_from(code.clamp(0, i32::from(u16::MAX))).unwrap_or(u16::MAX)
}

// ============================================================================
// Status
// ============================================================================

/// A status given either numerically or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    /// Numeric code.
    Code(u16),
    /// Symbolic name, e.g. `"not_found"`.
    Name(String),
}

impl Status {
    /// Canonical numeric code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatus`] for unknown names.
    pub fn code(&self) -> Result<u16> {
        match self {
            Self::Code(code) => Ok(*code),
            Self::Name(name) => status_code(name).ok_or_else(|| Error::UnknownStatus(name.clone())),
        }
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        Self::Code(code)
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self::Code(clamp_code(code))
    }
}

impl From<&str> for Status {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Status {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<http::StatusCode> for Status {
    fn from(status: http::StatusCode) -> Self {
        Self::Code(status.as_u16())
    }
}

// ============================================================================
// Spec
// ============================================================================

/// The set of statuses a filter is declared over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusSpec {
    /// Every status from 100 to 599.
    #[default]
    Any,
    /// An inclusive range; `end: None` is an endless range.
    Range {
        /// First matching status.
        start: u16,
        /// Last matching status, if bounded.
        end: Option<u16>,
    },
    /// An explicit set, mixing codes and names.
    Codes(Vec<Status>),
}

impl StatusSpec {
    /// An explicit set of statuses.
    #[must_use]
    pub fn codes(statuses: impl IntoIterator<Item = Status>) -> Self {
        Self::Codes(statuses.into_iter().collect())
    }
}

impl From<u16> for StatusSpec {
    fn from(code: u16) -> Self {
        Self::Codes(vec![Status::Code(code)])
    }
}

impl From<i32> for StatusSpec {
    fn from(code: i32) -> Self {
        Self::Codes(vec![Status::from(code)])
    }
}

impl From<&str> for StatusSpec {
    fn from(name: &str) -> Self {
        Self::Codes(vec![Status::from(name)])
    }
}

impl From<Status> for StatusSpec {
    fn from(status: Status) -> Self {
        Self::Codes(vec![status])
    }
}

impl From<RangeInclusive<u16>> for StatusSpec {
    fn from(range: RangeInclusive<u16>) -> Self {
        Self::Range {
            start: *range.start(),
            end: Some(*range.end()),
        }
    }
}

impl From<Range<u16>> for StatusSpec {
    fn from(range: Range<u16>) -> Self {
        Self::Range {
            start: range.start,
            end: Some(range.end.saturating_sub(1)),
        }
    }
}

impl From<RangeFrom<u16>> for StatusSpec {
    fn from(range: RangeFrom<u16>) -> Self {
        Self::Range {
            start: range.start,
            end: None,
        }
    }
}

impl From<RangeInclusive<i32>> for StatusSpec {
    fn from(range: RangeInclusive<i32>) -> Self {
        Self::from(clamp_code(*range.start())..=clamp_code(*range.end()))
    }
}

impl From<Range<i32>> for StatusSpec {
    fn from(range: Range<i32>) -> Self {
        Self::from(clamp_code(range.start)..clamp_code(range.end))
    }
}

impl From<RangeFrom<i32>> for StatusSpec {
    fn from(range: RangeFrom<i32>) -> Self {
        Self::from(clamp_code(range.start)..)
    }
}

impl<const N: usize> From<[i32; N]> for StatusSpec {
    fn from(codes: [i32; N]) -> Self {
        Self::Codes(codes.into_iter().map(Status::from).collect())
    }
}

impl<const N: usize> From<[u16; N]> for StatusSpec {
    fn from(codes: [u16; N]) -> Self {
        Self::Codes(codes.into_iter().map(Status::Code).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StatusSpec {
    fn from(names: [&str; N]) -> Self {
        Self::Codes(names.into_iter().map(Status::from).collect())
    }
}

impl From<Vec<Status>> for StatusSpec {
    fn from(statuses: Vec<Status>) -> Self {
        Self::Codes(statuses)
    }
}

// ============================================================================
// Filter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    Range { start: u16, end: Option<u16> },
    Codes(Vec<u16>),
}

/// A resolved status predicate with inclusion/exclusion polarity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    matcher: Matcher,
    inclusion: bool,
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::any()
    }
}

impl StatusFilter {
    /// Resolve a spec into a filter; `inclusion = false` inverts the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatus`] if the spec names an unknown status.
    pub fn new(spec: impl Into<StatusSpec>, inclusion: bool) -> Result<Self> {
        let matcher = match spec.into() {
            StatusSpec::Any => Matcher::Range {
                start: MIN_STATUS,
                end: Some(MAX_STATUS),
            },
            StatusSpec::Range { start, end } => Matcher::Range { start, end },
            StatusSpec::Codes(statuses) => Matcher::Codes(
                statuses
                    .iter()
                    .map(Status::code)
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(Self { matcher, inclusion })
    }

    /// Match every status from 100 to 599.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            matcher: Matcher::Range {
                start: MIN_STATUS,
                end: Some(MAX_STATUS),
            },
            inclusion: true,
        }
    }

    /// Match only the statuses of the spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatus`] if the spec names an unknown status.
    pub fn only(spec: impl Into<StatusSpec>) -> Result<Self> {
        Self::new(spec, true)
    }

    /// Match every status except those of the spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatus`] if the spec names an unknown status.
    pub fn except(spec: impl Into<StatusSpec>) -> Result<Self> {
        Self::new(spec, false)
    }

    /// Resolve an `only_status` / `except_status` option pair.
    ///
    /// Neither option matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when both options are given.
    pub fn from_options(only: Option<StatusSpec>, except: Option<StatusSpec>) -> Result<Self> {
        match (only, except) {
            (Some(_), Some(_)) => Err(Error::configuration(
                "pass either only_status or except_status, not both",
            )),
            (Some(spec), None) => Self::only(spec),
            (None, Some(spec)) => Self::except(spec),
            (None, None) => Ok(Self::any()),
        }
    }

    /// Whether the filter accepts this status.
    ///
    /// Unknown status names never match an inclusive filter.
    #[must_use]
    pub fn matches(&self, status: impl Into<Status>) -> bool {
        let status: Status = status.into();
        let Ok(code) = status.code() else {
            return !self.inclusion;
        };

        let covered = match &self.matcher {
            Matcher::Range { start, end } => code >= *start && end.is_none_or(|end| code <= end),
            Matcher::Codes(codes) => codes.contains(&code),
        };

        covered == self.inclusion
    }

    /// Whether this filter includes (rather than excludes) its spec.
    #[must_use]
    pub const fn is_inclusion(&self) -> bool {
        self.inclusion
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn any_matches_every_status() {
        let filter = StatusFilter::only(StatusSpec::Any).expect("filter");
        check!((100..=599_u16).all(|code| filter.matches(code)));
        check!(!filter.matches(99));
        check!(!filter.matches(600));
    }

    #[test]
    fn range_bounds() {
        let filter = StatusFilter::only(400..=499).expect("filter");
        check!(filter.matches(400));
        check!(filter.matches(499));
        check!(!filter.matches(399));
        check!(!filter.matches(500));
    }

    #[test]
    fn exclusive_range() {
        let filter = StatusFilter::only(200..300).expect("filter");
        check!(filter.matches(299));
        check!(!filter.matches(300));
    }

    #[test]
    fn endless_range() {
        let filter = StatusFilter::only(100..).expect("filter");
        check!(filter.matches(101));
        check!(!filter.matches(99));
    }

    #[test]
    fn codes_and_names() {
        let filter = StatusFilter::only([401, 403]).expect("filter");
        check!(filter.matches(401));
        check!(!filter.matches(422));

        let filter = StatusFilter::only(["unauthorized", "forbidden"]).expect("filter");
        check!(filter.matches(401));
        check!(filter.matches(403));
        check!(!filter.matches(422));

        let filter =
            StatusFilter::only(StatusSpec::codes([Status::from(401), "forbidden".into()]))
                .expect("filter");
        check!(filter.matches(403));
    }

    #[test]
    fn matched_status_is_normalized() {
        let filter = StatusFilter::only(401).expect("filter");
        check!(filter.matches("unauthorized"));
        check!(!filter.matches("unprocessable_entity"));

        let filter = StatusFilter::only("unauthorized").expect("filter");
        check!(filter.matches("unauthorized") == filter.matches(401));
    }

    #[test]
    fn exclusion_inverts() {
        let filter = StatusFilter::except(200).expect("filter");
        check!(!filter.matches(200));
        check!(filter.matches(422));
    }

    #[test]
    fn unknown_name_is_rejected_at_declaration() {
        let err = StatusFilter::only("not_a_status").expect_err("unknown");
        check!(matches!(err, Error::UnknownStatus(_)));
    }

    #[test]
    fn both_options_is_a_configuration_error() {
        let err = StatusFilter::from_options(Some(422.into()), Some(200.into()))
            .expect_err("conflicting options");
        check!(matches!(err, Error::Configuration(_)));

        let filter = StatusFilter::from_options(None, None).expect("any");
        check!(filter == StatusFilter::any());
    }

    #[test]
    fn status_names() {
        check!(status_code("ok") == Some(200));
        check!(status_code("not_found") == Some(404));
        check!(status_code("unprocessable_entity") == Some(422));
        check!(status_code("too_many_requests") == Some(429));
        check!(status_code("internal_server_error") == Some(500));
        check!(status_code("nope").is_none());
    }
}
