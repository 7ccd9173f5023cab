//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for memo identifiers, local
//! calendar dates and resume markers. Each newtype ensures data validity at
//! construction time.

use std::fmt::{self, Display, Formatter, Write};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// MemoId
// ============================================================================

/// Opaque memo identifier as issued by the server
///
/// v0.19.1 uses bare numeric ids (`"42"`), the gRPC generations use resource
/// names (`"memos/42"` or `"memos/Ab3xY"`). The id is stable across pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoId(String);

impl MemoId {
    /// Create a new MemoId, rejecting empty values
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidMemoId(id));
        }
        Ok(Self(id))
    }

    /// Get the raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity token embedded in rendered local text
    ///
    /// Takes the last path segment of the id and replaces every character
    /// outside `[A-Za-z0-9-]` with `-`, so the token is a valid block
    /// reference name.
    pub fn marker(&self) -> String {
        let segment = self.0.rsplit('/').next().unwrap_or(&self.0);
        segment
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }
}

impl Display for MemoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MemoId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// DateKey
// ============================================================================

/// Local calendar date that identifies one daily note
///
/// Rendered as `YYYY-MM-DD`. Computed once per memo from its creation
/// instant and the configured local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Canonical key format
    pub const FORMAT: &'static str = "%Y-%m-%d";

    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Key for a timestamp that has already been shifted into local time
    #[must_use]
    pub fn from_local(local: &DateTime<FixedOffset>) -> Self {
        Self(local.date_naive())
    }

    #[must_use]
    pub const fn as_date(&self) -> NaiveDate {
        self.0
    }

    /// Format the date with a chrono strftime pattern
    ///
    /// Returns an error instead of panicking when the pattern contains an
    /// unsupported specifier.
    pub fn format(&self, pattern: &str) -> Result<String, DomainError> {
        let mut out = String::new();
        write!(out, "{}", self.0.format(pattern)).map_err(|_| {
            DomainError::ValidationFailed(format!("invalid date format pattern: {pattern}"))
        })?;
        Ok(out)
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT)
            .map(Self)
            .map_err(|_| DomainError::InvalidDateKey(s.to_string()))
    }
}

impl TryFrom<String> for DateKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

// ============================================================================
// ResumeMarker
// ============================================================================

/// Resume boundary for an incremental sync ("lastTime")
///
/// Supplied by the caller and only ever read by the sync core: pagination
/// may stop at the first memo created at or before this instant.
/// Accepts RFC 3339 timestamps or integer unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResumeMarker(DateTime<Utc>);

impl ResumeMarker {
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns true when a memo created at `created_at` lies on or behind
    /// the boundary
    #[must_use]
    pub fn is_reached_by(&self, created_at: &DateTime<Utc>) -> bool {
        *created_at <= self.0
    }
}

impl Display for ResumeMarker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl FromStr for ResumeMarker {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(secs) = trimmed.parse::<i64>() {
            return DateTime::from_timestamp(secs, 0)
                .map(Self)
                .ok_or_else(|| DomainError::InvalidResumeMarker(s.to_string()));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|_| DomainError::InvalidResumeMarker(s.to_string()))
    }
}

impl TryFrom<String> for ResumeMarker {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResumeMarker> for String {
    fn from(marker: ResumeMarker) -> Self {
        marker.to_string()
    }
}

// ============================================================================
// ApiVersion
// ============================================================================

/// Remote API generation, selected once from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiVersion {
    /// REST API of servers before v0.21
    #[serde(rename = "v0.19.1")]
    V0191,
    /// gRPC API of v0.22.x - v0.23.x
    #[serde(rename = "v0.22.0")]
    V0220,
    /// gRPC API from v0.24.x on
    #[serde(rename = "v0.24.0")]
    V0240,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 3] = [Self::V0191, Self::V0220, Self::V0240];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V0191 => "v0.19.1",
            Self::V0220 => "v0.22.0",
            Self::V0240 => "v0.24.0",
        }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V0191
    }
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        let normalized = normalized.strip_prefix('v').unwrap_or(normalized);
        match normalized {
            "0.19.1" => Ok(Self::V0191),
            "0.22.0" => Ok(Self::V0220),
            "0.24.0" => Ok(Self::V0240),
            _ => Err(DomainError::UnknownApiVersion(s.to_string())),
        }
    }
}
