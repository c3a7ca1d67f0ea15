//! Usage ledger vocabulary: outcomes, service names, and summary windows.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Service name recorded for the reference echo endpoint.
pub const SERVICE_ECHO: &str = "core.echo";

/// Maximum length of a service name.
pub const MAX_SERVICE_LENGTH: usize = 100;

/// Maximum length of an error code.
pub const MAX_ERROR_CODE_LENGTH: usize = 50;

/// Outcome of a metered request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOutcome {
    Success,
    Error,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::Error => "error",
        }
    }

    /// Only successful requests are billed.
    pub fn is_billable(&self) -> bool {
        matches!(self, RequestOutcome::Success)
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestOutcome {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(RequestOutcome::Success),
            "error" => Ok(RequestOutcome::Error),
            other => Err(CoreError::Validation(format!(
                "Invalid request outcome '{other}'"
            ))),
        }
    }
}

/// Validate the free-form strings attached to a ledger entry.
pub fn validate_entry_labels(service: &str, error_code: Option<&str>) -> Result<(), CoreError> {
    if service.is_empty() || service.len() > MAX_SERVICE_LENGTH {
        return Err(CoreError::Validation(format!(
            "service must be 1..={MAX_SERVICE_LENGTH} bytes"
        )));
    }
    if matches!(error_code, Some(code) if code.len() > MAX_ERROR_CODE_LENGTH) {
        return Err(CoreError::Validation(format!(
            "error_code must be at most {MAX_ERROR_CODE_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Saturating conversion for byte counts and durations stored as INTEGER.
pub fn clamp_to_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Summary windows
// ---------------------------------------------------------------------------

/// Start instants of the rolling windows shown on the usage summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryWindows {
    pub today: Timestamp,
    pub yesterday: Timestamp,
    pub week_ago: Timestamp,
    pub month_start: Timestamp,
}

impl SummaryWindows {
    /// Windows anchored at UTC midnight of `now`.
    pub fn at(now: Timestamp) -> Self {
        let today = now
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        let month_start = now
            .date_naive()
            .with_day(1)
            .unwrap_or(now.date_naive())
            .and_time(NaiveTime::MIN)
            .and_utc();
        Self {
            today,
            yesterday: today - chrono::Duration::days(1),
            week_ago: today - chrono::Duration::days(7),
            month_start,
        }
    }
}
