//! Access key age and expiry warnings.
//!
//! Everything here is pure: callers look up the key's creation date and decide
//! what to do with the resulting status.

use std::fmt;

use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Default when creating a profile interactively.
pub const DEFAULT_KEY_MAX_AGE_DAYS: u32 = 90;

/// Age thresholds applied when a profile has no maximum age configured.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AgeThresholds {
    /// Keys younger than this are not reported.
    pub info_days: i64,
    pub warning_days: i64,
    /// Keys older than this are critical.
    pub critical_days: i64,
}

pub const DEFAULT_AGE_THRESHOLDS: AgeThresholds = AgeThresholds {
    info_days: 10,
    warning_days: 90,
    critical_days: 180,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyAgeStatus {
    pub severity: Severity,
    pub message: String,
}

impl KeyAgeStatus {
    pub fn new<S: Into<String>>(severity: Severity, message: S) -> KeyAgeStatus {
        KeyAgeStatus {
            severity,
            message: message.into(),
        }
    }
}

/// Whole days elapsed since `created_at`.
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

/// Status of a key that must be rotated after `max_age` days.
pub fn expiry_status(age_days: i64, max_age: u32) -> Option<KeyAgeStatus> {
    let days_left = i64::from(max_age) - age_days;
    match days_left {
        d if d < 0 => Some(KeyAgeStatus::new(Severity::Critical, "has expired")),
        0 => Some(KeyAgeStatus::new(Severity::Warning, "expires today")),
        1 => Some(KeyAgeStatus::new(Severity::Warning, "expires tomorrow")),
        d if d < 7 => Some(KeyAgeStatus::new(
            Severity::Warning,
            format!("expires in {} days", d),
        )),
        d if d < 30 => Some(KeyAgeStatus::new(
            Severity::Info,
            format!("expires in {} days", d),
        )),
        _ => None,
    }
}

/// Status of a key without a configured maximum age.
pub fn age_status(age_days: i64, thresholds: &AgeThresholds) -> Option<KeyAgeStatus> {
    let severity = if age_days > thresholds.critical_days {
        Severity::Critical
    } else if age_days >= thresholds.warning_days {
        Severity::Warning
    } else if age_days >= thresholds.info_days {
        Severity::Info
    } else {
        return None;
    };

    Some(KeyAgeStatus::new(
        severity,
        format!(
            "is {} days old. Keys are reported from {} days, warned about from {} days and \
             critical after {} days; run 'awsx set-key-max-age' to set your own maximum age \
             or 0 to silence this",
            age_days, thresholds.info_days, thresholds.warning_days, thresholds.critical_days
        ),
    ))
}

/// Evaluates a key against the profile's policy.
///
/// `Some(0)` disables monitoring, `None` falls back to `thresholds`.
pub fn evaluate(
    age_days: i64,
    max_age: Option<u32>,
    thresholds: &AgeThresholds,
) -> Option<KeyAgeStatus> {
    match max_age {
        Some(0) => None,
        Some(max_age) => expiry_status(age_days, max_age),
        None => age_status(age_days, thresholds),
    }
}
