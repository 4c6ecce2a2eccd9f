//! Timestamp value object for immutable points in time.
//!
//! Every instant is held in UTC and truncated to millisecond precision, so a
//! value survives a round trip through epoch millis (or a `timestamptz`
//! column) unchanged regardless of the host's local timezone.

use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Immutable point in time, always UTC, millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>, dropping sub-millisecond digits.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(3))
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, ValidationError> {
        match Utc.timestamp_millis_opt(millis).single() {
            Some(dt) => Ok(Self(dt)),
            None => Err(ValidationError::invalid_format(
                "epoch_millis",
                format!("{} is outside the representable range", millis),
            )),
        }
    }

    /// Returns milliseconds since the Unix epoch.
    pub fn as_epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp offset forward by a std duration.
    ///
    /// Saturates at the maximum representable instant.
    pub fn plus(&self, duration: std::time::Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        let shifted = Duration::try_milliseconds(millis)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::from_datetime(shifted)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
