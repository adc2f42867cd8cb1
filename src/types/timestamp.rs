//! Timestamp data type implementation

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// UTC instant with nanosecond precision
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Seconds since Unix epoch
    secs: i64,
    /// Sub-second nanoseconds, always < 1e9
    nanos: u32,
}

impl Timestamp {
    pub(crate) const NANOS_PER_SEC: u32 = 1_000_000_000;

    /// Latest second whose microsecond count fits in an `i64`
    pub const MAX_SECS: i64 = i64::MAX / 1_000_000 - 1;
    /// Earliest second whose microsecond count fits in an `i64`
    pub const MIN_SECS: i64 = i64::MIN / 1_000_000;

    /// Create a timestamp from seconds and sub-second nanoseconds.
    /// Nanoseconds past one second carry into `secs`, saturating at the
    /// `i64` bounds.
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self {
            secs: secs.saturating_add((nanos / Self::NANOS_PER_SEC) as i64),
            nanos: nanos % Self::NANOS_PER_SEC,
        }
    }

    /// Create a timestamp from microseconds
    pub fn from_micros(micros: i64) -> Self {
        Self {
            secs: micros.div_euclid(1_000_000),
            nanos: (micros.rem_euclid(1_000_000) * 1000) as u32,
        }
    }

    /// Create a timestamp from milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Self {
            secs: millis.div_euclid(1000),
            nanos: (millis.rem_euclid(1000) * 1_000_000) as u32,
        }
    }

    /// Create a timestamp from seconds
    pub fn from_secs(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }

    /// Get current timestamp (falls back to the epoch if the clock is before it)
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self::new(d.as_secs() as i64, d.subsec_nanos()))
            .unwrap_or_default()
    }

    /// Get timestamp in seconds
    pub fn as_secs(&self) -> i64 {
        self.secs
    }

    /// Sub-second nanoseconds
    pub fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// Get timestamp in milliseconds, saturating outside the `i64` range
    pub fn as_millis(&self) -> i64 {
        self.secs
            .saturating_mul(1000)
            .saturating_add((self.nanos / 1_000_000) as i64)
    }

    /// Get timestamp in microseconds, saturating outside the `i64` range
    pub fn as_micros(&self) -> i64 {
        self.secs
            .saturating_mul(1_000_000)
            .saturating_add((self.nanos / 1000) as i64)
    }

    /// Shift by whole seconds, saturating at the `i64` bounds
    pub fn add_secs(&self, secs: i64) -> Self {
        Self {
            secs: self.secs.saturating_add(secs),
            nanos: self.nanos,
        }
    }
}
