use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::config::Tolerance;

// ============================================================================
// DEVICE IDENTIFIER
// ============================================================================

/// Identifier of an end-device as resolved from its frames (e.g. DevAddr)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 32-bit LoRaWAN device address, rendered as 8 upper-case hex digits
    pub fn from_dev_addr(dev_addr: u32) -> Self {
        Self(format!("{:08X}", dev_addr))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// DEVICE BASELINE
// ============================================================================

/// Reference RSSI recorded from a device's first observed frame.
///
/// Only the registry creates and updates baselines; callers receive copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBaseline {
    pub device_id: DeviceId,
    /// Fixed at creation, "first seen wins"
    pub baseline_rssi_dbm: f64,
    pub tolerance: Tolerance,
    pub first_seen_at: DateTime<Utc>,
    pub last_observed_at: DateTime<Utc>,
    /// Frames evaluated for this device, including the first
    pub sample_count: u64,
}

impl DeviceBaseline {
    pub fn new(device_id: DeviceId, rssi_dbm: f64, tolerance: Tolerance, now: DateTime<Utc>) -> Self {
        Self {
            device_id,
            baseline_rssi_dbm: rssi_dbm,
            tolerance,
            first_seen_at: now,
            last_observed_at: now,
            sample_count: 1,
        }
    }

    /// Bookkeeping for a repeat observation; the baseline value is untouched
    pub(crate) fn observe(&mut self, now: DateTime<Utc>) {
        self.sample_count += 1;
        self.last_observed_at = now;
    }

    pub fn is_first_observation(&self) -> bool {
        self.sample_count == 1
    }
}
