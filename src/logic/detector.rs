//! Anomaly Detector - RSSI Tolerance Band Check
//!
//! Compares each frame's RSSI against the band around its device baseline:
//!
//! ```text
//! margin = |baseline| * tolerance
//! band   = [baseline - margin, baseline + margin]
//! ```
//!
//! Both bounds are inclusive. The first frame of a device defines the
//! baseline and is always within tolerance.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logic::config::Tolerance;
use crate::logic::radio::NormalizedFrame;
use crate::logic::registry::{DeviceId, DeviceRegistry};

/// Absorbs binary float noise at the band edges (e.g. -119 * 0.1)
const BOUND_EPSILON_DB: f64 = 1e-9;

// ============================================================================
// TOLERANCE BAND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBand {
    pub lower_dbm: f64,
    pub upper_dbm: f64,
}

impl ToleranceBand {
    pub fn around(baseline_dbm: f64, tolerance: Tolerance) -> Self {
        let margin = baseline_dbm.abs() * tolerance.fraction();
        Self {
            lower_dbm: baseline_dbm - margin,
            upper_dbm: baseline_dbm + margin,
        }
    }

    pub fn contains(&self, rssi_dbm: f64) -> bool {
        rssi_dbm >= self.lower_dbm - BOUND_EPSILON_DB && rssi_dbm <= self.upper_dbm + BOUND_EPSILON_DB
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Outcome of evaluating one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub device_id: DeviceId,
    pub observed_rssi_dbm: f64,
    pub baseline_rssi_dbm: f64,
    pub tolerance: f64,
    pub lower_bound_dbm: f64,
    pub upper_bound_dbm: f64,
    pub within_tolerance: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl Verdict {
    /// Signed difference, observed minus baseline
    pub fn deviation_db(&self) -> f64 {
        self.observed_rssi_dbm - self.baseline_rssi_dbm
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    tolerance: Tolerance,
    overrides: HashMap<DeviceId, Tolerance>,
}

impl AnomalyDetector {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            overrides: HashMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<DeviceId, Tolerance>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn tolerance_for(&self, device_id: &DeviceId) -> Tolerance {
        self.overrides.get(device_id).copied().unwrap_or(self.tolerance)
    }

    /// Evaluate one frame against its device baseline.
    ///
    /// Returns `None` for frames without a device identifier; those are
    /// never evaluated and leave the registry untouched.
    pub fn evaluate(&self, frame: &NormalizedFrame, registry: &DeviceRegistry) -> Option<Verdict> {
        let device_id = frame.device_id.as_ref()?;
        let baseline = registry.lookup_or_create(
            device_id,
            frame.rssi_dbm,
            self.tolerance_for(device_id),
            frame.captured_at,
        );

        let band = ToleranceBand::around(baseline.baseline_rssi_dbm, baseline.tolerance);
        let within_tolerance = baseline.is_first_observation() || band.contains(frame.rssi_dbm);

        if !within_tolerance {
            log::warn!(
                "Device {} RSSI {:.1} dBm outside [{:.1}, {:.1}] (baseline {:.1} dBm, sample {})",
                device_id,
                frame.rssi_dbm,
                band.lower_dbm,
                band.upper_dbm,
                baseline.baseline_rssi_dbm,
                baseline.sample_count
            );
        }

        Some(Verdict {
            device_id: device_id.clone(),
            observed_rssi_dbm: frame.rssi_dbm,
            baseline_rssi_dbm: baseline.baseline_rssi_dbm,
            tolerance: baseline.tolerance.fraction(),
            lower_bound_dbm: band.lower_dbm,
            upper_bound_dbm: band.upper_dbm,
            within_tolerance,
            evaluated_at: Utc::now(),
        })
    }
}
