//! Registry Module - Per-Device Baseline Store
//!
//! Maps device identifiers to their baseline RSSI record.
//!
//! # Architecture
//! - `types.rs`: `DeviceId`, `DeviceBaseline`
//!
//! # Concurrency
//! One map-wide `RwLock`: `lookup_or_create` and `reset` take the write
//! lock, `get` and the reporting helpers only read. Share the registry
//! between producers with an `Arc`.

pub mod types;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::logic::config::Tolerance;

pub use types::{DeviceBaseline, DeviceId};

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<DeviceId, DeviceBaseline>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation of `device_id`.
    ///
    /// Unknown devices get a new baseline at `observed_rssi_dbm`; known
    /// devices only have `sample_count` and `last_observed_at` updated.
    /// Returns a snapshot of the stored record after the update.
    pub fn lookup_or_create(
        &self,
        device_id: &DeviceId,
        observed_rssi_dbm: f64,
        tolerance: Tolerance,
        now: DateTime<Utc>,
    ) -> DeviceBaseline {
        let mut devices = self.devices.write();
        match devices.entry(device_id.clone()) {
            Entry::Occupied(mut entry) => {
                let baseline = entry.get_mut();
                baseline.observe(now);
                baseline.clone()
            }
            Entry::Vacant(entry) => {
                log::info!(
                    "New device {} baselined at {:.1} dBm (tolerance {})",
                    device_id,
                    observed_rssi_dbm,
                    tolerance
                );
                entry
                    .insert(DeviceBaseline::new(device_id.clone(), observed_rssi_dbm, tolerance, now))
                    .clone()
            }
        }
    }

    /// Non-mutating read
    pub fn get(&self, device_id: &DeviceId) -> Option<DeviceBaseline> {
        self.devices.read().get(device_id).cloned()
    }

    /// Forget a device so its next frame re-baselines from scratch
    pub fn reset(&self, device_id: &DeviceId) -> Option<DeviceBaseline> {
        let removed = self.devices.write().remove(device_id);
        if let Some(b) = &removed {
            log::info!(
                "Baseline for {} reset (was {:.1} dBm over {} samples)",
                device_id,
                b.baseline_rssi_dbm,
                b.sample_count
            );
        }
        removed
    }

    /// Forget every device
    pub fn reset_all(&self) -> usize {
        let mut devices = self.devices.write();
        let count = devices.len();
        devices.clear();
        log::info!("All {} device baselines reset", count);
        count
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// All baselines, ordered by device identifier
    pub fn snapshot(&self) -> Vec<DeviceBaseline> {
        let mut list: Vec<DeviceBaseline> = self.devices.read().values().cloned().collect();
        list.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        list
    }
}
