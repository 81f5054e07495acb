//! Output record
//!
//! One record per evaluated frame. Field order is part of the downstream
//! contract: serde emits struct fields in declaration order.

use serde::Serialize;

use crate::logic::detector::Verdict;
use crate::logic::radio::NormalizedFrame;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OutputRecord {
    pub size: u32,
    /// Spreading factor, FSK datarate, or `SF_UNDEFINED`
    pub sf: u32,
    /// Hz, 0 when undefined
    pub bandwidth: u32,
    /// Denominator of 4/x, 0 when undefined
    pub code_rate: u32,
    /// Capture time, unix seconds
    pub timestamp: u64,
    pub phy_payload: String,
    pub rssi: f64,
    #[serde(flatten)]
    pub verdict: Option<VerdictFields>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VerdictFields {
    pub baseline_rssi: f64,
    /// observed - baseline, dB
    pub deviation: f64,
    pub within_tolerance: bool,
}

impl From<&Verdict> for VerdictFields {
    fn from(v: &Verdict) -> Self {
        Self {
            baseline_rssi: v.baseline_rssi_dbm,
            deviation: v.deviation_db(),
            within_tolerance: v.within_tolerance,
        }
    }
}

impl OutputRecord {
    pub fn from_frame(frame: &NormalizedFrame, verdict: Option<&Verdict>) -> Self {
        Self {
            size: u32::from(frame.payload_size),
            sf: frame.datarate.wire_value(),
            bandwidth: frame.bandwidth.as_hz(),
            code_rate: frame.code_rate.wire_value(),
            timestamp: frame.timestamp_secs(),
            phy_payload: frame.payload_hex(),
            rssi: frame.rssi_dbm,
            verdict: verdict.map(VerdictFields::from),
        }
    }

    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
