//! Radio Frame Types
//!
//! `RawFrame` is what the frame source hands over; everything else is the
//! canonical, hardware-independent view produced by the normalizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codes::{HwBandwidth, HwCoderate, HwCrcStatus, HwLoraDatarate, HwModulation};
use crate::logic::registry::DeviceId;

/// Wire value for an undefined spreading factor (`(uint32_t)-1` downstream)
pub const SF_UNDEFINED: u32 = u32::MAX;

// ============================================================================
// RAW FRAME (input)
// ============================================================================

/// Packet metadata exactly as reported by the concentrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Host time the batch was fetched (UTC)
    pub captured_at: DateTime<Utc>,
    /// Concentrator internal counter (microseconds)
    #[serde(default)]
    pub count_us: u32,
    pub freq_hz: u32,
    #[serde(default)]
    pub rf_chain: u8,
    #[serde(default)]
    pub if_chain: u8,
    pub status: u8,
    pub modulation: u8,
    pub bandwidth: u8,
    /// `DR_LORA_*` code for LoRa, bits per second for FSK
    pub datarate: u32,
    pub coderate: u8,
    pub rssi: f64,
    pub snr: f64,
    pub size: u16,
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
}

// ============================================================================
// CANONICAL VALUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modulation {
    Lora,
    Fsk,
    Undefined,
}

impl Modulation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modulation::Lora => "LORA",
            Modulation::Fsk => "FSK",
            Modulation::Undefined => "UNDEFINED",
        }
    }
}

impl From<HwModulation> for Modulation {
    fn from(code: HwModulation) -> Self {
        match code {
            HwModulation::Lora => Modulation::Lora,
            HwModulation::Fsk => Modulation::Fsk,
            HwModulation::Undefined => Modulation::Undefined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bandwidth {
    Hz(u32),
    Undefined,
}

impl Bandwidth {
    /// Bandwidth in Hz, 0 when undefined
    pub fn as_hz(&self) -> u32 {
        match self {
            Bandwidth::Hz(hz) => *hz,
            Bandwidth::Undefined => 0,
        }
    }
}

impl From<HwBandwidth> for Bandwidth {
    fn from(code: HwBandwidth) -> Self {
        match code {
            HwBandwidth::Bw500kHz => Bandwidth::Hz(500_000),
            HwBandwidth::Bw250kHz => Bandwidth::Hz(250_000),
            HwBandwidth::Bw125kHz => Bandwidth::Hz(125_000),
            HwBandwidth::Bw62k5Hz => Bandwidth::Hz(62_500),
            HwBandwidth::Bw31k2Hz => Bandwidth::Hz(31_200),
            HwBandwidth::Bw15k6Hz => Bandwidth::Hz(15_600),
            HwBandwidth::Bw7k8Hz => Bandwidth::Hz(7_800),
            HwBandwidth::Undefined => Bandwidth::Undefined,
        }
    }
}

/// Spreading factor for LoRa, raw datarate for FSK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataRate {
    LoraSf(u8),
    FskBps(u32),
    Undefined,
}

impl DataRate {
    /// SF number, bits per second, or `SF_UNDEFINED`
    pub fn wire_value(&self) -> u32 {
        match self {
            DataRate::LoraSf(sf) => u32::from(*sf),
            DataRate::FskBps(bps) => *bps,
            DataRate::Undefined => SF_UNDEFINED,
        }
    }
}

impl From<HwLoraDatarate> for DataRate {
    fn from(code: HwLoraDatarate) -> Self {
        match code {
            HwLoraDatarate::Sf7 => DataRate::LoraSf(7),
            HwLoraDatarate::Sf8 => DataRate::LoraSf(8),
            HwLoraDatarate::Sf9 => DataRate::LoraSf(9),
            HwLoraDatarate::Sf10 => DataRate::LoraSf(10),
            HwLoraDatarate::Sf11 => DataRate::LoraSf(11),
            HwLoraDatarate::Sf12 => DataRate::LoraSf(12),
            HwLoraDatarate::Undefined => DataRate::Undefined,
        }
    }
}

/// LoRa forward error correction rate, always 4/x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeRate {
    Cr4_5,
    Cr4_6,
    Cr4_7,
    Cr4_8,
    Undefined,
}

impl CodeRate {
    pub fn numerator(&self) -> Option<u8> {
        match self {
            CodeRate::Undefined => None,
            _ => Some(4),
        }
    }

    pub fn denominator(&self) -> Option<u8> {
        match self {
            CodeRate::Cr4_5 => Some(5),
            CodeRate::Cr4_6 => Some(6),
            CodeRate::Cr4_7 => Some(7),
            CodeRate::Cr4_8 => Some(8),
            CodeRate::Undefined => None,
        }
    }

    /// Denominator, 0 when undefined
    pub fn wire_value(&self) -> u32 {
        self.denominator().map(u32::from).unwrap_or(0)
    }

    /// "4/5" style label, `None` when undefined
    pub fn label(&self) -> Option<String> {
        match (self.numerator(), self.denominator()) {
            (Some(n), Some(d)) => Some(format!("{}/{}", n, d)),
            _ => None,
        }
    }
}

impl From<HwCoderate> for CodeRate {
    fn from(code: HwCoderate) -> Self {
        match code {
            HwCoderate::Cr4_5 => CodeRate::Cr4_5,
            HwCoderate::Cr4_6 => CodeRate::Cr4_6,
            HwCoderate::Cr4_7 => CodeRate::Cr4_7,
            HwCoderate::Cr4_8 => CodeRate::Cr4_8,
            HwCoderate::Undefined => CodeRate::Undefined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrcStatus {
    Ok,
    Bad,
    Absent,
    Undefined,
}

impl From<HwCrcStatus> for CrcStatus {
    fn from(code: HwCrcStatus) -> Self {
        match code {
            HwCrcStatus::CrcOk => CrcStatus::Ok,
            HwCrcStatus::CrcBad => CrcStatus::Bad,
            HwCrcStatus::NoCrc => CrcStatus::Absent,
            HwCrcStatus::Undefined => CrcStatus::Undefined,
        }
    }
}

// ============================================================================
// NORMALIZED FRAME
// ============================================================================

/// Canonical view of one received packet.
///
/// Built once by the normalizer; the device identifier is attached by the
/// pipeline's resolver before the frame is evaluated. Never modified after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFrame {
    /// `None` until higher-layer parsing can name the sender
    pub device_id: Option<DeviceId>,
    pub captured_at: DateTime<Utc>,
    pub count_us: u32,
    pub frequency_hz: u32,
    pub rf_chain: u8,
    pub if_chain: u8,
    pub crc_status: CrcStatus,
    pub payload_size: u16,
    pub modulation: Modulation,
    pub bandwidth: Bandwidth,
    pub datarate: DataRate,
    pub code_rate: CodeRate,
    pub rssi_dbm: f64,
    pub snr_db: f64,
    #[serde(serialize_with = "hex::serde::serialize_upper")]
    pub payload: Vec<u8>,
}

impl NormalizedFrame {
    pub fn with_device_id(mut self, device_id: Option<DeviceId>) -> Self {
        self.device_id = device_id;
        self
    }

    /// Payload as contiguous upper-case hex
    pub fn payload_hex(&self) -> String {
        hex::encode_upper(&self.payload)
    }

    /// Capture time as unix seconds (clamped at the epoch)
    pub fn timestamp_secs(&self) -> u64 {
        self.captured_at.timestamp().max(0) as u64
    }
}
