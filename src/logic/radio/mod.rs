//! Radio Module - Frame Metadata Normalizer
//!
//! Translates concentrator-specific metadata codes into canonical values.
//!
//! # Architecture
//! - `codes.rs`: hardware code enums (one variant per HAL code)
//! - `types.rs`: `RawFrame`, canonical values, `NormalizedFrame`
//!
//! # Failure Strategy
//! Normalization is total. Unknown codes become `Undefined` and are logged;
//! a frame is never rejected because of its metadata.

pub mod codes;
pub mod types;
#[cfg(test)]
mod tests;

use codes::{HwBandwidth, HwCoderate, HwCrcStatus, HwLoraDatarate, HwModulation};

pub use types::{
    Bandwidth, CodeRate, CrcStatus, DataRate, Modulation, NormalizedFrame, RawFrame,
    SF_UNDEFINED,
};

/// Normalize one raw frame. The device identifier is left unresolved.
pub fn normalize(raw: &RawFrame) -> NormalizedFrame {
    let modulation = decode_modulation(raw.modulation);

    let declared = usize::from(raw.size);
    let available = declared.min(raw.payload.len());
    if available < declared {
        log::debug!(
            "Payload shorter than declared size ({} < {} bytes), rendering available bytes",
            raw.payload.len(),
            declared
        );
    }

    NormalizedFrame {
        device_id: None,
        captured_at: raw.captured_at,
        count_us: raw.count_us,
        frequency_hz: raw.freq_hz,
        rf_chain: raw.rf_chain,
        if_chain: raw.if_chain,
        crc_status: decode_crc_status(raw.status),
        payload_size: raw.size,
        modulation,
        bandwidth: decode_bandwidth(raw.bandwidth),
        datarate: decode_datarate(modulation, raw.datarate),
        code_rate: decode_code_rate(raw.coderate),
        rssi_dbm: raw.rssi,
        snr_db: raw.snr,
        payload: raw.payload[..available].to_vec(),
    }
}

fn decode_modulation(code: u8) -> Modulation {
    match HwModulation::from_code(code) {
        Some(hw) => hw.into(),
        None => {
            log::warn!("Unrecognized modulation code 0x{:02X}", code);
            Modulation::Undefined
        }
    }
}

fn decode_bandwidth(code: u8) -> Bandwidth {
    match HwBandwidth::from_code(code) {
        Some(hw) => hw.into(),
        None => {
            log::warn!("Unrecognized bandwidth code 0x{:02X}", code);
            Bandwidth::Undefined
        }
    }
}

/// Datarate meaning depends on modulation
fn decode_datarate(modulation: Modulation, code: u32) -> DataRate {
    match modulation {
        Modulation::Lora => match HwLoraDatarate::from_code(code) {
            Some(hw) => hw.into(),
            None => {
                log::warn!("Unrecognized LoRa datarate code 0x{:02X}", code);
                DataRate::Undefined
            }
        },
        Modulation::Fsk => DataRate::FskBps(code),
        Modulation::Undefined => DataRate::Undefined,
    }
}

fn decode_code_rate(code: u8) -> CodeRate {
    match HwCoderate::from_code(code) {
        Some(hw) => hw.into(),
        None => {
            log::warn!("Unrecognized coderate code 0x{:02X}", code);
            CodeRate::Undefined
        }
    }
}

fn decode_crc_status(code: u8) -> CrcStatus {
    match HwCrcStatus::from_code(code) {
        Some(hw) => hw.into(),
        None => {
            log::warn!("Unrecognized CRC status code 0x{:02X}", code);
            CrcStatus::Undefined
        }
    }
}
