//! Device identifier resolution
//!
//! The normalizer leaves `device_id` empty; a resolver names the sender
//! from the frame contents before evaluation. Frames nobody can name are
//! logged for audit but never evaluated.

use crate::logic::radio::{CrcStatus, Modulation, NormalizedFrame};
use crate::logic::registry::DeviceId;

/// MHDR(1) + DevAddr(4) + FCtrl(1) + FCnt(2) + MIC(4)
const MIN_DATA_FRAME_LEN: usize = 12;

const MTYPE_UNCONFIRMED_DATA_UP: u8 = 0b010;
const MTYPE_CONFIRMED_DATA_UP: u8 = 0b100;
const MAJOR_LORAWAN_R1: u8 = 0b00;

pub trait DeviceResolver: Send {
    fn resolve(&self, frame: &NormalizedFrame) -> Option<DeviceId>;
}

/// Leaves every frame unresolved
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResolver;

impl DeviceResolver for NoResolver {
    fn resolve(&self, _frame: &NormalizedFrame) -> Option<DeviceId> {
        None
    }
}

/// Reads the DevAddr of LoRaWAN uplink data frames.
///
/// Only CRC-valid LoRa frames are trusted; join requests and downlinks
/// carry no DevAddr and stay unresolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevAddrResolver;

impl DeviceResolver for DevAddrResolver {
    fn resolve(&self, frame: &NormalizedFrame) -> Option<DeviceId> {
        if frame.modulation != Modulation::Lora || frame.crc_status != CrcStatus::Ok {
            return None;
        }

        let payload = &frame.payload;
        if payload.len() < MIN_DATA_FRAME_LEN {
            return None;
        }

        let mhdr = payload[0];
        let mtype = mhdr >> 5;
        let major = mhdr & 0b11;
        if major != MAJOR_LORAWAN_R1
            || (mtype != MTYPE_UNCONFIRMED_DATA_UP && mtype != MTYPE_CONFIRMED_DATA_UP)
        {
            return None;
        }

        // DevAddr is little-endian on air
        let dev_addr = u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
        Some(DeviceId::from_dev_addr(dev_addr))
    }
}
