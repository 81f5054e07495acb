//! Concentrator Hardware Codes
//!
//! Raw enumeration values reported by the SX1301 HAL for every received
//! packet. Each enum lists exactly the codes the HAL defines; anything else
//! fails `from_code` and is treated as undefined by the normalizer.
//! Adding a variant here forces the matching `From` impl in `types.rs` to
//! be updated.

/// `MOD_*` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HwModulation {
    Undefined = 0x00,
    Lora = 0x10,
    Fsk = 0x20,
}

impl HwModulation {
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Undefined),
            0x10 => Some(Self::Lora),
            0x20 => Some(Self::Fsk),
            _ => None,
        }
    }
}

/// `BW_*` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HwBandwidth {
    Undefined = 0x00,
    Bw500kHz = 0x01,
    Bw250kHz = 0x02,
    Bw125kHz = 0x03,
    Bw62k5Hz = 0x04,
    Bw31k2Hz = 0x05,
    Bw15k6Hz = 0x06,
    Bw7k8Hz = 0x07,
}

impl HwBandwidth {
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Undefined),
            0x01 => Some(Self::Bw500kHz),
            0x02 => Some(Self::Bw250kHz),
            0x03 => Some(Self::Bw125kHz),
            0x04 => Some(Self::Bw62k5Hz),
            0x05 => Some(Self::Bw31k2Hz),
            0x06 => Some(Self::Bw15k6Hz),
            0x07 => Some(Self::Bw7k8Hz),
            _ => None,
        }
    }
}

/// `DR_LORA_*` codes. Only meaningful for LoRa modulation; FSK frames carry
/// the datarate in bits per second in the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HwLoraDatarate {
    Undefined = 0x00,
    Sf7 = 0x02,
    Sf8 = 0x04,
    Sf9 = 0x08,
    Sf10 = 0x10,
    Sf11 = 0x20,
    Sf12 = 0x40,
}

impl HwLoraDatarate {
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0x00 => Some(Self::Undefined),
            0x02 => Some(Self::Sf7),
            0x04 => Some(Self::Sf8),
            0x08 => Some(Self::Sf9),
            0x10 => Some(Self::Sf10),
            0x20 => Some(Self::Sf11),
            0x40 => Some(Self::Sf12),
            _ => None,
        }
    }
}

/// `CR_*` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HwCoderate {
    Undefined = 0x00,
    Cr4_5 = 0x01,
    Cr4_6 = 0x02,
    Cr4_7 = 0x03,
    Cr4_8 = 0x04,
}

impl HwCoderate {
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Undefined),
            0x01 => Some(Self::Cr4_5),
            0x02 => Some(Self::Cr4_6),
            0x03 => Some(Self::Cr4_7),
            0x04 => Some(Self::Cr4_8),
            _ => None,
        }
    }
}

/// `STAT_*` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HwCrcStatus {
    Undefined = 0x00,
    NoCrc = 0x01,
    CrcOk = 0x10,
    CrcBad = 0x11,
}

impl HwCrcStatus {
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Undefined),
            0x01 => Some(Self::NoCrc),
            0x10 => Some(Self::CrcOk),
            0x11 => Some(Self::CrcBad),
            _ => None,
        }
    }
}
