//! Packet log CSV layout
//!
//! Kept column-compatible with existing gateway packet logs, padding
//! included, so the files can be fed to the same tooling.

use std::fmt::Write;

use crate::logic::gateway::GatewayId;
use crate::logic::radio::{CrcStatus, DataRate, Modulation, NormalizedFrame};

pub const HEADER: &str = "\"gateway ID\",\"node MAC\",\"UTC timestamp\",\"us count\",\"frequency\",\"RF chain\",\"RX chain\",\"status\",\"size\",\"modulation\",\"bandwidth\",\"datarate\",\"coderate\",\"RSSI\",\"SNR\",\"payload\",\"messageType\",\"AppEUI\",\"DevEUI\",\"DevNonce\",\"MIC\",\"DevAddr\",\"AppNonce\",\"NetID\",\"DLSettings\",\"RxDelay\",\"CFList\",\"PHYPayload\",\"MHDR\",\"MACPayload\",\"FCtrl\",\"FHDR\",\"FCnt\",\"FPort\",\"FRMPayload\",\"FOpts\"";

/// LoRaWAN header columns present in the header but not populated
const RESERVED_COLUMNS: usize = 20;

/// One CSV line, without the trailing newline
pub fn format_line(gateway_id: GatewayId, frame: &NormalizedFrame) -> String {
    let mut line = String::with_capacity(256);

    let node = frame.device_id.as_ref().map(|d| d.as_str()).unwrap_or("");
    let _ = write!(
        line,
        "\"{}\",\"{}\",\"{}\",{:10},{:10},{},{:2},{},{},{},{},{},{},{:+.0},{:+5.1},\"{}\"",
        gateway_id,
        node,
        frame.captured_at.format("%Y-%m-%d %H:%M:%S%.3fZ"),
        frame.count_us,
        frame.frequency_hz,
        frame.rf_chain,
        frame.if_chain,
        status_column(frame.crc_status),
        frame.payload_size,
        modulation_column(frame.modulation),
        frame.bandwidth.as_hz(),
        datarate_column(frame.datarate),
        frame.code_rate.label().map(|l| format!("\"{}\"", l)).unwrap_or_default(),
        frame.rssi_dbm,
        frame.snr_db,
        grouped_hex(&frame.payload),
    );

    line.push_str(&",".repeat(RESERVED_COLUMNS));
    line
}

fn status_column(status: CrcStatus) -> &'static str {
    match status {
        CrcStatus::Ok => "\"CRC_OK\" ",
        CrcStatus::Bad => "\"CRC_BAD\"",
        CrcStatus::Absent => "\"NO_CRC\" ",
        CrcStatus::Undefined => "\"UNDEF\"  ",
    }
}

fn modulation_column(modulation: Modulation) -> &'static str {
    match modulation {
        Modulation::Lora => "\"LORA\"",
        Modulation::Fsk => "\"FSK\" ",
        Modulation::Undefined => "\"ERR\" ",
    }
}

fn datarate_column(datarate: DataRate) -> String {
    match datarate {
        DataRate::LoraSf(sf) => format!("\"SF{}\"", sf),
        DataRate::FskBps(bps) => bps.to_string(),
        DataRate::Undefined => String::new(),
    }
}

/// Upper-case hex in 32-bit words: `40AABBCC-DD`
fn grouped_hex(payload: &[u8]) -> String {
    let mut out = String::with_capacity(payload.len() * 2 + payload.len() / 4);
    for (i, chunk) in payload.chunks(4).enumerate() {
        if i > 0 {
            out.push('-');
        }
        out.push_str(&hex::encode_upper(chunk));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::radio::{normalize, RawFrame};
    use crate::logic::registry::DeviceId;
    use chrono::{Duration, TimeZone, Utc};

    fn raw() -> RawFrame {
        RawFrame {
            captured_at: Utc.with_ymd_and_hms(2018, 5, 1, 10, 0, 0).unwrap() + Duration::milliseconds(250),
            count_us: 1234,
            freq_hz: 868_100_000,
            rf_chain: 0,
            if_chain: 2,
            status: 0x10,
            modulation: 0x10,
            bandwidth: 0x03,
            datarate: 0x02,
            coderate: 0x01,
            rssi: -119.0,
            snr: 7.5,
            size: 4,
            payload: vec![0x40, 0xAA, 0xBB, 0xCC],
        }
    }

    #[test]
    fn test_header_has_36_columns() {
        assert_eq!(HEADER.split(',').count(), 36);
    }

    #[test]
    fn test_lora_line() {
        let frame = normalize(&raw()).with_device_id(Some(DeviceId::from("26011BDA")));
        let line = format_line(GatewayId(0xAA555A0000000101), &frame);

        assert_eq!(
            line,
            format!(
                "\"AA555A0000000101\",\"26011BDA\",\"2018-05-01 10:00:00.250Z\",      1234, 868100000,0, 2,\"CRC_OK\" ,4,\"LORA\",125000,\"SF7\",\"4/5\",-119, +7.5,\"40AABBCC\"{}",
                ",".repeat(20)
            )
        );
        assert_eq!(line.split(',').count(), HEADER.split(',').count());
    }

    #[test]
    fn test_fsk_line_with_unresolved_node() {
        let frame = normalize(&RawFrame {
            modulation: 0x20,
            datarate: 50_000,
            coderate: 0x00,
            status: 0x01,
            snr: -12.25,
            ..raw()
        });
        let line = format_line(GatewayId(1), &frame);

        assert!(line.starts_with("\"0000000000000001\",\"\","));
        assert!(line.contains(",\"NO_CRC\" ,4,\"FSK\" ,125000,50000,,-119,-12."));
    }

    #[test]
    fn test_payload_grouped_in_words() {
        assert_eq!(grouped_hex(&[]), "");
        assert_eq!(grouped_hex(&[0x01, 0x02, 0x03, 0x04]), "01020304");
        assert_eq!(grouped_hex(&[0x01, 0x02, 0x03, 0x04, 0x05]), "01020304-05");
        assert_eq!(grouped_hex(&[0xAB; 9]), "ABABABAB-ABABABAB-AB");
    }

    #[test]
    fn test_status_padding() {
        for status in [CrcStatus::Ok, CrcStatus::Bad, CrcStatus::Absent, CrcStatus::Undefined] {
            assert_eq!(status_column(status).len(), 9);
        }
    }
}
