use chrono::{TimeZone, Utc};

use super::{normalize, Bandwidth, CodeRate, CrcStatus, DataRate, Modulation, RawFrame, SF_UNDEFINED};

fn lora_frame() -> RawFrame {
    RawFrame {
        captured_at: Utc.with_ymd_and_hms(2018, 5, 1, 10, 0, 0).unwrap(),
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
fn test_normalize_lora_frame() {
    let frame = normalize(&lora_frame());

    assert_eq!(frame.device_id, None);
    assert_eq!(frame.modulation, Modulation::Lora);
    assert_eq!(frame.bandwidth, Bandwidth::Hz(125_000));
    assert_eq!(frame.datarate, DataRate::LoraSf(7));
    assert_eq!(frame.code_rate, CodeRate::Cr4_5);
    assert_eq!(frame.crc_status, CrcStatus::Ok);
    assert_eq!(frame.frequency_hz, 868_100_000);
    assert_eq!(frame.if_chain, 2);
    assert_eq!(frame.payload_size, 4);
    assert_eq!(frame.rssi_dbm, -119.0);
    assert_eq!(frame.snr_db, 7.5);
    assert_eq!(frame.payload_hex(), "40AABBCC");
}

#[test]
fn test_all_lora_spreading_factors() {
    let table = [(0x02, 7), (0x04, 8), (0x08, 9), (0x10, 10), (0x20, 11), (0x40, 12)];
    for (code, sf) in table {
        let raw = RawFrame { datarate: code, ..lora_frame() };
        assert_eq!(normalize(&raw).datarate, DataRate::LoraSf(sf), "code 0x{:02X}", code);
    }
}

#[test]
fn test_all_bandwidths() {
    let table = [
        (0x01, 500_000),
        (0x02, 250_000),
        (0x03, 125_000),
        (0x04, 62_500),
        (0x05, 31_200),
        (0x06, 15_600),
        (0x07, 7_800),
    ];
    for (code, hz) in table {
        let raw = RawFrame { bandwidth: code, ..lora_frame() };
        assert_eq!(normalize(&raw).bandwidth.as_hz(), hz);
    }
}

#[test]
fn test_fsk_carries_datarate_through() {
    let raw = RawFrame { modulation: 0x20, datarate: 50_000, ..lora_frame() };
    let frame = normalize(&raw);

    assert_eq!(frame.modulation, Modulation::Fsk);
    assert_eq!(frame.datarate, DataRate::FskBps(50_000));
    assert_eq!(frame.datarate.wire_value(), 50_000);
}

#[test]
fn test_undefined_modulation_has_no_spreading_factor() {
    let raw = RawFrame { modulation: 0x00, ..lora_frame() };
    let frame = normalize(&raw);

    assert_eq!(frame.modulation, Modulation::Undefined);
    assert_eq!(frame.datarate, DataRate::Undefined);
    assert_eq!(frame.datarate.wire_value(), SF_UNDEFINED);
}

#[test]
fn test_unrecognized_codes_map_to_undefined() {
    let raw = RawFrame {
        modulation: 0x7F,
        bandwidth: 0x99,
        coderate: 0x42,
        status: 0x33,
        ..lora_frame()
    };
    let frame = normalize(&raw);

    assert_eq!(frame.modulation, Modulation::Undefined);
    assert_eq!(frame.bandwidth, Bandwidth::Undefined);
    assert_eq!(frame.bandwidth.as_hz(), 0);
    assert_eq!(frame.datarate, DataRate::Undefined);
    assert_eq!(frame.code_rate, CodeRate::Undefined);
    assert_eq!(frame.code_rate.wire_value(), 0);
    assert_eq!(frame.crc_status, CrcStatus::Undefined);
    // The rest of the frame survives
    assert_eq!(frame.rssi_dbm, -119.0);
    assert_eq!(frame.payload_hex(), "40AABBCC");
}

#[test]
fn test_unrecognized_lora_datarate() {
    let raw = RawFrame { datarate: 0x03, ..lora_frame() };
    assert_eq!(normalize(&raw).datarate, DataRate::Undefined);
}

#[test]
fn test_sentinel_codes_map_to_undefined() {
    let raw = RawFrame {
        bandwidth: 0x00,
        coderate: 0x00,
        status: 0x00,
        datarate: 0x00,
        ..lora_frame()
    };
    let frame = normalize(&raw);

    assert_eq!(frame.bandwidth, Bandwidth::Undefined);
    assert_eq!(frame.code_rate, CodeRate::Undefined);
    assert_eq!(frame.crc_status, CrcStatus::Undefined);
    assert_eq!(frame.datarate, DataRate::Undefined);
}

#[test]
fn test_crc_status_table() {
    for (code, expected) in [
        (0x10, CrcStatus::Ok),
        (0x11, CrcStatus::Bad),
        (0x01, CrcStatus::Absent),
        (0x00, CrcStatus::Undefined),
    ] {
        let raw = RawFrame { status: code, ..lora_frame() };
        assert_eq!(normalize(&raw).crc_status, expected);
    }
}

#[test]
fn test_code_rate_values() {
    let raw = RawFrame { coderate: 0x04, ..lora_frame() };
    let frame = normalize(&raw);

    assert_eq!(frame.code_rate.numerator(), Some(4));
    assert_eq!(frame.code_rate.denominator(), Some(8));
    assert_eq!(frame.code_rate.wire_value(), 8);
    assert_eq!(frame.code_rate.label().as_deref(), Some("4/8"));
    assert_eq!(CodeRate::Undefined.label(), None);
}

#[test]
fn test_payload_truncated_to_declared_size() {
    let raw = RawFrame { size: 2, ..lora_frame() };
    assert_eq!(normalize(&raw).payload_hex(), "40AA");
}

#[test]
fn test_short_payload_buffer_is_not_fatal() {
    let raw = RawFrame { size: 10, ..lora_frame() };
    let frame = normalize(&raw);

    assert_eq!(frame.payload_size, 10);
    assert_eq!(frame.payload_hex(), "40AABBCC");
}

#[test]
fn test_raw_frame_from_json() {
    let line = r#"{"captured_at":"2018-05-01T10:00:00Z","count_us":1234,"freq_hz":868100000,
        "rf_chain":0,"if_chain":2,"status":16,"modulation":16,"bandwidth":3,
        "datarate":2,"coderate":1,"rssi":-119.0,"snr":7.5,"size":4,"payload":"40aabbcc"}"#;
    let raw: RawFrame = serde_json::from_str(line).unwrap();

    assert_eq!(raw, lora_frame());
}
