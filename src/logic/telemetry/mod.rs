//! Telemetry Module - Detector Output
//!
//! ## Structure
//! - `record.rs` - `OutputRecord`, the per-frame downstream record
//! - `emitter.rs` - JSON-lines writer implementing `OutputSink`

pub mod emitter;
pub mod record;

pub use emitter::TelemetryEmitter;
pub use record::{OutputRecord, VerdictFields};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::Tolerance;
    use crate::logic::detector::AnomalyDetector;
    use crate::logic::pipeline::OutputSink;
    use crate::logic::radio::{normalize, RawFrame, SF_UNDEFINED};
    use crate::logic::registry::{DeviceId, DeviceRegistry};
    use chrono::{TimeZone, Utc};

    fn raw() -> RawFrame {
        RawFrame {
            captured_at: Utc.with_ymd_and_hms(2018, 5, 1, 10, 0, 0).unwrap(),
            freq_hz: 868_100_000,
            status: 0x10,
            modulation: 0x10,
            bandwidth: 0x03,
            datarate: 0x08,
            coderate: 0x02,
            rssi: -119.0,
            snr: 7.5,
            size: 4,
            payload: vec![0x40, 0xaa, 0xbb, 0xcc],
            ..RawFrame::default()
        }
    }

    #[test]
    fn test_record_field_order_without_verdict() {
        let record = OutputRecord::from_frame(&normalize(&raw()), None);
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"SIZE":4,"SF":9,"BANDWIDTH":125000,"CODE_RATE":6,"TIMESTAMP":1525168800,"PHY_PAYLOAD":"40AABBCC","RSSI":-119.0}"#
        );
    }

    #[test]
    fn test_record_field_order_with_verdict() {
        let registry = DeviceRegistry::new();
        let detector = AnomalyDetector::new(Tolerance::new(0.1).unwrap());
        let id = Some(DeviceId::from("26011BDA"));

        detector.evaluate(&normalize(&raw()).with_device_id(id.clone()), &registry);
        let moved = normalize(&RawFrame { rssi: -100.0, ..raw() }).with_device_id(id);
        let verdict = detector.evaluate(&moved, &registry).unwrap();

        let record = OutputRecord::from_frame(&moved, Some(&verdict));
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"SIZE":4,"SF":9,"BANDWIDTH":125000,"CODE_RATE":6,"TIMESTAMP":1525168800,"PHY_PAYLOAD":"40AABBCC","RSSI":-100.0,"BASELINE_RSSI":-119.0,"DEVIATION":19.0,"WITHIN_TOLERANCE":false}"#
        );
    }

    #[test]
    fn test_undefined_values_use_sentinels() {
        let frame = normalize(&RawFrame {
            modulation: 0x00,
            bandwidth: 0x00,
            coderate: 0x00,
            ..raw()
        });
        let record = OutputRecord::from_frame(&frame, None);

        assert_eq!(record.sf, SF_UNDEFINED);
        assert_eq!(record.bandwidth, 0);
        assert_eq!(record.code_rate, 0);
    }

    #[test]
    fn test_emitter_writes_json_lines() {
        let mut emitter = TelemetryEmitter::new(Vec::new());
        let record = OutputRecord::from_frame(&normalize(&raw()), None);

        emitter.emit(&record).unwrap();
        emitter.emit(&record).unwrap();
        assert_eq!(emitter.emitted(), 2);

        let text = String::from_utf8(emitter.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["PHY_PAYLOAD"], "40AABBCC");
    }

    #[test]
    fn test_emitter_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("telemetry.jsonl");

        let mut emitter = TelemetryEmitter::create(&path).unwrap();
        emitter.emit(&OutputRecord::from_frame(&normalize(&raw()), None)).unwrap();
        drop(emitter);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
