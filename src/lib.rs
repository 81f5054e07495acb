//! LoRa RSSI Relocation Detector
//!
//! Remembers the RSSI of each end-device's first frame and flags later
//! frames that fall outside a tolerance band around it. A cloned or moved
//! device usually shows up at a different signal strength even when its
//! LoRaWAN credentials still check out.

pub mod constants;
pub mod logic;

pub use logic::config::{Config, ConfigError, Tolerance};
pub use logic::detector::{AnomalyDetector, ToleranceBand, Verdict};
pub use logic::pipeline::{DetectionPipeline, PipelineError, PipelineStats};
pub use logic::radio::{normalize, NormalizedFrame, RawFrame};
pub use logic::registry::{DeviceBaseline, DeviceId, DeviceRegistry};
