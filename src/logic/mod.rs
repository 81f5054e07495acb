//! Logic Module - Detection Engines
//!
//! ## Structure
//! - `radio/` - hardware code decoding, `NormalizedFrame`
//! - `registry/` - per-device baseline store
//! - `detector` - tolerance band check, `Verdict`
//! - `resolver` - device identifier from frame headers
//! - `pipeline/` - per-frame flow, frame sources, sink traits
//! - `telemetry/` - output records (JSON lines)
//! - `audit/` - CSV packet log
//! - `config`, `gateway`, `shutdown` - startup context and lifecycle

pub mod config;
pub mod gateway;
pub mod shutdown;

pub mod radio;
pub mod registry;
pub mod detector;
pub mod resolver;

pub mod pipeline;
pub mod telemetry;
pub mod audit;
