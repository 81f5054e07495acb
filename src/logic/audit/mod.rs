//! Audit Module - CSV Packet Log
//!
//! Every received frame is logged, including frames whose sender could not
//! be identified.
//!
//! # Architecture
//! - `format.rs`: header and line layout
//! - `writer.rs`: `AuditLog`, file handling and age-based rotation
//!
//! # Failure Strategy
//! Write errors surface as `SinkError`; the pipeline logs and drops them.
//! Detection never stops because the audit log is unavailable.

pub mod format;
pub mod writer;

pub use writer::AuditLog;
