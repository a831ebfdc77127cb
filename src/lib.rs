// src/lib.rs
//! GLL Fix Library
//!
//! Acquires NMEA GLL position fixes from a serial GPS receiver: frames the
//! raw byte stream, verifies checksums, and parses validated sentences into
//! typed records.

pub mod config;
pub mod error;
pub mod gps;
pub mod monitor;

// Re-export main types for convenience
pub use error::{GpsError, MalformedReason, Result};
pub use gps::{AcquisitionOutcome, PositionFix};
pub use monitor::{GpsMonitor, GpsSource};
