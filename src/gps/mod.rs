// src/gps/mod.rs
//! GLL sentence acquisition: framing, checksum, parsing and the retry loop

pub mod acquire;
pub mod checksum;
pub mod data;
pub mod frame;
pub mod link;
pub mod nmea;
pub mod source;

pub use acquire::{AcquisitionController, AcquisitionOutcome, AcquisitionStats};
pub use data::{EastWest, FixRecord, FixStatus, NorthSouth, PositionFix};
