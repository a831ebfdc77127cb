// src/error.rs
//! Error types for GLL fix acquisition

use std::fmt;

pub type Result<T> = std::result::Result<T, GpsError>;

#[derive(Debug)]
pub enum GpsError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    Config(String),
}

impl fmt::Display for GpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpsError::Io(e) => write!(f, "IO error: {}", e),
            GpsError::Serial(e) => write!(f, "Serial error: {}", e),
            GpsError::Json(e) => write!(f, "JSON error: {}", e),
            GpsError::Connection(msg) => write!(f, "Connection error: {}", msg),
            GpsError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for GpsError {}

impl From<std::io::Error> for GpsError {
    fn from(error: std::io::Error) -> Self {
        GpsError::Io(error)
    }
}

impl From<tokio_serial::Error> for GpsError {
    fn from(error: tokio_serial::Error) -> Self {
        GpsError::Serial(error)
    }
}

impl From<serde_json::Error> for GpsError {
    fn from(error: serde_json::Error) -> Self {
        GpsError::Json(error)
    }
}

/// Why a candidate frame did not yield a position fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum MalformedReason {
    /// The frame body grew past the frame capacity before a `*` arrived.
    Overflow,
    /// The XOR checksum over the body did not match the declared suffix.
    ChecksumMismatch,
    /// The sentence identifier was not `GPGLL`.
    WrongType,
    /// The body contained bytes that are not ASCII text.
    NotAscii,
    /// Fewer than eight comma-delimited fields.
    IncompleteFields,
    /// More than eight comma-delimited fields.
    ExtraFields,
    /// Status field other than `A` or `V`.
    UnknownStatus,
    /// Empty latitude, longitude, time or mode on a fix that claims to be valid.
    MissingField,
    /// Empty N/S or E/W field on a fix that claims to be valid.
    MissingHemisphere,
    /// N/S or E/W field holding some other letter.
    InvalidHemisphere,
}

impl MalformedReason {
    /// Whether this reason ends an acquisition instead of consuming one attempt.
    ///
    /// Link noise (overflow, bad checksum, other sentence types) is expected on
    /// a shared receiver stream and only costs an attempt. Field errors in an
    /// authenticated `GPGLL` sentence are reported to the caller.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            MalformedReason::Overflow
                | MalformedReason::ChecksumMismatch
                | MalformedReason::WrongType
                | MalformedReason::NotAscii
        )
    }
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MalformedReason::Overflow => "frame exceeded capacity",
            MalformedReason::ChecksumMismatch => "checksum mismatch",
            MalformedReason::WrongType => "not a GPGLL sentence",
            MalformedReason::NotAscii => "non-ASCII bytes in sentence",
            MalformedReason::IncompleteFields => "fewer than 8 fields",
            MalformedReason::ExtraFields => "more than 8 fields",
            MalformedReason::UnknownStatus => "status is neither A nor V",
            MalformedReason::MissingField => "field missing on valid fix",
            MalformedReason::MissingHemisphere => "hemisphere missing on valid fix",
            MalformedReason::InvalidHemisphere => "unrecognised hemisphere",
        };
        f.write_str(text)
    }
}
