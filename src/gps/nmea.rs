// src/gps/nmea.rs
//! GLL sentence classification and parsing

use super::{
    data::{EastWest, FixStatus, NorthSouth, PositionFix},
    frame::CandidateFrame,
};
use crate::error::MalformedReason;

/// Sentence identifier of a GPS position fix.
pub const GLL_IDENTIFIER: &str = "GPGLL";

/// Number of fields in a GLL sentence, identifier included.
pub const GLL_FIELD_COUNT: usize = 8;

/// Latitude, longitude, time and mode positions.
const VALUE_FIELDS: [usize; 4] = [1, 3, 5, 7];

/// Split a sentence body on `,`, keeping empty fields in place.
pub fn tokenize(body: &str) -> Vec<&str> {
    body.split(',').collect()
}

/// Accept a checksum-verified frame as a GLL sentence and split its fields.
pub fn classify(frame: &CandidateFrame) -> Result<Vec<&str>, MalformedReason> {
    let body = frame.body();
    if !body.is_ascii() {
        return Err(MalformedReason::NotAscii);
    }
    let body = std::str::from_utf8(body).map_err(|_| MalformedReason::NotAscii)?;

    let fields = tokenize(body);
    if fields.first() != Some(&GLL_IDENTIFIER) {
        return Err(MalformedReason::WrongType);
    }
    Ok(fields)
}

/// Map the eight GLL fields onto a [`PositionFix`].
pub fn parse_fix(fields: &[&str]) -> Result<PositionFix, MalformedReason> {
    if fields.len() < GLL_FIELD_COUNT {
        return Err(MalformedReason::IncompleteFields);
    }
    if fields.len() > GLL_FIELD_COUNT {
        return Err(MalformedReason::ExtraFields);
    }

    // Status first: it decides whether empty hemispheres are acceptable
    let status = match fields[6] {
        "A" => FixStatus::Valid,
        "V" => FixStatus::Invalid,
        _ => return Err(MalformedReason::UnknownStatus),
    };

    // A valid fix carries every field; a void one may leave them empty
    if status == FixStatus::Valid && VALUE_FIELDS.iter().any(|&i| fields[i].is_empty()) {
        return Err(MalformedReason::MissingField);
    }

    let north_south = hemisphere(fields[2], status, NorthSouth::from_char)?;
    let east_west = hemisphere(fields[4], status, EastWest::from_char)?;

    Ok(PositionFix::new(
        fields[0], fields[1], north_south, fields[3], east_west, fields[5], status, fields[7],
    ))
}

/// Classify and parse a frame in one go.
pub fn parse_frame(frame: &CandidateFrame) -> Result<PositionFix, MalformedReason> {
    let fields = classify(frame)?;
    parse_fix(&fields)
}

fn hemisphere<T>(
    token: &str,
    status: FixStatus,
    from_char: fn(char) -> Option<T>,
) -> Result<Option<T>, MalformedReason> {
    match token.chars().next() {
        Some(c) => from_char(c)
            .map(Some)
            .ok_or(MalformedReason::InvalidHemisphere),
        None if status == FixStatus::Valid => Err(MalformedReason::MissingHemisphere),
        None => Ok(None),
    }
}
