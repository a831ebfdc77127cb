// src/gps/data.rs
//! Position fix records

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NorthSouth {
    North,
    South,
}

impl NorthSouth {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'N' => Some(NorthSouth::North),
            'S' => Some(NorthSouth::South),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            NorthSouth::North => 'N',
            NorthSouth::South => 'S',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EastWest {
    East,
    West,
}

impl EastWest {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'E' => Some(EastWest::East),
            'W' => Some(EastWest::West),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            EastWest::East => 'E',
            EastWest::West => 'W',
        }
    }
}

/// GLL status field: `A` (data valid) or `V` (void).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixStatus {
    Valid,
    Invalid,
}

/// NMEA 2.3 positioning mode indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixMode {
    Autonomous,
    Differential,
    Estimated,
    Manual,
    Simulated,
    NotValid,
}

impl FixMode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(FixMode::Autonomous),
            'D' => Some(FixMode::Differential),
            'E' => Some(FixMode::Estimated),
            'M' => Some(FixMode::Manual),
            'S' => Some(FixMode::Simulated),
            'N' => Some(FixMode::NotValid),
            _ => None,
        }
    }
}

/// A parsed GLL sentence.
///
/// Latitude, longitude and time are kept exactly as transmitted. Hemispheres
/// are `None` only when the receiver left them empty on a void fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionFix {
    talker_and_type: String,
    latitude: String,
    north_south: Option<NorthSouth>,
    longitude: String,
    east_west: Option<EastWest>,
    utc_time: String,
    status: FixStatus,
    mode: String,
}

impl PositionFix {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        talker_and_type: &str,
        latitude: &str,
        north_south: Option<NorthSouth>,
        longitude: &str,
        east_west: Option<EastWest>,
        utc_time: &str,
        status: FixStatus,
        mode: &str,
    ) -> Self {
        Self {
            talker_and_type: talker_and_type.to_string(),
            latitude: latitude.to_string(),
            north_south,
            longitude: longitude.to_string(),
            east_west,
            utc_time: utc_time.to_string(),
            status,
            mode: mode.to_string(),
        }
    }

    pub fn talker_and_type(&self) -> &str {
        &self.talker_and_type
    }

    /// Latitude as `ddmm.mmmm`
    pub fn latitude(&self) -> &str {
        &self.latitude
    }

    pub fn north_south(&self) -> Option<NorthSouth> {
        self.north_south
    }

    /// Longitude as `dddmm.mmmm`
    pub fn longitude(&self) -> &str {
        &self.longitude
    }

    pub fn east_west(&self) -> Option<EastWest> {
        self.east_west
    }

    /// UTC time of the fix as `hhmmss.sss`
    pub fn utc_time(&self) -> &str {
        &self.utc_time
    }

    pub fn status(&self) -> FixStatus {
        self.status
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn is_valid(&self) -> bool {
        self.status == FixStatus::Valid
    }

    pub fn mode_indicator(&self) -> Option<FixMode> {
        let mut chars = self.mode.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => FixMode::from_char(c),
            _ => None,
        }
    }

    /// Decode `hhmmss` with an optional fractional second.
    pub fn utc_time_of_day(&self) -> Option<NaiveTime> {
        let (whole, fraction) = match self.utc_time.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (self.utc_time.as_str(), ""),
        };
        if whole.len() != 6 || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let hour = whole[0..2].parse().ok()?;
        let minute = whole[2..4].parse().ok()?;
        let second = whole[4..6].parse().ok()?;
        let milli = fraction
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(3)
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));

        NaiveTime::from_hms_milli_opt(hour, minute, second, milli)
    }
}

impl fmt::Display for PositionFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = self.north_south.map_or('-', |h| h.as_char());
        let ew = self.east_west.map_or('-', |h| h.as_char());
        write!(
            f,
            "{} {} {} {} {} {} {:?} {}",
            self.talker_and_type,
            self.latitude,
            ns,
            self.longitude,
            ew,
            self.utc_time,
            self.status,
            self.mode
        )
    }
}

/// A fix together with the moment it was acquired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixRecord {
    pub fix: PositionFix,
    pub received_at: DateTime<Utc>,
}

impl FixRecord {
    pub fn new(fix: PositionFix) -> Self {
        Self {
            fix,
            received_at: Utc::now(),
        }
    }

    /// Get the age of the record in seconds
    pub fn age_seconds(&self) -> i64 {
        Utc::now().signed_duration_since(self.received_at).num_seconds()
    }

    /// Check if the record is recent (within 10 seconds)
    pub fn is_recent(&self) -> bool {
        self.age_seconds() < 10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_with(utc_time: &str, mode: &str) -> PositionFix {
        PositionFix::new(
            "GPGLL",
            "4916.45",
            Some(NorthSouth::North),
            "12311.12",
            Some(EastWest::West),
            utc_time,
            FixStatus::Valid,
            mode,
        )
    }

    #[test]
    fn test_hemisphere_letters() {
        assert_eq!(NorthSouth::from_char('S'), Some(NorthSouth::South));
        assert_eq!(NorthSouth::from_char('E'), None);
        assert_eq!(EastWest::from_char('E'), Some(EastWest::East));
        assert_eq!(EastWest::West.as_char(), 'W');
    }

    #[test]
    fn test_utc_time_of_day() {
        let fix = fix_with("225444", "A");
        assert_eq!(fix.utc_time_of_day(), NaiveTime::from_hms_opt(22, 54, 44));

        let fix = fix_with("225444.5", "A");
        assert_eq!(fix.utc_time_of_day(), NaiveTime::from_hms_milli_opt(22, 54, 44, 500));

        let fix = fix_with("010203.045", "A");
        assert_eq!(fix.utc_time_of_day(), NaiveTime::from_hms_milli_opt(1, 2, 3, 45));
    }

    #[test]
    fn test_utc_time_of_day_rejects_garbage() {
        assert_eq!(fix_with("", "A").utc_time_of_day(), None);
        assert_eq!(fix_with("2254", "A").utc_time_of_day(), None);
        assert_eq!(fix_with("256000", "A").utc_time_of_day(), None);
        assert_eq!(fix_with("22a444", "A").utc_time_of_day(), None);
        assert_eq!(fix_with("225444.x", "A").utc_time_of_day(), None);
    }

    #[test]
    fn test_mode_indicator() {
        assert_eq!(fix_with("225444", "A").mode_indicator(), Some(FixMode::Autonomous));
        assert_eq!(fix_with("225444", "D").mode_indicator(), Some(FixMode::Differential));
        assert_eq!(fix_with("225444", "").mode_indicator(), None);
        assert_eq!(fix_with("225444", "AD").mode_indicator(), None);
    }

    #[test]
    fn test_display() {
        let fix = fix_with("225444", "A");
        assert_eq!(fix.to_string(), "GPGLL 4916.45 N 12311.12 W 225444 Valid A");
    }

    #[test]
    fn test_fresh_record_is_recent() {
        let record = FixRecord::new(fix_with("225444", "A"));
        assert!(record.is_recent());
        assert!(record.age_seconds() <= 1);
    }
}
