// src/gps/acquire.rs
//! Bounded retry loop turning a byte stream into one position fix

use super::{
    checksum,
    data::PositionFix,
    frame::{FrameAssembler, FrameEvent},
    nmea,
    source::ByteSource,
};
use crate::error::MalformedReason;
use log::{debug, trace};

/// Retry ceiling that tolerates the other sentence types a receiver
/// interleaves with GLL on the same link.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Bytes read per attempt before it counts as "no frame yet".
pub const DEFAULT_MAX_READS_PER_ATTEMPT: usize = 512;

/// Final result of one [`AcquisitionController::acquire`] call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum AcquisitionOutcome {
    Fix(PositionFix),
    /// No checksum-verified GLL sentence within the attempt budget.
    Timeout,
    /// A verified GLL sentence arrived but its fields could not be trusted.
    Malformed(MalformedReason),
}

impl AcquisitionOutcome {
    pub fn fix(&self) -> Option<&PositionFix> {
        match self {
            AcquisitionOutcome::Fix(fix) => Some(fix),
            _ => None,
        }
    }

    pub fn into_fix(self) -> Option<PositionFix> {
        match self {
            AcquisitionOutcome::Fix(fix) => Some(fix),
            _ => None,
        }
    }
}

/// What happened during the most recent acquisition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub attempts: u32,
    /// Attempts where the source ran dry before a frame finished.
    pub idle: u32,
    pub overflow: u32,
    pub checksum_mismatch: u32,
    pub wrong_type: u32,
}

impl AcquisitionStats {
    fn record_rejection(&mut self, reason: MalformedReason) {
        match reason {
            MalformedReason::Overflow => self.overflow += 1,
            MalformedReason::ChecksumMismatch => self.checksum_mismatch += 1,
            _ => self.wrong_type += 1,
        }
    }
}

/// Drives the frame assembler until a fix, a terminal error or the attempt
/// budget is reached.
///
/// The controller owns the assembler, so all framing state lives with
/// whichever context owns the controller.
#[derive(Debug)]
pub struct AcquisitionController {
    assembler: FrameAssembler,
    max_reads_per_attempt: usize,
    stats: AcquisitionStats,
}

impl Default for AcquisitionController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_READS_PER_ATTEMPT)
    }
}

impl AcquisitionController {
    pub fn new(max_reads_per_attempt: usize) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            max_reads_per_attempt: max_reads_per_attempt.max(1),
            stats: AcquisitionStats::default(),
        }
    }

    /// Statistics of the last `acquire` call.
    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    /// Try up to `max_attempts` frames from `source`.
    pub async fn acquire<S: ByteSource>(
        &mut self,
        source: &mut S,
        max_attempts: u32,
    ) -> AcquisitionOutcome {
        self.stats = AcquisitionStats::default();

        while self.stats.attempts < max_attempts {
            self.stats.attempts += 1;
            let attempt = self.stats.attempts;

            let event = self
                .assembler
                .next_frame(source, self.max_reads_per_attempt)
                .await;

            let result = match event {
                None => {
                    trace!("attempt {}/{}: no frame yet", attempt, max_attempts);
                    self.stats.idle += 1;
                    continue;
                }
                Some(FrameEvent::Overflow) => Err(MalformedReason::Overflow),
                Some(FrameEvent::Frame(frame)) if !frame.verify_checksum() => {
                    debug!(
                        "attempt {}/{}: declared checksum {}, computed {}",
                        attempt,
                        max_attempts,
                        frame.suffix(),
                        checksum::compute(frame.body())
                    );
                    Err(MalformedReason::ChecksumMismatch)
                }
                Some(FrameEvent::Frame(frame)) => {
                    nmea::classify(&frame).and_then(|fields| nmea::parse_fix(&fields))
                }
            };

            match result {
                Ok(fix) => {
                    debug!("attempt {}/{}: fix {}", attempt, max_attempts, fix);
                    return AcquisitionOutcome::Fix(fix);
                }
                Err(reason) if reason.is_terminal() => {
                    debug!("attempt {}/{}: malformed GLL: {}", attempt, max_attempts, reason);
                    return AcquisitionOutcome::Malformed(reason);
                }
                Err(reason) => {
                    debug!("attempt {}/{}: rejected: {}", attempt, max_attempts, reason);
                    self.stats.record_rejection(reason);
                }
            }
        }

        debug!("no GLL fix after {} attempts: {:?}", max_attempts, self.stats);
        AcquisitionOutcome::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::{
        data::{EastWest, FixStatus, NorthSouth},
        source::MemorySource,
    };

    const GLL: &str = "$GPGLL,4916.45,N,12311.12,W,225444,A,A*5C\r\n";
    const GSA: &str = "$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39\r\n";

    async fn acquire(input: &str, max_attempts: u32) -> (AcquisitionOutcome, AcquisitionStats) {
        let mut controller = AcquisitionController::default();
        let mut source = MemorySource::from(input);
        let outcome = controller.acquire(&mut source, max_attempts).await;
        (outcome, controller.stats())
    }

    #[tokio::test]
    async fn test_acquires_fix() {
        let (outcome, stats) = acquire(GLL, DEFAULT_MAX_ATTEMPTS).await;

        let fix = outcome.into_fix().expect("expected a fix");
        assert_eq!(fix.latitude(), "4916.45");
        assert_eq!(fix.north_south(), Some(NorthSouth::North));
        assert_eq!(fix.longitude(), "12311.12");
        assert_eq!(fix.east_west(), Some(EastWest::West));
        assert_eq!(fix.utc_time(), "225444");
        assert_eq!(fix.status(), FixStatus::Valid);
        assert_eq!(fix.mode(), "A");
        assert_eq!(stats.attempts, 1);
    }

    #[tokio::test]
    async fn test_corrupt_checksum_consumes_attempt() {
        let input = format!("{}{}", GLL.replace("*5C", "*00"), GLL);
        let (outcome, stats) = acquire(&input, DEFAULT_MAX_ATTEMPTS).await;

        assert!(outcome.fix().is_some());
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.checksum_mismatch, 1);
    }

    #[tokio::test]
    async fn test_corrupt_checksum_alone_times_out() {
        let (outcome, stats) = acquire(&GLL.replace("*5C", "*00"), 3).await;

        assert_eq!(outcome, AcquisitionOutcome::Timeout);
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.checksum_mismatch, 1);
        assert_eq!(stats.idle, 2);
    }

    #[tokio::test]
    async fn test_lowercase_checksum_is_rejected() {
        let (outcome, _) = acquire(&GLL.replace("*5C", "*5c"), 2).await;
        assert_eq!(outcome, AcquisitionOutcome::Timeout);
    }

    #[tokio::test]
    async fn test_skips_interleaved_sentences() {
        let input = format!("xx\r\n{}garbage{}{}", GSA, GSA, GLL);
        let (outcome, stats) = acquire(&input, DEFAULT_MAX_ATTEMPTS).await;

        assert_eq!(outcome.fix().map(|f| f.latitude()), Some("4916.45"));
        assert_eq!(stats.wrong_type, 2);
        assert_eq!(stats.attempts, 3);
    }

    #[tokio::test]
    async fn test_fix_beyond_attempt_budget_times_out() {
        let input = format!("{}{}{}", GSA, GSA, GLL);
        let (outcome, stats) = acquire(&input, 2).await;

        assert_eq!(outcome, AcquisitionOutcome::Timeout);
        assert_eq!(stats.attempts, 2);
    }

    #[tokio::test]
    async fn test_overflow_consumes_attempt() {
        let long = format!("$GPGLL,{}*00\r\n", "9".repeat(200));
        let input = format!("{}{}", long, GLL);
        let (outcome, stats) = acquire(&input, DEFAULT_MAX_ATTEMPTS).await;

        assert!(outcome.fix().is_some());
        assert_eq!(stats.overflow, 1);
    }

    #[tokio::test]
    async fn test_malformed_gll_is_terminal() {
        let input = format!("$GPGLL,4916.45,N,12311.12,W,225444,X,A*45\r\n{}", GLL);
        let (outcome, stats) = acquire(&input, DEFAULT_MAX_ATTEMPTS).await;

        assert_eq!(outcome, AcquisitionOutcome::Malformed(MalformedReason::UnknownStatus));
        assert_eq!(stats.attempts, 1);
    }

    #[tokio::test]
    async fn test_short_gll_is_incomplete() {
        let (outcome, _) = acquire("$GPGLL,4916.45,N,12311.12,W,225444,A*31\r\n", 5).await;
        assert_eq!(outcome, AcquisitionOutcome::Malformed(MalformedReason::IncompleteFields));
    }

    #[tokio::test]
    async fn test_valid_fix_with_empty_field_is_malformed() {
        let bodies = [
            "GPGLL,,N,12311.12,W,225444,A,A",
            "GPGLL,4916.45,N,,W,225444,A,A",
            "GPGLL,4916.45,N,12311.12,W,,A,A",
            "GPGLL,4916.45,N,12311.12,W,225444,A,",
            "GPGLL,,N,,W,,A,",
        ];
        for body in bodies {
            let input = format!("${}*{}\r\n{}", body, checksum::compute(body.as_bytes()), GLL);
            let (outcome, stats) = acquire(&input, DEFAULT_MAX_ATTEMPTS).await;

            assert_eq!(outcome, AcquisitionOutcome::Malformed(MalformedReason::MissingField), "{}", body);
            assert_eq!(stats.attempts, 1);
        }
    }

    #[test]
    fn test_outcome_json() {
        assert_eq!(serde_json::to_string(&AcquisitionOutcome::Timeout).unwrap(), "\"Timeout\"");
        assert_eq!(
            serde_json::to_string(&AcquisitionOutcome::Malformed(MalformedReason::MissingField)).unwrap(),
            r#"{"Malformed":"MissingField"}"#
        );
    }

    #[tokio::test]
    async fn test_fix_outcome_json() {
        let (outcome, _) = acquire(GLL, 1).await;
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["Fix"]["latitude"], "4916.45");
        assert_eq!(value["Fix"]["status"], "Valid");
    }

    #[tokio::test]
    async fn test_void_fix_is_returned() {
        let (outcome, _) = acquire("$GPGLL,3751.65,S,14507.36,E,,V,N*43\r\n", 5).await;

        let fix = outcome.into_fix().expect("expected a fix");
        assert_eq!(fix.status(), FixStatus::Invalid);
        assert_eq!(fix.utc_time(), "");
    }

    #[tokio::test]
    async fn test_empty_source_times_out() {
        let (outcome, stats) = acquire("", 15).await;
        assert_eq!(outcome, AcquisitionOutcome::Timeout);
        assert_eq!(stats.attempts, 15);
        assert_eq!(stats.idle, 15);
    }

    #[tokio::test]
    async fn test_zero_attempts_reads_nothing() {
        let mut controller = AcquisitionController::default();
        let mut source = MemorySource::from(GLL);

        let outcome = controller.acquire(&mut source, 0).await;
        assert_eq!(outcome, AcquisitionOutcome::Timeout);
        assert_eq!(source.remaining(), GLL.len());
    }

    #[tokio::test]
    async fn test_sentence_split_across_attempts() {
        let mut controller = AcquisitionController::new(8);
        let mut source = MemorySource::from(GLL);

        let outcome = controller.acquire(&mut source, DEFAULT_MAX_ATTEMPTS).await;
        assert!(outcome.fix().is_some());
        // 8 bytes per attempt, the frame completes with the 41st byte
        assert_eq!(controller.stats().attempts, 6);
    }
}
