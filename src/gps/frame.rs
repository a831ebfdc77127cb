// src/gps/frame.rs
//! Byte-level NMEA frame assembly
//!
//! Pulls `$...*CC` frames out of an unbounded byte stream. The body between
//! the markers is stored in a fixed-capacity buffer; a body that outgrows it is
//! reported as an overflow once its terminator arrives instead of being
//! truncated.

use super::{
    checksum::{self, ChecksumSuffix},
    source::ByteSource,
};
use heapless::Vec;

/// Largest sentence body (bytes between `$` and `*`) the assembler keeps.
pub const FRAME_CAPACITY: usize = 48;

const START_MARKER: u8 = b'$';
const CHECKSUM_MARKER: u8 = b'*';

/// A complete sentence body together with its declared checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFrame {
    body: Vec<u8, FRAME_CAPACITY>,
    suffix: ChecksumSuffix,
}

impl CandidateFrame {
    /// Bytes captured between `$` and `*`, exclusive of both.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn suffix(&self) -> ChecksumSuffix {
        self.suffix
    }

    /// Checksum the bytes exactly as they were received.
    pub fn verify_checksum(&self) -> bool {
        checksum::verify(&self.body, &self.suffix)
    }
}

/// Result of feeding bytes until something frame-shaped finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Frame(CandidateFrame),
    /// A frame terminated after its body exceeded [`FRAME_CAPACITY`].
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Capturing,
    Suffix { first: Option<u8> },
}

/// Capture-flag and cursor state machine for `$...*CC` frames.
#[derive(Debug)]
pub struct FrameAssembler {
    state: State,
    body: Vec<u8, FRAME_CAPACITY>,
    overflowed: bool,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            body: Vec::new(),
            overflowed: false,
        }
    }

    /// Drop any partially captured frame.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.body.clear();
        self.overflowed = false;
    }

    /// Whether a frame is in progress.
    pub fn is_capturing(&self) -> bool {
        self.state != State::Idle
    }

    /// Feed one byte, returning an event when a frame finishes.
    pub fn push(&mut self, byte: u8) -> Option<FrameEvent> {
        // A start marker always wins, even over an unfinished frame
        if byte == START_MARKER {
            self.reset();
            self.state = State::Capturing;
            return None;
        }

        match self.state {
            State::Idle => None,
            State::Capturing if byte == CHECKSUM_MARKER => {
                if self.overflowed {
                    self.reset();
                    Some(FrameEvent::Overflow)
                } else {
                    self.state = State::Suffix { first: None };
                    None
                }
            }
            State::Capturing => {
                if self.body.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
            State::Suffix { first: None } => {
                self.state = State::Suffix { first: Some(byte) };
                None
            }
            State::Suffix { first: Some(first) } => {
                let frame = CandidateFrame {
                    body: std::mem::take(&mut self.body),
                    suffix: ChecksumSuffix([first, byte]),
                };
                self.reset();
                Some(FrameEvent::Frame(frame))
            }
        }
    }

    /// Read from `source` until a frame finishes.
    ///
    /// Gives up and returns `None` when the source runs dry or after
    /// `max_reads` bytes, keeping any partial frame for the next call.
    pub async fn next_frame<S: ByteSource>(
        &mut self,
        source: &mut S,
        max_reads: usize,
    ) -> Option<FrameEvent> {
        for _ in 0..max_reads {
            let byte = source.read_byte().await.ok()?;
            if let Some(event) = self.push(byte) {
                return Some(event);
            }
        }
        None
    }
}
