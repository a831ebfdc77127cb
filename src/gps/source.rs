// src/gps/source.rs
//! Byte sources feeding the frame assembler
//!
//! The serial reader runs in its own task and only ever pushes raw bytes into
//! a bounded ring. Everything that interprets those bytes lives on the other
//! side of the ring, in whichever context owns the [`RingConsumer`].

use std::{collections::VecDeque, fmt, time::Duration};
use tokio::sync::mpsc;

/// The source had nothing to deliver within its wait bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoData;

impl fmt::Display for NoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no data available")
    }
}

impl std::error::Error for NoData {}

/// Something that yields bytes one at a time.
///
/// Implementations may wait for data, but every wait must be bounded: when no
/// byte shows up in time they return [`NoData`] and let the caller decide.
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    async fn read_byte(&mut self) -> Result<u8, NoData>;
}

/// In-memory source, mostly for replaying captured bytes in tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    bytes: VecDeque<u8>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend(bytes.iter().copied());
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl From<&[u8]> for MemorySource {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.iter().copied().collect(),
        }
    }
}

impl From<&str> for MemorySource {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes())
    }
}

impl ByteSource for MemorySource {
    async fn read_byte(&mut self) -> Result<u8, NoData> {
        self.bytes.pop_front().ok_or(NoData)
    }
}

/// Create a bounded single-producer/single-consumer byte ring.
///
/// `read_timeout` bounds how long the consumer waits for each byte.
pub fn byte_ring(capacity: usize, read_timeout: Duration) -> (RingProducer, RingConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        RingProducer { tx },
        RingConsumer { rx, read_timeout },
    )
}

/// Write half of the byte ring. Owned by the reader task.
#[derive(Debug)]
pub struct RingProducer {
    tx: mpsc::Sender<u8>,
}

impl RingProducer {
    /// Push bytes, waiting for room when the ring is full.
    ///
    /// Returns `false` once the consumer has gone away.
    pub async fn push_slice(&self, bytes: &[u8]) -> bool {
        for &b in bytes {
            if self.tx.send(b).await.is_err() {
                return false;
            }
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Read half of the byte ring. Owned by the acquiring context.
#[derive(Debug)]
pub struct RingConsumer {
    rx: mpsc::Receiver<u8>,
    read_timeout: Duration,
}

impl RingConsumer {
    /// Bytes currently buffered and not yet read.
    pub fn buffered(&self) -> usize {
        self.rx.len()
    }
}

impl ByteSource for RingConsumer {
    async fn read_byte(&mut self) -> Result<u8, NoData> {
        match tokio::time::timeout(self.read_timeout, self.rx.recv()).await {
            Ok(Some(b)) => Ok(b),
            // Timed out, or the producer is gone for good
            Ok(None) | Err(_) => Err(NoData),
        }
    }
}
