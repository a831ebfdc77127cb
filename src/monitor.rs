// src/monitor.rs
//! Consumer-facing entry point: owns the ring's read side and acquires fixes

use crate::{
    config::GpsConfig,
    error::{GpsError, Result},
    gps::{
        acquire::{AcquisitionController, AcquisitionOutcome, AcquisitionStats},
        data::FixRecord,
        link,
        source::{byte_ring, RingConsumer, RingProducer},
    },
};
use log::{info, warn};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{io::AsyncRead, task::JoinHandle};

/// Where the GPS byte stream comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpsSource {
    Serial { port: String, baudrate: u32, send_init: bool },
    Replay { path: PathBuf },
}

/// Acquires GLL fixes from one GPS link.
///
/// The reader task only fills the byte ring. Framing, checksum and parsing all
/// happen inside [`GpsMonitor::acquire_fix`], on whatever task owns the monitor.
pub struct GpsMonitor {
    controller: AcquisitionController,
    consumer: RingConsumer,
    producer: Option<RingProducer>,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    last_fix: Option<FixRecord>,
}

impl GpsMonitor {
    /// Create a new GPS monitor
    pub fn new(ring_capacity: usize, read_timeout: Duration, max_reads_per_attempt: usize) -> Self {
        let (producer, consumer) = byte_ring(ring_capacity, read_timeout);
        Self {
            controller: AcquisitionController::new(max_reads_per_attempt),
            consumer,
            producer: Some(producer),
            running: Arc::new(AtomicBool::new(false)),
            reader: None,
            last_fix: None,
        }
    }

    pub fn from_config(config: &GpsConfig) -> Self {
        Self::new(
            config.ring_capacity,
            Duration::from_millis(config.read_timeout_ms),
            config.max_reads_per_attempt,
        )
    }

    /// Start reading from the specified source
    pub async fn start(&mut self, source: GpsSource) -> Result<()> {
        match source {
            GpsSource::Serial { port, baudrate, send_init } => {
                let serial = link::open_serial(&port, baudrate, send_init).await?;
                self.attach(serial)?;
                info!("Connected to {}", port);
            }
            GpsSource::Replay { path } => {
                let file = link::open_replay(&path).await?;
                self.attach(file)?;
            }
        }
        Ok(())
    }

    /// Feed the monitor from an arbitrary byte stream.
    ///
    /// A monitor has a single producer; attaching twice is an error.
    pub fn attach<R>(&mut self, reader: R) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let producer = self
            .producer
            .take()
            .ok_or_else(|| GpsError::Connection("GPS link already attached".to_string()))?;

        self.running.store(true, Ordering::Relaxed);
        self.reader = Some(link::spawn_reader(reader, producer, Arc::clone(&self.running)));
        Ok(())
    }

    /// Acquire one GLL fix, trying at most `max_attempts` frames.
    pub async fn acquire_fix(&mut self, max_attempts: u32) -> AcquisitionOutcome {
        let outcome = self.controller.acquire(&mut self.consumer, max_attempts).await;

        match &outcome {
            AcquisitionOutcome::Fix(fix) => self.last_fix = Some(FixRecord::new(fix.clone())),
            AcquisitionOutcome::Timeout => warn!(
                "No GLL fix within {} attempts ({} bytes buffered)",
                max_attempts,
                self.consumer.buffered()
            ),
            AcquisitionOutcome::Malformed(reason) => warn!("Malformed GLL sentence: {}", reason),
        }

        outcome
    }

    /// Statistics of the last acquisition
    pub fn stats(&self) -> AcquisitionStats {
        self.controller.stats()
    }

    /// Most recent fix, with the time it was acquired
    pub fn last_fix(&self) -> Option<&FixRecord> {
        self.last_fix.as_ref()
    }

    /// Stop the reader task
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            reader.abort();
            info!("GPS link stopped");
        }
    }

    /// Check if the monitor is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for GpsMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
