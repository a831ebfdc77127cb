// src/gps/link.rs
//! Serial link plumbing: receiver setup and the producer side of the ring

use super::source::RingProducer;
use crate::error::{GpsError, Result};
use log::{info, warn};
use std::{
    io,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    task::JoinHandle,
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Switches a SiRF receiver to NMEA at 9600 8N1.
pub const INIT_COMMAND: &[u8] = b"$PSRF100,1,9600,8,1,0*0C";

const LINE_END: &[u8] = b"\r\n";
const READ_CHUNK: usize = 64;

/// Something that accepts bytes for the receiver.
#[allow(async_fn_in_trait)]
pub trait ByteSink {
    async fn write_byte(&mut self, byte: u8) -> Result<()>;
    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<W: AsyncWrite + Unpin> ByteSink for W {
    async fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_all(&[byte]).await?;
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes).await?;
        self.flush().await?;
        Ok(())
    }
}

/// Send the one-shot protocol/baud command to the receiver.
pub async fn send_init_command<S: ByteSink>(sink: &mut S) -> Result<()> {
    let mut line = Vec::with_capacity(INIT_COMMAND.len() + LINE_END.len());
    line.extend_from_slice(INIT_COMMAND);
    line.extend_from_slice(LINE_END);
    sink.write_bytes(&line).await
}

/// Open the receiver's serial port, optionally sending [`INIT_COMMAND`].
pub async fn open_serial(port: &str, baudrate: u32, send_init: bool) -> Result<SerialStream> {
    info!("Connecting to GPS on {} at {} baud", port, baudrate);

    let mut serial = tokio_serial::new(port, baudrate)
        .timeout(Duration::from_millis(1000))
        .open_native_async()
        .map_err(|e| {
            warn!("Failed to open serial port {}: {}", port, e);
            GpsError::Serial(e)
        })?;

    if send_init {
        send_init_command(&mut serial).await?;
        info!("Sent init command to {}", port);
    }

    Ok(serial)
}

/// Open a captured NMEA log for replay.
pub async fn open_replay(path: &Path) -> Result<tokio::fs::File> {
    info!("Replaying NMEA capture {}", path.display());

    tokio::fs::File::open(path).await.map_err(|e| {
        GpsError::Connection(format!("Failed to open replay file {}: {}", path.display(), e))
    })
}

/// Spawn the producer task.
///
/// The task does nothing but copy bytes from `reader` into the ring. It stops
/// at end of stream, on a read error, when `running` is cleared, or when the
/// consumer has been dropped.
pub fn spawn_reader<R>(mut reader: R, producer: RingProducer, running: Arc<AtomicBool>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; READ_CHUNK];

        while running.load(Ordering::Relaxed) && !producer.is_closed() {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    info!("GPS link reached end of stream");
                    break;
                }
                Ok(n) => {
                    if !producer.push_slice(&buf[..n]).await {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                Err(e) => {
                    warn!("Error reading from GPS link: {}", e);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::source::{byte_ring, ByteSource, NoData};

    #[tokio::test]
    async fn test_init_command_is_written_verbatim() {
        let mut sink: Vec<u8> = Vec::new();
        send_init_command(&mut sink).await.unwrap();
        assert_eq!(sink, b"$PSRF100,1,9600,8,1,0*0C\r\n");
    }

    #[tokio::test]
    async fn test_write_byte() {
        let mut sink: Vec<u8> = Vec::new();
        sink.write_byte(b'$').await.unwrap();
        sink.write_bytes(b"GP").await.unwrap();
        assert_eq!(sink, b"$GP");
    }

    #[tokio::test]
    async fn test_reader_feeds_ring_until_eof() {
        let (producer, mut consumer) = byte_ring(8, Duration::from_millis(200));
        let running = Arc::new(AtomicBool::new(true));
        let input: &'static [u8] = b"$GPGLL,4916.45*00\r\n";

        let handle = spawn_reader(input, producer, running);

        let mut out = Vec::new();
        while let Ok(b) = consumer.read_byte().await {
            out.push(b);
        }
        handle.await.unwrap();
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn test_reader_honours_running_flag() {
        let (producer, mut consumer) = byte_ring(8, Duration::from_millis(20));
        let running = Arc::new(AtomicBool::new(false));

        spawn_reader(&b"ignored"[..], producer, running).await.unwrap();
        assert_eq!(consumer.read_byte().await, Err(NoData));
    }

    #[tokio::test]
    async fn test_reader_stops_when_consumer_dropped() {
        let (producer, consumer) = byte_ring(8, Duration::from_millis(20));
        drop(consumer);
        let running = Arc::new(AtomicBool::new(true));

        // An endless stream only ends through the closed ring
        spawn_reader(tokio::io::repeat(b'$'), producer, running).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_missing_serial_port_fails() {
        let result = open_serial("/nonexistent/gll-fix/tty", 9600, false).await;
        assert!(matches!(result, Err(GpsError::Serial(_))));
    }

    #[tokio::test]
    async fn test_open_missing_replay_fails() {
        let err = open_replay(Path::new("/nonexistent/gll-fix/capture.nmea"))
            .await
            .unwrap_err();
        assert!(matches!(err, GpsError::Connection(_)));
    }
}
