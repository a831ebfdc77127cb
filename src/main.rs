// src/main.rs
//! GLL Fix - acquire NMEA GLL position fixes from a serial GPS receiver

use anyhow::Context;
use clap::Parser;
use gll_fix::{config::GpsConfig, gps::FixRecord, monitor, AcquisitionOutcome, GpsMonitor};
use log::info;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
#[command(name = "gll-fix", version, about = "Acquire GLL position fixes from a GPS receiver")]
struct Cli {
    /// Serial port the receiver is attached to
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Replay a captured NMEA log instead of opening a serial port
    #[arg(short, long, conflicts_with = "port")]
    replay: Option<PathBuf>,

    /// Frames to try per fix before giving up
    #[arg(short, long)]
    attempts: Option<u32>,

    /// Longest wait for a single byte, in milliseconds
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Do not send the NMEA/baud init command to the receiver
    #[arg(long)]
    no_init: bool,

    /// Stop after this many acquisitions (0 runs until Ctrl-C)
    #[arg(short = 'n', long, default_value_t = 0)]
    count: u64,

    /// Pause between acquisitions, in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Print every outcome as one JSON object per line
    #[arg(long)]
    json: bool,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Persist the effective settings to the config file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut GpsConfig) {
        if let Some(port) = &self.port {
            let baud = self.baud.or(config.serial_baudrate).unwrap_or(9600);
            config.update_serial(port.clone(), baud);
        } else if let Some(baud) = self.baud {
            config.serial_baudrate = Some(baud);
        }
        if let Some(path) = &self.replay {
            config.update_replay(path.clone());
        }
        if let Some(attempts) = self.attempts {
            config.max_attempts = attempts;
        }
        if let Some(timeout) = self.read_timeout_ms {
            config.read_timeout_ms = timeout;
        }
        if self.no_init {
            config.send_init_command = false;
        }
    }
}

fn print_outcome(outcome: &AcquisitionOutcome, last_fix: Option<&FixRecord>) {
    match outcome {
        AcquisitionOutcome::Fix(fix) => {
            let time = fix
                .utc_time_of_day()
                .map(|t| t.format("%H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| "--:--:--".to_string());
            let mode = fix
                .mode_indicator()
                .map(|m| format!("{:?}", m))
                .unwrap_or_else(|| "unknown mode".to_string());
            println!("{}  [{} UTC, {}]", fix, time, mode);
        }
        AcquisitionOutcome::Timeout => match last_fix {
            Some(record) if record.is_recent() => {
                println!("timeout (last fix {}s ago)", record.age_seconds())
            }
            Some(record) => println!("timeout (last fix stale, {}s ago)", record.age_seconds()),
            None => println!("timeout"),
        },
        AcquisitionOutcome::Malformed(reason) => println!("malformed: {}", reason),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_env("GLL_FIX_LOG")
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        monitor::list_serial_ports()?;
        return Ok(());
    }

    let mut config = GpsConfig::load().context("loading configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    if cli.save_config {
        config.save().context("saving configuration")?;
        info!("Configuration saved");
    }

    let source = config.to_source()?;
    info!("Using {} source", config.source_type);

    let mut monitor = GpsMonitor::from_config(&config);
    monitor.start(source).await.context("starting GPS link")?;

    let mut acquired = 0u64;
    loop {
        let outcome = tokio::select! {
            outcome = monitor.acquire_fix(config.max_attempts) => outcome,
            _ = tokio::signal::ctrl_c() => break,
        };

        if cli.json {
            println!("{}", serde_json::to_string(&outcome)?);
        } else {
            print_outcome(&outcome, monitor.last_fix());
        }

        acquired += 1;
        if cli.count != 0 && acquired >= cli.count {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(cli.interval_ms)) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    monitor.stop();
    Ok(())
}
