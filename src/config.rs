// src/config.rs
//! Configuration management with file-based storage

use crate::{
    error::{GpsError, Result},
    gps::acquire::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_READS_PER_ATTEMPT},
    monitor::GpsSource,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub source_type: String, // "serial", "replay"
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    pub replay_path: Option<PathBuf>,
    pub send_init_command: bool,
    pub max_attempts: u32,
    pub read_timeout_ms: u64,
    pub max_reads_per_attempt: usize,
    pub ring_capacity: usize,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            source_type: "serial".to_string(),
            serial_port: None,
            serial_baudrate: Some(9600),
            replay_path: None,
            send_init_command: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            read_timeout_ms: 1000,
            max_reads_per_attempt: DEFAULT_MAX_READS_PER_ATTEMPT,
            ring_capacity: 256,
        }
    }
}

impl GpsConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Load from a config file, falling back to defaults when it is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| GpsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save to a config file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(config_path, contents)
            .map_err(|e| GpsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get config file path
    fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("gll-fix").join("config.json"))
    }

    /// Reject settings that would make acquisition meaningless
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(GpsError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.max_reads_per_attempt == 0 {
            return Err(GpsError::Config("max_reads_per_attempt must be at least 1".to_string()));
        }
        if self.ring_capacity == 0 {
            return Err(GpsError::Config("ring_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }

    /// Update replay settings
    pub fn update_replay(&mut self, path: PathBuf) {
        self.source_type = "replay".to_string();
        self.replay_path = Some(path);
    }

    /// Build the monitor source these settings describe
    pub fn to_source(&self) -> Result<GpsSource> {
        match self.source_type.as_str() {
            "serial" => {
                let port = self
                    .serial_port
                    .clone()
                    .ok_or_else(|| GpsError::Config("No serial port configured".to_string()))?;
                Ok(GpsSource::Serial {
                    port,
                    baudrate: self.serial_baudrate.unwrap_or(9600),
                    send_init: self.send_init_command,
                })
            }
            "replay" => {
                let path = self
                    .replay_path
                    .clone()
                    .ok_or_else(|| GpsError::Config("No replay file configured".to_string()))?;
                Ok(GpsSource::Replay { path })
            }
            other => Err(GpsError::Config(format!("Unknown source type: {}", other))),
        }
    }
}
