//! Configuration management for the MTP responder
//!
//! Settings load from `config.toml` with environment overrides (prefix
//! `MTP`). Every field has a default, so the responder also starts without
//! a file; the tests rely on that.

use config::{Config, Environment, File};
use log::warn;
use serde::Deserialize;
use std::path::PathBuf;

use crate::protocol::CONTAINER_HEADER_LEN;
use crate::utils::serial;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResponderConfig {
    /// Address and port the bulk transport emulation binds to
    pub bind_address: String,
    pub port: u16,

    /// Directory exposed as the single MTP storage
    pub storage_root: String,

    /// Capacity budget for the storage volume in bytes
    pub storage_capacity_bytes: u64,

    /// Handle table capacity; bounds the objects one session can expose
    pub handle_capacity: usize,

    /// Longest accepted object filename in bytes of UTF-8
    pub max_filename_length: usize,

    /// Bulk container buffer size, 12-byte header included
    pub io_buffer_size: usize,

    /// Device identity reported by GetDeviceInfo
    pub manufacturer: String,
    pub model: String,
    pub device_version: String,
    pub friendly_name: String,

    /// MAC address the serial number is derived from
    pub mac_address: String,

    /// Storage description strings
    pub storage_description: String,
    pub volume_identifier: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5120,
            storage_root: "./mtp_storage".to_string(),
            storage_capacity_bytes: 4 * 1024 * 1024,
            handle_capacity: 32,
            max_filename_length: 63,
            io_buffer_size: 512,
            manufacturer: "TinyUSB".to_string(),
            model: "MTP Example".to_string(),
            device_version: "1.0".to_string(),
            friendly_name: "TinyUSB MTP".to_string(),
            mac_address: "F8:0D:AC:12:34:56".to_string(),
            storage_description: "disk".to_string(),
            volume_identifier: "vol".to_string(),
        }
    }
}

impl ResponderConfig {
    /// Loads configuration from config.toml with environment overrides,
    /// falling back to the defaults when no usable file is present.
    pub fn load() -> Self {
        let loaded = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("MTP"))
            .build()
            .and_then(|settings| settings.try_deserialize::<ResponderConfig>());

        match loaded {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(message) => {
                    warn!("Invalid configuration ({}), using defaults", message);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to load configuration: {}, using defaults", e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port cannot be 0".into());
        }
        if self.io_buffer_size <= CONTAINER_HEADER_LEN {
            return Err("io_buffer_size must exceed the container header".into());
        }
        if self.handle_capacity == 0 {
            return Err("handle_capacity must be greater than 0".into());
        }
        if self.max_filename_length == 0 {
            return Err("max_filename_length must be greater than 0".into());
        }
        if self.storage_root.is_empty() {
            return Err("storage_root cannot be empty".into());
        }
        Ok(())
    }

    /// Bind address and port as one socket address string.
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Serial number derived from the configured MAC address.
    pub fn serial_number(&self) -> String {
        match serial::parse_mac(&self.mac_address) {
            Some(mac) => serial::serial_from_mac(&mac),
            None => {
                warn!(
                    "Unparseable mac_address {:?}, serial falls back to zeros",
                    self.mac_address
                );
                "000000000000".to_string()
            }
        }
    }
}
