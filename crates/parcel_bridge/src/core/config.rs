//! # Bridge Configuration
//!
//! All tunables for the scene bridge live here: world-grid geometry, the
//! debug floor policy, and the capacities of the queues between scenes,
//! host and renderer.
//!
//! ## Configuration Categories
//!
//! - **Parcel Settings**: grid cell size and floor heights used when positioning parcels
//! - **Transport Settings**: per-scene queue, host backlog and loopback capacities
//! - **Bridge Config**: top level, adds log level and the debug flag

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// Edge length of one parcel in world units
pub const PARCEL_SIZE: f32 = 10.0;

/// Floor height used for parcels while the debug flag is set
pub const DEBUG_FLOOR_HEIGHT: f32 = -0.1;

/// # Parcel Settings
///
/// Geometry of the shared world grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelSettings {
    /// Edge length of one parcel in world units
    pub parcel_size: f32,
    /// Floor height applied when debug mode is on
    pub debug_floor_height: f32,
    /// Floor height applied otherwise, normally supplied by the renderer
    pub floor_height: f32,
}

impl ParcelSettings {
    /// Create parcel settings with the standard grid
    pub fn new() -> Self {
        Self {
            parcel_size: PARCEL_SIZE,
            debug_floor_height: DEBUG_FLOOR_HEIGHT,
            floor_height: 0.0,
        }
    }

    /// Set the externally supplied floor height
    pub fn with_floor_height(mut self, height: f32) -> Self {
        self.floor_height = height;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if !(self.parcel_size.is_finite() && self.parcel_size > 0.0) {
            return Err(format!("Parcel size must be positive, got {}", self.parcel_size));
        }
        if !self.debug_floor_height.is_finite() || !self.floor_height.is_finite() {
            return Err("Floor heights must be finite".to_string());
        }
        Ok(())
    }
}

impl Default for ParcelSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// # Transport Settings
///
/// Bounds for every queue on the path from a scene script to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Actions a scene may queue before the next host flush
    pub scene_queue_capacity: usize,
    /// Batches the host keeps while no transport is attached
    pub backlog_capacity: usize,
    /// Messages each direction of the in-process loopback can hold
    pub loopback_capacity: usize,
}

impl TransportSettings {
    /// Create transport settings with default capacities
    pub fn new() -> Self {
        Self {
            scene_queue_capacity: 1024,
            backlog_capacity: 64,
            loopback_capacity: 256,
        }
    }

    /// Set the per-scene queue capacity
    pub fn with_scene_queue_capacity(mut self, capacity: usize) -> Self {
        self.scene_queue_capacity = capacity;
        self
    }

    /// Set the host backlog capacity
    pub fn with_backlog_capacity(mut self, capacity: usize) -> Self {
        self.backlog_capacity = capacity;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.scene_queue_capacity == 0 {
            return Err("Scene queue capacity must be at least 1".to_string());
        }
        if self.backlog_capacity == 0 {
            return Err("Backlog capacity must be at least 1".to_string());
        }
        if self.loopback_capacity == 0 {
            return Err("Loopback capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// # Bridge Configuration
///
/// Top-level configuration handed to [`crate::SceneHost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Debug mode pins parcels to the debug floor height
    pub debug: bool,
    /// World grid settings
    pub parcel: ParcelSettings,
    /// Queue capacities
    pub transport: TransportSettings,
}

impl BridgeConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            parcel: ParcelSettings::default(),
            transport: TransportSettings::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Replace the parcel settings
    pub fn with_parcel(mut self, parcel: ParcelSettings) -> Self {
        self.parcel = parcel;
        self
    }

    /// Replace the transport settings
    pub fn with_transport(mut self, transport: TransportSettings) -> Self {
        self.transport = transport;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parcel.validate().map_err(ConfigError::Invalid)?;
        self.transport.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for BridgeConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.parcel.parcel_size, PARCEL_SIZE);
        assert!(!config.debug);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = BridgeConfig::default()
            .with_transport(TransportSettings::default().with_scene_queue_capacity(0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn toml_fills_missing_sections_with_defaults() {
        let text = "debug = true\n\n[parcel]\nfloor_height = 2.5\n";
        let config = BridgeConfig::parse("bridge.toml", text).expect("parse toml");
        assert!(config.debug);
        assert_eq!(config.parcel.floor_height, 2.5);
        assert_eq!(config.parcel.parcel_size, PARCEL_SIZE);
        assert_eq!(config.transport, TransportSettings::default());
    }

    #[test]
    fn ron_round_trips_through_text() {
        let text = "(log_level: \"debug\", transport: (backlog_capacity: 8))";
        let config = BridgeConfig::parse("bridge.ron", text).expect("parse ron");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.transport.backlog_capacity, 8);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = BridgeConfig::parse("bridge.yaml", "").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
