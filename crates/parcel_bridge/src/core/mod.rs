//! # Core Module
//!
//! Shared configuration types used by every subsystem of the bridge.

pub mod config;

// Re-export commonly used config types
pub use config::{
    BridgeConfig,
    ParcelSettings,
    TransportSettings,
    Config,
    ConfigError,
    PARCEL_SIZE,
    DEBUG_FLOOR_HEIGHT,
};
