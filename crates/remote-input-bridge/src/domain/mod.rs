//! Domain layer for remote-input-bridge.
//!
//! Only configuration lives here; the protocol and dialog types come from
//! `remote-input-core`.  Nothing in this layer performs I/O: reading the
//! config file is the infrastructure layer's job.

pub mod config;

pub use config::{BridgeConfig, ConfigError};
