//! Infrastructure layer: everything that touches sockets, files, or the OS.
//!
//! - `network`     – host address discovery and free-port selection
//! - `ws_server`   – the axum listener serving the page and the WebSocket protocol
//! - `qr`          – the `qrcodegen`-backed [`QrEncoder`](crate::application::QrEncoder)
//! - `config_file` – TOML loading for [`BridgeConfig`](crate::domain::BridgeConfig)

pub mod config_file;
pub mod network;
pub mod qr;
pub mod ws_server;

pub use config_file::{load_config, load_config_or_default};
pub use network::NetworkError;
pub use qr::QrCodeGenEncoder;
pub use ws_server::{BridgeError, BridgeServer};
