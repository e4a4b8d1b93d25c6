//! remote-input-bridge library crate.
//!
//! Lets a second device on the LAN type into a text-input dialog that is open
//! on this machine.  The dialog advertises `http://{host}:{port}` (as text and
//! as a QR code); the page served there opens a WebSocket back to the bridge
//! and sends `input` / `submit` operations, which are applied to the dialog
//! exactly like local edits and button presses.
//!
//! # Architecture
//!
//! ```text
//! Phone browser (JSON over WebSocket)
//!         ↕
//! [remote-input-bridge]
//!   ├── domain/           BridgeConfig
//!   ├── application/
//!   │     ├── registry      single active MessageHandler slot
//!   │     ├── ui_context    network task ⇄ UI context handoff
//!   │     ├── dialog_bridge request_text_input, one session per dialog
//!   │     └── presenter     DialogPresenter / QrEncoder ports
//!   └── infrastructure/
//!         ├── ws_server     axum HTTP + WebSocket listener
//!         ├── network       address discovery, port selection
//!         ├── qr            qrcodegen-backed encoder
//!         └── config_file   TOML config
//! ```
//!
//! # Layer rules
//!
//! - `domain` does no I/O.
//! - `application` depends on `domain` and `remote-input-core`, plus tokio
//!   channels; it never opens a socket.
//! - `infrastructure` depends on all other layers.
//!
//! The composition root (`main.rs`, or an embedding host) owns one
//! [`BridgeServer`](infrastructure::BridgeServer), one
//! [`SessionHandlerRegistry`](application::SessionHandlerRegistry), and one
//! UI context, and hands them to a [`DialogBridge`](application::DialogBridge).

/// Domain layer: runtime configuration.
pub mod domain;

/// Application layer: handler registry, UI handoff, dialog sessions.
pub mod application;

/// Infrastructure layer: listener, address discovery, QR encoding, config files.
pub mod infrastructure;
