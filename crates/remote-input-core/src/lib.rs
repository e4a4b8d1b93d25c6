//! # remote-input-core
//!
//! Shared, I/O-free building blocks for the remote text-input bridge.
//!
//! When a modal text-input dialog is open, a second device on the same LAN
//! (a phone browser, a laptop) can drive that dialog over a WebSocket.  This
//! crate holds everything about that feature that does not touch a socket or
//! a thread:
//!
//! - **`protocol`** – The JSON wire messages exchanged with the remote
//!   browser, and the codec that turns them into domain [`Operation`]s and
//!   turns handler results back into [`WireReply`]s.
//!
//! - **`domain`** – The [`ServerEndpoint`] advertised through the QR code,
//!   the LAN address preference rules, and the [`DialogState`] model that
//!   decides what each local or remote action does to an open dialog.
//!
//! The networking, the handler registry, and the UI-context handoff live in
//! the `remote-input-bridge` crate, which depends on this one.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `remote_input_core::Operation` instead of the full module path.
pub use domain::address::select_lan_address;
pub use domain::dialog::{
    accept_all, DialogAction, DialogOutcome, DialogSnapshot, DialogState, TextInputRequest,
    Validator,
};
pub use domain::endpoint::ServerEndpoint;
pub use protocol::codec::{decode_operation, encode_result, CloseCode, ProtocolError, WireReply};
pub use protocol::messages::{HandlerResult, IncomingMessage, Operation, OutgoingResponse};
