//! Domain layer: pure types with no I/O.
//!
//! - [`endpoint`] – the address the remote device is told to open.
//! - [`address`] – which of this device's addresses is worth advertising.
//! - [`dialog`] – the text-input dialog model shared by local and remote input.

pub mod address;
pub mod dialog;
pub mod endpoint;

pub use address::select_lan_address;
pub use dialog::{DialogAction, DialogOutcome, DialogSnapshot, DialogState, TextInputRequest};
pub use endpoint::ServerEndpoint;
