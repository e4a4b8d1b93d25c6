//! JSON message types and domain variants for the remote-input protocol.
//!
//! # Message flow
//!
//! ```text
//! Browser → Bridge:  JSON text frame  →  IncomingMessage  →  Operation
//! Bridge  → Browser: HandlerResult    →  OutgoingResponse →  JSON text frame
//!                                     └→ close frame (HandlerResult::Close)
//! ```
//!
//! The wire types ([`IncomingMessage`], [`OutgoingResponse`]) mirror the JSON
//! exactly.  The domain types ([`Operation`], [`HandlerResult`]) are what the
//! rest of the program works with; the codec in [`super::codec`] converts
//! between the two.

use serde::{Deserialize, Deserializer, Serialize};

/// Fixed message sent when a frame arrives while no dialog is listening.
pub const NO_ACTIVE_HANDLER_MESSAGE: &str = "no input dialog is currently listening";

// ── Browser → Bridge ──────────────────────────────────────────────────────────

/// One message sent by the remote browser.
///
/// # Serde representation
///
/// ```json
/// {"operation":"input","content":"hello"}
/// {"operation":"SUBMIT"}
/// ```
///
/// `operation` is matched case-insensitively by the codec.  `content` is
/// optional; a missing or `null` value is treated as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// The requested action name (`"input"` or `"submit"`, any case).
    pub operation: String,

    /// The text payload for `input`; ignored for `submit`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Bridge → Browser ──────────────────────────────────────────────────────────

/// The JSON body sent back for every frame that does not close the socket.
///
/// ```json
/// {"success":true,"message":""}
/// {"success":false,"message":"no input dialog is currently listening"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl OutgoingResponse {
    /// A `{success:true, message:""}` response.
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    /// A `{success:false, message}` response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// ── Domain variants ───────────────────────────────────────────────────────────

/// A decoded action requested by the remote device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Replace the dialog's current text.
    Input { text: String },
    /// Press the dialog's confirm button.
    Submit,
}

impl Operation {
    /// Short variant name for log lines; never includes the typed text.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Input { .. } => "input",
            Operation::Submit => "submit",
        }
    }
}

/// What a handler wants the server to do after processing one [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    /// Reply `{success:true}`.
    Success,
    /// Reply `{success:false, message}`; the connection stays open.
    Error { message: String },
    /// Close the connection normally with `message` as the close reason.
    Close { message: String },
}

impl HandlerResult {
    pub fn error(message: impl Into<String>) -> Self {
        HandlerResult::Error {
            message: message.into(),
        }
    }

    pub fn close(message: impl Into<String>) -> Self {
        HandlerResult::Close {
            message: message.into(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
