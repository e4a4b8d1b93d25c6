//! Codec between WebSocket text frames and domain values.
//!
//! Decoding never panics and never throws: every frame either becomes an
//! [`Operation`] or a typed [`ProtocolError`] that the server answers with an
//! error response.  Encoding maps a [`HandlerResult`] onto exactly one
//! [`WireReply`]: a JSON text frame or a close frame.
//!
//! | HandlerResult     | WireReply                                   |
//! |-------------------|---------------------------------------------|
//! | `Success`         | `Text({"success":true,"message":""})`       |
//! | `Error{m}`        | `Text({"success":false,"message":m})`       |
//! | `Close{m}`        | `Close{code: Normal, reason: m}`            |

use thiserror::Error;
use tracing::debug;

use crate::protocol::messages::{HandlerResult, IncomingMessage, Operation, OutgoingResponse};

/// Largest close reason a WebSocket close frame can carry (125-byte control
/// payload minus the 2-byte status code).
pub const MAX_CLOSE_REASON_BYTES: usize = 123;

/// Errors produced while decoding or encoding protocol frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame is not a JSON object with a string `operation` field.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The `operation` field names no known action.
    #[error("invalid operation: {0:?}")]
    UnknownOperation(String),

    /// The frame was not a text frame.
    #[error("unsupported frame type: {0}")]
    UnsupportedFrame(&'static str),

    /// A response could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(String),
}

/// WebSocket close status used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// 1000: the handler asked to end the session.
    Normal,
    /// 1011: processing the frame raised a fault.
    InternalError,
}

impl CloseCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::InternalError => 1011,
        }
    }
}

/// One server-side reply to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireReply {
    /// Send this JSON text frame and keep the connection open.
    Text(String),
    /// Close the connection with this code and reason; no JSON body.
    Close { code: CloseCode, reason: String },
}

impl WireReply {
    /// Builds a close reply, truncating `reason` to fit in a close frame.
    pub fn close(code: CloseCode, reason: &str) -> Self {
        WireReply::Close {
            code,
            reason: truncate_close_reason(reason).to_string(),
        }
    }

    /// The internal-error close sent when handling a frame faulted.
    pub fn fault(description: &str) -> Self {
        Self::close(CloseCode::InternalError, description)
    }

    /// A `{success:false}` text reply carrying `message`.
    pub fn error(message: &str) -> Result<Self, ProtocolError> {
        encode_response(&OutgoingResponse::error(message)).map(WireReply::Text)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one text frame into an [`Operation`].
///
/// # Errors
///
/// - [`ProtocolError::MalformedPayload`] if `payload` is not valid JSON for an
///   [`IncomingMessage`].
/// - [`ProtocolError::UnknownOperation`] if the operation name is not
///   `input` or `submit` (compared case-insensitively).
///
/// # Examples
///
/// ```rust
/// use remote_input_core::{decode_operation, Operation};
///
/// let op = decode_operation(r#"{"operation":"InPut","content":"hi"}"#).unwrap();
/// assert_eq!(op, Operation::Input { text: "hi".to_string() });
/// ```
pub fn decode_operation(payload: &str) -> Result<Operation, ProtocolError> {
    let message: IncomingMessage = serde_json::from_str(payload)
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    operation_from_message(message)
}

/// Maps an already-parsed [`IncomingMessage`] onto an [`Operation`].
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownOperation`] for any name other than
/// `input` / `submit`.
pub fn operation_from_message(message: IncomingMessage) -> Result<Operation, ProtocolError> {
    let name = message.operation.as_str();
    if name.eq_ignore_ascii_case("input") {
        Ok(Operation::Input {
            text: message.content,
        })
    } else if name.eq_ignore_ascii_case("submit") {
        Ok(Operation::Submit)
    } else {
        Err(ProtocolError::UnknownOperation(message.operation))
    }
}

/// Maps a handler's [`HandlerResult`] onto the reply the server must send.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if the JSON body cannot be serialized.
pub fn encode_result(result: &HandlerResult) -> Result<WireReply, ProtocolError> {
    match result {
        HandlerResult::Success => encode_response(&OutgoingResponse::ok()).map(WireReply::Text),
        HandlerResult::Error { message } => WireReply::error(message),
        HandlerResult::Close { message } => Ok(WireReply::close(CloseCode::Normal, message)),
    }
}

/// Serializes an [`OutgoingResponse`] to its JSON text.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_response(response: &OutgoingResponse) -> Result<String, ProtocolError> {
    serde_json::to_string(response).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Cuts `reason` to at most [`MAX_CLOSE_REASON_BYTES`] on a char boundary.
pub fn truncate_close_reason(reason: &str) -> &str {
    if reason.len() <= MAX_CLOSE_REASON_BYTES {
        return reason;
    }
    let mut end = MAX_CLOSE_REASON_BYTES;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    debug!("close reason truncated from {} to {end} bytes", reason.len());
    &reason[..end]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
