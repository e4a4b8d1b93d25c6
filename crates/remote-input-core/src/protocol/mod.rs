//! Browser-facing wire protocol: JSON message types and the codec.
//!
//! Every WebSocket text frame from the browser is one [`messages::IncomingMessage`];
//! every non-close reply is one [`messages::OutgoingResponse`].

pub mod codec;
pub mod messages;

pub use codec::{decode_operation, encode_result, CloseCode, ProtocolError, WireReply};
pub use messages::{HandlerResult, IncomingMessage, Operation, OutgoingResponse};
