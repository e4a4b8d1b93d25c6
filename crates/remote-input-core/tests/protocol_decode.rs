//! Integration tests for the remote-input protocol codec.
//!
//! These exercise the public API the way the bridge server uses it: decode a
//! raw text frame, hand the operation to a handler, encode the handler's
//! result into the reply frame.

use remote_input_core::{
    decode_operation, encode_result, CloseCode, HandlerResult, Operation, OutgoingResponse,
    ProtocolError, WireReply,
};

fn reply_body(reply: WireReply) -> OutgoingResponse {
    match reply {
        WireReply::Text(json) => serde_json::from_str(&json).expect("reply must be JSON"),
        WireReply::Close { .. } => panic!("expected a text reply, got {reply:?}"),
    }
}

#[test]
fn test_unrecognized_operations_always_fail_to_decode() {
    for name in ["", "inputs", "sub mit", "close", "INPUT_TEXT"] {
        let payload = format!(r#"{{"operation":"{name}","content":"x"}}"#);
        assert!(
            matches!(
                decode_operation(&payload),
                Err(ProtocolError::UnknownOperation(_))
            ),
            "{name:?} must be rejected"
        );
    }
}

#[test]
fn test_non_object_payloads_are_malformed() {
    for payload in ["", "null", "[]", "\"input\"", "42"] {
        assert!(
            matches!(
                decode_operation(payload),
                Err(ProtocolError::MalformedPayload(_))
            ),
            "{payload:?} must be malformed"
        );
    }
}

#[test]
fn test_extra_fields_are_ignored() {
    let op = decode_operation(r#"{"operation":"submit","content":"","client":"ios"}"#).unwrap();
    assert_eq!(op, Operation::Submit);
}

#[test]
fn test_unicode_content_is_preserved() {
    let op = decode_operation(r#"{"operation":"input","content":"héllo 世界"}"#).unwrap();
    assert_eq!(
        op,
        Operation::Input {
            text: "héllo 世界".to_string()
        }
    );
}

#[test]
fn test_success_reply_body() {
    let body = reply_body(encode_result(&HandlerResult::Success).unwrap());
    assert!(body.success);
    assert_eq!(body.message, "");
}

#[test]
fn test_error_reply_body() {
    let body = reply_body(encode_result(&HandlerResult::error("text too long")).unwrap());
    assert!(!body.success);
    assert_eq!(body.message, "text too long");
}

#[test]
fn test_decode_error_can_be_answered_as_error_reply() {
    // Arrange: the server turns a decode failure into a plain error reply
    let err = decode_operation(r#"{"operation":"paste"}"#).unwrap_err();

    // Act
    let body = reply_body(WireReply::error(&err.to_string()).unwrap());

    // Assert
    assert!(!body.success);
    assert!(body.message.contains("paste"));
}

#[test]
fn test_close_reply_has_reason_and_no_body() {
    let reply = encode_result(&HandlerResult::close("bye")).unwrap();
    match reply {
        WireReply::Close { code, reason } => {
            assert_eq!(code, CloseCode::Normal);
            assert_eq!(reason, "bye");
        }
        WireReply::Text(_) => panic!("close must not carry a JSON body"),
    }
}

#[test]
fn test_long_close_reason_is_truncated() {
    let long = "x".repeat(500);
    match encode_result(&HandlerResult::close(long)).unwrap() {
        WireReply::Close { reason, .. } => assert_eq!(reason.len(), 123),
        WireReply::Text(_) => panic!("expected close"),
    }
}
