//! Tests for protocol error types

use crate::error::ProtocolError;

#[test]
fn test_error_creation_unknown_network() {
    let err = ProtocolError::unknown_network("devnet");
    assert!(matches!(err, ProtocolError::UnknownNetwork(ref n) if n == "devnet"));
}

#[test]
fn test_error_display() {
    let err = ProtocolError::UnhandledMimetype {
        expected: "application/bincode",
        actual: "application/json",
    };
    let msg = err.to_string();
    assert!(msg.contains("application/bincode"));
    assert!(msg.contains("application/json"));

    let err = ProtocolError::UnhandledEventType {
        name: "Foo".into(),
        major_version: 2,
    };
    assert_eq!(err.to_string(), "unhandled event type: Foo v2");

    let err = ProtocolError::decode("unexpected end of file");
    assert!(err.to_string().contains("unexpected end of file"));
}

#[test]
fn test_is_permanent() {
    assert!(ProtocolError::decode("bad").is_permanent());
    assert!(
        ProtocolError::UnhandledEventType {
            name: "Foo".into(),
            major_version: 1
        }
        .is_permanent()
    );
    assert!(
        ProtocolError::UnhandledMimetype {
            expected: "a",
            actual: "b"
        }
        .is_permanent()
    );
    assert!(!ProtocolError::encode("oops").is_permanent());
    assert!(!ProtocolError::unknown_network("x").is_permanent());
}
