use http::StatusCode;

use crate::message::SoapVersion;
use crate::transport::{CancelCause, ErrorKind, TransportError};

use super::scenario::{Scenario, SOAP11_FAULT, SOAP11_OK, SOAP12_FAULT};

#[test]
fn server_fault_wins_over_transport_error() {
    let scenario = Scenario::builder()
        .body(SOAP11_FAULT)
        .error(TransportError::status(StatusCode::INTERNAL_SERVER_ERROR))
        .build();
    let call = &scenario.call;

    let message = call.return_message();
    assert!(message.is_fault());
    assert_eq!(message.fault_code(), Some("soap:Server"));
    assert_eq!(message.fault_reason(), Some("Employee not found"));

    // The envelope had a header, but the transport failed.
    assert!(call.return_headers().is_empty());
}

#[test]
fn soap12_server_fault() {
    let scenario = Scenario::builder()
        .version(SoapVersion::Soap12)
        .body(SOAP12_FAULT)
        .error(TransportError::status(StatusCode::INTERNAL_SERVER_ERROR))
        .build();

    let message = scenario.call.return_message();
    assert_eq!(message.fault_code(), Some("env:Receiver"));
    assert_eq!(message.fault_reason(), Some("Database down"));
}

#[test]
fn server_fault_without_transport_error() {
    let scenario = Scenario::builder().body(SOAP11_FAULT).build();
    let call = &scenario.call;

    assert!(call.is_fault());
    assert_eq!(call.return_headers().len(), 1);

    // The fault's first child is still returned as value.
    assert_eq!(call.return_value().name(), "faultcode");
}

#[test]
fn transport_error_without_body() {
    let scenario = Scenario::builder()
        .error(TransportError::new(
            ErrorKind::ConnectionRefused,
            "Connection refused",
        ))
        .build();
    let call = &scenario.call;

    let message = call.return_message();
    assert!(message.is_fault());
    assert_eq!(message.fault_code(), Some("1"));
    assert_eq!(message.fault_reason(), Some("Connection refused"));
    assert!(call.return_headers().is_empty());
}

#[test]
fn transport_error_with_non_fault_body() {
    let scenario = Scenario::builder()
        .body(SOAP11_OK)
        .error(TransportError::status(StatusCode::NOT_FOUND))
        .build();
    let call = &scenario.call;

    let message = call.return_message();
    assert!(message.is_fault());
    assert_eq!(message.fault_code(), Some("404"));
    assert_eq!(message.fault_reason(), Some("server replied: Not Found"));
    assert!(call.return_headers().is_empty());
}

#[test]
fn transport_error_with_undecodable_body() {
    let scenario = Scenario::builder()
        .body("<html><body>Bad Gateway</body></html>")
        .error(TransportError::status(StatusCode::BAD_GATEWAY))
        .build();

    let message = scenario.call.return_message();
    assert_eq!(message.fault_code(), Some("502"));
    assert_eq!(message.fault_reason(), Some("server replied: Bad Gateway"));
}

#[test]
fn deadline_cancel_is_a_timeout() {
    let scenario = Scenario::builder()
        .closed()
        .error(TransportError::deadline())
        .build();

    let message = scenario.call.return_message();
    assert!(message.is_fault());
    assert_eq!(message.fault_code(), Some("4"));
    assert_eq!(message.fault_reason(), Some("Operation timed out"));
}

#[test]
fn deadline_cancel_soap12_layout() {
    let scenario = Scenario::builder()
        .version(SoapVersion::Soap12)
        .closed()
        .error(TransportError::deadline())
        .build();

    let message = scenario.call.return_message();
    let code = message.as_value().child("Code").unwrap();
    assert_eq!(code.child("Value").unwrap().value(), Some("4"));
    assert_eq!(message.fault_reason(), Some(crate::TIMEOUT_REASON));
}

#[test]
fn other_cancel_is_not_a_timeout() {
    let scenario = Scenario::builder()
        .closed()
        .error(TransportError::new(
            ErrorKind::Canceled(CancelCause::Other),
            "Operation canceled",
        ))
        .build();

    let message = scenario.call.return_message();
    assert_eq!(message.fault_code(), Some("5"));
    assert_eq!(message.fault_reason(), Some("Operation canceled"));
}

#[test]
fn fault_is_stable() {
    let scenario = Scenario::builder()
        .error(TransportError::from_kind(ErrorKind::HostNotFound))
        .build();
    let call = &scenario.call;

    let first = call.return_message();
    assert_eq!(first.fault_as_string(), "Fault code 3: host not found");

    for _ in 0..3 {
        assert_eq!(call.return_message(), first);
    }
    assert_eq!(scenario.tracker.reads.get(), 1);
}
