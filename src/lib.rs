//! Sans-IO handling of pending SOAP calls.
//!
//! A SOAP call is issued elsewhere: some client builds the request envelope,
//! hands the bytes to a transport and gets back an [`Exchange`][transport::Exchange]
//! representing the in-flight request/response cycle. This crate picks up from
//! there. The exchange and the request bytes are wrapped in a
//! [`PendingCall`], a cheap clonable handle that can be polled for completion
//! and that decodes the response envelope once, the first time anyone asks
//! for the result.
//!
//! Transport failures (connection refused, our own deadline, HTTP 500 without
//! a body) and protocol faults sent by the server end up in the same place: a
//! fault flagged [`Message`]. Callers inspect one representation.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "http-exchange")] {
//! use soap_proto::{CallConfig, PendingCall, SoapVersion};
//! use soap_proto::transport::http::HttpExchange;
//!
//! let request = b"<soap:Envelope>...</soap:Envelope>".to_vec();
//!
//! // The transport that sent `request` feeds the response into the exchange.
//! let exchange = HttpExchange::new();
//! let call = PendingCall::new(exchange, request, CallConfig::new(SoapVersion::Soap11));
//!
//! // Nothing arrived yet.
//! assert!(!call.is_finished());
//!
//! call.with_exchange(|ex| {
//!     ex.feed(b"HTTP/1.1 200 OK\r\n\
//!         Content-Length: 202\r\n\
//!         \r\n\
//!         <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
//!         <soap:Body>\
//!         <n:getCountryResponse xmlns:n=\"urn:demo\">\
//!         <n:country>France</n:country>\
//!         </n:getCountryResponse>\
//!         </soap:Body>\
//!         </soap:Envelope>")
//!         .unwrap();
//! });
//!
//! assert!(call.is_finished());
//!
//! let message = call.return_message();
//! assert!(!message.is_fault());
//! assert_eq!(message.name(), "getCountryResponse");
//! assert_eq!(call.return_value().value(), Some("France"));
//! # }
//! ```
//!
//! # In scope:
//!
//! * Lazy, memoized decoding of the response envelope
//! * Mapping transport errors to SOAP faults
//! * Teardown that aborts exchanges nobody waits for anymore
//! * A buffered HTTP/1.1 response exchange (feature `http-exchange`)
//!
//! # Out of scope:
//!
//! * Opening/closing sockets
//! * Building the request envelope
//! * Timers, retries and connection pools
//! * Streaming responses

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

mod error;
pub use error::Error;

mod message;
pub use message::{Headers, Message, SoapValue, SoapVersion};

pub mod reader;
pub use reader::{EnvelopeReader, MessageReader};

pub mod transport;

mod pending;
pub use pending::{CallConfig, PendingCall, DEBUG_ENV, DECODE_FAULT_CODE, TIMEOUT_REASON};

mod util;

pub use http;
