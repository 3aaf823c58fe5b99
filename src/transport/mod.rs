//! The transport side of a pending call.
//!
//! A [`PendingCall`][crate::PendingCall] owns one [`Exchange`]: a single
//! request/response cycle that some I/O layer drives to completion. The core
//! only ever asks the exchange questions, reads its bytes once, and aborts it
//! when the last handle goes away.

use std::fmt;

use ::http::StatusCode;

#[cfg(feature = "http-exchange")]
pub mod http;

/// One in-flight request/response cycle.
pub trait Exchange {
    /// Whether the exchange has completed, successfully or not.
    ///
    /// `None` means the transport cannot tell. Such exchanges are always read
    /// right away, and [`PendingCall::is_finished()`][crate::PendingCall::is_finished]
    /// reports `false` for them.
    fn is_finished(&self) -> Option<bool>;

    /// Whether the response can still be read. Aborted exchanges are closed.
    fn is_open(&self) -> bool;

    /// Take all buffered response bytes.
    ///
    /// Valid once per completion, later calls return nothing.
    fn read_all(&mut self) -> Vec<u8>;

    /// The transport level error, if the exchange failed.
    fn error(&self) -> Option<&TransportError>;

    /// Drop the completion callback. Nothing is notified after this.
    fn unbind_completion(&mut self);

    /// Abort the exchange and close the underlying connection.
    ///
    /// May synchronously notify completion if it is still bound.
    fn abort(&mut self);
}

/// Why an exchange was canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// Canceled by whoever enforces the call deadline.
    Deadline,
    /// Canceled for any other reason.
    Other,
}

/// Kinds of transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote end refused the connection.
    ConnectionRefused,
    /// The remote end closed the connection before the response was complete.
    RemoteHostClosed,
    /// Name resolution failed.
    HostNotFound,
    /// The transport itself timed out.
    Timeout,
    /// The exchange was aborted.
    Canceled(CancelCause),
    /// TLS handshake or session failure.
    Tls,
    /// The response could not be parsed.
    Protocol,
    /// The server answered with an error status.
    Status(StatusCode),
}

impl ErrorKind {
    /// Numeric code of the error, used as fault code for synthesized faults.
    ///
    /// For [`ErrorKind::Status`] this is the HTTP status.
    pub fn code(&self) -> u16 {
        match self {
            ErrorKind::ConnectionRefused => 1,
            ErrorKind::RemoteHostClosed => 2,
            ErrorKind::HostNotFound => 3,
            ErrorKind::Timeout => 4,
            ErrorKind::Canceled(_) => 5,
            ErrorKind::Tls => 6,
            ErrorKind::Protocol => 99,
            ErrorKind::Status(s) => s.as_u16(),
        }
    }

    /// Tell if this is a cancel caused by our own deadline.
    pub fn is_deadline(&self) -> bool {
        matches!(self, ErrorKind::Canceled(CancelCause::Deadline))
    }

    fn explain(&self) -> &'static str {
        match self {
            ErrorKind::ConnectionRefused => "connection refused",
            ErrorKind::RemoteHostClosed => "remote host closed the connection",
            ErrorKind::HostNotFound => "host not found",
            ErrorKind::Timeout => "operation timed out",
            ErrorKind::Canceled(_) => "operation canceled",
            ErrorKind::Tls => "tls failure",
            ErrorKind::Protocol => "protocol failure",
            ErrorKind::Status(_) => "server replied with an error",
        }
    }
}

/// A transport level failure of an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: ErrorKind,
    description: String,
}

impl TransportError {
    /// Create an error with a description.
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        TransportError {
            kind,
            description: description.into(),
        }
    }

    /// An error with the default description of the kind.
    pub fn from_kind(kind: ErrorKind) -> Self {
        TransportError::new(kind, kind.explain())
    }

    /// Error for a response with a 4xx or 5xx status.
    pub fn status(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        TransportError::new(
            ErrorKind::Status(status),
            format!("server replied: {}", reason),
        )
    }

    /// The exchange was canceled because the call deadline passed.
    pub fn deadline() -> Self {
        TransportError::from_kind(ErrorKind::Canceled(CancelCause::Deadline))
    }

    /// Kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Numeric error code, see [`ErrorKind::code()`].
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    /// Human readable description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description, self.code())
    }
}

impl std::error::Error for TransportError {}
