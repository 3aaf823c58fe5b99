//! Pending SOAP calls
//!
//! A [`PendingCall`] is a handle to the result of one SOAP call. The handle
//! is cheap to clone; all clones share the same state, which holds the
//! transport [`Exchange`], the request bytes and, once decoded, the response.
//!
//! The state moves from *unparsed* to *parsed* exactly once:
//!
//! ```text
//!   ┌──────────────────┐   first result access,   ┌──────────────────┐
//!   │     Unparsed     │ ───────────────────────▶ │      Parsed      │
//!   └──────────────────┘   exchange finished      └──────────────────┘
//!        │      ▲
//!        └──────┘ access before the exchange finished: warn, default result
//! ```
//!
//! Parsing reads the response bytes from the exchange, decodes them with the
//! [`MessageReader`] and folds any transport error into a fault message.
//! After that, accessors only return copies of the memoized result.
//!
//! When the last clone is dropped the exchange's completion callback is
//! unbound and the exchange is aborted, in that order.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::message::{Headers, Message, SoapValue, SoapVersion};
use crate::reader::{EnvelopeReader, MessageReader};
use crate::transport::{ErrorKind, Exchange};
use crate::util::log_data;
use crate::Error;

#[cfg(test)]
mod test;

/// Fault reason used when our own deadline canceled the exchange.
pub const TIMEOUT_REASON: &str = "Operation timed out";

/// Fault code used when the response body could not be decoded.
pub const DECODE_FAULT_CODE: &str = "XmlError";

/// Environment variable turning on response tracing in [`CallConfig::from_env()`].
pub const DEBUG_ENV: &str = "SOAP_PROTO_DEBUG";

/// Settings of a pending call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallConfig {
    soap_version: SoapVersion,
    trace_response: bool,
}

impl CallConfig {
    /// Config for the given SOAP version, tracing off.
    pub fn new(soap_version: SoapVersion) -> Self {
        CallConfig {
            soap_version,
            trace_response: false,
        }
    }

    /// Config with tracing taken from the environment.
    ///
    /// Tracing is on if `SOAP_PROTO_DEBUG` holds a non-zero integer.
    pub fn from_env(soap_version: SoapVersion) -> Self {
        let trace = tracing_from_env_value(std::env::var(DEBUG_ENV).ok());
        CallConfig::new(soap_version).trace_response(trace)
    }

    /// Log the raw response bytes (at debug level) before decoding.
    ///
    /// Defaults to `false`.
    pub fn trace_response(mut self, enabled: bool) -> Self {
        self.trace_response = enabled;
        self
    }

    /// SOAP version of the call.
    pub fn soap_version(&self) -> SoapVersion {
        self.soap_version
    }

    /// Whether response tracing is on.
    pub fn is_tracing(&self) -> bool {
        self.trace_response
    }
}

fn tracing_from_env_value(value: Option<String>) -> bool {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|v| v != 0)
        .unwrap_or(false)
}

/// Handle to the result of a SOAP call.
///
/// Cloning the handle does not copy the state. The exchange is aborted when
/// the last clone is dropped.
///
/// The handle is meant for a single event loop and is not `Send`.
///
/// While [`with_exchange()`][Self::with_exchange] runs, the call is busy.
/// A completion callback fired from in there sees `is_finished() == false`
/// and default results, exactly like an access before completion. It should
/// record the completion and read the result afterwards. A clone captured by
/// the callback keeps the call alive until the callback has fired.
pub struct PendingCall<E: Exchange> {
    inner: Rc<RefCell<Inner<E>>>,
    soap_version: SoapVersion,
}

// pub(crate) for tests to inspect state
pub(crate) struct Inner<E: Exchange> {
    // Dropped before `request`. Some transports read the request bytes until
    // the exchange is gone.
    pub exchange: E,
    pub request: Vec<u8>,
    pub reader: Box<dyn MessageReader>,
    pub config: CallConfig,
    pub parsed: bool,
    pub message: Message,
    pub headers: Headers,
}

impl<E: Exchange> PendingCall<E> {
    /// Wrap an exchange and the request bytes it was sent from.
    ///
    /// The response is decoded with [`EnvelopeReader`].
    pub fn new(exchange: E, request: Vec<u8>, config: CallConfig) -> Self {
        PendingCall::with_reader(exchange, request, config, EnvelopeReader::new())
    }

    /// Like [`PendingCall::new()`], with a custom message reader.
    pub fn with_reader(
        exchange: E,
        request: Vec<u8>,
        config: CallConfig,
        reader: impl MessageReader + 'static,
    ) -> Self {
        let inner = Inner {
            exchange,
            request,
            reader: Box::new(reader),
            config,
            parsed: false,
            message: Message::default(),
            headers: Headers::new(),
        };

        debug!("{:?}", inner);

        PendingCall {
            inner: Rc::new(RefCell::new(inner)),
            soap_version: config.soap_version,
        }
    }

    /// Tell if the exchange has completed.
    ///
    /// Never parses. Exchanges that cannot report completion give `false`,
    /// and so does a busy call.
    pub fn is_finished(&self) -> bool {
        match self.inner.try_borrow() {
            Ok(inner) => inner.exchange.is_finished().unwrap_or(false),
            Err(_) => false,
        }
    }

    /// The response message.
    ///
    /// A server fault gives a fault flagged message, and so does a transport
    /// error (see [`Message::fault_code()`]). Before the exchange finished
    /// this is an empty message.
    pub fn return_message(&self) -> Message {
        self.with_parsed(|inner| inner.message.clone()).unwrap_or_default()
    }

    /// Like [`return_message()`][Self::return_message], but accessing the
    /// result before the exchange finished is an error.
    pub fn try_return_message(&self) -> Result<Message, Error> {
        self.with_parsed(|inner| inner.parsed.then(|| inner.message.clone()))
            .flatten()
            .ok_or(Error::NotFinished)
    }

    /// The response headers.
    ///
    /// Empty if the response had none, or the exchange failed at the
    /// transport level.
    pub fn return_headers(&self) -> Headers {
        self.with_parsed(|inner| inner.headers.clone()).unwrap_or_default()
    }

    /// The first value of the response message, or the empty value.
    ///
    /// This does not tell faults apart; check [`Message::is_fault()`] on
    /// [`return_message()`][Self::return_message].
    pub fn return_value(&self) -> SoapValue {
        self.with_parsed(|inner| inner.message.child_values().first().cloned())
            .flatten()
            .unwrap_or_default()
    }

    /// Tell if the response is a fault (server sent or synthesized).
    pub fn is_fault(&self) -> bool {
        self.with_parsed(|inner| inner.message.is_fault()).unwrap_or(false)
    }

    /// SOAP version of the call.
    pub fn soap_version(&self) -> SoapVersion {
        self.soap_version
    }

    /// Access the exchange, e.g. to feed it from the I/O loop.
    ///
    /// The call is busy while `f` runs.
    ///
    /// # Panics
    ///
    /// If called from inside another `with_exchange()` on the same call.
    pub fn with_exchange<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        let mut inner = self.inner.borrow_mut();
        f(&mut inner.exchange)
    }

    // None if the call is busy, i.e. accessed from a completion callback.
    fn with_parsed<R>(&self, f: impl FnOnce(&Inner<E>) -> R) -> Option<R> {
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            warn!("Accessing the result while the call is busy");
            return None;
        };
        inner.parse();
        Some(f(&inner))
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> std::cell::Ref<'_, Inner<E>> {
        self.inner.borrow()
    }
}

impl<E: Exchange> Clone for PendingCall<E> {
    fn clone(&self) -> Self {
        PendingCall {
            inner: Rc::clone(&self.inner),
            soap_version: self.soap_version,
        }
    }
}

impl<E: Exchange> Inner<E> {
    fn parse(&mut self) {
        if self.parsed {
            return;
        }

        // A later access retries once the exchange is done.
        if self.exchange.is_finished() == Some(false) {
            warn!("Parsing response before the exchange finished");
            return;
        }

        self.parsed = true;

        // Don't read from an aborted (closed) exchange.
        let data = if self.exchange.is_open() {
            self.exchange.read_all()
        } else {
            Vec::new()
        };

        if self.config.trace_response {
            log_data(&data);
        }

        let version = self.config.soap_version;
        let mut decode_error = None;

        if !data.is_empty() {
            match self.reader.decode(&data, version) {
                Ok((message, headers)) => {
                    self.message = message;
                    self.headers = headers;
                }
                Err(e) => {
                    debug!("Failed to decode response: {}", e);
                    decode_error = Some(e);
                }
            }
        }

        if let Some(err) = self.exchange.error() {
            // Headers are meaningless once the transport failed.
            self.headers.clear();

            // A fault sent by the server wins over the transport error.
            if !self.message.is_fault() {
                if err.kind().is_deadline() {
                    let code = ErrorKind::Timeout.code().to_string();
                    self.message
                        .create_fault_message(&code, TIMEOUT_REASON, version);
                } else {
                    let code = err.code().to_string();
                    self.message
                        .create_fault_message(&code, err.description(), version);
                }
            }
        } else if let Some(e) = decode_error {
            self.headers.clear();
            self.message
                .create_fault_message(DECODE_FAULT_CODE, &e.to_string(), version);
        }

        debug!("{:?}", self);
    }
}

impl<E: Exchange> Drop for Inner<E> {
    fn drop(&mut self) {
        // Unbind first, abort can notify synchronously.
        self.exchange.unbind_completion();
        self.exchange.abort();

        trace!("Release request buffer of {} bytes", self.request.len());
    }
}

impl<E: Exchange> fmt::Debug for Inner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("version", &self.config.soap_version)
            .field("request", &self.request.len())
            .field("finished", &self.exchange.is_finished())
            .field("parsed", &self.parsed)
            .field("message", &self.message.name())
            .field("fault", &self.message.is_fault())
            .field("headers", &self.headers.len())
            .finish()
    }
}

impl<E: Exchange> fmt::Debug for PendingCall<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => fmt::Debug::fmt(&*inner, f),
            Err(_) => f.write_str("PendingCall { <in use> }"),
        }
    }
}
