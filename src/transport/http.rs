//! Buffered HTTP/1.x response exchange.
//!
//! [`HttpExchange`] is the receiving half of a SOAP call over HTTP. The I/O
//! layer that sent the request feeds whatever it reads from the socket into
//! [`HttpExchange::feed()`], and tells the exchange about end of stream,
//! failures and deadlines. The exchange parses the status line and headers,
//! buffers the body (content-length, chunked or close delimited) and reports
//! completion through [`Exchange`].

use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};

use crate::util::find_crlf;
use crate::Error;

use super::{CancelCause, ErrorKind, Exchange, TransportError};

/// Max number of headers to parse from an HTTP response
pub const MAX_RESPONSE_HEADERS: usize = 128;

type Callback = Box<dyn FnMut()>;

/// A single HTTP response being received.
///
/// A status of 400 or above finishes the exchange with
/// [`ErrorKind::Status`], but the body is still kept: SOAP servers send
/// faults with `500 Internal Server Error`.
pub struct HttpExchange {
    phase: Phase,
    input: Vec<u8>,
    status: Option<StatusCode>,
    version: Option<Version>,
    headers: HeaderMap,
    body: Vec<u8>,
    body_taken: bool,
    open: bool,
    error: Option<TransportError>,
    on_finished: Option<Callback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    RecvResponse,
    RecvBody(BodyMode),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    LengthDelimited(usize),
    Chunked(Chunk),
    CloseDelimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    Len,
    Data(usize),
    DataCrLf,
    Trailer,
}

impl HttpExchange {
    /// Create an exchange awaiting the response.
    pub fn new() -> Self {
        HttpExchange {
            phase: Phase::RecvResponse,
            input: Vec::new(),
            status: None,
            version: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
            body_taken: false,
            open: true,
            error: None,
            on_finished: None,
        }
    }

    /// Register the completion callback.
    ///
    /// The callback runs once, when the exchange finishes or is aborted. It
    /// runs while the exchange is borrowed, so it should only record or
    /// schedule work.
    pub fn on_finished(&mut self, callback: impl FnMut() + 'static) {
        self.on_finished = Some(Box::new(callback));
    }

    /// Feed bytes read from the connection.
    ///
    /// On a malformed response the exchange finishes with
    /// [`ErrorKind::Protocol`] and the parse error is returned.
    pub fn feed(&mut self, input: &[u8]) -> Result<(), Error> {
        if self.phase == Phase::Finished {
            if input.is_empty() {
                return Ok(());
            }
            return Err(Error::BodyContentAfterFinish);
        }

        self.input.extend_from_slice(input);

        if let Err(e) = self.advance() {
            debug!("Response parse failed: {}", e);
            self.finish(Some(TransportError::new(ErrorKind::Protocol, e.to_string())));
            return Err(e);
        }

        Ok(())
    }

    /// The peer closed the connection.
    pub fn feed_eof(&mut self) {
        match self.phase {
            Phase::Finished => {}
            Phase::RecvBody(BodyMode::CloseDelimited) => {
                let rest = std::mem::take(&mut self.input);
                self.body.extend_from_slice(&rest);
                let error = self.status_error();
                self.finish(error);
            }
            _ => {
                self.finish(Some(TransportError::from_kind(ErrorKind::RemoteHostClosed)));
            }
        }
    }

    /// The I/O layer failed, e.g. connection refused or reset.
    pub fn fail(&mut self, error: TransportError) {
        if self.phase == Phase::Finished {
            return;
        }
        self.open = false;
        self.finish(Some(error));
    }

    /// Abort because the call deadline passed.
    ///
    /// This is for the component enforcing call timeouts. The resulting
    /// cancel error is marked with [`CancelCause::Deadline`], which pending
    /// calls turn into a timeout fault.
    pub fn abort_on_deadline(&mut self) {
        self.cancel(CancelCause::Deadline);
    }

    /// Response status, once the headers are received.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// HTTP version of the response, once the headers are received.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Response headers. Empty until received.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn cancel(&mut self, cause: CancelCause) {
        self.open = false;
        if self.phase == Phase::Finished {
            return;
        }
        self.finish(Some(TransportError::from_kind(ErrorKind::Canceled(cause))));
    }

    fn advance(&mut self) -> Result<(), Error> {
        loop {
            match self.phase {
                Phase::RecvResponse => {
                    if !self.try_response()? {
                        return Ok(());
                    }
                }
                Phase::RecvBody(mode) => {
                    self.read_body(mode)?;
                    return Ok(());
                }
                Phase::Finished => return Ok(()),
            }
        }
    }

    // Returns true if the phase moved on.
    fn try_response(&mut self) -> Result<bool, Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_RESPONSE_HEADERS];
        let mut res = httparse::Response::new(&mut headers);

        let input_used = match res.parse(&self.input) {
            Ok(httparse::Status::Complete(n)) => n,
            Ok(httparse::Status::Partial) => return Ok(false),
            Err(httparse::Error::TooManyHeaders) => return Err(Error::HttpParseTooManyHeaders),
            Err(e) => return Err(e.into()),
        };

        let code = res.code.unwrap_or_default();
        let status = StatusCode::from_u16(code).map_err(|_| Error::BadStatus(code))?;

        let version = match res.version {
            Some(0) => Version::HTTP_10,
            _ => Version::HTTP_11,
        };

        let mut map = HeaderMap::with_capacity(res.headers.len());
        for h in res.headers.iter() {
            let name = HeaderName::from_bytes(h.name.as_bytes())
                .map_err(|e| Error::HttpParseFail(e.to_string()))?;
            let value = HeaderValue::from_bytes(h.value)
                .map_err(|e| Error::HttpParseFail(e.to_string()))?;
            map.append(name, value);
        }

        self.input.drain(..input_used);

        if status.is_informational() {
            // 100-continue and friends precede the actual response.
            debug!("Skip interim response: {}", status);
            return Ok(true);
        }

        let mode = body_mode(status, &map)?;

        debug!("Response {:?} {}, body: {:?}", version, status, mode);

        self.status = Some(status);
        self.version = Some(version);
        self.headers = map;

        match mode {
            Some(mode) => self.phase = Phase::RecvBody(mode),
            None => {
                let error = self.status_error();
                self.finish(error);
            }
        }

        Ok(true)
    }

    fn read_body(&mut self, mode: BodyMode) -> Result<(), Error> {
        match mode {
            BodyMode::LengthDelimited(left) => {
                let take = left.min(self.input.len());
                self.body.extend(self.input.drain(..take));
                if left == take {
                    let error = self.status_error();
                    self.finish(error);
                } else {
                    self.phase = Phase::RecvBody(BodyMode::LengthDelimited(left - take));
                }
            }
            BodyMode::Chunked(chunk) => self.read_chunked(chunk)?,
            BodyMode::CloseDelimited => {
                self.body.append(&mut self.input);
            }
        }
        Ok(())
    }

    fn read_chunked(&mut self, mut chunk: Chunk) -> Result<(), Error> {
        loop {
            match chunk {
                Chunk::Len => {
                    let Some(pos) = find_crlf(&self.input) else {
                        break;
                    };
                    let line = &self.input[..pos];
                    if !line.is_ascii() {
                        return Err(Error::ChunkLenNotAscii);
                    }
                    // chunk extensions after ';' are ignored
                    let line = String::from_utf8_lossy(line);
                    let hex = line.split(';').next().unwrap_or_default().trim();
                    // from_str_radix alone would take a leading '+'
                    if hex.is_empty() || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
                        return Err(Error::ChunkLenNotANumber);
                    }
                    let len =
                        usize::from_str_radix(hex, 16).map_err(|_| Error::ChunkLenNotANumber)?;
                    self.input.drain(..pos + 2);
                    chunk = if len == 0 {
                        Chunk::Trailer
                    } else {
                        Chunk::Data(len)
                    };
                }
                Chunk::Data(left) => {
                    let take = left.min(self.input.len());
                    if take == 0 {
                        break;
                    }
                    self.body.extend(self.input.drain(..take));
                    chunk = if left == take {
                        Chunk::DataCrLf
                    } else {
                        Chunk::Data(left - take)
                    };
                }
                Chunk::DataCrLf => {
                    if self.input.len() < 2 {
                        break;
                    }
                    if &self.input[..2] != b"\r\n" {
                        return Err(Error::ChunkExpectedCrLf);
                    }
                    self.input.drain(..2);
                    chunk = Chunk::Len;
                }
                Chunk::Trailer => {
                    let Some(pos) = find_crlf(&self.input) else {
                        break;
                    };
                    self.input.drain(..pos + 2);
                    if pos == 0 {
                        let error = self.status_error();
                        self.finish(error);
                        return Ok(());
                    }
                }
            }
        }

        self.phase = Phase::RecvBody(BodyMode::Chunked(chunk));
        Ok(())
    }

    fn status_error(&self) -> Option<TransportError> {
        let status = self.status?;
        if status.is_client_error() || status.is_server_error() {
            Some(TransportError::status(status))
        } else {
            None
        }
    }

    fn finish(&mut self, error: Option<TransportError>) {
        self.phase = Phase::Finished;
        if self.error.is_none() {
            self.error = error;
        }

        debug!("{:?}", self);

        if let Some(mut callback) = self.on_finished.take() {
            callback();
        }
    }
}

fn body_mode(status: StatusCode, headers: &HeaderMap) -> Result<Option<BodyMode>, Error> {
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return Ok(None);
    }

    let chunked = headers
        .get_all(http::header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains("chunked"));

    if chunked {
        return Ok(Some(BodyMode::Chunked(Chunk::Len)));
    }

    if let Some(v) = headers.get(http::header::CONTENT_LENGTH) {
        let len = v
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or(Error::BadContentLengthHeader)?;
        if len == 0 {
            return Ok(None);
        }
        return Ok(Some(BodyMode::LengthDelimited(len)));
    }

    Ok(Some(BodyMode::CloseDelimited))
}

impl Default for HttpExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange for HttpExchange {
    fn is_finished(&self) -> Option<bool> {
        Some(self.phase == Phase::Finished)
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_all(&mut self) -> Vec<u8> {
        if !self.open || self.body_taken {
            return Vec::new();
        }
        self.body_taken = true;
        std::mem::take(&mut self.body)
    }

    fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    fn unbind_completion(&mut self) {
        self.on_finished = None;
    }

    fn abort(&mut self) {
        self.cancel(CancelCause::Other);
    }
}

impl fmt::Debug for HttpExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpExchange")
            .field("phase", &self.phase)
            .field("status", &self.status)
            .field("body", &self.body.len())
            .field("open", &self.open)
            .field("error", &self.error)
            .finish()
    }
}
