use std::fmt;

/// Error type for soap-proto
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum Error {
    NotFinished,
    Xml(String),
    NoEnvelope,
    UnexpectedRoot(String),
    NoBody,
    HttpParseFail(String),
    HttpParseTooManyHeaders,
    BadStatus(u16),
    BadContentLengthHeader,
    ChunkLenNotAscii,
    ChunkLenNotANumber,
    ChunkExpectedCrLf,
    BodyContentAfterFinish,
}

impl Error {
    /// Whether this error comes from decoding the response envelope.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::Xml(_) | Error::NoEnvelope | Error::UnexpectedRoot(_) | Error::NoBody
        )
    }
}

#[cfg(feature = "http-exchange")]
impl From<httparse::Error> for Error {
    fn from(value: httparse::Error) -> Self {
        Error::HttpParseFail(value.to_string())
    }
}

impl From<xml::reader::Error> for Error {
    fn from(value: xml::reader::Error) -> Self {
        Error::Xml(value.to_string())
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFinished => write!(f, "response accessed before the exchange finished"),
            Error::Xml(v) => write!(f, "XML error: {}", v),
            Error::NoEnvelope => write!(f, "response is not a SOAP envelope"),
            Error::UnexpectedRoot(v) => write!(f, "expected SOAP envelope, found <{}>", v),
            Error::NoBody => write!(f, "SOAP envelope has no body"),
            Error::HttpParseFail(v) => write!(f, "http parse fail: {}", v),
            Error::HttpParseTooManyHeaders => write!(f, "http parse resulted in too many headers"),
            Error::BadStatus(v) => write!(f, "invalid http status code: {}", v),
            Error::BadContentLengthHeader => write!(f, "content-length header not a number"),
            Error::ChunkLenNotAscii => write!(f, "chunk length is not ascii"),
            Error::ChunkLenNotANumber => write!(f, "chunk length cannot be read as a number"),
            Error::ChunkExpectedCrLf => write!(f, "chunk expected crlf as next character"),
            Error::BodyContentAfterFinish => write!(f, "received data after the response ended"),
        }
    }
}
