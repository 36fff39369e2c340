use crate::StatusCode;
use std::{error, fmt, io};

/// Failure of a body read, multipart read or response write.
///
/// Once a request body has failed to decode the stream position is lost,
/// there is no way to resynchronize and the request should be abandoned.
#[derive(Debug)]
pub enum Error {
    /// The octet stream collaborator failed
    Io(io::Error),
    /// The stream ended in the middle of a structure
    UnexpectedEof,
    /// A header block or request line violated the protocol
    Malformed,
    /// Chunked transfer framing did not have the expected shape
    ChunkFraming,
    /// A multipart boundary was followed by something other than `CRLF` or `--`
    BoundaryFraming,
    /// A body write was attempted after the declared `Content-Length` was sent
    ContentLengthExceeded,
    /// The sent-octets counter would overflow
    Overflow,
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "stream error: {err}"),
            Error::UnexpectedEof => f.write_str("unexpected end of stream"),
            Error::Malformed => f.write_str("malformed input"),
            Error::ChunkFraming => f.write_str("invalid chunked transfer framing"),
            Error::BoundaryFraming => f.write_str("invalid multipart boundary framing"),
            Error::ContentLengthExceeded => f.write_str("declared content length already sent"),
            Error::Overflow => f.write_str("sent octet counter overflow"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Reasons a request is aborted before its handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    Stream,
    Malformed,
    UriTooLong,
    UnknownMethod,
    UnsupportedVersion,
    NotFound,
    MethodNotAllowed,
}

macro_rules! abort_statuses {
    ($($name:ident => $status:ident,)*) => {
        impl ErrorKind {
            pub(crate) const fn status(&self) -> StatusCode {
                match self { $(
                    ErrorKind::$name => StatusCode::$status,
                )* }
            }
        }
    };
}

abort_statuses! {
    Stream => INTERNAL_SERVER_ERROR,
    Malformed => BAD_REQUEST,
    UriTooLong => URI_TOO_LONG,
    UnknownMethod => NOT_IMPLEMENTED,
    UnsupportedVersion => HTTP_VERSION_NOT_SUPPORTED,
    NotFound => NOT_FOUND,
    MethodNotAllowed => METHOD_NOT_ALLOWED,
}

impl error::Error for ErrorKind {}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.status())
    }
}

impl From<Error> for ErrorKind {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(_) | Error::UnexpectedEof => ErrorKind::Stream,
            _ => ErrorKind::Malformed,
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(_: io::Error) -> Self {
        ErrorKind::Stream
    }
}
