//! Response writer: lazy headers, `Content-Length` budget and `HEAD` suppression.
//!
//! The status line and headers go out on the first body write or on an
//! explicit [`send_headers`](crate::Request::send_headers), whichever comes
//! first. Connections are never kept alive, so every response carries
//! `Connection: close`.

use crate::{
    errors::Error,
    http::types::{number_to_bytes, Method, StatusCode},
    Request,
};

const SERVER: &str = concat!("octet_http/", env!("CARGO_PKG_VERSION"));
const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// # Response
///
/// Setters return `false` once the headers were sent, the change is
/// then refused.
impl Request<'_> {
    #[inline]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn set_status(&mut self, status: StatusCode) -> bool {
        if self.sent.header {
            return false;
        }
        self.status = status;
        true
    }

    /// Defaults to `text/plain` when never set.
    #[inline]
    pub fn set_content_type(&mut self, content_type: &'static str) -> bool {
        if self.sent.header {
            return false;
        }
        self.outbound.content_type = Some(content_type);
        true
    }

    /// Value of the `Content-Disposition` header, e.g.
    /// `attachment; filename="report.csv"`.
    #[inline]
    pub fn set_content_disposition(&mut self, disposition: &'static str) -> bool {
        if self.sent.header {
            return false;
        }
        self.outbound.content_disposition = Some(disposition);
        true
    }

    /// Declares the body length. Body writes are clipped to it, `0` leaves
    /// the body unbounded and the header out.
    #[inline]
    pub fn set_content_length(&mut self, len: usize) -> bool {
        if self.sent.header {
            return false;
        }
        self.outbound.content_length = len;
        true
    }

    /// Challenges the client for Basic credentials: sets `401` and the
    /// `WWW-Authenticate` header.
    ///
    /// # Examples
    ///
    /// ```
    /// use octet_http::{AuthScheme, Request};
    ///
    /// fn private(req: &mut Request<'_>) {
    ///     if req.auth_scheme() != AuthScheme::Basic || req.password() != Some(b"secret") {
    ///         req.request_basic_auth("private");
    ///         let _ = req.write(b"who are you?");
    ///         return;
    ///     }
    ///     let _ = req.write(b"welcome");
    /// }
    /// ```
    pub fn request_basic_auth(&mut self, realm: &'static str) -> bool {
        if self.sent.header {
            return false;
        }
        self.status = StatusCode::UNAUTHORIZED;
        self.outbound.auth_realm = Some(realm);
        true
    }

    #[inline]
    pub const fn headers_sent(&self) -> bool {
        self.sent.header
    }

    /// Body octets accounted so far, including suppressed `HEAD` bodies.
    #[inline]
    pub const fn sent(&self) -> usize {
        self.sent.octets
    }

    /// Sends the status line and headers. Once they went out, later calls do
    /// nothing. A failed attempt leaves them unsent.
    pub fn send_headers(&mut self) -> Result<(), Error> {
        if self.sent.header {
            return Ok(());
        }

        let (status, version) = (self.status, self.version);
        let Request {
            stream, outbound, ..
        } = self;

        let (major, minor) = (b'0' + version.major, b'0' + version.minor);
        stream.write_all(&[b'H', b'T', b'T', b'P', b'/', major, b'.', minor, b' '])?;

        let (digits, start) = number_to_bytes(status.0 as u64);
        stream.write_all(&digits[start..])?;
        stream.write_all(b" ")?;
        stream.write_all(status.reason().as_bytes())?;

        stream.write_all(b"\r\nServer: ")?;
        stream.write_all(SERVER.as_bytes())?;
        stream.write_all(b"\r\nConnection: close\r\nContent-Type: ")?;
        stream.write_all(
            outbound
                .content_type
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .as_bytes(),
        )?;
        stream.write_all(b"\r\n")?;

        if let Some(disposition) = outbound.content_disposition {
            stream.write_all(b"Content-Disposition: ")?;
            stream.write_all(disposition.as_bytes())?;
            stream.write_all(b"\r\n")?;
        }
        if outbound.content_length != 0 {
            let (digits, start) = number_to_bytes(outbound.content_length as u64);
            stream.write_all(b"Content-Length: ")?;
            stream.write_all(&digits[start..])?;
            stream.write_all(b"\r\n")?;
        }
        if let Some(realm) = outbound.auth_realm {
            stream.write_all(b"WWW-Authenticate: Basic realm=\"")?;
            stream.write_all(realm.as_bytes())?;
            stream.write_all(b"\"\r\n")?;
        }

        stream.write_all(b"\r\n")?;
        self.sent.header = true;
        Ok(())
    }

    /// Writes body bytes, sending the headers first if needed.
    ///
    /// Returns how many bytes of `buf` were accepted: writes are clipped to
    /// the declared `Content-Length` and fail with
    /// [`Error::ContentLengthExceeded`] once it is used up. For `HEAD`
    /// requests nothing is transmitted but the bytes are accounted as sent.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.send_headers()?;

        let len = match self.outbound.content_length {
            0 => buf.len(),
            declared => {
                let left = declared.saturating_sub(self.sent.octets);
                if left == 0 && !buf.is_empty() {
                    return Err(Error::ContentLengthExceeded);
                }
                buf.len().min(left)
            }
        };

        let total = self.sent.octets.checked_add(len).ok_or(Error::Overflow)?;
        if self.method != Method::Head {
            self.stream().write_all(&buf[..len])?;
        }
        self.sent.octets = total;
        Ok(len)
    }

    #[inline]
    pub fn write_str(&mut self, text: &str) -> Result<usize, Error> {
        self.write(text.as_bytes())
    }

    /// Answers with `status` and its reason phrase as the whole body.
    ///
    /// Meant for requests that are rejected before reaching a handler.
    pub fn status_response(&mut self, status: StatusCode) -> Result<(), Error> {
        let reason = status.reason();

        self.set_status(status);
        self.set_content_length(reason.len());
        self.write(reason.as_bytes()).map(|_| ())
    }

    #[inline]
    pub(crate) fn flush(&mut self) -> Result<(), Error> {
        self.stream().flush().map_err(Error::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{limits::ReqLimits, tools::*, Arena, Route, Router, Version};

    fn nop(_: &mut Request<'_>) {}

    static ROUTES: [Route; 1] = [Route::new("/", &nop)];
    static ROUTER: Router = Router::new(&ROUTES);

    fn respond<F>(method: Method, f: F) -> MockStream
    where
        F: FnOnce(&mut Request<'_>),
    {
        let mut arena = Arena::new(&ROUTER, &ReqLimits::default());
        let mut stream = MockStream::new(b"");

        let mut req = Request::new(&mut stream, arena.split());
        req.method = method;
        req.version = Version::HTTP_11;
        f(&mut req);
        drop(req);
        stream
    }

    fn header_block(extra: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nServer: {SERVER}\r\nConnection: close\r\n\
            Content-Type: text/plain\r\n{extra}\r\n"
        )
    }

    #[test]
    fn lazy_headers() {
        let stream = respond(Method::Get, |req| {
            assert_eq!(req.write(b"hi").unwrap(), 2);
            assert!(req.headers_sent());
        });

        assert_eq!(stream.output_str(), header_block("") + "hi");
    }

    #[test]
    fn send_headers_once() {
        let stream = respond(Method::Get, |req| {
            req.send_headers().unwrap();
            req.send_headers().unwrap();
            req.flush().unwrap();
        });
        let once = respond(Method::Get, |req| req.send_headers().unwrap());

        assert_eq!(stream.write_calls, once.write_calls);
        assert_eq!(stream.output_str(), header_block(""));
        assert_eq!(stream.flushes, 1);
    }

    #[test]
    fn header_order() {
        let stream = respond(Method::Get, |req| {
            assert!(req.set_content_type("application/json"));
            assert!(req.set_content_disposition("attachment; filename=\"a.json\""));
            assert!(req.set_content_length(2));
            assert!(req.request_basic_auth("area 51"));
            req.write(b"{}").unwrap();

            assert!(!req.set_status(StatusCode::OK));
            assert!(!req.set_content_type("text/html"));
            assert!(!req.request_basic_auth("other"));
        });

        let expected = format!(
            "HTTP/1.1 401 Unauthorized\r\n\
            Server: {SERVER}\r\n\
            Connection: close\r\n\
            Content-Type: application/json\r\n\
            Content-Disposition: attachment; filename=\"a.json\"\r\n\
            Content-Length: 2\r\n\
            WWW-Authenticate: Basic realm=\"area 51\"\r\n\
            \r\n{{}}"
        );
        assert_eq!(stream.output_str(), expected);
    }

    #[test]
    fn content_length_budget() {
        let stream = respond(Method::Get, |req| {
            req.set_content_length(5);

            assert_eq!(req.write(b"0123456789").unwrap(), 5);
            assert!(matches!(req.write(b"x"), Err(Error::ContentLengthExceeded)));
            assert_eq!(req.write(b"").unwrap(), 0);
            assert_eq!(req.sent(), 5);
        });

        assert!(stream.output_str().ends_with("\r\n\r\n01234"));
    }

    #[test]
    fn head_suppresses_body() {
        let stream = respond(Method::Head, |req| {
            req.set_content_length(5);
            assert_eq!(req.write(b"abc").unwrap(), 3);
            assert_eq!(req.write(b"defgh").unwrap(), 2);
            assert_eq!(req.sent(), 5);
        });

        assert_eq!(stream.output_str(), header_block("Content-Length: 5\r\n"));
    }

    #[test]
    fn status_responses() {
        #[rustfmt::skip]
        let cases = [
            (StatusCode::NOT_FOUND,     "404 Not Found",     "Not Found"),
            (StatusCode::URI_TOO_LONG,  "414 URI Too Long",  "URI Too Long"),
            (StatusCode(299),           "299 ...",           "..."),
        ];

        for (status, line, body) in cases {
            let stream = respond(Method::Get, |req| req.status_response(status).unwrap());

            let expected = format!(
                "HTTP/1.1 {line}\r\nServer: {SERVER}\r\nConnection: close\r\n\
                Content-Type: text/plain\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            assert_eq!(stream.output_str(), expected);
        }
    }

    #[test]
    fn write_failure() {
        let mut arena = Arena::new(&ROUTER, &ReqLimits::default());
        let mut stream = MockStream::new(b"").fail_writes(usize::MAX);
        let mut req = Request::new(&mut stream, arena.split());

        assert!(matches!(req.write(b"x"), Err(Error::Io(_))));
        assert!(!req.headers_sent());
        assert!(req.send_headers().is_err());
    }

    #[test]
    fn headers_resent_after_failure() {
        let mut arena = Arena::new(&ROUTER, &ReqLimits::default());
        let mut stream = MockStream::new(b"").fail_writes(1);
        let mut req = Request::new(&mut stream, arena.split());

        assert!(req.send_headers().is_err());
        assert!(!req.headers_sent());
        assert!(req.set_status(StatusCode::NOT_FOUND));

        req.send_headers().unwrap();
        assert!(req.headers_sent());
        drop(req);

        assert!(stream.output_str().starts_with("HTTP/1.0 404 Not Found\r\n"));
    }
}
