//! `multipart/form-data` decoding on top of the request body.
//!
//! The body is scanned for the delimiter `CRLF--boundary` one byte at a
//! time. Bytes that start to look like the delimiter are held back and
//! released again as content once the match fails, so part content is
//! returned unchanged, bare `CR`s included.

use crate::{
    errors::Error,
    http::{
        headers::{param, HeaderName, HeaderReader},
        request::Request,
        types::ContentType,
    },
    limits::DISPOSITION_NAME_SIZE,
};
use log::debug;

/// Length of the `CRLF` in front of the `--boundary` that opens the body.
const LEADING_CRLF: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Returning content of the current part
    Scanning,
    /// A delimiter followed by `CRLF`, another part follows
    BoundarySeen,
    /// The closing `--boundary--` was read
    Terminal,
    /// Decoding failed, the stream position is lost
    Failed,
}

/// Reader over the parts of a `multipart/form-data` request body.
///
/// # Examples
///
/// ```
/// use octet_http::{Multipart, Request};
///
/// fn upload(req: &mut Request<'_>) {
///     let Some(mut form) = Multipart::new(req) else {
///         return;
///     };
///
///     let mut total = 0;
///     while let Ok(true) = form.next_part() {
///         let mut buf = [0; 64];
///         while let Ok(n @ 1..) = form.read(&mut buf) {
///             total += n;
///         }
///     }
///
///     let reply = if total > 0 { "stored" } else { "empty" };
///     let _ = form.request().write_str(reply);
/// }
/// ```
pub struct Multipart<'r, 'a> {
    req: &'r mut Request<'a>,
    state: State,

    /// Length of the delimiter prefix matched so far
    matched: usize,
    /// Start of the real bytes within the matched prefix
    start: usize,
    /// Held-back delimiter bytes being released as content
    replay: std::ops::Range<usize>,
    pending: Option<u8>,

    name: [u8; DISPOSITION_NAME_SIZE],
    name_len: usize,
    content_type: ContentType,
}

impl<'r, 'a> Multipart<'r, 'a> {
    /// Starts decoding a `multipart/form-data` body with a valid boundary.
    pub fn new(req: &'r mut Request<'a>) -> Option<Self> {
        if req.content_type() != ContentType::MULTIPART_FORM_DATA || req.boundary().is_empty() {
            return None;
        }

        Some(Multipart {
            req,
            state: State::Scanning,
            // the body starts with the delimiter minus its CRLF
            matched: LEADING_CRLF,
            start: LEADING_CRLF,
            replay: 0..0,
            pending: None,

            name: [0; DISPOSITION_NAME_SIZE],
            name_len: 0,
            content_type: ContentType::UNKNOWN,
        })
    }

    /// Request the body belongs to, e.g. to write the response.
    #[inline]
    pub fn request(&mut self) -> &mut Request<'a> {
        &mut *self.req
    }

    /// Skips what is left of the current part and reads the headers of the
    /// next one. Returns `false` once the closing delimiter was reached.
    ///
    /// The first call skips the preamble and opens the first part.
    pub fn next_part(&mut self) -> Result<bool, Error> {
        while self.getch()?.is_some() {}

        if self.state == State::Terminal {
            return Ok(false);
        }

        self.name_len = 0;
        self.content_type = ContentType::UNKNOWN;

        if let Err(err) = self.read_part_headers() {
            self.fail();
            return Err(err);
        }

        self.state = State::Scanning;
        self.matched = 0;
        self.start = 0;
        Ok(true)
    }

    fn read_part_headers(&mut self) -> Result<(), Error> {
        let mut reader = HeaderReader::new();
        let req = &mut *self.req;
        let mut next = || req.getch();

        while let Some(field) = reader.next_field(&mut next)? {
            match field.name {
                HeaderName::ContentDisposition => {
                    let name = param(field.value, b"name").unwrap_or_default();
                    let len = name.len().min(DISPOSITION_NAME_SIZE);
                    if len < name.len() {
                        debug!("Truncating part name of {} bytes", name.len());
                    }

                    self.name[..len].copy_from_slice(&name[..len]);
                    self.name_len = len;
                }
                HeaderName::ContentType => self.content_type = ContentType::classify(field.value),
                _ => {}
            }
        }
        Ok(())
    }

    /// Next content byte of the current part, `Ok(None)` at its end.
    ///
    /// After a failure every further read fails with
    /// [`Error::BoundaryFraming`].
    pub fn getch(&mut self) -> Result<Option<u8>, Error> {
        if self.state == State::Failed {
            return Err(Error::BoundaryFraming);
        }

        let result = self.scan();
        if result.is_err() {
            self.fail();
        }
        result
    }

    fn scan(&mut self) -> Result<Option<u8>, Error> {
        loop {
            if self.state != State::Scanning {
                return Ok(None);
            }

            if let Some(index) = self.replay.next() {
                return Ok(Some(self.delimiter()[index]));
            }
            if let Some(byte) = self.pending.take() {
                return Ok(Some(byte));
            }

            let ch = self.req.getch()?.ok_or(Error::UnexpectedEof)?;

            if ch == self.delimiter()[self.matched] {
                self.matched += 1;
                if self.matched == self.delimiter().len() {
                    self.delimiter_end()?;
                }
                continue;
            }

            // release the held-back bytes, a CR may open the delimiter again
            self.replay = self.start..self.matched;
            self.start = 0;
            if ch == b'\r' {
                self.matched = 1;
            } else {
                self.matched = 0;
                self.pending = Some(ch);
            }
        }
    }

    /// Reads content of the current part into `buf`, `Ok(0)` at its end.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut len = 0;
        while len < buf.len() {
            match self.getch()? {
                Some(byte) => buf[len] = byte,
                None => break,
            }
            len += 1;
        }
        Ok(len)
    }

    /// Value of the `name` parameter of the part's `Content-Disposition`,
    /// truncated to [`DISPOSITION_NAME_SIZE`] bytes.
    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.name[..self.name_len]
    }

    #[inline]
    pub fn name_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(self.name()).ok()
    }

    #[inline]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Whether the closing delimiter was reached.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == State::Terminal
    }

    fn fail(&mut self) {
        self.state = State::Failed;
        self.matched = 0;
        self.start = 0;
        self.replay = 0..0;
        self.pending = None;
    }

    #[inline(always)]
    fn delimiter(&self) -> &[u8] {
        self.req.boundary()
    }

    /// Classifies what follows a complete delimiter.
    fn delimiter_end(&mut self) -> Result<(), Error> {
        let first = self.req.getch()?.ok_or(Error::UnexpectedEof)?;
        let second = self.req.getch()?.ok_or(Error::UnexpectedEof)?;

        self.state = match [first, second] {
            [b'\r', b'\n'] => State::BoundarySeen,
            [b'-', b'-'] => State::Terminal,
            _ => return Err(Error::BoundaryFraming),
        };
        self.matched = 0;
        self.start = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{limits::ReqLimits, tools::*, Arena, Route, Router};

    fn nop(_: &mut Request<'_>) {}

    static ROUTES: [Route; 1] = [Route::new("/", &nop)];
    static ROUTER: Router = Router::new(&ROUTES);

    fn with_form<F>(boundary: &str, body: &[u8], f: F)
    where
        F: FnOnce(&mut Multipart<'_, '_>),
    {
        let mut input = format!(
            "Content-Type: multipart/form-data; boundary={boundary}\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        input.extend_from_slice(body);

        let mut arena = Arena::new(&ROUTER, &ReqLimits::default());
        let mut stream = MockStream::new(&input);
        let mut req = Request::new(&mut stream, arena.split());
        req.read_headers().unwrap();

        let mut form = Multipart::new(&mut req).unwrap();
        f(&mut form);
    }

    fn content(form: &mut Multipart<'_, '_>) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        while let Some(byte) = form.getch()? {
            out.push(byte);
        }
        Ok(out)
    }

    #[test]
    fn single_part() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nHELLO\r\n--B--\r\n";

        with_form("B", body, |form| {
            assert!(form.next_part().unwrap());
            assert_eq!(form.name(), b"f");
            assert_eq!(form.content_type(), ContentType::UNKNOWN);
            assert_eq!(content(form).unwrap(), b"HELLO");

            assert!(!form.next_part().unwrap());
            assert!(form.is_finished());
            assert_eq!(form.getch().unwrap(), None);
            assert!(!form.next_part().unwrap());
        });
    }

    #[test]
    fn content_passes_through() {
        #[rustfmt::skip]
        let cases: [&[u8]; 7] = [
            b"a\rb",
            b"a\r\nb",
            b"\r\r\n",
            b"\r\n--",
            b"\r\n--X",
            b"--B",
            b"line\r\n-\r\n--\r\n--b\r\n",
        ];

        for data in cases {
            let mut body = b"--B\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\n".to_vec();
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n--B--");

            with_form("B", &body, |form| {
                assert!(form.next_part().unwrap());
                assert_eq!(content(form).unwrap(), data, "{:?}", str_op(data));
            });
        }
    }

    #[test]
    fn parts() {
        let body = b"preamble\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\
            \r\n\
            Report\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            line 1\r\nline 2\r\n\
            --XyZ--\r\n\
            epilogue";

        with_form("XyZ", body, |form| {
            assert!(form.next_part().unwrap());
            assert_eq!(form.name_str(), Some("title"));

            assert!(form.next_part().unwrap());
            assert_eq!(form.name_str(), Some("file"));
            assert_eq!(form.content_type(), ContentType::TEXT_PLAIN);

            let mut buf = [0; 5];
            assert_eq!(form.read(&mut buf).unwrap(), 5);
            assert_eq!(&buf, b"line ");
            assert_eq!(content(form).unwrap(), b"1\r\nline 2");

            assert!(!form.next_part().unwrap());
        });
    }

    #[test]
    fn long_name_truncated() {
        let name = "n".repeat(DISPOSITION_NAME_SIZE + 8);
        let body = format!("--B\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\nv\r\n--B--");

        with_form("B", body.as_bytes(), |form| {
            assert!(form.next_part().unwrap());
            assert_eq!(form.name().len(), DISPOSITION_NAME_SIZE);
            assert_eq!(content(form).unwrap(), b"v");
        });
    }

    #[test]
    fn broken_framing() {
        #[rustfmt::skip]
        let cases: [&[u8]; 3] = [
            b"--B\r\n\r\nabc\r\n--Bxx",
            b"--B\r\n\r\nabc",
            b"--B",
        ];

        for body in cases {
            with_form("B", body, |form| {
                let result = form.next_part().and_then(|_| content(form));
                assert!(result.is_err(), "{:?}", str_op(body));
            });
        }
    }

    #[test]
    fn failure_is_sticky() {
        #[rustfmt::skip]
        let cases: [&[u8]; 3] = [
            b"--B\r\n\r\nabc\r\n--Bxxmore",
            b"--B\r\n\r\nabc\r\n--B",
            b"--B\r\nContent-Type: text/plain\r",
        ];

        for body in cases {
            with_form("B", body, |form| {
                let result = form.next_part().and_then(|_| content(form));
                assert!(result.is_err(), "{:?}", str_op(body));

                let mut buf = [0; 8];
                assert!(form.getch().is_err(), "{:?}", str_op(body));
                assert!(form.read(&mut buf).is_err(), "{:?}", str_op(body));
                assert!(form.next_part().is_err(), "{:?}", str_op(body));
                assert!(!form.is_finished());
            });
        }
    }

    #[test]
    fn requires_multipart() {
        let mut arena = Arena::new(&ROUTER, &ReqLimits::default());
        let mut stream = MockStream::new(b"Content-Type: text/plain\r\n\r\n");
        let mut req = Request::new(&mut stream, arena.split());
        req.read_headers().unwrap();

        assert!(Multipart::new(&mut req).is_none());
    }
}
