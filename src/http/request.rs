use crate::{
    errors::Error,
    http::{
        base64,
        headers::{param, Authorization, Field, HeaderName, HeaderReader},
        route::{Route, Router},
        types::{slice_to_usize, ContentType, Method, StatusCode, Version},
    },
    limits::{ChunkFraming, ReqLimits, BOUNDARY_SIZE, HEADER_VALUE_SIZE},
    OctetStream,
};
use log::debug;

const DELIMITER_PREFIX: &[u8; 4] = b"\r\n--";

/// Memory a worker parses requests into.
///
/// Allocated once from the route table and the [`ReqLimits`], then reused
/// for every request, parsing itself never allocates.
///
/// # Examples
///
/// ```
/// use octet_http::{limits::ReqLimits, Arena, Request, Route, Router};
///
/// fn index(_: &mut Request<'_>) {}
///
/// static ROUTES: [Route; 1] = [Route::new("/|", &index).tail(30)];
/// static ROUTER: Router = Router::new(&ROUTES);
///
/// let arena = Arena::new(&ROUTER, &ReqLimits::default());
/// assert_eq!(arena.len(), Arena::estimated_size(&ROUTER, &ReqLimits::default()));
/// assert_eq!(arena.len(), 32 + 0 + 32 + 32);
/// ```
#[derive(Debug)]
pub struct Arena {
    buf: Box<[u8]>,
    url_size: usize,
    var_name_size: usize,
    username_size: usize,
    chunk_framing: ChunkFraming,
}

impl Arena {
    pub fn new(router: &Router, limits: &ReqLimits) -> Self {
        Arena {
            buf: vec![0; Self::estimated_size(router, limits)].into_boxed_slice(),
            url_size: router.url_size(),
            var_name_size: router.var_name_size(),
            username_size: limits.username_size,
            chunk_framing: limits.chunk_framing,
        }
    }

    /// Bytes an arena for this configuration occupies.
    #[inline]
    pub const fn estimated_size(router: &Router, limits: &ReqLimits) -> usize {
        router.url_size() + router.var_name_size() + limits.username_size + limits.password_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn split(&mut self) -> Buffers<'_> {
        let (url, rest) = self.buf.split_at_mut(self.url_size);
        let (var_name, rest) = rest.split_at_mut(self.var_name_size);
        let (username, password) = rest.split_at_mut(self.username_size);

        Buffers {
            url,
            var_name,
            username,
            password,
            chunk_framing: self.chunk_framing,
        }
    }
}

pub(crate) struct Buffers<'a> {
    url: &'a mut [u8],
    var_name: &'a mut [u8],
    username: &'a mut [u8],
    password: &'a mut [u8],
    chunk_framing: ChunkFraming,
}

/// Authentication scheme announced by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    None,
    /// `Authorization: Basic`, credentials are available
    Basic,
    /// `Authorization: Digest`, detected only
    Digest,
}

/// An HTTP request being served.
///
/// Holds the parsed request line and headers, the body getters and the
/// [response writer](#response). A `Request` lives for exactly one
/// parse-and-handle cycle.
///
/// # Body
///
/// [`getch`](Self::getch) and [`read`](Self::read) return body bytes,
/// bounded by `Content-Length` or decoded from chunked framing. Without
/// either there is no body. Multipart bodies are read through
/// [`Multipart`](crate::Multipart).
pub struct Request<'a> {
    pub(crate) stream: &'a mut dyn OctetStream,

    pub(crate) method: Method,
    pub(crate) version: Version,
    pub(crate) status: StatusCode,
    pub(crate) route: Option<&'static Route>,

    pub(crate) url: &'a mut [u8],
    pub(crate) url_len: usize,
    pub(crate) tail: Option<usize>,
    pub(crate) var_name: &'a mut [u8],
    pub(crate) vars: u64,

    pub(crate) inbound: Inbound<'a>,
    pub(crate) outbound: Outbound,
    pub(crate) sent: Sent,
}

pub(crate) struct Inbound<'a> {
    pub(crate) content_length: Option<usize>,
    pub(crate) content_type: ContentType,
    pub(crate) chunked: bool,
    pub(crate) boundary: [u8; BOUNDARY_SIZE + 4],
    pub(crate) boundary_len: usize,

    pub(crate) received: usize,
    pub(crate) chunk_remaining: Option<usize>,
    pub(crate) body_done: bool,
    chunk_framing: ChunkFraming,

    pub(crate) auth: AuthScheme,
    username: &'a mut [u8],
    username_len: usize,
    password: &'a mut [u8],
    password_len: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Outbound {
    pub(crate) content_type: Option<&'static str>,
    pub(crate) content_disposition: Option<&'static str>,
    pub(crate) content_length: usize,
    pub(crate) auth_realm: Option<&'static str>,
}

#[derive(Debug, Default)]
pub(crate) struct Sent {
    pub(crate) header: bool,
    pub(crate) octets: usize,
}

impl<'a> Request<'a> {
    pub(crate) fn new(stream: &'a mut dyn OctetStream, buffers: Buffers<'a>) -> Self {
        Request {
            stream,

            method: Method::Get,
            version: Version::HTTP_10,
            status: StatusCode::OK,
            route: None,

            url: buffers.url,
            url_len: 0,
            tail: None,
            var_name: buffers.var_name,
            vars: 0,

            inbound: Inbound {
                content_length: None,
                content_type: ContentType::UNKNOWN,
                chunked: false,
                boundary: [0; BOUNDARY_SIZE + 4],
                boundary_len: 0,

                received: 0,
                chunk_remaining: None,
                body_done: false,
                chunk_framing: buffers.chunk_framing,

                auth: AuthScheme::None,
                username: buffers.username,
                username_len: 0,
                password: buffers.password,
                password_len: 0,
            },
            outbound: Outbound::default(),
            sent: Sent::default(),
        }
    }

    /// Request without buffers, used to answer a connection that is never parsed.
    pub(crate) fn detached(stream: &'a mut dyn OctetStream) -> Self {
        Request::new(
            stream,
            Buffers {
                url: &mut [],
                var_name: &mut [],
                username: &mut [],
                password: &mut [],
                chunk_framing: ChunkFraming::Decimal,
            },
        )
    }

    #[inline]
    pub(crate) fn stream(&mut self) -> &mut dyn OctetStream {
        &mut *self.stream
    }

    #[inline]
    pub(crate) fn next_raw(&mut self) -> Result<Option<u8>, Error> {
        self.stream.getch().map_err(Error::Io)
    }

    #[inline]
    pub(crate) fn require_raw(&mut self) -> Result<u8, Error> {
        self.next_raw()?.ok_or(Error::UnexpectedEof)
    }

    /// Skips the rest of a line, a CR has to be followed by LF.
    pub(crate) fn skip_line(&mut self, mut ch: u8) -> Result<(), Error> {
        loop {
            match ch {
                b'\n' => return Ok(()),
                b'\r' => {
                    return match self.require_raw()? {
                        b'\n' => Ok(()),
                        _ => Err(Error::Malformed),
                    }
                }
                _ => ch = self.require_raw()?,
            }
        }
    }

    /// Parses the request header block and applies the recognized fields.
    pub(crate) fn read_headers(&mut self) -> Result<(), Error> {
        let mut reader = HeaderReader::new();
        let stream = &mut *self.stream;
        let mut next = || stream.getch().map_err(Error::Io);

        while let Some(field) = reader.next_field(&mut next)? {
            self.inbound.apply(&field);
        }
        Ok(())
    }

    fn read_trailers(&mut self) -> Result<(), Error> {
        let mut reader = HeaderReader::new();
        let stream = &mut *self.stream;
        let mut next = || stream.getch().map_err(Error::Io);

        while let Some(field) = reader.next_field(&mut next)? {
            debug!("Ignoring chunk trailer {:?}", String::from_utf8_lossy(field.raw_name));
        }
        Ok(())
    }
}

impl Inbound<'_> {
    fn apply(&mut self, field: &Field<'_>) {
        debug!(
            "{}: {}",
            String::from_utf8_lossy(field.raw_name),
            String::from_utf8_lossy(field.value)
        );

        match field.name {
            HeaderName::ContentLength => match slice_to_usize(field.value) {
                Some(len) => self.content_length = Some(len),
                None => debug!("Ignoring invalid Content-Length"),
            },
            HeaderName::ContentType => {
                self.content_type = ContentType::classify(field.value);
                if self.content_type.category() == ContentType::MULTIPART {
                    self.set_boundary(field.value);
                }
            }
            HeaderName::TransferEncoding => {
                if field.value.eq_ignore_ascii_case(b"chunked") {
                    self.chunked = true;
                    self.chunk_remaining = None;
                }
            }
            HeaderName::Authorization => self.set_credentials(field.value),
            HeaderName::ContentDisposition | HeaderName::Other => {}
        }
    }

    fn set_boundary(&mut self, value: &[u8]) {
        self.boundary_len = 0;

        let Some(boundary) = param(value, b"boundary") else {
            return;
        };
        if boundary.is_empty() || boundary.len() > BOUNDARY_SIZE {
            debug!("Ignoring multipart boundary of {} bytes", boundary.len());
            return;
        }

        let len = DELIMITER_PREFIX.len() + boundary.len();
        self.boundary[..DELIMITER_PREFIX.len()].copy_from_slice(DELIMITER_PREFIX);
        self.boundary[DELIMITER_PREFIX.len()..len].copy_from_slice(boundary);
        self.boundary_len = len;
    }

    fn set_credentials(&mut self, value: &[u8]) {
        let credentials = match Authorization::parse(value) {
            Authorization::Basic(credentials) => credentials,
            Authorization::Digest => {
                self.auth = AuthScheme::Digest;
                return;
            }
            Authorization::Other => return,
        };

        let mut decoded = [0; HEADER_VALUE_SIZE];
        let Some(len) = base64::decode(credentials, &mut decoded) else {
            debug!("Ignoring undecodable Basic credentials");
            return;
        };
        let decoded = &decoded[..len];

        let Some(colon) = memchr::memchr(b':', decoded) else {
            debug!("Ignoring Basic credentials without ':'");
            return;
        };
        let (username, password) = (&decoded[..colon], &decoded[colon + 1..]);

        let (Some(user_buf), Some(pass_buf)) = (
            self.username.get_mut(..username.len()),
            self.password.get_mut(..password.len()),
        ) else {
            debug!("Ignoring Basic credentials exceeding the configured sizes");
            return;
        };
        user_buf.copy_from_slice(username);
        pass_buf.copy_from_slice(password);

        self.username_len = username.len();
        self.password_len = password.len();
        self.auth = AuthScheme::Basic;
    }
}

// Public API
impl Request<'_> {
    #[inline]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Route the request was dispatched to
    #[inline]
    pub fn route(&self) -> Option<&'static Route> {
        self.route
    }

    /// Percent-decoded URL path, query excluded.
    #[inline]
    pub fn url(&self) -> &[u8] {
        &self.url[..self.url_len]
    }

    #[inline]
    pub fn url_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(self.url()).ok()
    }

    /// Part of the URL after the matched route pattern.
    ///
    /// # Examples
    ///
    /// For the route `/files` and the path `/files/img/a.png`:
    /// ```text
    /// /img/a.png
    /// ```
    /// For the path `/files` the tail is `None`.
    #[inline]
    pub fn tail(&self) -> Option<&[u8]> {
        self.tail.map(|start| &self.url[start..self.url_len])
    }

    #[inline]
    pub fn tail_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(self.tail()?).ok()
    }

    /// Whether the query string named the route variable `name`.
    ///
    /// Only the first 64 variables of a route are tracked.
    #[inline]
    pub fn has_var(&self, name: &str) -> bool {
        self.route
            .and_then(|route| route.var_index(name.as_bytes()))
            .is_some_and(|index| index < 64 && self.vars & (1 << index) != 0)
    }

    #[inline]
    pub const fn content_length(&self) -> Option<usize> {
        self.inbound.content_length
    }

    #[inline]
    pub const fn content_type(&self) -> ContentType {
        self.inbound.content_type
    }

    #[inline]
    pub const fn is_chunked(&self) -> bool {
        self.inbound.chunked
    }

    /// Multipart delimiter `"\r\n--" + boundary`, empty if none was declared.
    #[inline]
    pub fn boundary(&self) -> &[u8] {
        &self.inbound.boundary[..self.inbound.boundary_len]
    }

    #[inline]
    pub const fn auth_scheme(&self) -> AuthScheme {
        self.inbound.auth
    }

    /// Username of `Authorization: Basic` credentials.
    #[inline]
    pub fn username(&self) -> Option<&[u8]> {
        (self.inbound.auth == AuthScheme::Basic)
            .then(|| &self.inbound.username[..self.inbound.username_len])
    }

    #[inline]
    pub fn password(&self) -> Option<&[u8]> {
        (self.inbound.auth == AuthScheme::Basic)
            .then(|| &self.inbound.password[..self.inbound.password_len])
    }

    #[inline]
    pub fn username_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(self.username()?).ok()
    }

    #[inline]
    pub fn password_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(self.password()?).ok()
    }

    /// Body octets consumed so far.
    #[inline]
    pub const fn received(&self) -> usize {
        self.inbound.received
    }
}

// Body
impl Request<'_> {
    /// Next body byte, `Ok(None)` at the end of the body.
    pub fn getch(&mut self) -> Result<Option<u8>, Error> {
        if self.available()? == 0 {
            return Ok(None);
        }

        let byte = self.require_raw()?;
        self.consumed(1)?;
        Ok(Some(byte))
    }

    /// Reads body bytes into `buf`, `Ok(0)` at the end of the body.
    ///
    /// Never reads across a chunk boundary.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let len = buf.len().min(self.available()?);
        if len == 0 {
            return Ok(0);
        }

        match self.stream.read(&mut buf[..len])? {
            0 => Err(Error::UnexpectedEof),
            n => {
                self.consumed(n)?;
                Ok(n)
            }
        }
    }

    /// Bytes readable without crossing a chunk boundary.
    fn available(&mut self) -> Result<usize, Error> {
        if !self.inbound.chunked {
            return Ok(self
                .inbound
                .content_length
                .map_or(0, |len| len.saturating_sub(self.inbound.received)));
        }

        while !self.inbound.body_done {
            if let Some(remaining) = self.inbound.chunk_remaining {
                return Ok(remaining);
            }
            self.start_chunk()?;
        }
        Ok(0)
    }

    fn consumed(&mut self, n: usize) -> Result<(), Error> {
        self.inbound.received += n;

        if let Some(remaining) = self.inbound.chunk_remaining {
            match remaining - n {
                0 => self.finish_chunk()?,
                left => self.inbound.chunk_remaining = Some(left),
            }
        }
        Ok(())
    }

    /// Reads a chunk-size line.
    fn start_chunk(&mut self) -> Result<(), Error> {
        let Some(mut ch) = self.next_raw()? else {
            self.inbound.body_done = true;
            return Ok(());
        };

        let radix = match self.inbound.chunk_framing {
            ChunkFraming::Decimal => 10,
            ChunkFraming::Rfc7230 => 16,
        };
        let mut size: usize = 0;
        let mut digits = 0;

        while let Some(digit) = (ch as char).to_digit(radix) {
            size = size
                .checked_mul(radix as usize)
                .and_then(|size| size.checked_add(digit as usize))
                .ok_or(Error::ChunkFraming)?;
            digits += 1;
            ch = self.require_raw()?;
        }
        if digits == 0 {
            return Err(Error::ChunkFraming);
        }
        self.skip_line(ch)?;

        match size {
            0 => {
                self.read_trailers()?;
                self.inbound.body_done = true;
            }
            size => self.inbound.chunk_remaining = Some(size),
        }
        Ok(())
    }

    /// Consumes what follows the data of a chunk.
    fn finish_chunk(&mut self) -> Result<(), Error> {
        self.inbound.chunk_remaining = None;

        let mut ch = self.require_raw()?;
        if ch == b'\r' {
            ch = self.require_raw()?;
            if ch != b'\n' {
                return Err(Error::ChunkFraming);
            }
            ch = match self.inbound.chunk_framing {
                ChunkFraming::Decimal => self.require_raw()?,
                ChunkFraming::Rfc7230 => return Ok(()),
            };
        }

        match self.inbound.chunk_framing {
            ChunkFraming::Rfc7230 if ch == b'\n' => Ok(()),
            ChunkFraming::Decimal if ch == b'0' => {
                let ch = self.require_raw()?;
                self.skip_line(ch)?;
                self.read_trailers()
            }
            _ => Err(Error::ChunkFraming),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    fn nop(_: &mut Request<'_>) {}

    static ROUTES: [Route; 1] = [Route::new("/", &nop).tail(32)];
    static ROUTER: Router = Router::new(&ROUTES);

    fn with_request<F>(input: &[u8], framing: ChunkFraming, f: F) -> MockStream
    where
        F: FnOnce(&mut Request<'_>),
    {
        let limits = ReqLimits {
            chunk_framing: framing,
            ..ReqLimits::default()
        };
        let mut arena = Arena::new(&ROUTER, &limits);
        let mut stream = MockStream::new(input);

        let mut req = Request::new(&mut stream, arena.split());
        f(&mut req);
        drop(req);
        stream
    }

    fn read_all(req: &mut Request<'_>) -> Result<Vec<u8>, Error> {
        let mut body = Vec::new();
        while let Some(byte) = req.getch()? {
            body.push(byte);
        }
        Ok(body)
    }

    #[test]
    fn headers() {
        let input = b"Content-Length: 5\r\n\
            Content-Type: multipart/form-data; boundary=\"XyZ\"\r\n\
            X-Other: 1\r\n\r\nHELLO";

        with_request(input, ChunkFraming::Decimal, |req| {
            assert!(req.read_headers().is_ok());

            assert_eq!(req.content_length(), Some(5));
            assert_eq!(req.content_type(), ContentType::MULTIPART_FORM_DATA);
            assert_eq!(str_op(req.boundary()), "\r\n--XyZ");
            assert!(!req.is_chunked());
            assert_eq!(read_all(req).unwrap(), b"HELLO");
            assert_eq!(req.received(), 5);
        });
    }

    #[test]
    fn identity_body() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<&[u8]>); 4] = [
            (b"Content-Length: 3\r\n\r\nabcdef", Some(b"abc")),
            (b"Content-Length: 0\r\n\r\nabc",    Some(b"")),
            (b"\r\nabc",                         Some(b"")),
            (b"Content-Length: 9\r\n\r\nabc",    None),
        ];

        for (input, expected) in cases {
            with_request(input, ChunkFraming::Decimal, |req| {
                req.read_headers().unwrap();
                assert_eq!(read_all(req).ok().as_deref(), expected);
            });
        }
    }

    #[test]
    fn bulk_read() {
        let input = b"Content-Length: 6\r\n\r\nabcdefgh";

        with_request(input, ChunkFraming::Decimal, |req| {
            req.read_headers().unwrap();

            let mut buf = [0; 4];
            assert_eq!(req.read(&mut buf).unwrap(), 4);
            assert_eq!(&buf, b"abcd");
            assert_eq!(req.read(&mut buf).unwrap(), 2);
            assert_eq!(&buf[..2], b"ef");
            assert_eq!(req.read(&mut buf).unwrap(), 0);
        });
    }

    #[test]
    fn chunked_decimal() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<&[u8]>); 7] = [
            (b"5\r\nHELLO\r\n0\r\n\r\n",                        Some(b"HELLO")),
            (b"5\r\nHELLO0\r\n\r\n",                            Some(b"HELLO")),
            (b"5\r\nHELLO\r\n0\r\nX-Sum: 1\r\n\r\n",            Some(b"HELLO")),
            (b"5\r\nHELLO\r\n0\r\n\r\n6\r\n WORLD\r\n0\r\n\r\n0\r\n\r\n",
                                                                Some(b"HELLO WORLD")),
            (b"18\r\n0123456789abcdefgh\r\n0\r\n\r\n",          Some(b"0123456789abcdefgh")),
            (b"5\r\nHELLO\r\n1\r\n\r\n",                        None),
            (b"x\r\nHELLO\r\n0\r\n\r\n",                        None),
        ];

        for (body, expected) in cases {
            let mut input = b"Transfer-Encoding: chunked\r\n\r\n".to_vec();
            input.extend_from_slice(body);

            with_request(&input, ChunkFraming::Decimal, |req| {
                req.read_headers().unwrap();
                assert!(req.is_chunked());
                assert_eq!(read_all(req).ok().as_deref(), expected, "{:?}", str_op(body));
            });
        }
    }

    #[test]
    fn chunk_releases_exactly_its_length() {
        let input = b"Transfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n4\r\ndefg0\r\n\r\n";

        with_request(input, ChunkFraming::Decimal, |req| {
            req.read_headers().unwrap();

            let mut buf = [0; 8];
            assert_eq!(req.read(&mut buf).unwrap(), 3);
            assert_eq!(&buf[..3], b"abc");
            assert_eq!(req.read(&mut buf).unwrap(), 4);
            assert_eq!(&buf[..4], b"defg");
            assert_eq!(req.read(&mut buf).unwrap(), 0);
        });
    }

    #[test]
    fn broken_chunk_trailer() {
        let input = b"Transfer-Encoding: chunked\r\n\r\n3\r\nabcX";

        with_request(input, ChunkFraming::Decimal, |req| {
            req.read_headers().unwrap();

            assert_eq!(req.getch().unwrap(), Some(b'a'));
            assert_eq!(req.getch().unwrap(), Some(b'b'));
            assert!(matches!(req.getch(), Err(Error::ChunkFraming)));
        });
    }

    #[test]
    fn chunked_rfc7230() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<&[u8]>); 5] = [
            (b"5\r\nHELLO\r\n0\r\n\r\n",                     Some(b"HELLO")),
            (b"5\r\nHELLO\r\n6\r\n WORLD\r\n0\r\n\r\n",      Some(b"HELLO WORLD")),
            (b"a;ext=1\r\n0123456789\r\n0\r\nX: y\r\n\r\n",  Some(b"0123456789")),
            (b"5\r\nHELLOX\r\n0\r\n\r\n",                    None),
            (b"\r\n",                                        None),
        ];

        for (body, expected) in cases {
            let mut input = b"Transfer-Encoding: chunked\r\n\r\n".to_vec();
            input.extend_from_slice(body);

            with_request(&input, ChunkFraming::Rfc7230, |req| {
                req.read_headers().unwrap();
                assert_eq!(read_all(req).ok().as_deref(), expected, "{:?}", str_op(body));
            });
        }
    }

    #[test]
    fn basic_credentials() {
        #[rustfmt::skip]
        let cases = [
            ("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==", AuthScheme::Basic,  Some(("Aladdin", "open sesame"))),
            ("Basic dXNlcjo=",                     AuthScheme::Basic,  Some(("user", ""))),
            ("Basic dXNlcjphOmI=",                 AuthScheme::Basic,  Some(("user", "a:b"))),
            ("Basic dXNlcg==",                     AuthScheme::None,   None),
            ("Basic !!!!",                         AuthScheme::None,   None),
            ("Digest username=\"x\"",              AuthScheme::Digest, None),
            ("Bearer abc",                         AuthScheme::None,   None),
        ];

        for (value, scheme, credentials) in cases {
            let input = format!("Authorization: {value}\r\n\r\n");

            with_request(input.as_bytes(), ChunkFraming::Decimal, |req| {
                req.read_headers().unwrap();

                assert_eq!(req.auth_scheme(), scheme, "{value}");
                assert_eq!(
                    req.username_str().zip(req.password_str()),
                    credentials,
                    "{value}"
                );
            });
        }
    }

    #[test]
    fn oversized_credentials() {
        let raw = format!("{}:pw", "u".repeat(33));
        let mut enc = [0; 64];
        let len = base64::encode(raw.as_bytes(), &mut enc).unwrap();
        let input = format!("Authorization: Basic {}\r\n\r\n", str_op(&enc[..len]));

        with_request(input.as_bytes(), ChunkFraming::Decimal, |req| {
            req.read_headers().unwrap();
            assert_eq!(req.auth_scheme(), AuthScheme::None);
            assert_eq!(req.username(), None);
        });
    }

    #[test]
    fn boundary_limits() {
        let long = "b".repeat(BOUNDARY_SIZE + 1);
        let exact = "b".repeat(BOUNDARY_SIZE);

        #[rustfmt::skip]
        let cases = [
            (format!("multipart/form-data; boundary={long}"),  0),
            (format!("multipart/form-data; boundary={exact}"), BOUNDARY_SIZE + 4),
            ("multipart/form-data".to_string(),                0),
            ("text/plain; boundary=abc".to_string(),           0),
        ];

        for (value, len) in cases {
            let input = format!("Content-Type: {value}\r\n\r\n");

            with_request(input.as_bytes(), ChunkFraming::Decimal, |req| {
                req.read_headers().unwrap();
                assert_eq!(req.boundary().len(), len, "{value}");
            });
        }
    }
}
