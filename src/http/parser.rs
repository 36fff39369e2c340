//! Request-line parsing and the parse, dispatch, respond cycle

use crate::{
    errors::ErrorKind,
    http::{
        request::{Arena, Request},
        route::{Route, Router},
        types::{hex_nibble, is_blank, is_crlf, is_lws, Method, StatusCode, Version},
    },
    OctetStream,
};
use log::{debug, warn};

/// How a request cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A handler ran, carries the status it answered with.
    Dispatched(StatusCode),
    /// Parsing failed before a handler could run, a status-only response was sent.
    Aborted(StatusCode),
}

impl Outcome {
    #[inline]
    pub const fn status(&self) -> StatusCode {
        match self {
            Outcome::Dispatched(status) | Outcome::Aborted(status) => *status,
        }
    }
}

/// Parses one request off `stream`, runs the handler of the matching route
/// and flushes the response.
///
/// The stream is left positioned after whatever the handler consumed.
/// Connections are not reused, the caller should close the stream.
///
/// # Examples
///
/// ```
/// use octet_http::{limits::ReqLimits, process_request, Arena, OctetStream, Outcome};
/// use octet_http::{Request, Route, Router, StatusCode};
/// use std::io;
///
/// struct Buffered<'a> {
///     input: &'a [u8],
///     output: Vec<u8>,
/// }
///
/// impl OctetStream for Buffered<'_> {
///     fn getch(&mut self) -> io::Result<Option<u8>> {
///         let Some((&first, rest)) = self.input.split_first() else {
///             return Ok(None);
///         };
///         self.input = rest;
///         Ok(Some(first))
///     }
///
///     fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
///         self.output.extend_from_slice(buf);
///         Ok(buf.len())
///     }
///
///     fn flush(&mut self) -> io::Result<()> {
///         Ok(())
///     }
/// }
///
/// fn hello(req: &mut Request<'_>) {
///     let _ = req.write(b"Hello!");
/// }
///
/// static ROUTES: [Route; 1] = [Route::new("/|", &hello)];
/// static ROUTER: Router = Router::new(&ROUTES);
///
/// let mut arena = Arena::new(&ROUTER, &ReqLimits::default());
/// let mut stream = Buffered {
///     input: b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n",
///     output: Vec::new(),
/// };
///
/// let outcome = process_request(&mut stream, &ROUTER, &mut arena);
///
/// assert_eq!(outcome, Outcome::Dispatched(StatusCode::OK));
/// assert!(stream.output.starts_with(b"HTTP/1.1 200 OK\r\n"));
/// assert!(stream.output.ends_with(b"\r\n\r\nHello!"));
/// ```
pub fn process_request(stream: &mut dyn OctetStream, router: &Router, arena: &mut Arena) -> Outcome {
    let mut req = Request::new(stream, arena.split());

    match parse_head(&mut req, router) {
        Ok(route) => {
            debug!("{} {:?} -> {:?}", req.method, req.url_str(), route.pattern);

            route.handler.handle(&mut req);
            if let Err(err) = req.send_headers().and_then(|()| req.flush()) {
                warn!("Failed to complete the response: {err}");
            }
            Outcome::Dispatched(req.status)
        }
        Err(kind) => {
            let status = kind.status();
            warn!("Request aborted: {kind}");

            if let Err(err) = req.status_response(status).and_then(|()| req.flush()) {
                warn!("Failed to send {status}: {err}");
            }
            Outcome::Aborted(status)
        }
    }
}

fn parse_head(req: &mut Request<'_>, router: &Router) -> Result<&'static Route, ErrorKind> {
    req.method = parse_method(req)?;

    let ch = skip_blanks(req)?;
    let ch = parse_url(req, ch)?;

    let (route, tail) = router.find(req.url(), req.method)?;
    req.route = Some(route);
    req.tail = tail;

    let ch = match ch {
        b'?' => parse_query(req, route)?,
        ch => ch,
    };
    req.version = parse_version(req, ch)?;
    req.read_headers()?;

    Ok(route)
}

fn parse_method(req: &mut Request<'_>) -> Result<Method, ErrorKind> {
    let (method, rest) = match req.require_raw()? {
        b'G' => (Method::Get, &b"ET"[..]),
        b'H' => (Method::Head, &b"EAD"[..]),
        b'P' => (Method::Post, &b"OST"[..]),
        _ => return Err(ErrorKind::UnknownMethod),
    };

    for &expected in rest {
        if req.require_raw()? != expected {
            return Err(ErrorKind::UnknownMethod);
        }
    }
    match req.require_raw()? {
        ch if is_blank(ch) => Ok(method),
        _ => Err(ErrorKind::UnknownMethod),
    }
}

#[inline]
fn skip_blanks(req: &mut Request<'_>) -> Result<u8, ErrorKind> {
    let mut ch = req.require_raw()?;
    while is_blank(ch) {
        ch = req.require_raw()?;
    }
    Ok(ch)
}

/// Copies the percent-decoded path into the URL buffer.
/// Returns the byte that ended it: `?` or whitespace.
///
/// A `#` also ends the path. The fragment is skipped and never reaches the
/// URL buffer or the route matcher.
fn parse_url(req: &mut Request<'_>, mut ch: u8) -> Result<u8, ErrorKind> {
    req.url_len = 0;

    loop {
        let byte = match ch {
            b'?' => return Ok(ch),
            b'#' => return drain_fragment(req),
            _ if is_lws(ch) => return Ok(ch),
            b'%' => percent_escape(req)?,
            _ => ch,
        };

        let slot = req
            .url
            .get_mut(req.url_len)
            .ok_or(ErrorKind::UriTooLong)?;
        *slot = byte;
        req.url_len += 1;

        ch = req.require_raw()?;
    }
}

/// Decodes the two hex digits following a `%`.
///
/// Whitespace inside the escape or an escape decoding to NUL is malformed.
fn percent_escape(req: &mut Request<'_>) -> Result<u8, ErrorKind> {
    let (hi, lo) = (req.require_raw()?, req.require_raw()?);
    if is_lws(hi) || is_lws(lo) {
        return Err(ErrorKind::Malformed);
    }
    match (hex_nibble(hi) << 4) | hex_nibble(lo) {
        0 => Err(ErrorKind::Malformed),
        byte => Ok(byte),
    }
}

/// Skips a `#fragment` up to the whitespace ending it.
fn drain_fragment(req: &mut Request<'_>) -> Result<u8, ErrorKind> {
    loop {
        let ch = req.require_raw()?;
        if is_lws(ch) {
            return Ok(ch);
        }
    }
}

/// Records which of the route's variables the query names. Names are
/// percent-decoded like the path. Values are skipped, names longer than any
/// declared variable are ignored.
fn parse_query(req: &mut Request<'_>, route: &Route) -> Result<u8, ErrorKind> {
    req.vars = 0;

    loop {
        let mut len = 0;
        let mut overlong = false;

        let mut ch = req.require_raw()?;
        while !matches!(ch, b'=' | b'&' | b'#') && !is_lws(ch) {
            let byte = match ch {
                b'%' => percent_escape(req)?,
                _ => ch,
            };
            match req.var_name.get_mut(len) {
                Some(slot) => {
                    *slot = byte;
                    len += 1;
                }
                None => overlong = true,
            }
            ch = req.require_raw()?;
        }

        if !overlong && len > 0 {
            match route.var_index(&req.var_name[..len]) {
                Some(index) if index < 64 => req.vars |= 1 << index,
                _ => debug!(
                    "Ignoring query variable {:?}",
                    String::from_utf8_lossy(&req.var_name[..len])
                ),
            }
        }

        if ch == b'=' {
            ch = req.require_raw()?;
            while !matches!(ch, b'&' | b'#') && !is_lws(ch) {
                ch = req.require_raw()?;
            }
        }

        match ch {
            b'&' => continue,
            b'#' => return drain_fragment(req),
            _ => return Ok(ch),
        }
    }
}

/// Parses an optional `HTTP/<major>.<minor>` token and the rest of the
/// request line.
fn parse_version(req: &mut Request<'_>, mut ch: u8) -> Result<Version, ErrorKind> {
    while is_blank(ch) {
        ch = req.require_raw()?;
    }
    if is_crlf(ch) {
        req.skip_line(ch)?;
        return Ok(Version::HTTP_10);
    }

    for &expected in b"HTTP/" {
        if ch != expected {
            return Err(ErrorKind::Malformed);
        }
        ch = req.require_raw()?;
    }

    let (major, next) = parse_digits(req, ch)?;
    if next != b'.' {
        return Err(ErrorKind::Malformed);
    }
    let first = req.require_raw()?;
    let (minor, mut ch) = parse_digits(req, first)?;

    while is_blank(ch) {
        ch = req.require_raw()?;
    }
    req.skip_line(ch)?;

    let version = Version { major, minor };
    match version.is_supported() {
        true => Ok(version),
        false => Err(ErrorKind::UnsupportedVersion),
    }
}

/// Decimal number saturating at `u8::MAX`, returns it with the byte after it.
fn parse_digits(req: &mut Request<'_>, mut ch: u8) -> Result<(u8, u8), ErrorKind> {
    if !ch.is_ascii_digit() {
        return Err(ErrorKind::Malformed);
    }

    let mut value: u8 = 0;
    while ch.is_ascii_digit() {
        value = value.saturating_mul(10).saturating_add(ch - b'0');
        ch = req.require_raw()?;
    }
    Ok((value, ch))
}
