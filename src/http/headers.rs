//! Header block parsing shared by requests, chunk trailers and multipart parts

use crate::{
    errors::Error,
    http::types::{is_blank, is_crlf, trim},
    limits::{HEADER_NAME_SIZE, HEADER_VALUE_SIZE},
};

/// Header names the engine acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderName {
    ContentLength,
    ContentType,
    ContentDisposition,
    TransferEncoding,
    Authorization,
    Other,
}

impl HeaderName {
    pub(crate) fn classify(name: &[u8]) -> HeaderName {
        #[rustfmt::skip]
        const NAMES: [(&[u8], HeaderName); 5] = [
            (b"content-length",      HeaderName::ContentLength),
            (b"content-type",        HeaderName::ContentType),
            (b"content-disposition", HeaderName::ContentDisposition),
            (b"transfer-encoding",   HeaderName::TransferEncoding),
            (b"authorization",       HeaderName::Authorization),
        ];

        NAMES
            .iter()
            .find(|(known, _)| name.eq_ignore_ascii_case(known))
            .map_or(HeaderName::Other, |&(_, header)| header)
    }
}

/// One complete header, continuation lines already joined.
#[derive(Debug)]
pub(crate) struct Field<'h> {
    pub(crate) name: HeaderName,
    pub(crate) raw_name: &'h [u8],
    pub(crate) value: &'h [u8],
}

/// Pulls `Name: Value` lines off a byte source until the blank line.
///
/// Names longer than [`HEADER_NAME_SIZE`] and values longer than
/// [`HEADER_VALUE_SIZE`] are consumed but truncated.
pub(crate) struct HeaderReader {
    name: [u8; HEADER_NAME_SIZE],
    name_len: usize,
    value: [u8; HEADER_VALUE_SIZE],
    value_len: usize,
    lookahead: Option<u8>,
}

impl HeaderReader {
    #[inline]
    pub(crate) const fn new() -> Self {
        HeaderReader {
            name: [0; HEADER_NAME_SIZE],
            name_len: 0,
            value: [0; HEADER_VALUE_SIZE],
            value_len: 0,
            lookahead: None,
        }
    }

    /// Next header of the block, `None` once the blank line (or the end
    /// of the stream at a line start) was consumed.
    pub(crate) fn next_field<S>(&mut self, next: &mut S) -> Result<Option<Field<'_>>, Error>
    where
        S: FnMut() -> Result<Option<u8>, Error>,
    {
        loop {
            let first = match self.lookahead.take() {
                Some(byte) => byte,
                None => match next()? {
                    Some(byte) => byte,
                    None => return Ok(None),
                },
            };

            if is_crlf(first) {
                end_of_line(next, first)?;
                return Ok(None);
            }

            self.name_len = 0;
            self.value_len = 0;

            let mut ch = first;
            while ch != b':' && !is_crlf(ch) {
                push(&mut self.name, &mut self.name_len, ch);
                ch = require(next)?;
            }
            if ch != b':' {
                // not a header, drop the line
                end_of_line(next, ch)?;
                continue;
            }

            let ch = self.read_value(next)?;
            end_of_line(next, ch)?;

            // continuation lines
            loop {
                match next()? {
                    Some(byte) if is_blank(byte) => {
                        let ch = self.read_value(next)?;
                        end_of_line(next, ch)?;
                    }
                    Some(byte) => {
                        self.lookahead = Some(byte);
                        break;
                    }
                    None => break,
                }
            }

            let raw_name = trim(&self.name[..self.name_len]);
            return Ok(Some(Field {
                name: HeaderName::classify(raw_name),
                raw_name,
                value: trim(&self.value[..self.value_len]),
            }));
        }
    }

    /// Appends the rest of the line to the value, leading blanks skipped and
    /// a single space joining it to previous content. Returns the CR or LF.
    fn read_value<S>(&mut self, next: &mut S) -> Result<u8, Error>
    where
        S: FnMut() -> Result<Option<u8>, Error>,
    {
        let mut ch = require(next)?;
        while is_blank(ch) {
            ch = require(next)?;
        }

        if !is_crlf(ch) && self.value_len > 0 {
            push(&mut self.value, &mut self.value_len, b' ');
        }
        while !is_crlf(ch) {
            push(&mut self.value, &mut self.value_len, ch);
            ch = require(next)?;
        }

        Ok(ch)
    }
}

#[inline(always)]
fn push(buf: &mut [u8], len: &mut usize, byte: u8) {
    if let Some(slot) = buf.get_mut(*len) {
        *slot = byte;
        *len += 1;
    }
}

#[inline(always)]
fn require<S>(next: &mut S) -> Result<u8, Error>
where
    S: FnMut() -> Result<Option<u8>, Error>,
{
    next()?.ok_or(Error::UnexpectedEof)
}

/// Consumes the LF after a CR, a bare LF ends the line as well.
#[inline]
fn end_of_line<S>(next: &mut S, ch: u8) -> Result<(), Error>
where
    S: FnMut() -> Result<Option<u8>, Error>,
{
    match ch {
        b'\n' => Ok(()),
        _ => match require(next)? {
            b'\n' => Ok(()),
            _ => Err(Error::Malformed),
        },
    }
}

/// Value of the `key` parameter in a header value like
/// `form-data; name="file"; filename="a.txt"`.
pub(crate) fn param<'v>(value: &'v [u8], key: &[u8]) -> Option<&'v [u8]> {
    let mut rest = value;

    while let Some(pos) = memchr::memchr(b';', rest) {
        rest = trim(&rest[pos + 1..]);

        let Some(eq) = memchr::memchr(b'=', rest) else {
            continue;
        };
        if !trim(&rest[..eq]).eq_ignore_ascii_case(key) {
            continue;
        }

        let raw = trim(&rest[eq + 1..]);
        return Some(match raw.split_first() {
            Some((b'"', quoted)) => {
                let end = memchr::memchr(b'"', quoted).unwrap_or(quoted.len());
                &quoted[..end]
            }
            _ => {
                let end = memchr::memchr(b';', raw).unwrap_or(raw.len());
                trim(&raw[..end])
            }
        });
    }

    None
}

/// Credentials scheme of an `Authorization` value.
#[derive(Debug, PartialEq)]
pub(crate) enum Authorization<'v> {
    Basic(&'v [u8]),
    Digest,
    Other,
}

impl<'v> Authorization<'v> {
    pub(crate) fn parse(value: &'v [u8]) -> Self {
        let value = trim(value);
        let (scheme, credentials) = match memchr::memchr(b' ', value) {
            Some(pos) => (&value[..pos], trim(&value[pos + 1..])),
            None => (value, &value[value.len()..]),
        };

        if scheme.eq_ignore_ascii_case(b"Basic") {
            Authorization::Basic(credentials)
        } else if scheme.eq_ignore_ascii_case(b"Digest") {
            Authorization::Digest
        } else {
            Authorization::Other
        }
    }
}
