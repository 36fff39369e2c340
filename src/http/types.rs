//! Core HTTP protocol types and utilities

use std::{fmt, ops::BitOr};

// BYTE CLASSES

#[inline(always)]
pub(crate) const fn is_crlf(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n')
}

/// Linear whitespace: space, tab, CR or LF.
#[inline(always)]
pub(crate) const fn is_lws(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

#[inline(always)]
pub(crate) const fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t')
}

/// Value of one percent-escape nibble. Bytes that are not hex digits
/// contribute nothing.
///
/// Classification happens after folding with `0x20`, so the control bytes
/// `0x10..=0x19` count as digits too.
#[inline(always)]
pub(crate) const fn hex_nibble(byte: u8) -> u8 {
    match byte | 0x20 {
        lower @ b'0'..=b'9' => lower & 0x0f,
        lower @ b'a'..=b'f' => (lower & 0x0f) + 9,
        _ => 0,
    }
}

/// Strips leading and trailing spaces and tabs.
#[inline]
pub(crate) fn trim(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !is_blank(*first) {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !is_blank(*last) {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Parses an unsigned decimal number, `None` on a non-digit or overflow.
#[inline(always)]
pub(crate) fn slice_to_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }
    let mut result: usize = 0;

    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result
            .checked_mul(10)?
            .checked_add((byte - b'0') as usize)?;
    }

    Some(result)
}

/// Formats `n` in decimal without allocating, returns the buffer and the
/// index of the first digit.
#[inline]
pub(crate) const fn number_to_bytes(mut n: u64) -> ([u8; 20], usize) {
    let mut buffer = [b'0'; 20];
    let mut i = 20;

    if n == 0 {
        return (buffer, 19);
    }

    while n > 0 {
        i -= 1;
        buffer[i] = b'0' + (n % 10) as u8;
        n /= 10;
    }

    (buffer, i)
}

// METHOD

/// HTTP request methods understood by the parser
///
/// Anything else on the request line is answered with
/// [`StatusCode::NOT_IMPLEMENTED`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method - transfer a current representation of the target resource
    /// [[RFC7231, Section 4.3.1](https://tools.ietf.org/html/rfc7231#section-4.3.1)]
    Get,
    /// HEAD method - same as GET but without response body
    /// [[RFC7231, Section 4.3.2](https://tools.ietf.org/html/rfc7231#section-4.3.2)]
    Head,
    /// POST method - perform resource-specific processing on the request payload
    /// [[RFC7231, Section 4.3.3](https://tools.ietf.org/html/rfc7231#section-4.3.3)]
    Post,
}

impl Method {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
        }
    }

    #[inline(always)]
    const fn bit(&self) -> u8 {
        match self {
            Method::Get => 1,
            Method::Head => 2,
            Method::Post => 4,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of methods a route accepts.
///
/// ```
/// use octet_http::Methods;
///
/// const READ: Methods = Methods::GET.or(Methods::HEAD);
/// assert!(READ.contains(octet_http::Method::Head));
/// assert!(!READ.contains(octet_http::Method::Post));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Methods(u8);

impl Methods {
    pub const NONE: Methods = Methods(0);
    pub const GET: Methods = Methods(1);
    pub const HEAD: Methods = Methods(2);
    pub const POST: Methods = Methods(4);
    pub const ALL: Methods = Methods(1 | 2 | 4);

    #[inline]
    pub const fn or(self, other: Methods) -> Methods {
        Methods(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(&self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }
}

impl BitOr for Methods {
    type Output = Methods;

    #[inline]
    fn bitor(self, rhs: Methods) -> Methods {
        self.or(rhs)
    }
}

// VERSION

/// HTTP protocol version as announced on the request line
///
/// A request line without a version token is treated as `HTTP/1.0`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// [RFC 1945](https://tools.ietf.org/html/rfc1945)
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    /// [RFC 7230](https://tools.ietf.org/html/rfc7230)
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    #[inline]
    pub(crate) const fn is_supported(&self) -> bool {
        self.major <= 1 && self.minor <= 1
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::HTTP_10
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

// STATUS_CODE

/// HTTP status code
///
/// Any `u16` can be sent, the named constants are the ones with a known
/// reason phrase. Unknown codes are rendered with the phrase `...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:literal, $str:literal);
    )+) => {
        impl StatusCode {
            $(
                #[doc = concat!("`", stringify!($num), " ", $str, "`")]
                ///
                $(#[$docs])+
                pub const $name: StatusCode = StatusCode($num);
            )+

            /// Reason phrase sent on the status line
            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self.0 {
                    $( $num => $str, )+
                    _ => "...",
                }
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    OK = (200, "OK");

    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BAD_REQUEST = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.2)]
    UNAUTHORIZED = (401, "Unauthorized");
    /// [[RFC9110, Section 15.5.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5)]
    NOT_FOUND = (404, "Not Found");
    /// [[RFC9110, Section 15.5.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.6)]
    METHOD_NOT_ALLOWED = (405, "Method Not Allowed");
    /// [[RFC9110, Section 15.5.15](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.15)]
    URI_TOO_LONG = (414, "URI Too Long");
    /// [[RFC9110, Section 15.5.21](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.21)]
    UNPROCESSABLE_ENTITY = (422, "Unprocessable Entity");

    /// [[RFC9110, Section 15.6.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.1)]
    INTERNAL_SERVER_ERROR = (500, "Internal Server Error");
    /// [[RFC9110, Section 15.6.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.2)]
    NOT_IMPLEMENTED = (501, "Not Implemented");
    /// [[RFC9110, Section 15.6.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.4)]
    SERVICE_UNAVAILABLE = (503, "Service Unavailable");
    /// [[RFC9110, Section 15.6.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.6)]
    HTTP_VERSION_NOT_SUPPORTED = (505, "HTTP Version Not Supported");
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}

// CONTENT_TYPE

const CATEGORY_MASK: u16 = 0xf000;

/// Media type packed as a 4-bit category and a 12-bit subtype.
///
/// ```
/// use octet_http::ContentType;
///
/// assert_eq!(ContentType::MULTIPART_FORM_DATA.category(), ContentType::MULTIPART);
/// assert_eq!(ContentType::TEXT_HTML.category(), ContentType::TEXT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentType(u16);

impl ContentType {
    pub const UNKNOWN: ContentType = ContentType(0x0000);

    pub const APPLICATION: ContentType = ContentType(0x1000);
    pub const APPLICATION_OCTET_STREAM: ContentType = ContentType(0x1001);
    pub const APPLICATION_JSON: ContentType = ContentType(0x1002);
    pub const APPLICATION_FORM_URLENCODED: ContentType = ContentType(0x1003);

    pub const TEXT: ContentType = ContentType(0x2000);
    pub const TEXT_PLAIN: ContentType = ContentType(0x2001);
    pub const TEXT_HTML: ContentType = ContentType(0x2002);

    pub const MULTIPART: ContentType = ContentType(0x3000);
    pub const MULTIPART_FORM_DATA: ContentType = ContentType(0x3001);

    #[inline]
    pub const fn category(&self) -> ContentType {
        ContentType(self.0 & CATEGORY_MASK)
    }

    #[inline]
    pub const fn subtype(&self) -> u16 {
        self.0 & !CATEGORY_MASK
    }

    #[inline]
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Classifies a `Content-Type` header value, parameters are ignored.
    pub(crate) fn classify(value: &[u8]) -> ContentType {
        let end = memchr::memchr(b';', value).unwrap_or(value.len());
        let media = trim(&value[..end]);

        let Some(slash) = memchr::memchr(b'/', media) else {
            return ContentType::UNKNOWN;
        };
        let (kind, sub) = (&media[..slash], &media[slash + 1..]);

        #[rustfmt::skip]
        let table: &[(&[u8], ContentType, &[(&[u8], ContentType)])] = &[
            (b"application", ContentType::APPLICATION, &[
                (b"octet-stream",          ContentType::APPLICATION_OCTET_STREAM),
                (b"json",                  ContentType::APPLICATION_JSON),
                (b"x-www-form-urlencoded", ContentType::APPLICATION_FORM_URLENCODED),
            ]),
            (b"text", ContentType::TEXT, &[
                (b"plain", ContentType::TEXT_PLAIN),
                (b"html",  ContentType::TEXT_HTML),
            ]),
            (b"multipart", ContentType::MULTIPART, &[
                (b"form-data", ContentType::MULTIPART_FORM_DATA),
            ]),
        ];

        for (name, category, subtypes) in table {
            if !kind.eq_ignore_ascii_case(name) {
                continue;
            }
            return subtypes
                .iter()
                .find(|(name, _)| sub.eq_ignore_ascii_case(name))
                .map_or(*category, |&(_, content_type)| content_type);
        }

        ContentType::UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reason() {
        #[rustfmt::skip]
        let cases = [
            (StatusCode::OK,                         "OK"),
            (StatusCode::URI_TOO_LONG,               "URI Too Long"),
            (StatusCode::UNPROCESSABLE_ENTITY,       "Unprocessable Entity"),
            (StatusCode::HTTP_VERSION_NOT_SUPPORTED, "HTTP Version Not Supported"),
            (StatusCode(299),                        "..."),
            (StatusCode(0),                          "..."),
        ];

        for (status, reason) in cases {
            assert_eq!(status.reason(), reason);
        }
    }

    #[test]
    fn methods_mask() {
        let mask = Methods::GET | Methods::POST;

        assert!(mask.contains(Method::Get));
        assert!(mask.contains(Method::Post));
        assert!(!mask.contains(Method::Head));
        assert!(!Methods::NONE.contains(Method::Get));
        assert_eq!(Methods::ALL, Methods::GET.or(Methods::HEAD).or(Methods::POST));
    }

    #[test]
    fn content_type_classify() {
        #[rustfmt::skip]
        let cases: [(&[u8], ContentType); 9] = [
            (b"text/plain",                            ContentType::TEXT_PLAIN),
            (b"Text/HTML; charset=utf-8",              ContentType::TEXT_HTML),
            (b"text/csv",                              ContentType::TEXT),
            (b"application/json",                      ContentType::APPLICATION_JSON),
            (b"application/x-www-form-urlencoded",     ContentType::APPLICATION_FORM_URLENCODED),
            (b"multipart/form-data; boundary=xyz",     ContentType::MULTIPART_FORM_DATA),
            (b"multipart/mixed; boundary=xyz",         ContentType::MULTIPART),
            (b"image/png",                             ContentType::UNKNOWN),
            (b"garbage",                               ContentType::UNKNOWN),
        ];

        for (value, expected) in cases {
            assert_eq!(ContentType::classify(value), expected);
        }
    }

    #[test]
    fn hex_nibbles() {
        #[rustfmt::skip]
        let cases = [
            (b'0', 0), (b'9', 9), (b'a', 10), (b'F', 15),
            (b'g', 0), (b'z', 0), (b' ', 0),
            (0x15, 5), (0x1a, 0),
        ];

        for (byte, expected) in cases {
            assert_eq!(hex_nibble(byte), expected);
        }
    }

    #[test]
    fn decimal() {
        assert_eq!(slice_to_usize(b"0"), Some(0));
        assert_eq!(slice_to_usize(b"1234"), Some(1234));
        assert_eq!(slice_to_usize(b""), None);
        assert_eq!(slice_to_usize(b"12a"), None);
        assert_eq!(slice_to_usize(b"99999999999999999999999"), None);

        let (buf, start) = number_to_bytes(0);
        assert_eq!(&buf[start..], b"0");
        let (buf, start) = number_to_bytes(1_048_576);
        assert_eq!(&buf[start..], b"1048576");
    }
}
