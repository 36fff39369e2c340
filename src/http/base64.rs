//! Base64 block codec ([RFC 4648](https://datatracker.ietf.org/doc/html/rfc4648#section-4))
//!
//! Works on 3-byte / 4-character blocks without allocating. Used to decode
//! the credentials of `Authorization: Basic`.
//!
//! # Examples
//!
//! ```
//! use octet_http::base64;
//!
//! let mut enc = [0; 8];
//! let len = base64::encode(b"user:pw", &mut enc).unwrap();
//! assert_eq!(&enc[..len], b"dXNlcjpw");
//!
//! let mut raw = [0; 6];
//! let len = base64::decode(b"dXNlcjpw", &mut raw).unwrap();
//! assert_eq!(&raw[..len], b"user:pw");
//! ```

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PAD: u8 = b'=';

#[inline(always)]
const fn sextet(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Encodes 1 to 3 raw bytes into one padded block.
///
/// Returns `None` for an empty or oversized input.
pub fn encode_block(raw: &[u8]) -> Option<[u8; 4]> {
    let (b0, b1, b2) = match *raw {
        [b0] => (b0, 0, 0),
        [b0, b1] => (b0, b1, 0),
        [b0, b1, b2] => (b0, b1, b2),
        _ => return None,
    };

    let mut enc = [
        ALPHABET[(b0 >> 2) as usize],
        ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize],
        ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize],
        ALPHABET[(b2 & 0x3f) as usize],
    ];
    if raw.len() < 3 {
        enc[3] = PAD;
    }
    if raw.len() < 2 {
        enc[2] = PAD;
    }

    Some(enc)
}

/// Decodes one block, returns the raw bytes and how many of them are valid.
///
/// `=` and NUL both count as padding, but only in the last two positions.
pub fn decode_block(enc: [u8; 4]) -> Option<([u8; 3], usize)> {
    let mut v = [0u8; 4];
    let mut count = 3;

    for (i, &byte) in enc.iter().enumerate() {
        match sextet(byte) {
            Some(value) if count == 3 => v[i] = value,
            // data after padding
            Some(_) => return None,
            None if (byte == PAD || byte == 0) && i >= 2 => count -= 1,
            None => return None,
        }
    }

    let raw = [
        (v[0] << 2) | (v[1] >> 4),
        ((v[1] & 0x0f) << 4) | (v[2] >> 2),
        ((v[2] & 0x03) << 6) | v[3],
    ];
    Some((raw, count))
}

/// Encodes `src` into `dst`, returns the number of characters written.
pub fn encode(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    let needed = src.len().div_ceil(3).checked_mul(4)?;
    if dst.len() < needed {
        return None;
    }

    for (block, out) in src.chunks(3).zip(dst.chunks_mut(4)) {
        out.copy_from_slice(&encode_block(block)?);
    }
    Some(needed)
}

/// Decodes `src` into `dst`, returns the number of bytes written.
///
/// Missing padding on the final block is tolerated.
pub fn decode(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    let mut len = 0;
    let mut blocks = src.chunks(4).peekable();

    while let Some(block) = blocks.next() {
        let mut enc = [PAD; 4];
        match block.len() {
            1 => return None,
            n => enc[..n].copy_from_slice(block),
        }

        let (raw, count) = decode_block(enc)?;
        // padding is only allowed at the very end
        if count < 3 && blocks.peek().is_some() {
            return None;
        }

        dst.get_mut(len..len + count)?.copy_from_slice(&raw[..count]);
        len += count;
    }

    Some(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_round_trip() {
        #[rustfmt::skip]
        let cases: [(&[u8], &[u8; 4]); 6] = [
            (b"M",        b"TQ=="),
            (b"Ma",       b"TWE="),
            (b"Man",      b"TWFu"),
            (&[0xff],             b"/w=="),
            (&[0xfb, 0xff],       b"+/8="),
            (&[0x00, 0x00, 0x00], b"AAAA"),
        ];

        for (raw, enc) in cases {
            assert_eq!(&encode_block(raw).unwrap(), enc);

            let (decoded, count) = decode_block(*enc).unwrap();
            assert_eq!(&decoded[..count], raw);
        }
    }

    #[test]
    fn block_invalid() {
        #[rustfmt::skip]
        let cases: [&[u8; 4]; 5] = [
            b"TQ=A",
            b"T===",
            b"====",
            b"TW E",
            b"TW\x00E",
        ];

        for enc in cases {
            assert_eq!(decode_block(*enc), None, "{:?}", enc);
        }
        assert_eq!(encode_block(b""), None);
        assert_eq!(encode_block(b"abcd"), None);
    }

    #[test]
    fn nul_padding() {
        let (raw, count) = decode_block(*b"TQ\0\0").unwrap();
        assert_eq!(&raw[..count], b"M");
    }

    #[test]
    fn buffers() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<&[u8]>); 6] = [
            (b"QWxhZGRpbjpvcGVuIHNlc2FtZQ==", Some(b"Aladdin:open sesame")),
            (b"QWxhZGRpbjpvcGVuIHNlc2FtZQ",   Some(b"Aladdin:open sesame")),
            (b"YWJj",                         Some(b"abc")),
            (b"",                             Some(b"")),
            (b"YWJjZ",                        None),
            (b"YQ==YWJj",                     None),
        ];

        for (src, expected) in cases {
            let mut dst = [0; 32];
            let result = decode(src, &mut dst).map(|len| &dst[..len]);
            assert_eq!(result, expected);
        }

        let mut small = [0; 2];
        assert_eq!(decode(b"YWJj", &mut small), None);

        let mut enc = [0; 28];
        let len = encode(b"Aladdin:open sesame", &mut enc).unwrap();
        assert_eq!(&enc[..len], b"QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
        assert_eq!(encode(b"abcd", &mut [0; 4]), None);
    }
}
