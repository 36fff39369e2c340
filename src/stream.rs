//! The octet stream the engine parses from and writes to
//!
//! The engine never talks to sockets directly. Everything goes through an
//! [`OctetStream`], so a request can be served from a TCP socket, a UART,
//! or an in-memory buffer in tests. Timeouts, retries and buffering are the
//! stream's business.

use std::io;

/// Pull-based byte source and sink.
///
/// Only [`getch`](Self::getch), [`write`](Self::write) and
/// [`flush`](Self::flush) are required.
///
/// # Examples
///
/// A stream replaying a fixed request and discarding the response:
/// ```
/// use octet_http::OctetStream;
/// use std::io;
///
/// struct Replay<'a> {
///     input: &'a [u8],
/// }
///
/// impl OctetStream for Replay<'_> {
///     fn getch(&mut self) -> io::Result<Option<u8>> {
///         let Some((&first, rest)) = self.input.split_first() else {
///             return Ok(None);
///         };
///         self.input = rest;
///         Ok(Some(first))
///     }
///
///     fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
///         Ok(buf.len())
///     }
///
///     fn flush(&mut self) -> io::Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait OctetStream {
    /// Next byte, `Ok(None)` once the peer finished sending.
    fn getch(&mut self) -> io::Result<Option<u8>>;

    /// Reads up to `buf.len()` bytes, `Ok(0)` at end of stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
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

    /// Writes some prefix of `buf` and returns its length.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn putch(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()>;

    /// Writes all of `buf`, a stream accepting nothing is an error.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => return Err(io::ErrorKind::WriteZero.into()),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }
}
