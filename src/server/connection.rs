use crate::{
    http::{
        parser::{process_request, Outcome},
        request::{Arena, Request},
        route::Router,
        types::StatusCode,
    },
    limits::{ConnLimits, ReqLimits},
    OctetStream,
};
use log::debug;
use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
    thread,
    time::{Duration, Instant},
};

const RECV_SIZE: usize = 512;
const SEND_SIZE: usize = 256;

/// [`OctetStream`] over a non-blocking socket.
///
/// Reads and writes go through small fixed buffers. A socket that is not
/// ready is polled every `poll_interval` until the read or write timeout
/// expires, which fails with [`io::ErrorKind::TimedOut`].
pub(crate) struct IoStream<T: Read + Write> {
    inner: T,

    recv: [u8; RECV_SIZE],
    recv_pos: usize,
    recv_len: usize,
    send: [u8; SEND_SIZE],
    send_len: usize,

    read_timeout: Duration,
    write_timeout: Duration,
    poll_interval: Duration,
}

impl<T: Read + Write> IoStream<T> {
    pub(crate) fn new(inner: T, limits: &ConnLimits) -> Self {
        IoStream {
            inner,

            recv: [0; RECV_SIZE],
            recv_pos: 0,
            recv_len: 0,
            send: [0; SEND_SIZE],
            send_len: 0,

            read_timeout: limits.socket_read_timeout,
            write_timeout: limits.socket_write_timeout,
            poll_interval: limits.poll_interval,
        }
    }

    #[inline]
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }

    /// Refills the receive buffer, `Ok(0)` once the peer closed.
    fn fill(&mut self) -> io::Result<usize> {
        let deadline = Instant::now() + self.read_timeout;

        loop {
            match self.inner.read(&mut self.recv) {
                Ok(n) => {
                    self.recv_pos = 0;
                    self.recv_len = n;
                    return Ok(n);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    wait(deadline, self.poll_interval)?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Writes out the whole send buffer.
    fn drain(&mut self) -> io::Result<()> {
        let deadline = Instant::now() + self.write_timeout;
        let mut pos = 0;

        while pos < self.send_len {
            match self.inner.write(&self.send[pos..self.send_len]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => pos += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    wait(deadline, self.poll_interval)?;
                }
                Err(err) => return Err(err),
            }
        }

        self.send_len = 0;
        Ok(())
    }
}

#[inline]
fn wait(deadline: Instant, poll_interval: Duration) -> io::Result<()> {
    if Instant::now() >= deadline {
        return Err(io::ErrorKind::TimedOut.into());
    }
    thread::sleep(poll_interval);
    Ok(())
}

impl<T: Read + Write> OctetStream for IoStream<T> {
    #[inline]
    fn getch(&mut self) -> io::Result<Option<u8>> {
        if self.recv_pos == self.recv_len && self.fill()? == 0 {
            return Ok(None);
        }

        let byte = self.recv[self.recv_pos];
        self.recv_pos += 1;
        Ok(Some(byte))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.recv_pos == self.recv_len && self.fill()? == 0 {
            return Ok(0);
        }

        let len = buf.len().min(self.recv_len - self.recv_pos);
        buf[..len].copy_from_slice(&self.recv[self.recv_pos..self.recv_pos + len]);
        self.recv_pos += len;
        Ok(len)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.send_len == SEND_SIZE {
            self.drain()?;
        }

        let len = buf.len().min(SEND_SIZE - self.send_len);
        self.send[self.send_len..self.send_len + len].copy_from_slice(&buf[..len]);
        self.send_len += len;
        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()?;
        self.inner.flush()
    }
}

/// Per-worker state, reused for every connection the worker serves.
pub(crate) struct Connection {
    router: &'static Router,
    arena: Arena,
    conn_limits: ConnLimits,
}

impl Connection {
    pub(crate) fn new(router: &'static Router, req_limits: &ReqLimits, conn_limits: ConnLimits) -> Self {
        Connection {
            router,
            arena: Arena::new(router, req_limits),
            conn_limits,
        }
    }

    /// Serves one request and closes the connection.
    pub(crate) fn run(&mut self, stream: TcpStream) -> Outcome {
        let (outcome, stream) = self.serve(stream);
        close(stream);
        outcome
    }

    pub(crate) fn serve<T: Read + Write>(&mut self, stream: T) -> (Outcome, T) {
        let mut io = IoStream::new(stream, &self.conn_limits);
        let outcome = process_request(&mut io, self.router, &mut self.arena);

        debug!("Served request: {outcome:?}");
        (outcome, io.into_inner())
    }
}

/// Answers a connection that is never parsed with a bare status response.
pub(crate) fn reject<T: Read + Write>(stream: T, limits: &ConnLimits, status: StatusCode) -> T {
    let mut io = IoStream::new(stream, limits);
    let mut req = Request::detached(&mut io);

    if let Err(err) = req.status_response(status).and_then(|()| req.flush()) {
        debug!("Failed to send {status}: {err}");
    }
    drop(req);
    io.into_inner()
}

#[inline]
pub(crate) fn close(stream: TcpStream) {
    if let Err(err) = stream.shutdown(Shutdown::Both) {
        debug!("Shutdown failed: {err}");
    }
}
