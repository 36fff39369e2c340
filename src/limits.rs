//! Engine configuration limits and timeouts
//!
//! # Memory Consumption
//!
//! Parsing never allocates. Every worker owns one [`Arena`](crate::Arena)
//! created at configuration time whose size is:
//!
//! `Total` = `URL buffer` ([`Router::url_size`](crate::Router::url_size)) +
//!           `query name scratch` ([`Router::var_name_size`](crate::Router::var_name_size)) +
//!           [`username_size`](ReqLimits::username_size) +
//!           [`password_size`](ReqLimits::password_size)
//!
//! Header lines, multipart boundaries and part names use the fixed-size
//! stack buffers described by the constants of this module.
//!
//! # Examples
//!
//! ```no_run
//! use octet_http::{Method, Methods, Request, Route, Router, Server};
//! use octet_http::limits::{ConnLimits, ReqLimits, ServerLimits};
//! use std::time::Duration;
//!
//! fn index(req: &mut Request<'_>) {
//!     let _ = req.write(b"Hello world!");
//! }
//!
//! static ROUTES: [Route; 1] = [Route::new("/|", &index).methods(Methods::GET)];
//! static ROUTER: Router = Router::new(&ROUTES);
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     Server::builder()
//!         .bind("127.0.0.1:8080".parse().unwrap())?
//!         .router(&ROUTER)
//!         .server_limits(ServerLimits {
//!             max_connections: 2,
//!             ..ServerLimits::default()
//!         })
//!         .connection_limits(ConnLimits {
//!             socket_read_timeout: Duration::from_secs(5),
//!             ..ConnLimits::default()
//!         })
//!         .request_limits(ReqLimits {
//!             username_size: 16,
//!             ..ReqLimits::default()
//!         })
//!         .build()
//!         .launch()
//!         .await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

/// Longest header name kept, the rest of the name is consumed and dropped.
pub const HEADER_NAME_SIZE: usize = 32;
/// Longest header value kept, continuation lines included.
pub const HEADER_VALUE_SIZE: usize = 224;
/// Longest multipart boundary accepted, see
/// [RFC 2046, Section 5.1.1](https://datatracker.ietf.org/doc/html/rfc2046#section-5.1.1).
pub const BOUNDARY_SIZE: usize = 70;
/// Longest `Content-Disposition` name kept for a multipart part.
pub const DISPOSITION_NAME_SIZE: usize = 32;

/// Controls server-level concurrency and queueing.
///
/// # Connection management
/// ```text
///                            [------------]
///                            [ Tcp accept ]
///                            [------------]
///                                  ||
///                                  || TCP_STREAM
///                                  \/
/// [--------------]   Yes   /----------------\   No   [-------------]
/// [ Add to queue ] <====== | Room in queue? | =====> [ Sending 503 ]
/// [--------------]         \----------------/        [-------------]
///        ||
///        \==================\\          //====================\
///                            V          V                    ||
/// [--------]   Yes   /-------------------------\   No   [------]
/// [ Worker ] <====== | Is there a free worker? | =====> [ Wait ]
/// [--------]         \-------------------------/        [------]
/// ```
///
/// # Worker
/// A worker is a thread created once at startup. It owns one
/// [`Arena`](crate::Arena), pops a connection from the queue, serves exactly
/// one request on it and closes it.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Number of workers, i.e. requests processed concurrently (default: `8`).
    pub max_connections: usize,

    /// Maximum number of TCP connections waiting in the admission queue (default: `32`).
    ///
    /// If the queue is full, new connections receive an immediate
    /// [503](crate::StatusCode::SERVICE_UNAVAILABLE) response.
    pub max_pending_connections: usize,

    /// Strategy for worker waiting behavior (default: `Sleep(50µs)`)
    pub wait_strategy: WaitStrategy,

    /// Dedicated handlers for queue overflow responses (default: `1`).
    ///
    /// Set to 0 to silently close overflowing connections.
    pub count_503_handlers: usize,

    /// Listen backlog used by [`ServerBuilder::bind`](crate::ServerBuilder::bind) (default: `128`).
    pub backlog: i32,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 8,
            max_pending_connections: 32,
            wait_strategy: WaitStrategy::Sleep(Duration::from_micros(50)),
            count_503_handlers: 1,
            backlog: 128,

            _priv: (),
        }
    }
}

/// Strategy for workers when no connections are queued
#[derive(Debug, Clone)]
pub enum WaitStrategy {
    /// While waiting, uses [`std::thread::yield_now()`]
    ///
    /// # Note
    /// Keeps a core busy, only worth it when latency matters more than power.
    Yield,

    /// While waiting, uses [`std::thread::sleep()`]
    Sleep(Duration),
}

/// Connection-level timeouts
///
/// The socket is polled in non-blocking mode. A read or write that would
/// block sleeps for [`poll_interval`](Self::poll_interval) and tries again
/// until the matching timeout runs out.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Maximum duration to wait for incoming data (default: `2 seconds`)
    ///
    /// Measured from the last byte received, prevents slowloris clients from
    /// holding a worker.
    pub socket_read_timeout: Duration,

    /// Maximum duration to wait for the socket to accept data (default: `3 seconds`)
    pub socket_write_timeout: Duration,

    /// Sleep between polls of a socket that would block (default: `200µs`)
    pub poll_interval: Duration,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(2),
            socket_write_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_micros(200),

            _priv: (),
        }
    }
}

/// Request parsing limits
///
/// URL and query-name capacities are not configured here, they follow from
/// the route table (see [`Router`](crate::Router)).
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Capacity for the username of `Authorization: Basic` (default: `32`)
    ///
    /// Credentials that do not fit are ignored as a whole.
    pub username_size: usize,

    /// Capacity for the password of `Authorization: Basic` (default: `32`)
    pub password_size: usize,

    /// Framing of `Transfer-Encoding: chunked` bodies (default: [`ChunkFraming::Decimal`])
    pub chunk_framing: ChunkFraming,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ReqLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            username_size: 32,
            password_size: 32,
            chunk_framing: ChunkFraming::Decimal,

            _priv: (),
        }
    }
}

/// How chunked request bodies are framed
///
/// # Note
/// [RFC 7230, Section 4.1](https://datatracker.ietf.org/doc/html/rfc7230#section-4.1)
/// defines chunk sizes in hexadecimal. The default [`Decimal`](Self::Decimal)
/// dialect deliberately deviates from it, select
/// [`Rfc7230`](Self::Rfc7230) for standard clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFraming {
    /// Chunk sizes are decimal. Every chunk is followed by a literal `0`
    /// line and a trailer block, a chunk of size `0` ends the body:
    /// ```text
    /// 5\r\n
    /// HELLO\r\n
    /// 0\r\n
    /// \r\n
    /// ```
    Decimal,

    /// Chunk sizes are hexadecimal, extensions are skipped and a chunk of
    /// size `0` followed by trailers ends the body.
    Rfc7230,
}
