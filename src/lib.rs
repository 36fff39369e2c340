//! octet_http - Allocation-free HTTP/1.x request engine for small hosts
//!
//! Parses a request straight off a pull-based byte stream, routes it through
//! a static route table, decodes chunked and multipart bodies on demand and
//! writes a correctly framed response. Parsing never touches the heap: every
//! buffer is carved from an [`Arena`] sized once from the route table.
//!
//! # Protocol Support
//!
//! - **Methods**: `GET`, `HEAD` and `POST`, anything else is answered with `501`
//! - **Versions**: `HTTP/1.0` and `HTTP/1.1`, a missing version means `HTTP/1.0`
//! - **Bodies**: `Content-Length`, chunked ([two dialects](limits::ChunkFraming))
//!   and `multipart/form-data`
//! - **Auth**: `Authorization: Basic` credentials, `Digest` detection
//!
//! Connections are never kept alive, every response closes its connection.
//!
//! # Examples
//!
//! Engine only, over any [`OctetStream`]:
//! ```
//! use octet_http::{limits::ReqLimits, process_request, Arena, OctetStream, Outcome};
//! use octet_http::{Request, Route, Router, StatusCode};
//! use std::io;
//!
//! struct Serial<'a> {
//!     rx: &'a [u8],
//!     tx: Vec<u8>,
//! }
//!
//! impl OctetStream for Serial<'_> {
//!     fn getch(&mut self) -> io::Result<Option<u8>> {
//!         let Some((&first, rest)) = self.rx.split_first() else {
//!             return Ok(None);
//!         };
//!         self.rx = rest;
//!         Ok(Some(first))
//!     }
//!
//!     fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
//!         self.tx.extend_from_slice(buf);
//!         Ok(buf.len())
//!     }
//!
//!     fn flush(&mut self) -> io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn status(req: &mut Request<'_>) {
//!     req.set_content_type("application/json");
//!     let _ = req.write(br#"{"up":true}"#);
//! }
//!
//! static ROUTES: [Route; 1] = [Route::new("/status|", &status)];
//! static ROUTER: Router = Router::new(&ROUTES);
//!
//! let mut arena = Arena::new(&ROUTER, &ReqLimits::default());
//! let mut serial = Serial { rx: b"GET /status HTTP/1.1\r\n\r\n", tx: Vec::new() };
//!
//! let outcome = process_request(&mut serial, &ROUTER, &mut arena);
//! assert_eq!(outcome, Outcome::Dispatched(StatusCode::OK));
//! ```
//!
//! Over TCP, with a pool of worker threads:
//! ```no_run
//! use octet_http::{Methods, Request, Route, Router, Server};
//!
//! fn hello(req: &mut Request<'_>) {
//!     let _ = req.write(b"Hello world!");
//! }
//!
//! fn upload(req: &mut Request<'_>) {
//!     let mut buf = [0; 128];
//!     let mut total = 0;
//!     while let Ok(n @ 1..) = req.read(&mut buf) {
//!         total += n;
//!     }
//!     let _ = req.write(if total > 0 { &b"thanks"[..] } else { &b"empty"[..] });
//! }
//!
//! static ROUTES: [Route; 2] = [
//!     Route::new("/upload|", &upload).methods(Methods::POST),
//!     Route::new("/", &hello).tail(64),
//! ];
//! static ROUTER: Router = Router::new(&ROUTES);
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     Server::builder()
//!         .bind("127.0.0.1:8080".parse().unwrap())?
//!         .router(&ROUTER)
//!         .build()
//!         .launch()
//!         .await;
//!     Ok(())
//! }
//! ```

pub(crate) mod http {
    pub mod base64;
    pub(crate) mod headers;
    pub(crate) mod multipart;
    pub(crate) mod parser;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod route;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub(crate) mod errors;
pub mod limits;
pub(crate) mod stream;

pub use crate::{
    errors::Error,
    http::{
        base64,
        multipart::Multipart,
        parser::{process_request, Outcome},
        request::{Arena, AuthScheme, Request},
        route::{Handler, Route, Router, VarSpec, VarType},
        types::{ContentType, Method, Methods, StatusCode, Version},
    },
    server::server_impl::{Server, ServerBuilder},
    stream::OctetStream,
};
