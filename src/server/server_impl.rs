use crate::{
    http::{route::Router, types::StatusCode},
    limits::{ConnLimits, ReqLimits, ServerLimits, WaitStrategy},
    server::connection::{close, reject, Connection},
};
use crossbeam::queue::SegQueue;
use log::{debug, error, info};
use socket2::{Domain, Protocol, Socket, Type};
use std::{io, net::SocketAddr, sync::Arc, thread};
use tokio::net::TcpListener;

/// Accepts connections and hands them to a fixed pool of worker threads.
///
/// Every worker owns its [`Arena`](crate::Arena) and serves one connection
/// at a time. Connections arriving while the pending queue is full are
/// answered with `503 Service Unavailable`.
///
/// # Examples
///
/// ```no_run
/// use octet_http::{Request, Route, Router, Server};
/// use tokio::net::TcpListener;
///
/// fn index(req: &mut Request<'_>) {
///     let _ = req.write(b"Hello world!");
/// }
///
/// static ROUTES: [Route; 1] = [Route::new("/|", &index)];
/// static ROUTER: Router = Router::new(&ROUTES);
///
/// #[tokio::main]
/// async fn main() {
///     Server::builder()
///         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
///         .router(&ROUTER)
///         .build()
///         .launch()
///         .await
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    stream_queue: TcpQueue,
    error_queue: TcpQueue,
    server_limits: ServerLimits,
}

impl Server {
    #[inline]
    pub fn builder() -> ServerBuilder {
        ServerBuilder {
            listener: None,
            router: None,

            server_limits: None,
            request_limits: None,
            connection_limits: None,
        }
    }

    /// Address the server accepts connections on.
    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    pub async fn launch(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("Listening on {addr}");
        }

        loop {
            let stream = match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("Accepted {addr}");
                    stream.into_std()
                }
                Err(err) => {
                    error!("Accept failed: {err}");
                    continue;
                }
            };
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    error!("Failed to detach accepted stream: {err}");
                    continue;
                }
            };

            match self.stream_queue.len() < self.server_limits.max_pending_connections {
                true => self.stream_queue.push(stream),
                false => self.error_queue.push(stream),
            }
        }
    }

    /// Blocks the calling worker thread until a stream is queued.
    #[inline]
    fn get_stream(queue: &TcpQueue, wait: &WaitStrategy) -> std::net::TcpStream {
        loop {
            if let Some(stream) = queue.pop() {
                return stream;
            }

            match wait {
                WaitStrategy::Yield => thread::yield_now(),
                WaitStrategy::Sleep(time) => thread::sleep(*time),
            }
        }
    }
}

//

/// Builder for configuring and creating [`Server`] instances.
pub struct ServerBuilder {
    listener: Option<TcpListener>,
    router: Option<&'static Router>,

    server_limits: Option<ServerLimits>,
    request_limits: Option<ReqLimits>,
    connection_limits: Option<ConnLimits>,
}

impl ServerBuilder {
    /// Sets the TCP listener that the server will use to accept connections.
    ///
    /// Either this or [`bind`](Self::bind) is required.
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Binds a listener to `addr` with `SO_REUSEADDR` and the
    /// [`backlog`](ServerLimits::backlog) of the server limits set so far.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use octet_http::{Request, Route, Router};
    /// # fn index(_: &mut Request<'_>) {}
    /// # static ROUTES: [Route; 1] = [Route::new("/|", &index)];
    /// # static ROUTER: Router = Router::new(&ROUTES);
    /// use octet_http::{limits::ServerLimits, Server};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> std::io::Result<()> {
    /// let server = Server::builder()
    ///     .server_limits(ServerLimits {
    ///         backlog: 16,
    ///         ..ServerLimits::default()
    ///     })
    ///     .bind("0.0.0.0:8080".parse().unwrap())?
    ///     .router(&ROUTER)
    ///     .build();
    /// # Ok(())
    /// # }
    /// ```
    pub fn bind(mut self, addr: SocketAddr) -> io::Result<Self> {
        let backlog = self
            .server_limits
            .as_ref()
            .map_or(ServerLimits::default().backlog, |limits| limits.backlog);

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(backlog)?;

        self.listener = Some(TcpListener::from_std(socket.into())?);
        Ok(self)
    }

    /// Sets the route table requests are dispatched with.
    ///
    /// **This is a required component.**
    #[inline(always)]
    pub fn router(mut self, router: &'static Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Configures the worker pool and the pending queue.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use octet_http::{Request, Route, Router};
    /// # fn index(_: &mut Request<'_>) {}
    /// # static ROUTES: [Route; 1] = [Route::new("/|", &index)];
    /// # static ROUTER: Router = Router::new(&ROUTES);
    /// # #[tokio::main]
    /// # async fn main() {
    /// use octet_http::{limits::ServerLimits, Server};
    /// use tokio::net::TcpListener;
    ///
    /// let server = Server::builder()
    ///     .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
    ///     .router(&ROUTER)
    ///     .server_limits(ServerLimits {
    ///         max_connections: 4,
    ///         max_pending_connections: 64,
    ///         ..ServerLimits::default()
    ///     })
    ///     .build();
    /// # }
    /// ```
    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    /// Configures socket timeouts and polling.
    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Configures credential buffers and chunk framing.
    #[inline(always)]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Spawns the workers and constructs a [`Server`] instance.
    ///
    /// # Panics
    ///
    /// Error messages:
    /// - ``The `listener` or `bind` method must be called to create``
    /// - ``The `router` method must be called to create``
    ///
    /// Panics when:
    /// - Neither `listener` nor `bind` was called.
    /// - The `router` method was not called.
    /// - A worker thread could not be spawned.
    #[inline]
    #[track_caller]
    pub fn build(self) -> Server {
        let (listener, router, limits) = self.get_all_parts();

        let stream_queue = Arc::new(SegQueue::new());
        let error_queue = Arc::new(SegQueue::new());

        for _ in 0..limits.0.max_connections {
            Self::spawn_worker(&stream_queue, router, &limits);
        }
        if limits.0.count_503_handlers != 0 {
            for _ in 0..limits.0.count_503_handlers {
                Self::spawn_alarmist(&error_queue, &limits);
            }
        } else {
            Self::spawn_quiet_alarmist(&error_queue, &limits);
        }

        Server {
            listener,
            stream_queue,
            error_queue,
            server_limits: limits.0,
        }
    }

    #[inline]
    fn spawn_worker(queue: &TcpQueue, router: &'static Router, limits: &AllLimits) {
        let queue = queue.clone();
        let (server_limits, conn_limits, req_limits) = limits.clone();
        let mut conn = Connection::new(router, &req_limits, conn_limits);

        thread::spawn(move || loop {
            let stream = Server::get_stream(&queue, &server_limits.wait_strategy);
            conn.run(stream);
        });
    }

    #[inline]
    fn spawn_alarmist(queue: &TcpQueue, limits: &AllLimits) {
        let queue = queue.clone();
        let (server_limits, conn_limits, _) = limits.clone();

        thread::spawn(move || loop {
            let stream = Server::get_stream(&queue, &server_limits.wait_strategy);
            close(reject(stream, &conn_limits, StatusCode::SERVICE_UNAVAILABLE));
        });
    }

    #[inline]
    fn spawn_quiet_alarmist(queue: &TcpQueue, limits: &AllLimits) {
        let queue = queue.clone();
        let (server_limits, ..) = limits.clone();

        thread::spawn(move || loop {
            let stream = Server::get_stream(&queue, &server_limits.wait_strategy);
            close(stream);
        });
    }

    #[inline]
    #[track_caller]
    fn get_all_parts(self) -> (TcpListener, &'static Router, AllLimits) {
        (
            self.listener
                .expect("The `listener` or `bind` method must be called to create"),
            self.router
                .expect("The `router` method must be called to create"),
            (
                self.server_limits.unwrap_or_default(),
                self.connection_limits.unwrap_or_default(),
                self.request_limits.unwrap_or_default(),
            ),
        )
    }
}

type TcpQueue = Arc<SegQueue<std::net::TcpStream>>;
type AllLimits = (ServerLimits, ConnLimits, ReqLimits);
