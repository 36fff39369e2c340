use octet_http::{Methods, Request, Route, Router, Server};

fn favicon(req: &mut Request<'_>) {
    req.set_content_type("image/x-icon");
}

/// Echoes whatever follows `/test` in the path.
fn test(req: &mut Request<'_>) {
    let mut copy = [0; 16];
    let tail = req.tail().unwrap_or(b"/");
    copy[..tail.len()].copy_from_slice(tail);

    let len = tail.len();
    let _ = req.write(b"tail: ");
    let _ = req.write(&copy[..len]);
}

fn index(req: &mut Request<'_>) {
    req.set_content_type("text/html");
    let _ = req.write(b"<h1>Hello, world!</h1>");
}

static ROUTES: [Route; 3] = [
    Route::new("/favicon.ico|", &favicon),
    Route::new("/test", &test).tail(16),
    Route::new("/\\", &index).methods(Methods::ALL),
];
static ROUTER: Router = Router::new(&ROUTES);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    Server::builder()
        .bind("127.0.0.1:8080".parse().unwrap())?
        .router(&ROUTER)
        .build()
        .launch()
        .await;
    Ok(())
}
