//! ```sh
//! curl -F title=notes -F file=@Cargo.toml -H 'Transfer-Encoding: chunked' localhost:8080/upload
//! ```

use octet_http::{
    limits::{ChunkFraming, ReqLimits},
    ContentType, Methods, Multipart, Request, Route, Router, Server, StatusCode,
};

fn upload(req: &mut Request<'_>) {
    let Some(mut form) = Multipart::new(req) else {
        let _ = req.status_response(StatusCode::UNPROCESSABLE_ENTITY);
        return;
    };

    let mut report = [0u8; 512];
    let mut len = 0;
    let mut push = |bytes: &[u8]| {
        let n = bytes.len().min(report.len() - len);
        report[len..len + n].copy_from_slice(&bytes[..n]);
        len += n;
    };

    loop {
        match form.next_part() {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                log::warn!("Broken upload: {err}");
                form.request().set_status(StatusCode::BAD_REQUEST);
                break;
            }
        }

        let mut size = 0;
        let mut buf = [0; 256];
        while let Ok(n @ 1..) = form.read(&mut buf) {
            size += n;
        }

        push(form.name());
        let kind = match form.content_type().category() {
            ContentType::TEXT => " (text): ",
            ContentType::APPLICATION => " (application): ",
            _ => ": ",
        };
        push(kind.as_bytes());
        push(size.to_string().as_bytes());
        push(b" bytes\n");
    }

    let _ = form.request().write(&report[..len]);
}

static ROUTES: [Route; 1] = [Route::new("/upload|", &upload).methods(Methods::POST)];
static ROUTER: Router = Router::new(&ROUTES);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    Server::builder()
        .bind("127.0.0.1:8080".parse().unwrap())?
        .router(&ROUTER)
        .request_limits(ReqLimits {
            chunk_framing: ChunkFraming::Rfc7230,
            ..ReqLimits::default()
        })
        .build()
        .launch()
        .await;
    Ok(())
}
