//! ```sh
//! curl -u admin:hunter2 localhost:8080/private
//! ```

use octet_http::{AuthScheme, Request, Route, Router, Server};

const USERNAME: &[u8] = b"admin";
const PASSWORD: &[u8] = b"hunter2";

fn private(req: &mut Request<'_>) {
    match req.auth_scheme() {
        AuthScheme::Basic if req.username() == Some(USERNAME) && req.password() == Some(PASSWORD) => {
            let _ = req.write(b"Welcome, admin!");
        }
        AuthScheme::Digest => {
            req.request_basic_auth("octet");
            let _ = req.write(b"Digest is not supported, use Basic");
        }
        _ => {
            req.request_basic_auth("octet");
            let _ = req.write(b"Who are you?");
        }
    }
}

static ROUTES: [Route; 1] = [Route::new("/private\\", &private)];
static ROUTER: Router = Router::new(&ROUTES);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    Server::builder()
        .bind("127.0.0.1:8080".parse().unwrap())?
        .router(&ROUTER)
        .build()
        .launch()
        .await;
    Ok(())
}
