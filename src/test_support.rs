//! In-process HTTP fixture server for tests.
//!
//! Serves canned HTML per path over plain HTTP/1.1 on a random localhost
//! port, one connection per request. Routes can be swapped while the server
//! runs so a test can simulate the index page changing between runs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A canned response.
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Route {
    pub fn ok(body: impl Into<String>) -> Self {
        Route {
            status: 200,
            body: body.into(),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Route {
            status,
            body: String::new(),
            delay: None,
        }
    }

    pub fn slow(body: impl Into<String>, delay: Duration) -> Self {
        Route {
            status: 200,
            body: body.into(),
            delay: Some(delay),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    routes: HashMap<String, Route>,
    requests: Vec<(String, String)>,
}

/// Handle to a running fixture server.
#[derive(Debug, Clone)]
pub struct FixtureServer {
    addr: SocketAddr,
    shared: Arc<Mutex<Shared>>,
}

impl FixtureServer {
    /// Bind to `127.0.0.1:0` and serve `routes` until the runtime shuts down.
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Mutex::new(Shared {
            routes: routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
            requests: Vec::new(),
        }));

        let accept_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let shared = Arc::clone(&accept_shared);
                tokio::spawn(async move {
                    let _ = handle(stream, shared).await;
                });
            }
        });

        FixtureServer { addr, shared }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Replace (or add) the response for `path`.
    pub fn set_route(&self, path: &str, route: Route) {
        self.shared
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), route);
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.shared
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    /// Raw request head of the most recent request for `path`.
    pub fn last_request(&self, path: &str) -> Option<String> {
        self.shared
            .lock()
            .unwrap()
            .requests
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, head)| head.clone())
    }
}

async fn handle(mut stream: TcpStream, shared: Arc<Mutex<Shared>>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let route = {
        let mut guard = shared.lock().unwrap();
        guard.requests.push((path.clone(), head));
        guard.routes.get(&path).cloned()
    }
    .unwrap_or_else(|| Route::status(404));

    if let Some(delay) = route.delay {
        tokio::time::sleep(delay).await;
    }

    let reason = match route.status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        route.status,
        reason,
        route.body.len(),
        route.body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Wrap anchors in the nested container markup of the speeches index page.
pub fn index_page(anchors: &[(&str, &str)]) -> String {
    let items: String = anchors
        .iter()
        .map(|(href, text)| format!(r#"<div class="item"><a href="{href}">{text}</a></div>"#))
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>Discursos</title></head><body>
<div id="jm-allpage" class="nofluid"><div id="jm-mainpage"><div id="jm-mainpage-in">
<div id="jm-main" class="lcr scheme1 nocolumns clearfix"><div id="jm-maincontent">
<main class="home-special home-mid"><div class="container"><section>
<div class="row row-extra row-news row-clear-4"><div class="blog"><div class="contentboxes">
<div class="box col-sm-6 col-md-3">{items}</div>
</div></div></div>
</section></div></main>
</div></div></div></div></div>
</body></html>"#
    )
}

/// A speech page in the site's article layout.
pub fn article_page(title: &str, date: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        r#"<!DOCTYPE html><html><body>
<h2>{title}</h2>
<time>
{date}
</time>
<article><p><strong>Fuente: Presidencia</strong></p>{body}</article>
</body></html>"#
    )
}
