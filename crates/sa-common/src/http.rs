//! Blocking HTTP accept loop shared by both services.
//!
//! A single `tiny_http` server on a background thread. Requests are handled
//! one at a time; the loop polls a shutdown flag between requests and
//! answers 503 once shutdown has begun.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::StartError;

pub const JSON: &str = "application/json";
pub const TEXT: &str = "text/plain; charset=utf-8";
pub const HTML: &str = "text/html; charset=utf-8";

/// Extra response headers.
pub type HeaderList = Vec<(&'static str, String)>;

/// Transport-independent view of a request.
#[derive(Debug, Clone, Default)]
pub struct Incoming {
    pub method: String,
    /// Path plus optional `?query`.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Incoming {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `(path, query)`; the query is empty when absent.
    pub fn path_and_query(&self) -> (&str, &str) {
        self.url.split_once('?').unwrap_or((self.url.as_str(), ""))
    }
}

/// Response ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, TEXT, body)
    }

    pub fn html(body: String) -> Self {
        Self::new(200, HTML, body)
    }

    /// Serialize `value`; a serialization failure becomes a bare 500.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, JSON, body),
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                Self::internal()
            }
        }
    }

    pub fn internal() -> Self {
        Self::text(500, "Internal Server Error")
    }

    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Handle to a running accept loop.
pub struct HttpServer {
    name: &'static str,
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
    addr: SocketAddr,
}

impl HttpServer {
    /// Bind `bind` (`host:port`) and serve every request with `handler` on a
    /// background thread named `name`.
    pub fn start<H>(name: &'static str, bind: &str, handler: H) -> Result<Self, StartError>
    where
        H: Fn(&Incoming) -> Reply + Send + 'static,
    {
        let server = tiny_http::Server::http(bind).map_err(|e| StartError::Bind {
            addr: bind.to_string(),
            reason: e.to_string(),
        })?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| StartError::Address {
                addr: bind.to_string(),
                reason: "not an IP listener".to_string(),
            })?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || serve_loop(server, &handler, &shutdown_clone))?;

        info!(server = name, %addr, "http server started");
        Ok(Self {
            name,
            shutdown,
            thread: Some(thread),
            addr,
        })
    }

    /// The bound address (useful with port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the serve loop exits.
    pub fn wait(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    pub fn shutdown(mut self) {
        self.stop();
        info!(server = self.name, "http server stopped");
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Wake the accept loop.
        let _ = std::net::TcpStream::connect(self.addr);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn to_incoming(request: &mut tiny_http::Request) -> Incoming {
    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        warn!(error = %e, "failed to read request body");
    }
    Incoming {
        method: request.method().to_string().to_uppercase(),
        url: request.url().to_string(),
        headers: request
            .headers()
            .iter()
            .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
            .collect(),
        body,
    }
}

fn to_response(reply: Reply) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let mut response = tiny_http::Response::from_data(reply.body).with_status_code(reply.status);
    let content_type = ("Content-Type", reply.content_type.to_string());
    for (name, value) in std::iter::once(content_type).chain(reply.headers) {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => warn!(header = name, "dropping invalid response header"),
        }
    }
    response
}

fn serve_loop<H>(server: tiny_http::Server, handler: &H, shutdown: &AtomicBool)
where
    H: Fn(&Incoming) -> Reply,
{
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let mut request = match server.recv_timeout(Duration::from_secs(1)) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(e) => {
                if !shutdown.load(Ordering::SeqCst) {
                    error!(error = %e, "accept error");
                }
                break;
            }
        };

        if shutdown.load(Ordering::SeqCst) {
            let _ = request
                .respond(tiny_http::Response::from_string("shutting down").with_status_code(503));
            break;
        }

        let started = Instant::now();
        let incoming = to_incoming(&mut request);
        let reply = handler(&incoming);
        let status = reply.status;

        if let Err(e) = request.respond(to_response(reply)) {
            warn!(error = %e, "failed to send response");
        }
        debug!(
            method = %incoming.method,
            url = %incoming.url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
    }
}
