//! HTTP front end of the presentation service.
//!
//! Routes run on the shared [`HttpServer`] accept loop, the same one the
//! analytics server uses.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use sa_common::http::{HTML, TEXT};
use sa_common::{HttpServer, Incoming, PresentationConfig, Reply};
use tracing::{debug, info, warn};

use crate::client::UpstreamClient;
use crate::error::Result;
use crate::form::FormValues;
use crate::page::{PageContext, PageRenderer};
use crate::visual::save_visualization;

/// Shown when a hypothesis test is submitted with fewer than two variables.
pub const NOT_ENOUGH_VARIABLES: &str = "variables are not enough.";
/// Shown for any other failed test or chart request.
pub const NOT_FOUND: &str = "Not Found.";

/// Shared state of the presentation service.
#[derive(Debug, Clone)]
pub struct WebState {
    pub config: PresentationConfig,
    pub client: UpstreamClient,
    pub renderer: PageRenderer,
}

impl WebState {
    pub fn new(config: PresentationConfig) -> Self {
        Self {
            client: UpstreamClient::from_config(&config),
            renderer: PageRenderer::new(config.limits.clone()),
            config,
        }
    }
}

/// Handle one request.
pub fn dispatch(state: &WebState, req: &Incoming) -> Reply {
    let (path, query) = req.path_and_query();
    match (req.method.as_str(), path) {
        ("GET", "/") | ("POST", "/") => {
            let form = (req.method == "POST").then(|| FormValues::parse(query, &req.body));
            Reply::html(index(state, form.as_ref()))
        }
        ("GET", "/health") => Reply::text(200, "ok"),
        ("GET", p) if p.starts_with("/static/") => {
            serve_static(&state.config.static_dir, &p["/static/".len()..])
        }
        (_, "/") | (_, "/health") => Reply::text(405, "Method Not Allowed"),
        _ => Reply::text(404, "Not Found"),
    }
}

/// Build the index page, running any submitted test or chart first.
pub fn index(state: &WebState, form: Option<&FormValues>) -> String {
    let page = state.client.fetch_page();
    let mut ctx = PageContext::new(page);

    if let Some(form) = form {
        if let Some(req) = form.statistical() {
            match state.client.stat_test(&req) {
                Ok(result) => ctx.statistical = Some(result),
                Err(e) => {
                    warn!(test_type = %req.test_type, error = %e, "hypothesis test failed");
                    ctx.statistical_error = Some(if req.variables.len() < 2 {
                        NOT_ENOUGH_VARIABLES.to_string()
                    } else {
                        NOT_FOUND.to_string()
                    });
                }
            }
        }

        if let Some(vis) = form.visualization() {
            match render_visualization(state, &vis.kind, &vis.var1, &vis.var2) {
                Ok(url) => ctx.visualization_image = Some(url),
                Err(e) => {
                    warn!(kind = %vis.kind, error = %e, "visualization failed");
                    ctx.visualization_error = Some(NOT_FOUND.to_string());
                }
            }
        }
    }

    state.renderer.render(&ctx)
}

/// Fetch a chart, save it as JPEG and return the URL the page should use.
fn render_visualization(state: &WebState, kind: &str, var1: &str, var2: &str) -> Result<String> {
    let response = state.client.visualization(kind, var1, var2)?;
    save_visualization(&response.image, &state.config.visualization_path())?;
    // The file name never changes; the query defeats browser caching.
    Ok(format!(
        "{}?v={}",
        state.config.visualization_url(),
        Utc::now().timestamp_millis()
    ))
}

/// Relative path under the static dir, or `None` if it tries to escape.
fn static_path(root: &Path, rel: &str) -> Option<PathBuf> {
    if rel.is_empty() || rel.contains('\\') {
        return None;
    }
    let rel = Path::new(rel);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(rel))
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("html") => HTML,
        Some("txt") => TEXT,
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn serve_static(root: &Path, rel: &str) -> Reply {
    let Some(path) = static_path(root, rel) else {
        debug!(path = rel, "rejected static path");
        return Reply::text(404, "Not Found");
    };
    match std::fs::read(&path) {
        Ok(body) => Reply::new(200, content_type(&path), body),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "static file not served");
            Reply::text(404, "Not Found")
        }
    }
}

/// Handle to the running presentation server.
pub struct WebServer {
    http: HttpServer,
}

impl WebServer {
    /// Bind and start serving on a background thread.
    pub fn start(config: PresentationConfig) -> Result<Self> {
        info!(upstream = %config.upstream_base_url, "starting presentation server");
        let bind = config.addr();
        let state = WebState::new(config);
        let http = HttpServer::start("sa-web", &bind, move |req: &Incoming| dispatch(&state, req))?;
        Ok(Self { http })
    }

    pub fn addr(&self) -> SocketAddr {
        self.http.addr()
    }

    /// Block until the serve loop exits.
    pub fn wait(self) {
        self.http.wait();
    }

    pub fn shutdown(self) {
        self.http.shutdown();
    }
}
