//! HTTP front end for the analytics handlers.
//!
//! Routing and CORS on top of the shared accept loop in
//! [`sa_common::http`].

use std::net::SocketAddr;
use std::sync::Arc;

use sa_common::wire::{ErrorBody, StatTestRequest};
use sa_common::{AnalyticsConfig, CorsConfig, Dataset, HttpServer, Incoming, Reply, StartError};
use tracing::{debug, error, info};

use crate::cors::{self, Preflight};
use crate::error::ApiError;
use crate::handlers;

/// Paths with at least one route; other methods on them get 405.
const KNOWN_PATHS: &[&str] = &[
    "/api/data",
    "/api/summary",
    "/api/visualization",
    "/api/correlation",
    "/api/stat_tests",
    "/api/preprocess",
    "/api/patterns",
    "/api/insights",
    "/api/limitations",
    "/api/future_research",
    "/health",
];

/// Shared, read-only state of the service.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub cors: CorsConfig,
}

fn detail(status: u16, detail: &str) -> Reply {
    Reply::json(status, &ErrorBody::new(detail))
}

fn from_error(err: &ApiError) -> Reply {
    match err.body() {
        Some(body) => Reply::json(err.status(), &body),
        None => Reply::internal(),
    }
}

/// Last value of `key` in a urlencoded query string.
fn query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .last()
}

fn route(
    state: &AppState,
    method: &str,
    path: &str,
    query: &str,
    body: &[u8],
) -> Result<Reply, ApiError> {
    let ds = state.dataset.as_ref();
    let reply = match (method, path) {
        ("GET", "/api/data") => Reply::json(200, &handlers::data(ds)),
        ("GET", "/api/summary") => Reply::json(200, &handlers::summary(ds)?),
        ("GET", "/api/visualization") => {
            let kind = query_param(query, "type");
            let var1 = query_param(query, "var1");
            let var2 = query_param(query, "var2");
            Reply::json(
                200,
                &handlers::visualization(ds, kind.as_deref(), var1.as_deref(), var2.as_deref())?,
            )
        }
        ("GET", "/api/correlation") => Reply::json(200, &handlers::correlation(ds)),
        ("POST", "/api/stat_tests") => {
            let req: StatTestRequest = serde_json::from_slice(body)
                .map_err(|e| ApiError::Unprocessable(format!("invalid request body: {}", e)))?;
            Reply::json(200, &handlers::stat_tests(ds, &req)?)
        }
        ("POST", "/api/preprocess") => Reply::json(200, &handlers::preprocess(ds)?),
        ("GET", "/api/patterns") => Reply::json(200, &handlers::patterns(ds)),
        ("GET", "/api/insights") => Reply::json(200, &handlers::insights(ds)?),
        ("GET", "/api/limitations") => Reply::json(200, &handlers::limitations(ds)),
        ("GET", "/api/future_research") => Reply::json(200, &handlers::future_research()),
        ("GET", "/health") => Reply::text(200, "ok"),
        (_, p) if KNOWN_PATHS.contains(&p) => detail(405, "Method Not Allowed"),
        _ => detail(404, "Not Found"),
    };
    Ok(reply)
}

/// Handle one request end to end, CORS included.
pub fn dispatch(state: &AppState, req: &Incoming) -> Reply {
    let origin = req.header("Origin");

    if req.method == "OPTIONS" && req.header("Access-Control-Request-Method").is_some() {
        if let Some(origin) = origin {
            let requested = req.header("Access-Control-Request-Headers");
            return match cors::preflight(&state.cors, origin, requested) {
                Preflight::Allowed(headers) => Reply::text(200, "OK").with_headers(headers),
                Preflight::Denied(headers) => {
                    debug!(%origin, "preflight from disallowed origin");
                    Reply::text(400, "Disallowed CORS origin").with_headers(headers)
                }
            };
        }
    }

    let (path, query) = req.path_and_query();
    let mut reply = match route(state, &req.method, path, query, &req.body) {
        Ok(reply) => reply,
        Err(err) => {
            if err.is_internal() {
                error!(method = %req.method, path, error = %err, "request failed");
            } else {
                debug!(method = %req.method, path, error = %err, "rejected request");
            }
            from_error(&err)
        }
    };
    reply.headers.extend(cors::response_headers(&state.cors, origin));
    reply
}

/// Handle to the running analytics server.
pub struct ApiServer {
    http: HttpServer,
}

impl ApiServer {
    /// Bind and start serving on a background thread.
    pub fn start(config: &AnalyticsConfig, dataset: Arc<Dataset>) -> Result<Self, StartError> {
        info!(rows = dataset.n_rows(), "starting analytics server");
        let state = AppState {
            dataset,
            cors: config.cors.clone(),
        };
        let http = HttpServer::start("sa-api", &config.addr(), move |req: &Incoming| {
            dispatch(&state, req)
        })?;
        Ok(Self { http })
    }

    /// The bound address (useful with port 0).
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
