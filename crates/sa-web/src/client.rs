//! Blocking client for the analytics service.
//!
//! Each page view makes one call per endpoint, in a fixed order. A failed
//! call never aborts the page: it becomes [`Fetch::Unavailable`] and the
//! section renders a placeholder.

use std::time::Duration;

use sa_common::wire::{
    CorrelationResponse, FutureResearchResponse, InsightsResponse, LimitationsResponse,
    StatTestRequest, SummaryResponse, VisualizationResponse,
};
use sa_common::{PresentationConfig, Record};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::FetchError;

/// Result of one upstream call, as shown on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Loaded(T),
    Unavailable { endpoint: String, reason: String },
}

impl<T> Fetch<T> {
    /// Convert a call result, logging failures.
    pub fn from_result(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Fetch::Loaded(value),
            Err(err) => {
                warn!(endpoint = err.endpoint(), error = %err, "upstream call failed");
                Fetch::Unavailable {
                    endpoint: err.endpoint().to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Fetch::Loaded(value) => Some(value),
            Fetch::Unavailable { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Fetch::Loaded(_))
    }
}

/// Everything the page shows regardless of form input.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData {
    pub data: Fetch<Vec<Record>>,
    pub summary: Fetch<SummaryResponse>,
    pub future_research: Fetch<FutureResearchResponse>,
    pub limitations: Fetch<LimitationsResponse>,
    pub insights: Fetch<InsightsResponse>,
    pub patterns: Fetch<Vec<Record>>,
    pub correlation: Fetch<CorrelationResponse>,
    pub preprocess: Fetch<Vec<Record>>,
}

/// Analytics service client.
#[derive(Clone)]
pub struct UpstreamClient {
    agent: ureq::Agent,
    base_url: String,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl UpstreamClient {
    /// `timeout` bounds each whole call; `None` waits indefinitely.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            agent: builder.build(),
            base_url,
        }
    }

    pub fn from_config(config: &PresentationConfig) -> Self {
        Self::new(
            config.upstream_base_url.clone(),
            config.upstream_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn finish<T: DeserializeOwned>(
        endpoint: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, FetchError> {
        let response = result.map_err(|e| match e {
            ureq::Error::Status(status, _) => FetchError::Status {
                endpoint: endpoint.to_string(),
                status,
            },
            ureq::Error::Transport(t) => FetchError::Transport {
                endpoint: endpoint.to_string(),
                reason: t.to_string(),
            },
        })?;
        debug!(endpoint, status = response.status(), "upstream call");
        response.into_json::<T>().map_err(|e| FetchError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        Self::finish(endpoint, self.agent.get(&self.url(endpoint)).call())
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, FetchError> {
        let request = self.agent.post(&self.url(endpoint));
        let result = match body {
            Some(b) => request.send_json(b),
            None => request.call(),
        };
        Self::finish(endpoint, result)
    }

    pub fn data(&self) -> Result<Vec<Record>, FetchError> {
        self.get("/api/data")
    }

    pub fn summary(&self) -> Result<SummaryResponse, FetchError> {
        self.get("/api/summary")
    }

    pub fn future_research(&self) -> Result<FutureResearchResponse, FetchError> {
        self.get("/api/future_research")
    }

    pub fn limitations(&self) -> Result<LimitationsResponse, FetchError> {
        self.get("/api/limitations")
    }

    pub fn insights(&self) -> Result<InsightsResponse, FetchError> {
        self.get("/api/insights")
    }

    pub fn patterns(&self) -> Result<Vec<Record>, FetchError> {
        self.get("/api/patterns")
    }

    pub fn correlation(&self) -> Result<CorrelationResponse, FetchError> {
        self.get("/api/correlation")
    }

    pub fn preprocess(&self) -> Result<Vec<Record>, FetchError> {
        self.post::<(), _>("/api/preprocess", None)
    }

    /// Run a hypothesis test; the result map is passed through untouched.
    pub fn stat_test(&self, req: &StatTestRequest) -> Result<Map<String, Value>, FetchError> {
        self.post("/api/stat_tests", Some(req))
    }

    pub fn visualization(
        &self,
        kind: &str,
        var1: &str,
        var2: &str,
    ) -> Result<VisualizationResponse, FetchError> {
        let endpoint = "/api/visualization";
        let result = self
            .agent
            .get(&self.url(endpoint))
            .query("type", kind)
            .query("var1", var1)
            .query("var2", var2)
            .call();
        Self::finish(endpoint, result)
    }

    /// Fetch every page section, one call after another.
    pub fn fetch_page(&self) -> PageData {
        PageData {
            data: Fetch::from_result(self.data()),
            summary: Fetch::from_result(self.summary()),
            future_research: Fetch::from_result(self.future_research()),
            limitations: Fetch::from_result(self.limitations()),
            insights: Fetch::from_result(self.insights()),
            patterns: Fetch::from_result(self.patterns()),
            correlation: Fetch::from_result(self.correlation()),
            preprocess: Fetch::from_result(self.preprocess()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed() {
        let client = UpstreamClient::new("http://127.0.0.1:8000//", None);
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(client.url("/api/data"), "http://127.0.0.1:8000/api/data");
    }

    #[test]
    fn fetch_from_error_keeps_endpoint() {
        let f: Fetch<u8> = Fetch::from_result(Err(FetchError::Status {
            endpoint: "/api/summary".into(),
            status: 500,
        }));
        match f {
            Fetch::Unavailable { endpoint, reason } => {
                assert_eq!(endpoint, "/api/summary");
                assert!(reason.contains("500"));
            }
            Fetch::Loaded(_) => panic!("expected unavailable"),
        }
        assert!(Fetch::Loaded(1u8).is_loaded());
        assert_eq!(Fetch::Loaded(1u8).loaded(), Some(&1));
    }

    #[test]
    fn unreachable_upstream_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let client = UpstreamClient::new("http://127.0.0.1:9", Some(Duration::from_secs(2)));
        let err = client.data().unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(err.endpoint(), "/api/data");
    }
}
