//! The analytics server over real sockets.

use std::path::Path;
use std::sync::Arc;

use sa_api::ApiServer;
use sa_common::{AnalyticsConfig, Dataset};
use serde_json::{json, Value};

fn start() -> ApiServer {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/survey.csv");
    let dataset = Arc::new(Dataset::from_path(&path).unwrap());
    let config = AnalyticsConfig::default().with_port(0);
    ApiServer::start(&config, dataset).unwrap()
}

fn url(server: &ApiServer, path: &str) -> String {
    format!("http://{}{}", server.addr(), path)
}

fn status_of(result: Result<ureq::Response, ureq::Error>) -> (u16, String) {
    match result {
        Ok(resp) => (resp.status(), resp.into_string().unwrap()),
        Err(ureq::Error::Status(code, resp)) => (code, resp.into_string().unwrap()),
        Err(e) => panic!("transport error: {}", e),
    }
}

#[test]
fn health_and_data() {
    let server = start();
    let (status, body) = status_of(ureq::get(&url(&server, "/health")).call());
    assert_eq!((status, body.as_str()), (200, "ok"));

    let rows: Vec<Value> = ureq::get(&url(&server, "/api/data"))
        .call()
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(rows.len(), 16);
    server.shutdown();
}

#[test]
fn visualization_over_http() {
    let server = start();
    let resp: Value = ureq::get(&url(&server, "/api/visualization"))
        .query("type", "scatter")
        .query("var1", "Hours")
        .query("var2", "Age")
        .call()
        .unwrap()
        .into_json()
        .unwrap();
    assert!(resp["image"].as_str().is_some_and(|s| !s.is_empty()));

    let (status, body) = status_of(
        ureq::get(&url(&server, "/api/visualization?type=scatter&var1=Hours")).call(),
    );
    assert_eq!(status, 400);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"detail": "Invalid visualization type or variables"}));
}

#[test]
fn stat_tests_over_http() {
    let server = start();
    let resp: Value = ureq::post(&url(&server, "/api/stat_tests"))
        .send_json(json!({"test_type": "chi-square", "variables": ["Platform", "Gender"]}))
        .unwrap()
        .into_json()
        .unwrap();
    assert!(resp["chi2_statistic"].is_number());
    assert!(resp["p_value"].is_number());

    let (status, body) = status_of(
        ureq::post(&url(&server, "/api/stat_tests"))
            .send_json(json!({"test_type": "anova", "variables": ["GAD_T", "SWL_T"]})),
    );
    assert_eq!(status, 400);
    assert!(body.contains("Invalid test type or variables"));

    let (status, _) = status_of(
        ureq::post(&url(&server, "/api/stat_tests"))
            .set("Content-Type", "application/json")
            .send_string("{\"test_type\": 1"),
    );
    assert_eq!(status, 422);
}

#[test]
fn preprocess_is_post_only() {
    let server = start();
    let (status, _) = status_of(ureq::get(&url(&server, "/api/preprocess")).call());
    assert_eq!(status, 405);

    let rows: Vec<Value> = ureq::post(&url(&server, "/api/preprocess"))
        .call()
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(rows.len(), 13);
}

#[test]
fn cors_for_presentation_origin() {
    let server = start();
    let resp = ureq::get(&url(&server, "/api/limitations"))
        .set("Origin", "http://127.0.0.1:7000")
        .call()
        .unwrap();
    assert_eq!(
        resp.header("Access-Control-Allow-Origin"),
        Some("http://127.0.0.1:7000")
    );
    assert_eq!(resp.header("Access-Control-Allow-Credentials"), Some("true"));

    let resp = ureq::get(&url(&server, "/api/limitations"))
        .set("Origin", "http://elsewhere.example")
        .call()
        .unwrap();
    assert_eq!(resp.header("Access-Control-Allow-Origin"), None);

    let (status, body) = status_of(
        ureq::request("OPTIONS", &url(&server, "/api/data"))
            .set("Origin", "http://elsewhere.example")
            .set("Access-Control-Request-Method", "GET")
            .call(),
    );
    assert_eq!((status, body.as_str()), (400, "Disallowed CORS origin"));
}

#[test]
fn unknown_route_is_404() {
    let server = start();
    let (status, body) = status_of(ureq::get(&url(&server, "/api/nothing")).call());
    assert_eq!(status, 404);
    assert_eq!(body, r#"{"detail":"Not Found"}"#);
}
