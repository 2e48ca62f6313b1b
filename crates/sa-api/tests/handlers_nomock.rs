//! Handler behaviour against the survey fixture on disk.

use std::path::Path;

use base64::Engine as _;
use sa_api::handlers;
use sa_api::ApiError;
use sa_common::wire::StatTestRequest;
use sa_common::Dataset;
use serde_json::Value;

fn survey() -> Dataset {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/survey.csv");
    Dataset::from_path(&path).unwrap()
}

fn req(test_type: &str, vars: &[&str]) -> StatTestRequest {
    StatTestRequest {
        test_type: test_type.to_string(),
        variables: vars.iter().map(|v| v.to_string()).collect(),
    }
}

fn is_png(b64: &str) -> bool {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .unwrap();
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).is_ok()
}

#[test]
fn data_returns_every_row() {
    let ds = survey();
    let rows = handlers::data(&ds);
    assert_eq!(rows.len(), 16);
    assert_eq!(rows[0]["GAME"], Value::from("Skyrim"));
    assert_eq!(rows[3]["Platform"], Value::from("Console (PS, Xbox, ...)"));
    assert_eq!(rows[5]["earnings"], Value::Null);
}

#[test]
fn summary_is_deterministic_and_typed() {
    let ds = survey();
    let a = serde_json::to_vec(&handlers::summary(&ds).unwrap()).unwrap();
    let b = serde_json::to_vec(&handlers::summary(&ds).unwrap()).unwrap();
    assert_eq!(a, b);

    let s = handlers::summary(&ds).unwrap();
    // numeric columns only for moments
    assert!(s.mean.contains_key("Hours"));
    assert!(!s.mean.contains_key("GAME"));
    // mode covers every column
    assert_eq!(s.mode["GAME"], Value::from("League of Legends"));
    assert_eq!(s.mode["Platform"], Value::from("PC"));
    assert_eq!(s.mode["earnings"], Value::from(0.0));

    let age_mean = s.mean["Age"].as_f64().unwrap();
    assert!((age_mean - 25.625).abs() < 1e-9);
    let var = s.variance["Age"].as_f64().unwrap();
    let sd = s.std_dev["Age"].as_f64().unwrap();
    assert!((sd * sd - var).abs() < 1e-9);
}

#[test]
fn every_chart_kind_yields_png() {
    let ds = survey();
    let cases = [
        ("histogram", "Hours", None),
        ("histogram", "Platform", None),
        ("bar", "Gender", None),
        ("bar", "Age", None),
        ("scatter", "Hours", Some("earnings")),
        ("scatter", "Platform", Some("Age")),
    ];
    for (kind, v1, v2) in cases {
        let out = handlers::visualization(&ds, Some(kind), Some(v1), v2).unwrap();
        assert!(!out.image.is_empty());
        assert!(is_png(&out.image), "{} {} did not render", kind, v1);
    }
}

#[test]
fn invalid_charts_are_bad_requests() {
    let ds = survey();
    let err = handlers::visualization(&ds, Some("pie"), Some("Hours"), None).unwrap_err();
    assert_eq!(err.status(), 400);
    let err = handlers::visualization(&ds, Some("scatter"), Some("Hours"), None).unwrap_err();
    assert_eq!(err.status(), 400);
    let err = handlers::visualization(&ds, Some("histogram"), Some("Nope"), None).unwrap_err();
    assert_eq!(err.status(), 500);
}

#[test]
fn chi_square_arity() {
    let ds = survey();
    let out = handlers::stat_tests(&ds, &req("chi-square", &["Platform", "Gender"])).unwrap();
    assert!(out.statistic.is_finite() && out.statistic >= 0.0);
    assert!(out.p_value.is_finite() && (0.0..=1.0).contains(&out.p_value));

    for vars in [&["Platform"][..], &["Platform", "Gender", "GAME"][..]] {
        let err = handlers::stat_tests(&ds, &req("chi-square", vars)).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}

#[test]
fn t_test_p_value_is_probability() {
    let ds = survey();
    let out = handlers::stat_tests(&ds, &req("t-test", &["Hours", "Age"])).unwrap();
    assert!((0.0..=1.0).contains(&out.p_value));
    let json = serde_json::to_value(out).unwrap();
    assert!(json.get("t_statistic").is_some());

    let err = handlers::stat_tests(&ds, &req("t-test", &["Hours", "GAME"])).unwrap_err();
    assert_eq!(err.status(), 500);
}

#[test]
fn anova_needs_three_groups() {
    let ds = survey();
    let err = handlers::stat_tests(&ds, &req("anova", &["GAD_T", "SWL_T"])).unwrap_err();
    assert_eq!(err.status(), 400);

    let out = handlers::stat_tests(&ds, &req("anova", &["GAD_T", "SWL_T", "Narcissism"])).unwrap();
    let json = serde_json::to_value(out).unwrap();
    assert!(json["f_statistic"].as_f64().unwrap() > 0.0);
    assert!(json["p_value"].as_f64().is_some());

    let err = handlers::stat_tests(&ds, &req("z-test", &["GAD_T", "SWL_T"])).unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn preprocess_standardizes_complete_rows() {
    let ds = survey();
    let rows = handlers::preprocess(&ds).unwrap();
    assert_eq!(rows.len(), 13);
    for row in &rows {
        assert!(row.values().all(|v| !v.is_null()));
    }
    for col in ["Hours", "earnings", "Age", "GAD_T", "SWL_T", "Narcissism"] {
        let values: Vec<f64> = rows.iter().map(|r| r[col].as_f64().unwrap()).collect();
        let mean = sa_math::mean(&values);
        let sd = sa_math::std_dev(&values);
        assert!(mean.abs() < 1e-9, "{} mean {}", col, mean);
        assert!((sd - 1.0).abs() < 1e-9, "{} sd {}", col, sd);
    }
    // source dataset is untouched
    assert_eq!(ds.n_rows(), 16);
}

#[test]
fn patterns_use_raw_threshold() {
    let ds = survey();
    let rows = handlers::patterns(&ds);
    // every respondent's age exceeds 3
    assert_eq!(rows.len(), 16);

    let small = Dataset::from_reader("a,b,t\n1,2,x\n-4,0,y\n3,3,z\n".as_bytes()).unwrap();
    let rows = handlers::patterns(&small);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["t"], Value::from("y"));
}

#[test]
fn insights_rank_descending() {
    let ds = survey();
    let out = handlers::insights(&ds).unwrap();
    let earnings: Vec<f64> = out
        .top_earners
        .iter()
        .map(|r| r["earnings"].as_f64().unwrap())
        .collect();
    assert_eq!(earnings, vec![1200.0, 800.0, 300.0, 150.0, 50.0]);
    let hours: Vec<f64> = out.most_hours.iter().map(|r| r["Hours"].as_f64().unwrap()).collect();
    assert_eq!(hours, vec![50.0, 45.0, 40.0, 35.0, 30.0]);

    let no_earnings = Dataset::from_reader("Hours\n1\n".as_bytes()).unwrap();
    assert_eq!(handlers::insights(&no_earnings).unwrap_err().status(), 500);
}

#[test]
fn limitations_count_nulls() {
    let ds = survey();
    let lim = handlers::limitations(&ds);
    assert_eq!(lim.data_completeness["Hours"], Value::from(1));
    assert_eq!(lim.data_completeness["earnings"], Value::from(1));
    assert_eq!(lim.data_completeness["Gender"], Value::from(1));
    assert_eq!(lim.data_completeness["GAME"], Value::from(0));
    let keys: Vec<&String> = lim.data_completeness.keys().collect();
    assert_eq!(keys.first().map(|k| k.as_str()), Some("GAME"));
}

#[test]
fn correlation_is_column_oriented_dump() {
    let ds = survey();
    let out = handlers::correlation(&ds);
    assert_eq!(out.correlation_matrix.len(), 10);
    assert_eq!(out.correlation_matrix["Age"]["15"], Value::from(35));
}
