//! JSON bodies exchanged between the analytics and presentation services.
//!
//! Both sides use the same structs: the analytics service serializes them,
//! the presentation service deserializes them. Column-keyed maps are
//! `serde_json::Map`, which keeps insertion (column) order.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One table row: column name → value, in column order.
pub type Record = Map<String, Value>;

/// Column name → statistic.
pub type ColumnStats = Map<String, Value>;

/// JSON number, or `null` for NaN and infinities.
pub fn number_or_null(value: f64) -> Value {
    Value::from(value)
}

/// Descriptive statistics per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub mean: ColumnStats,
    pub median: ColumnStats,
    pub mode: ColumnStats,
    pub variance: ColumnStats,
    pub std_dev: ColumnStats,
}

/// A rendered chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationResponse {
    /// Base64-encoded PNG.
    pub image: String,
}

/// Column-oriented dump of the dataset (`{column: {row_index: value}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResponse {
    pub correlation_matrix: Map<String, Value>,
}

/// Hypothesis test request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTestRequest {
    pub test_type: String,
    pub variables: Vec<String>,
}

/// Supported hypothesis tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    /// Chi-square test of independence on a contingency table.
    ChiSquare,
    /// Independent two-sample t-test, pooled variance.
    TTest,
    /// One-way analysis of variance.
    Anova,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::ChiSquare => "chi-square",
            TestKind::TTest => "t-test",
            TestKind::Anova => "anova",
        }
    }

    /// Response field holding the test statistic.
    pub fn statistic_field(&self) -> &'static str {
        match self {
            TestKind::ChiSquare => "chi2_statistic",
            TestKind::TTest => "t_statistic",
            TestKind::Anova => "f_statistic",
        }
    }

    /// Whether `n` variables is a valid arity for this test.
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            TestKind::ChiSquare | TestKind::TTest => n == 2,
            TestKind::Anova => n > 2,
        }
    }
}

impl std::str::FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chi-square" => Ok(TestKind::ChiSquare),
            "t-test" => Ok(TestKind::TTest),
            "anova" => Ok(TestKind::Anova),
            _ => Err(format!("unknown test type: {}", s)),
        }
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hypothesis test result, serialized as `{<kind>_statistic, p_value}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatTestResponse {
    pub kind: TestKind,
    pub statistic: f64,
    pub p_value: f64,
}

impl Serialize for StatTestResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.kind.statistic_field(), &number_or_null(self.statistic))?;
        map.serialize_entry("p_value", &number_or_null(self.p_value))?;
        map.end()
    }
}

/// Top rows by earnings and by hours played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub top_earners: Vec<Record>,
    pub most_hours: Vec<Record>,
}

/// Null counts and fixed caveats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitationsResponse {
    /// Column → number of nulls.
    pub data_completeness: Map<String, Value>,
    pub scope_of_conclusions: String,
    pub future_research: String,
}

/// Fixed follow-up research suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureResearchResponse {
    pub new_research_questions: Vec<String>,
    pub areas_for_deeper_investigation: Vec<String>,
}

/// Error body: `{"detail": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_and_arity() {
        assert_eq!("chi-square".parse::<TestKind>().unwrap(), TestKind::ChiSquare);
        assert_eq!("t-test".parse::<TestKind>().unwrap(), TestKind::TTest);
        assert_eq!("anova".parse::<TestKind>().unwrap(), TestKind::Anova);
        assert!("ANOVA".parse::<TestKind>().is_err());
        assert!("z-test".parse::<TestKind>().is_err());

        assert!(TestKind::ChiSquare.accepts(2));
        assert!(!TestKind::ChiSquare.accepts(3));
        assert!(!TestKind::TTest.accepts(1));
        assert!(!TestKind::Anova.accepts(2));
        assert!(TestKind::Anova.accepts(3));
    }

    #[test]
    fn stat_response_uses_kind_specific_field() {
        let resp = StatTestResponse {
            kind: TestKind::Anova,
            statistic: 12.0,
            p_value: 0.008,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"f_statistic":12.0,"p_value":0.008}"#);
    }

    #[test]
    fn non_finite_statistic_is_null() {
        let resp = StatTestResponse {
            kind: TestKind::TTest,
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(value["t_statistic"], Value::Null);
        assert_eq!(value["p_value"], Value::Null);
    }

    #[test]
    fn stat_request_round_trips_through_json() {
        let req: StatTestRequest =
            serde_json::from_str(r#"{"test_type":"anova","variables":["a","b","c"]}"#).unwrap();
        assert_eq!(req.variables.len(), 3);
        assert!(serde_json::from_str::<StatTestRequest>(r#"{"test_type":"anova"}"#).is_err());
    }
}
