//! Form input of the index page.

use sa_common::wire::StatTestRequest;

pub const STATISTICAL_TEST_TYPE: &str = "statistical-test-type";
pub const STATISTICAL_VAR: &str = "statistical-var";
pub const VISUALIZATION_TYPE: &str = "test-type";
pub const VAR1: &str = "var1";
pub const VAR2: &str = "var2";

/// Decoded form fields from query string and urlencoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    query: Vec<(String, String)>,
    body: Vec<(String, String)>,
}

fn decode(raw: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

impl FormValues {
    pub fn parse(query: &str, body: &[u8]) -> Self {
        Self {
            query: decode(query.as_bytes()),
            body: decode(body),
        }
    }

    /// First value for `key`, query before body.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .chain(self.body.iter())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Hypothesis test request, if the test type field is filled in.
    pub fn statistical(&self) -> Option<StatTestRequest> {
        let test_type = self.non_empty(STATISTICAL_TEST_TYPE)?;
        Some(StatTestRequest {
            test_type: test_type.to_string(),
            variables: split_variables(self.get(STATISTICAL_VAR).unwrap_or("")),
        })
    }

    /// Chart request, if the chart type field is filled in.
    pub fn visualization(&self) -> Option<VisualizationForm> {
        let kind = self.non_empty(VISUALIZATION_TYPE)?;
        Some(VisualizationForm {
            kind: kind.to_string(),
            var1: self.get(VAR1).unwrap_or("").to_string(),
            var2: self.get(VAR2).unwrap_or("").to_string(),
        })
    }
}

/// Chart fields as submitted; empty strings mean "not given".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationForm {
    pub kind: String,
    pub var1: String,
    pub var2: String,
}

/// Comma-separated variable list, trimmed, empties dropped.
pub fn split_variables(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
