//! Endpoint logic.
//!
//! Every handler is a plain function of the immutable [`Dataset`]; the HTTP
//! layer in [`crate::server`] only parses requests and serializes results.

use sa_common::dataset::cmp_cells;
use sa_common::wire::{
    number_or_null, ColumnStats, CorrelationResponse, FutureResearchResponse, InsightsResponse,
    LimitationsResponse, StatTestRequest, StatTestResponse, SummaryResponse,
    VisualizationResponse,
};
use sa_common::{Cell, Column, Dataset, Record, TestKind};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::chart::{self, Chart};
use crate::error::{ApiError, Result};

pub const INVALID_VISUALIZATION: &str = "Invalid visualization type or variables";
pub const INVALID_TEST: &str = "Invalid test type or variables";

const SCOPE_OF_CONCLUSIONS: &str = "The dataset is limited to the responses collected and may not be representative of the entire population.";
const FURTHER_STUDIES: &str =
    "Further studies could expand the sample size and explore additional variables.";

const NEW_RESEARCH_QUESTIONS: [&str; 2] = [
    "How do gaming habits vary across different age groups?",
    "What are the long-term effects of gaming on mental health?",
];
const DEEPER_INVESTIGATION: [&str; 2] = [
    "Investigate the correlation between gaming and academic performance.",
    "Explore the impact of gaming on social skills development.",
];

/// Column ranked by `insights().top_earners`.
pub const EARNINGS_COLUMN: &str = "earnings";
/// Column ranked by `insights().most_hours`.
pub const HOURS_COLUMN: &str = "Hours";
const TOP_N: usize = 5;

/// Threshold on raw numeric values for `patterns()`.
const OUTLIER_ABS: f64 = 3.0;

/// `GET /api/data`
pub fn data(ds: &Dataset) -> Vec<Record> {
    ds.records()
}

/// `GET /api/summary`
pub fn summary(ds: &Dataset) -> Result<SummaryResponse> {
    let mut mean = ColumnStats::new();
    let mut median = ColumnStats::new();
    let mut variance = ColumnStats::new();
    let mut std_dev = ColumnStats::new();

    for column in ds.numeric_columns() {
        let values = column.numeric_values()?;
        let name = column.name().to_string();
        mean.insert(name.clone(), number_or_null(sa_math::mean(&values)));
        median.insert(name.clone(), number_or_null(sa_math::median(&values)));
        variance.insert(name.clone(), number_or_null(sa_math::variance(&values)));
        std_dev.insert(name, number_or_null(sa_math::std_dev(&values)));
    }

    let mode = ds
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.mode().to_json()))
        .collect();

    Ok(SummaryResponse {
        mean,
        median,
        mode,
        variance,
        std_dev,
    })
}

/// Chart kinds offered by `/api/visualization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Histogram,
    Bar,
    Scatter,
}

impl std::str::FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "histogram" => Ok(ChartKind::Histogram),
            "bar" => Ok(ChartKind::Bar),
            "scatter" => Ok(ChartKind::Scatter),
            _ => Err(format!("unknown chart type: {}", s)),
        }
    }
}

/// `GET /api/visualization?type=&var1=&var2=`
///
/// Empty strings count as missing.
pub fn visualization(
    ds: &Dataset,
    kind: Option<&str>,
    var1: Option<&str>,
    var2: Option<&str>,
) -> Result<VisualizationResponse> {
    let kind = present(kind).and_then(|k| k.parse::<ChartKind>().ok());
    let var1 = present(var1);
    let var2 = present(var2);

    let chart = match (kind, var1, var2) {
        (Some(ChartKind::Histogram), Some(v1), _) => histogram_chart(ds.column(v1)?)?,
        (Some(ChartKind::Bar), Some(v1), _) => Chart::Bars(category_counts(ds.column(v1)?)),
        (Some(ChartKind::Scatter), Some(v1), Some(v2)) => {
            scatter_chart(ds.column(v1)?, ds.column(v2)?)
        }
        _ => return Err(ApiError::BadRequest(INVALID_VISUALIZATION.into())),
    };

    let image = chart::render_base64(&chart)?;
    Ok(VisualizationResponse { image })
}

fn histogram_chart(column: &Column) -> Result<Chart> {
    if column.is_numeric() {
        Ok(Chart::histogram(&column.numeric_values()?))
    } else {
        Ok(Chart::Bars(category_counts(column)))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

enum Lookup<'a> {
    /// `values` is sorted by [`cmp_cells`].
    Sorted,
    Text(HashMap<&'a str, usize>),
}

/// Distinct non-null values of a column with their positions.
struct Categories<'a> {
    values: Vec<&'a Cell>,
    lookup: Lookup<'a>,
}

impl<'a> Categories<'a> {
    /// First-appearance order for text, ascending for numbers.
    fn of(column: &'a Column) -> Self {
        if column.is_numeric() {
            Self::sorted(column.cells())
        } else {
            Self::first_seen(column.cells())
        }
    }

    fn sorted(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut values: Vec<&Cell> = cells.into_iter().filter(|c| !c.is_null()).collect();
        values.sort_by(|a, b| cmp_cells(a, b));
        values.dedup_by(|a, b| cmp_cells(a, b) == Ordering::Equal);
        Self {
            values,
            lookup: Lookup::Sorted,
        }
    }

    /// Text cells only; anything else is skipped.
    fn first_seen(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut values = Vec::new();
        let mut index = HashMap::new();
        for cell in cells {
            if let Cell::Text(s) = cell {
                index.entry(s.as_str()).or_insert_with(|| {
                    values.push(cell);
                    values.len() - 1
                });
            }
        }
        Self {
            values,
            lookup: Lookup::Text(index),
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn index(&self, cell: &Cell) -> Option<usize> {
        if cell.is_null() {
            return None;
        }
        match &self.lookup {
            Lookup::Sorted => self
                .values
                .binary_search_by(|c| cmp_cells(c, cell))
                .ok(),
            Lookup::Text(index) => match cell {
                Cell::Text(s) => index.get(s.as_str()).copied(),
                _ => None,
            },
        }
    }
}

fn category_counts(column: &Column) -> Vec<f64> {
    let cats = Categories::of(column);
    let mut counts = vec![0.0; cats.len()];
    for cell in column.cells() {
        if let Some(i) = cats.index(cell) {
            counts[i] += 1.0;
        }
    }
    counts
}

/// Numeric position of each cell; text maps to its category index.
fn positions(column: &Column) -> Vec<Option<f64>> {
    if column.is_numeric() {
        return column.cells().iter().map(Cell::as_f64).collect();
    }
    let cats = Categories::first_seen(column.cells());
    column
        .cells()
        .iter()
        .map(|cell| cats.index(cell).map(|i| i as f64))
        .collect()
}

fn scatter_chart(x: &Column, y: &Column) -> Chart {
    let points = positions(x)
        .into_iter()
        .zip(positions(y))
        .filter_map(|(a, b)| Some((a?, b?)))
        .collect();
    Chart::Scatter(points)
}

/// `GET /api/correlation`: the raw dataset in column orientation.
pub fn correlation(ds: &Dataset) -> CorrelationResponse {
    CorrelationResponse {
        correlation_matrix: ds.to_column_map(),
    }
}

/// `POST /api/stat_tests`
pub fn stat_tests(ds: &Dataset, req: &StatTestRequest) -> Result<StatTestResponse> {
    let kind = req
        .test_type
        .parse::<TestKind>()
        .ok()
        .filter(|k| k.accepts(req.variables.len()))
        .ok_or_else(|| ApiError::BadRequest(INVALID_TEST.into()))?;

    let columns = req
        .variables
        .iter()
        .map(|v| ds.column(v))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let outcome = match kind {
        TestKind::ChiSquare => {
            let table = contingency_table(columns[0], columns[1]);
            sa_math::chi2_contingency(&table)?
        }
        TestKind::TTest => {
            let a = columns[0].numeric_values()?;
            let b = columns[1].numeric_values()?;
            sa_math::ttest_ind(&a, &b)
        }
        TestKind::Anova => {
            let groups = columns
                .iter()
                .map(|c| c.numeric_values())
                .collect::<std::result::Result<Vec<_>, _>>()?;
            sa_math::f_oneway(&groups)?
        }
    };

    Ok(StatTestResponse {
        kind,
        statistic: outcome.statistic,
        p_value: outcome.p_value,
    })
}

/// Cross-tabulation over rows where both cells are present; row and
/// column categories in ascending order.
pub fn contingency_table(a: &Column, b: &Column) -> Vec<Vec<f64>> {
    let pairs: Vec<(&Cell, &Cell)> = a
        .cells()
        .iter()
        .zip(b.cells())
        .filter(|(x, y)| !x.is_null() && !y.is_null())
        .collect();

    let rows = Categories::sorted(pairs.iter().map(|p| p.0));
    let cols = Categories::sorted(pairs.iter().map(|p| p.1));

    let mut table = vec![vec![0.0; cols.len()]; rows.len()];
    for (x, y) in pairs {
        let (Some(i), Some(j)) = (rows.index(x), cols.index(y)) else {
            continue;
        };
        table[i][j] += 1.0;
    }
    table
}

/// `POST /api/preprocess`
///
/// Drops rows with any null, then standardizes numeric columns with the
/// sample standard deviation. Columns without spread become null.
pub fn preprocess(ds: &Dataset) -> Result<Vec<Record>> {
    let clean = ds.drop_null_rows();
    let columns = clean
        .columns()
        .iter()
        .map(|column| -> Result<Column> {
            if !column.is_numeric() {
                return Ok(column.clone());
            }
            let values = column.numeric_values()?;
            let mu = sa_math::mean(&values);
            let sd = sa_math::std_dev(&values);
            let cells = values
                .iter()
                .map(|v| {
                    if sd > 0.0 {
                        Cell::from_f64((v - mu) / sd)
                    } else {
                        Cell::Null
                    }
                })
                .collect();
            Ok(Column::new(column.name(), cells))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Dataset::from_columns(columns)?.records())
}

/// `GET /api/patterns`: rows with any numeric |value| above the threshold.
pub fn patterns(ds: &Dataset) -> Vec<Record> {
    let numeric: Vec<&Column> = ds.numeric_columns().collect();
    let rows = ds.rows_where(|r| {
        numeric
            .iter()
            .any(|c| c.cells()[r].as_f64().is_some_and(|v| v.abs() > OUTLIER_ABS))
    });
    ds.records_at(&rows)
}

/// `GET /api/insights`
pub fn insights(ds: &Dataset) -> Result<InsightsResponse> {
    let top_earners = ds.records_at(&ds.nlargest(EARNINGS_COLUMN, TOP_N)?);
    let most_hours = ds.records_at(&ds.nlargest(HOURS_COLUMN, TOP_N)?);
    Ok(InsightsResponse {
        top_earners,
        most_hours,
    })
}

/// `GET /api/limitations`
pub fn limitations(ds: &Dataset) -> LimitationsResponse {
    let data_completeness: Map<String, Value> = ds
        .null_counts()
        .into_iter()
        .map(|(name, n)| (name.to_string(), Value::from(n as u64)))
        .collect();
    LimitationsResponse {
        data_completeness,
        scope_of_conclusions: SCOPE_OF_CONCLUSIONS.to_string(),
        future_research: FURTHER_STUDIES.to_string(),
    }
}

/// `GET /api/future_research`
pub fn future_research() -> FutureResearchResponse {
    FutureResearchResponse {
        new_research_questions: NEW_RESEARCH_QUESTIONS.iter().map(|s| s.to_string()).collect(),
        areas_for_deeper_investigation: DEEPER_INVESTIGATION
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}
