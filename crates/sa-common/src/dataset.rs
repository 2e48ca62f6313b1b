//! The in-memory survey table.
//!
//! A [`Dataset`] is loaded once from CSV and never mutated; every derived
//! view (null-free copy, row subsets, standardized columns) is a new value.
//! Column types are inferred on load:
//!
//! - **integer**: every cell parses as `i64` and none is null
//! - **float**: every non-null cell parses as a number, or the column is
//!   entirely null (integer columns with gaps land here too)
//! - **text**: anything else

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{DatasetError, Result};
use crate::wire::Record;

/// Cell contents treated as missing.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Float cell, with NaN folded into [`Cell::Null`].
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Cell::Null
        } else {
            Cell::Float(value)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell; `None` for nulls and text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Null | Cell::Text(_) => None,
        }
    }

    /// JSON value; non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Int(v) => Value::from(*v),
            Cell::Float(v) => Value::from(*v),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }

    /// Label used when the value is a category (contingency tables, bar
    /// charts).
    pub fn label(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    fn parse(raw: &str) -> Self {
        if NULL_TOKENS.contains(&raw.trim()) {
            return Cell::Null;
        }
        let trimmed = raw.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Cell::Int(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return Cell::from_f64(v);
        }
        Cell::Text(raw.to_string())
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_unit(),
            Cell::Int(v) => serializer.serialize_i64(*v),
            Cell::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Cell::Float(_) => serializer.serialize_unit(),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Total order within one column: numbers numerically, text lexically.
/// `-0.0` and `0.0` compare equal.
pub fn cmp_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        (Cell::Text(_), _) => Ordering::Greater,
        (_, Cell::Text(_)) => Ordering::Less,
        (Cell::Null, Cell::Null) => Ordering::Equal,
        (Cell::Null, _) => Ordering::Greater,
        (_, Cell::Null) => Ordering::Less,
        _ => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            if x == y {
                Ordering::Equal
            } else {
                x.total_cmp(&y)
            }
        }
    }
}

/// Inferred storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnKind::Text)
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Integer => write!(f, "integer"),
            ColumnKind::Float => write!(f, "float"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    /// Build a column, inferring its kind from the cells.
    ///
    /// Integer cells are widened to floats when the column also holds floats
    /// or nulls; numbers mixed with text are kept as their text labels.
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let has_text = cells.iter().any(|c| matches!(c, Cell::Text(_)));
        let all_int = !cells.is_empty() && cells.iter().all(|c| matches!(c, Cell::Int(_)));

        let (kind, cells) = if has_text {
            let cells = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Int(_) | Cell::Float(_) => Cell::Text(c.label()),
                    other => other,
                })
                .collect();
            (ColumnKind::Text, cells)
        } else if all_int {
            (ColumnKind::Integer, cells)
        } else {
            let cells = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Int(v) => Cell::Float(v as f64),
                    other => other,
                })
                .collect();
            (ColumnKind::Float, cells)
        };

        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    fn from_raw(name: String, raw: &[String]) -> Self {
        let parsed: Vec<Cell> = raw.iter().map(|s| Cell::parse(s)).collect();
        let has_text = parsed.iter().any(|c| matches!(c, Cell::Text(_)));
        if has_text {
            // Keep the original spelling of numeric-looking values in text columns.
            let cells = raw
                .iter()
                .zip(parsed)
                .map(|(s, c)| if c.is_null() { Cell::Null } else { Cell::Text(s.clone()) })
                .collect();
            return Self {
                name,
                kind: ColumnKind::Text,
                cells,
            };
        }
        Self::new(name, parsed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }

    pub fn null_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_null()).count()
    }

    /// Non-null values of a numeric column.
    pub fn numeric_values(&self) -> Result<Vec<f64>> {
        if !self.is_numeric() {
            return Err(DatasetError::NotNumeric(self.name.clone()));
        }
        Ok(self.cells.iter().filter_map(Cell::as_f64).collect())
    }

    /// Most frequent non-null value; the smallest one when several tie.
    /// [`Cell::Null`] when the column has no values.
    pub fn mode(&self) -> Cell {
        let mut values: Vec<&Cell> = self.cells.iter().filter(|c| !c.is_null()).collect();
        values.sort_by(|a, b| cmp_cells(a, b));

        let mut best: Option<(&Cell, usize)> = None;
        let mut i = 0;
        while i < values.len() {
            let mut j = i + 1;
            while j < values.len() && cmp_cells(values[i], values[j]) == Ordering::Equal {
                j += 1;
            }
            let run = j - i;
            if best.map_or(true, |(_, n)| run > n) {
                best = Some((values[i], run));
            }
            i = j;
        }
        best.map_or(Cell::Null, |(c, _)| c.clone())
    }

    fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            cells: rows.iter().map(|&r| self.cells[r].clone()).collect(),
        }
    }
}

/// Immutable table of equally long named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Load a CSV file with a header row.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            columns = dataset.n_cols(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV text with a header row.
    ///
    /// Short rows are padded with nulls; rows wider than the header are an
    /// error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = mangle_headers(rdr.headers()?);
        let width = headers.len();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); width];
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            if record.len() > width {
                return Err(DatasetError::RowWidth {
                    row: i + 1,
                    expected: width,
                    found: record.len(),
                });
            }
            for (col, store) in raw.iter_mut().enumerate() {
                store.push(record.get(col).unwrap_or("").to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw.iter())
            .map(|(name, values)| Column::from_raw(name, values))
            .collect();
        Self::from_columns(columns)
    }

    /// Assemble a dataset from prepared columns of equal length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, Column::len);
        for column in &columns {
            if column.len() != rows {
                return Err(DatasetError::ColumnLength {
                    name: column.name.clone(),
                    expected: rows,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Look a column up by exact name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    /// One row as a column-ordered JSON object.
    pub fn record(&self, row: usize) -> Record {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.cells[row].to_json()))
            .collect()
    }

    /// Every row, in order.
    pub fn records(&self) -> Vec<Record> {
        (0..self.rows).map(|r| self.record(r)).collect()
    }

    /// The given rows, in the order given.
    pub fn records_at(&self, rows: &[usize]) -> Vec<Record> {
        rows.iter().map(|&r| self.record(r)).collect()
    }

    /// Column-oriented dump: `{column: {row_index: value}}`.
    pub fn to_column_map(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|c| {
                let by_index: Map<String, Value> = c
                    .cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| (i.to_string(), cell.to_json()))
                    .collect();
                (c.name.clone(), Value::Object(by_index))
            })
            .collect()
    }

    /// New dataset with only the given rows; column kinds are kept.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        }
    }

    /// Rows where `predicate` holds for the row index.
    pub fn rows_where(&self, predicate: impl Fn(usize) -> bool) -> Vec<usize> {
        (0..self.rows).filter(|&r| predicate(r)).collect()
    }

    /// Copy without any row that holds a null.
    pub fn drop_null_rows(&self) -> Dataset {
        let keep = self.rows_where(|r| self.columns.iter().all(|c| !c.cells[r].is_null()));
        self.take_rows(&keep)
    }

    /// Null count per column, in column order.
    pub fn null_counts(&self) -> Vec<(&str, usize)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.null_count()))
            .collect()
    }

    /// Indices of the `n` rows with the largest values in `column`,
    /// descending. Nulls are skipped and ties keep the earlier row first.
    pub fn nlargest(&self, column: &str, n: usize) -> Result<Vec<usize>> {
        let col = self.column(column)?;
        if !col.is_numeric() {
            return Err(DatasetError::NotNumeric(column.to_string()));
        }
        let mut ranked: Vec<(usize, f64)> = col
            .cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_f64().map(|v| (i, v)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked.into_iter().take(n).map(|(i, _)| i).collect())
    }
}

/// Blank headers become `Unnamed: <i>`, repeats get `.1`, `.2`, ...
fn mangle_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
name,age,score,team
ann,31,4.5,red
bob,25,,blue
cid,40,7.25,red
dee,25,1.0,NA
";

    fn sample() -> Dataset {
        Dataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn signed_zero_compares_equal() {
        assert_eq!(cmp_cells(&Cell::Float(-0.0), &Cell::Float(0.0)), Ordering::Equal);
        assert_eq!(cmp_cells(&Cell::Int(0), &Cell::Float(-0.0)), Ordering::Equal);
        assert_eq!(cmp_cells(&Cell::Float(-0.0), &Cell::Float(1.5)), Ordering::Less);
        assert_eq!(cmp_cells(&Cell::Float(-1.0), &Cell::Float(-0.0)), Ordering::Less);
    }

    #[test]
    fn infers_column_kinds() {
        let ds = sample();
        assert_eq!(ds.n_rows(), 4);
        assert_eq!(ds.column("name").unwrap().kind(), ColumnKind::Text);
        assert_eq!(ds.column("age").unwrap().kind(), ColumnKind::Integer);
        assert_eq!(ds.column("score").unwrap().kind(), ColumnKind::Float);
        assert_eq!(ds.column("team").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn integer_column_with_gap_becomes_float() {
        let ds = Dataset::from_reader("x,y\n1,a\nNA,b\n3,c\n".as_bytes()).unwrap();
        let x = ds.column("x").unwrap();
        assert_eq!(x.kind(), ColumnKind::Float);
        assert_eq!(x.cells(), &[Cell::Float(1.0), Cell::Null, Cell::Float(3.0)]);
    }

    #[test]
    fn null_tokens_are_recognised() {
        let ds = sample();
        assert_eq!(ds.column("score").unwrap().null_count(), 1);
        assert_eq!(ds.column("team").unwrap().null_count(), 1);
        assert_eq!(ds.column("name").unwrap().null_count(), 0);
    }

    #[test]
    fn records_keep_column_order_and_types() {
        let ds = sample();
        let rec = ds.record(1);
        let keys: Vec<&String> = rec.keys().collect();
        assert_eq!(keys, ["name", "age", "score", "team"]);
        assert_eq!(rec["age"], Value::from(25));
        assert!(rec["age"].is_i64());
        assert_eq!(rec["score"], Value::Null);
        assert_eq!(rec["score"], ds.columns()[2].cells()[1].to_json());
    }

    #[test]
    fn mode_picks_smallest_among_ties() {
        let ds = sample();
        assert_eq!(ds.column("age").unwrap().mode(), Cell::Int(25));
        assert_eq!(ds.column("team").unwrap().mode(), Cell::Text("red".into()));
        // all distinct: smallest wins
        assert_eq!(ds.column("score").unwrap().mode(), Cell::Float(1.0));
        let empty = Column::new("e", vec![Cell::Null, Cell::Null]);
        assert_eq!(empty.mode(), Cell::Null);
    }

    #[test]
    fn nlargest_is_stable_and_skips_nulls() {
        let ds = sample();
        assert_eq!(ds.nlargest("age", 3).unwrap(), vec![2, 0, 1]);
        assert_eq!(ds.nlargest("score", 5).unwrap(), vec![2, 0, 3]);
        assert!(matches!(ds.nlargest("name", 2), Err(DatasetError::NotNumeric(_))));
        assert!(matches!(ds.nlargest("nope", 2), Err(DatasetError::UnknownColumn(_))));
    }

    #[test]
    fn drop_null_rows_keeps_complete_rows() {
        let ds = sample().drop_null_rows();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.record(1)["name"], Value::from("cid"));
        assert_eq!(ds.column("age").unwrap().kind(), ColumnKind::Integer);
    }

    #[test]
    fn column_map_is_indexed_by_row() {
        let map = sample().to_column_map();
        assert_eq!(map["name"]["0"], Value::from("ann"));
        assert_eq!(map["score"]["1"], Value::Null);
    }

    #[test]
    fn headers_are_mangled() {
        let ds = Dataset::from_reader(",a,a,b\n0,1,2,3\n".as_bytes()).unwrap();
        let names: Vec<&str> = ds.columns().iter().map(Column::name).collect();
        assert_eq!(names, ["Unnamed: 0", "a", "a.1", "b"]);
    }

    #[test]
    fn wide_rows_are_rejected_short_rows_padded() {
        let err = Dataset::from_reader("a,b\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::RowWidth { row: 1, expected: 2, found: 3 }));

        let ds = Dataset::from_reader("a,b\n1\n2,3\n".as_bytes()).unwrap();
        assert_eq!(ds.column("b").unwrap().cells()[0], Cell::Null);
    }

    #[test]
    fn text_columns_keep_numeric_spelling() {
        let ds = Dataset::from_reader("v\n01\nx\n".as_bytes()).unwrap();
        assert_eq!(ds.column("v").unwrap().cells()[0], Cell::Text("01".into()));
    }

    #[test]
    fn float_serialization_handles_non_finite() {
        assert_eq!(serde_json::to_string(&Cell::Float(f64::INFINITY)).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Cell::Int(3)).unwrap(), "3");
        assert_eq!(Cell::from_f64(f64::NAN), Cell::Null);
    }
}
