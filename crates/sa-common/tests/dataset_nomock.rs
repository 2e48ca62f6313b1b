//! Dataset loading against real files on disk.

use std::io::Write;

use sa_common::{Cell, ColumnKind, Dataset, DatasetError};
use tempfile::NamedTempFile;

const SURVEY: &str = "\
GAME,Platform,Hours,earnings,Age,streams
Skyrim,PC,12,120.5,21,2
Dota 2,PC,40,,25,1
Minecraft,Console,5,10,17,0
Dota 2,PC,40,300,30,4
,Console,NA,55.25,19,
";

fn write_csv(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_survey_file() {
    let file = write_csv(SURVEY);
    let ds = Dataset::from_path(file.path()).unwrap();

    assert_eq!(ds.n_rows(), 5);
    assert_eq!(ds.n_cols(), 6);
    assert_eq!(ds.column("GAME").unwrap().kind(), ColumnKind::Text);
    assert_eq!(ds.column("Hours").unwrap().kind(), ColumnKind::Float);
    assert_eq!(ds.column("Age").unwrap().kind(), ColumnKind::Integer);
    assert_eq!(ds.column("earnings").unwrap().null_count(), 1);

    let names: Vec<&str> = ds.numeric_columns().map(|c| c.name()).collect();
    assert_eq!(names, ["Hours", "earnings", "Age", "streams"]);
}

#[test]
fn top_rows_and_null_counts() {
    let file = write_csv(SURVEY);
    let ds = Dataset::from_path(file.path()).unwrap();

    // 40 appears twice; the earlier row comes first
    assert_eq!(ds.nlargest("Hours", 5).unwrap(), vec![1, 3, 0, 2]);
    assert_eq!(ds.nlargest("earnings", 2).unwrap(), vec![3, 0]);

    let counts = ds.null_counts();
    assert_eq!(
        counts,
        vec![
            ("GAME", 1),
            ("Platform", 0),
            ("Hours", 1),
            ("earnings", 1),
            ("Age", 0),
            ("streams", 1)
        ]
    );
}

#[test]
fn null_free_copy_leaves_original_untouched() {
    let file = write_csv(SURVEY);
    let ds = Dataset::from_path(file.path()).unwrap();
    let clean = ds.drop_null_rows();

    assert_eq!(clean.n_rows(), 3);
    assert_eq!(ds.n_rows(), 5);
    for column in clean.columns() {
        assert_eq!(column.null_count(), 0, "{} has nulls", column.name());
    }
    assert_eq!(clean.column("GAME").unwrap().cells()[2], Cell::Text("Dota 2".into()));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Dataset::from_path(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, DatasetError::Io { .. }));
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn header_only_file_is_empty_dataset() {
    let file = write_csv("a,b,c\n");
    let ds = Dataset::from_path(file.path()).unwrap();
    assert_eq!(ds.n_rows(), 0);
    assert_eq!(ds.n_cols(), 3);
    assert!(ds.records().is_empty());
    assert_eq!(ds.column("a").unwrap().mode(), Cell::Null);
}
