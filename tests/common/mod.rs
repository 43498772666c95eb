//! Shared test utilities and fixture generators

#![allow(dead_code)]

use lifeboat::pipeline::PipelineConfig;
use polars::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Four-passenger training table: every woman survived, no man did
pub const SCENARIO_TRAIN_CSV: &str = "\
PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch
1,0,3,\"Braund, Mr. Owen Harris\",male,22,1,0
2,1,1,\"Cumings, Mrs. John Bradley\",female,38,1,0
3,1,3,\"Heikkinen, Miss. Laina\",female,26,0,0
4,0,2,\"Allen, Mr. William Henry\",male,35,0,0
";

/// Two-passenger test table without labels
pub const SCENARIO_TEST_CSV: &str = "\
PassengerId,Pclass,Name,Sex,Age,SibSp,Parch
5,3,\"Kelly, Mr. James\",female,34.5,0,0
6,2,\"Wilkes, Mrs. James\",male,47,0,0
";

/// Raw training DataFrame matching the four-passenger scenario
pub fn scenario_train_dataframe() -> DataFrame {
    df! {
        "PassengerId" => [1i64, 2, 3, 4],
        "Survived" => [0i64, 1, 1, 0],
        "Pclass" => [3i64, 1, 3, 2],
        "Sex" => ["male", "female", "female", "male"],
        "SibSp" => [1i64, 1, 0, 0],
        "Parch" => [0i64, 0, 0, 0],
    }
    .unwrap()
}

/// Raw test DataFrame matching the scenario
pub fn scenario_test_dataframe() -> DataFrame {
    df! {
        "PassengerId" => [5i64, 6],
        "Pclass" => [3i64, 2],
        "Sex" => ["female", "male"],
        "SibSp" => [0i64, 0],
        "Parch" => [0i64, 0],
    }
    .unwrap()
}

/// Larger deterministic train/test CSV pair where sex and class drive survival
pub fn synthetic_csvs(train_rows: usize, test_rows: usize) -> (String, String) {
    let mut train = String::from("PassengerId,Survived,Pclass,Sex,SibSp,Parch\n");
    for i in 0..train_rows {
        let pclass = 1 + i % 3;
        let female = i % 2 == 0;
        let survived = u8::from((female && pclass < 3) || (!female && pclass == 1 && i % 5 == 0));
        train.push_str(&format!(
            "{},{},{},{},{},{}\n",
            i + 1,
            survived,
            pclass,
            if female { "female" } else { "male" },
            i % 4,
            i % 3
        ));
    }

    let mut test = String::from("PassengerId,Pclass,Sex,SibSp,Parch\n");
    for i in 0..test_rows {
        test.push_str(&format!(
            "{},{},{},{},{}\n",
            1000 + i,
            1 + (i * 7) % 3,
            if i % 3 == 0 { "male" } else { "female" },
            i % 2,
            0
        ));
    }

    (train, test)
}

/// Write a string to `dir/name` and return its path
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

/// Temporary workspace with train/test CSVs and a config pointing into it
pub fn create_workspace(train_csv: &str, test_csv: &str) -> (TempDir, PipelineConfig) {
    let temp_dir = TempDir::new().unwrap();
    let train_path = write_file(temp_dir.path(), "train.csv", train_csv);
    let test_path = write_file(temp_dir.path(), "test.csv", test_csv);
    let config = PipelineConfig::new(train_path, test_path, temp_dir.path().join("output"));
    (temp_dir, config)
}

/// Workspace with the four-passenger scenario
pub fn create_scenario_workspace() -> (TempDir, PipelineConfig) {
    create_workspace(SCENARIO_TRAIN_CSV, SCENARIO_TEST_CSV)
}

/// Read a CSV written by the pipeline
pub fn read_csv(path: &Path) -> DataFrame {
    lifeboat::pipeline::load_dataset(path, 100).unwrap()
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Integer values of a column, nulls as None
pub fn int_values(df: &DataFrame, column: &str) -> Vec<Option<i64>> {
    df.column(column)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}
