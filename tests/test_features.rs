//! Tests for feature preparation, labels and survival rates

use lifeboat::pipeline::{
    extract_labels, prepare_features, preprocess, survival_rates, PipelineError,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_one_hot_yields_two_exclusive_indicators() {
    let features = prepare_features(&scenario_train_dataframe()).unwrap();
    let frame = features.frame();

    assert_has_columns(frame, &["Sex_female", "Sex_male"]);
    assert_eq!(frame.width(), 5, "Pclass, SibSp, Parch, Sex_female, Sex_male");

    let female = frame.column("Sex_female").unwrap().bool().unwrap();
    let male = frame.column("Sex_male").unwrap().bool().unwrap();
    for (f, m) in female.into_iter().zip(male.into_iter()) {
        assert_ne!(f, m, "Exactly one indicator must be set per row");
    }
}

#[test]
fn test_row_counts_preserved() {
    let prepared = preprocess(&scenario_train_dataframe(), &scenario_test_dataframe()).unwrap();

    assert_eq!(prepared.train_features.height(), 4);
    assert_eq!(prepared.train_labels.len(), 4);
    assert_eq!(prepared.test_features.height(), 2);
    assert_eq!(
        prepared.train_features.feature_names(),
        prepared.test_features.feature_names()
    );
}

#[test]
fn test_numeric_features_pass_through() {
    let features = prepare_features(&scenario_train_dataframe()).unwrap();

    assert_eq!(int_values(features.frame(), "Pclass"), vec![Some(3), Some(1), Some(3), Some(2)]);
    assert_eq!(int_values(features.frame(), "SibSp"), vec![Some(1), Some(1), Some(0), Some(0)]);
}

#[test]
fn test_missing_feature_column_fails() {
    let df = df! {
        "PassengerId" => [1i64],
        "Pclass" => [3i64],
        "Sex" => ["male"],
        "SibSp" => [0i64],
    }
    .unwrap();

    let err = prepare_features(&df).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::MissingColumn { column }) => assert_eq!(column, "Parch"),
        other => panic!("expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_missing_label_column_fails() {
    let err = preprocess(&scenario_test_dataframe(), &scenario_test_dataframe()).unwrap_err();

    assert!(err.to_string().contains("Survived"), "unexpected error: {}", err);
}

#[test]
fn test_scenario_survival_rates() {
    let rates = survival_rates(&scenario_train_dataframe()).unwrap();

    assert_eq!(rates.female, Some(1.0));
    assert_eq!(rates.male, Some(0.0));
}

#[test]
fn test_all_survived_and_none_survived_groups() {
    let df = df! {
        "Sex" => ["male", "female", "male", "female"],
        "Survived" => [0i64, 1, 0, 1],
    }
    .unwrap();

    let rates = survival_rates(&df).unwrap();

    assert_eq!(rates.female, Some(1.0), "All women survived");
    assert_eq!(rates.male, Some(0.0), "No men survived");
}

#[test]
fn test_labels_flattened_in_order() {
    let labels = extract_labels(&scenario_train_dataframe()).unwrap();

    assert_eq!(labels, vec![0, 1, 1, 0]);
}

#[test]
fn test_single_sex_test_table_gets_one_indicator() {
    let test = df! {
        "PassengerId" => [7i64, 8],
        "Pclass" => [1i64, 3],
        "Sex" => ["male", "male"],
        "SibSp" => [0i64, 1],
        "Parch" => [0i64, 2],
    }
    .unwrap();

    let features = prepare_features(&test).unwrap();

    assert_eq!(features.feature_names(), vec!["Pclass", "SibSp", "Parch", "Sex_male"]);
}

#[test]
fn test_aligned_to_reorders_and_reports_missing() {
    let features = prepare_features(&scenario_train_dataframe()).unwrap();

    let order: Vec<String> = ["Sex_male", "Pclass"].iter().map(|s| s.to_string()).collect();
    let aligned = features.aligned_to(&order).unwrap();
    assert_eq!(aligned.feature_names(), order);
    assert_eq!(aligned.height(), 4);

    let unknown: Vec<String> = vec!["Pclass".to_string(), "Fare".to_string()];
    let err = features.aligned_to(&unknown).unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::SchemaMismatch { missing }) => assert_eq!(missing, &vec!["Fare".to_string()]),
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_aligned_to_fills_absent_category_with_false() {
    let test = df! {
        "PassengerId" => [7i64, 8],
        "Pclass" => [1i64, 3],
        "Sex" => ["male", "male"],
        "SibSp" => [0i64, 1],
        "Parch" => [0i64, 2],
    }
    .unwrap();
    let features = prepare_features(&test).unwrap();
    let model_order: Vec<String> = ["Pclass", "SibSp", "Parch", "Sex_female", "Sex_male"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let aligned = features.aligned_to(&model_order).unwrap();

    assert_eq!(aligned.feature_names(), model_order);
    let rows = aligned.to_rows().unwrap();
    assert_eq!(rows[0], vec![1.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(rows[1], vec![3.0, 1.0, 2.0, 0.0, 1.0]);
}

#[test]
fn test_aligned_to_empty_table_gets_every_indicator() {
    let test = df! {
        "PassengerId" => Vec::<i64>::new(),
        "Pclass" => Vec::<i64>::new(),
        "Sex" => Vec::<&str>::new(),
        "SibSp" => Vec::<i64>::new(),
        "Parch" => Vec::<i64>::new(),
    }
    .unwrap();
    let features = prepare_features(&test).unwrap();
    assert_eq!(features.feature_names(), vec!["Pclass", "SibSp", "Parch"]);

    let model_order: Vec<String> = ["Pclass", "SibSp", "Parch", "Sex_female", "Sex_male"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let aligned = features.aligned_to(&model_order).unwrap();

    assert_eq!(aligned.feature_names(), model_order);
    assert_eq!(aligned.height(), 0);
    assert!(aligned.to_rows().unwrap().is_empty());
}

#[test]
fn test_aligned_to_only_reports_missing_numeric_columns() {
    let features = prepare_features(&scenario_train_dataframe()).unwrap();
    let order: Vec<String> = ["Pclass", "Fare", "Sex_child"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let err = features.aligned_to(&order).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::SchemaMismatch { missing }) => assert_eq!(missing, &vec!["Fare".to_string()]),
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}
