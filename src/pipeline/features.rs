//! Feature selection, one-hot expansion and label extraction
//!
//! Numeric passenger attributes pass through unchanged. `Sex` is expanded into
//! one boolean indicator column per distinct value, named `Sex_<value>` and
//! ordered lexicographically, appended after the numeric columns.

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use polars::prelude::*;

use super::error::PipelineError;
use super::loader::{get_column_names, require_columns};

pub const ID_COLUMN: &str = "PassengerId";
pub const LABEL_COLUMN: &str = "Survived";
pub const CATEGORICAL_FEATURE: &str = "Sex";

/// Numeric attributes copied into the feature table, in output order
pub const NUMERIC_FEATURES: [&str; 3] = ["Pclass", "SibSp", "Parch"];

/// Every raw attribute the encoding reads
pub const FEATURE_COLUMNS: [&str; 4] = ["Pclass", "Sex", "SibSp", "Parch"];

/// Encoded features for one raw table, one row per passenger.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    frame: DataFrame,
}

impl FeatureTable {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut DataFrame {
        &mut self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn feature_names(&self) -> Vec<String> {
        get_column_names(&self.frame)
    }

    /// Row-major numeric view, booleans as 0.0/1.0.
    ///
    /// Fails with [`PipelineError::MissingValue`] on the first null cell.
    pub fn to_rows(&self) -> Result<Vec<Vec<f64>>> {
        let height = self.frame.height();
        let mut rows = vec![Vec::with_capacity(self.frame.width()); height];

        for column in self.frame.get_columns() {
            let float_col = column.cast(&DataType::Float64)?;
            for (row_idx, value) in float_col.f64()?.into_iter().enumerate() {
                let value = value.ok_or_else(|| PipelineError::MissingValue {
                    column: column.name().to_string(),
                    row: row_idx,
                })?;
                rows[row_idx].push(value);
            }
        }

        Ok(rows)
    }

    /// Reorder columns to match `names`, the order a model was fit on.
    ///
    /// Columns the model never saw are dropped with a warning. A missing
    /// `Sex_*` indicator belongs to a category absent from this table and is
    /// filled with `false`. Any other missing column is a
    /// [`PipelineError::SchemaMismatch`].
    pub fn aligned_to(&self, names: &[String]) -> Result<FeatureTable> {
        let present = self.feature_names();
        let (absent_indicators, missing): (Vec<&String>, Vec<&String>) = names
            .iter()
            .filter(|name| !present.contains(name))
            .partition(|name| is_indicator(name));

        if !missing.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                missing: missing.into_iter().cloned().collect(),
            }
            .into());
        }
        if !absent_indicators.is_empty() {
            tracing::info!(
                columns = ?absent_indicators,
                "Category absent from table; filling indicators with false"
            );
        }

        let extra: Vec<&String> = present.iter().filter(|name| !names.contains(name)).collect();
        if !extra.is_empty() {
            tracing::warn!(columns = ?extra, "Dropping feature columns unknown to the model");
        }

        let height = self.frame.height();
        let columns = names
            .iter()
            .map(|name| {
                if present.contains(name) {
                    self.frame.column(name).cloned()
                } else {
                    Ok(Column::new(name.as_str().into(), vec![false; height]))
                }
            })
            .collect::<PolarsResult<Vec<Column>>>()?;

        Ok(FeatureTable::new(DataFrame::new(columns)?))
    }
}

fn is_indicator(name: &str) -> bool {
    name.strip_prefix(CATEGORICAL_FEATURE)
        .is_some_and(|rest| rest.starts_with('_'))
}

/// Output of feature preparation: what the fitting and prediction stages read.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train_features: FeatureTable,
    pub train_labels: Vec<u8>,
    pub test_features: FeatureTable,
}

/// Select the fixed feature set and one-hot expand `Sex`.
///
/// Row count is preserved. Each table is encoded on its own categories.
pub fn prepare_features(df: &DataFrame) -> Result<FeatureTable> {
    require_columns(df, &FEATURE_COLUMNS)?;

    let mut columns = NUMERIC_FEATURES
        .iter()
        .map(|name| df.column(name).cloned())
        .collect::<PolarsResult<Vec<Column>>>()?;
    columns.extend(one_hot(df.column(CATEGORICAL_FEATURE)?)?);

    Ok(FeatureTable::new(DataFrame::new(columns)?))
}

/// Expand a categorical column into boolean indicators, one per distinct value.
///
/// A null cell sets every indicator of its row to false.
pub fn one_hot(column: &Column) -> Result<Vec<Column>> {
    let as_text = column.cast(&DataType::String)?;
    let values: Vec<Option<&str>> = as_text.str()?.into_iter().collect();
    let categories: BTreeSet<&str> = values.iter().flatten().copied().collect();

    let indicators = categories
        .into_iter()
        .map(|category| {
            let flags: Vec<bool> = values.iter().map(|v| *v == Some(category)).collect();
            Column::new(format!("{}_{}", column.name(), category).into(), flags)
        })
        .collect();

    Ok(indicators)
}

/// Read the label column as a flat 0/1 sequence.
pub fn extract_labels(df: &DataFrame) -> Result<Vec<u8>> {
    require_columns(df, &[LABEL_COLUMN])?;

    let float_col = df.column(LABEL_COLUMN)?.cast(&DataType::Float64)?;
    let labels = float_col
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v == 0.0 => Ok(0u8),
            Some(v) if v == 1.0 => Ok(1u8),
            Some(v) => Err(PipelineError::InvalidLabel {
                row,
                value: v.to_string(),
            }),
            None => Err(PipelineError::InvalidLabel {
                row,
                value: "null".to_string(),
            }),
        })
        .collect::<Result<Vec<u8>, PipelineError>>()?;

    Ok(labels)
}

/// Single-column label table as written between stages
pub fn labels_frame(labels: &[u8]) -> Result<DataFrame> {
    let values: Vec<i32> = labels.iter().map(|&l| i32::from(l)).collect();
    Ok(DataFrame::new(vec![Column::new(LABEL_COLUMN.into(), values)])?)
}

/// Encode both raw tables and split off the train labels.
pub fn preprocess(train: &DataFrame, test: &DataFrame) -> Result<PreparedData> {
    let train_features = prepare_features(train)?;
    let train_labels = extract_labels(train)?;
    let test_features = prepare_features(test)?;

    if train_features.feature_names() != test_features.feature_names() {
        tracing::warn!(
            train = ?train_features.feature_names(),
            test = ?test_features.feature_names(),
            "Train and test feature columns differ; prediction will align to the model's columns"
        );
    }

    Ok(PreparedData {
        train_features,
        train_labels,
        test_features,
    })
}

/// Survival rate by sex. `None` when no passenger of that sex is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivalRates {
    pub female: Option<f64>,
    pub male: Option<f64>,
}

impl fmt::Display for SurvivalRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |rate: Option<f64>| match rate {
            Some(r) => format!("{:.2}%", r * 100.0),
            None => "n/a".to_string(),
        };
        write!(f, "women {}, men {}", pct(self.female), pct(self.male))
    }
}

/// Mean of `Survived` within each sex. Rows with a null label are skipped.
pub fn survival_rates(df: &DataFrame) -> Result<SurvivalRates> {
    require_columns(df, &[CATEGORICAL_FEATURE, LABEL_COLUMN])?;

    let sex = df.column(CATEGORICAL_FEATURE)?.cast(&DataType::String)?;
    let survived = df.column(LABEL_COLUMN)?.cast(&DataType::Float64)?;

    let mut female = (0.0f64, 0usize);
    let mut male = (0.0f64, 0usize);

    for (sex_value, label) in sex.str()?.into_iter().zip(survived.f64()?.into_iter()) {
        let Some(label) = label else { continue };
        let group = match sex_value {
            Some("female") => &mut female,
            Some("male") => &mut male,
            _ => continue,
        };
        group.0 += label;
        group.1 += 1;
    }

    let rate = |(sum, count): (f64, usize)| (count > 0).then(|| sum / count as f64);

    Ok(SurvivalRates {
        female: rate(female),
        male: rate(male),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_train() -> DataFrame {
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

    #[test]
    fn test_prepare_features_column_order() {
        let features = prepare_features(&scenario_train()).unwrap();

        assert_eq!(
            features.feature_names(),
            vec!["Pclass", "SibSp", "Parch", "Sex_female", "Sex_male"]
        );
        assert_eq!(features.height(), 4);
    }

    #[test]
    fn test_is_indicator() {
        assert!(is_indicator("Sex_female"));
        assert!(is_indicator("Sex_male"));
        assert!(!is_indicator("Sex"));
        assert!(!is_indicator("SibSp"));
    }

    #[test]
    fn test_one_hot_null_sets_all_false() {
        let column = Column::new("Sex".into(), [Some("male"), None, Some("female")]);
        let indicators = one_hot(&column).unwrap();

        assert_eq!(indicators.len(), 2);
        for indicator in &indicators {
            assert_eq!(indicator.bool().unwrap().get(1), Some(false));
        }
    }

    #[test]
    fn test_to_rows_encodes_booleans() {
        let rows = prepare_features(&scenario_train()).unwrap().to_rows().unwrap();

        assert_eq!(rows[0], vec![3.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rows[1], vec![1.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_to_rows_rejects_null() {
        let df = df! { "Pclass" => [Some(1i64), None] }.unwrap();
        let err = FeatureTable::new(df).to_rows().unwrap_err();

        assert!(err.to_string().contains("Pclass"), "unexpected error: {}", err);
    }

    #[test]
    fn test_survival_rates_scenario() {
        let rates = survival_rates(&scenario_train()).unwrap();

        assert_eq!(rates.female, Some(1.0));
        assert_eq!(rates.male, Some(0.0));
    }

    #[test]
    fn test_survival_rates_empty_group() {
        let df = df! {
            "Sex" => ["female", "female"],
            "Survived" => [1i64, 0],
        }
        .unwrap();
        let rates = survival_rates(&df).unwrap();

        assert_eq!(rates.female, Some(0.5));
        assert_eq!(rates.male, None);
        assert_eq!(rates.to_string(), "women 50.00%, men n/a");
    }

    #[test]
    fn test_extract_labels_rejects_non_binary() {
        let df = df! { "Survived" => [0i64, 2, 1] }.unwrap();
        let err = extract_labels(&df).unwrap_err();

        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::InvalidLabel { row, .. }) => assert_eq!(*row, 1),
            other => panic!("expected InvalidLabel, got {:?}", other),
        }
    }
}
