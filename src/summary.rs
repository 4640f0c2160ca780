//! Dataset summary: shape, type partition, missing values and descriptive
//! statistics for numeric columns.

use crate::data::Dataset;
use crate::transform::{percentile, sorted_values};
use serde::Serialize;

/// Rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 5;

/// Shown instead of the statistics table when nothing is numeric.
pub const NO_NUMERIC_COLUMNS_MESSAGE: &str = "No numeric columns found to describe.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_columns: Vec<String>,
    pub non_numeric_columns: Vec<String>,
    pub missing_values: Vec<MissingCount>,
    pub total_missing: usize,
    pub statistics: Statistics,
    pub preview: Preview,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Either a describe-style table or an informational note.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Statistics {
    Table { columns: Vec<ColumnStats> },
    NoNumericColumns { message: String },
}

impl Statistics {
    pub fn table(&self) -> Option<&[ColumnStats]> {
        match self {
            Statistics::Table { columns } => Some(columns),
            Statistics::NoNumericColumns { .. } => None,
        }
    }
}

/// count, mean, std, min, quartiles, max of one numeric column. Undefined
/// values are NaN (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q1: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

pub fn summarize(dataset: &Dataset) -> Summary {
    let missing_values: Vec<MissingCount> = dataset
        .columns()
        .iter()
        .map(|c| MissingCount {
            column: c.name.clone(),
            missing: c.null_count(),
        })
        .collect();
    let total_missing = missing_values.iter().map(|m| m.missing).sum();

    Summary {
        row_count: dataset.row_count(),
        column_count: dataset.column_count(),
        numeric_columns: dataset.numeric_columns(),
        non_numeric_columns: dataset.non_numeric_columns(),
        missing_values,
        total_missing,
        statistics: describe(dataset),
        preview: Preview {
            columns: dataset.column_names(),
            rows: dataset.head(PREVIEW_ROWS),
        },
    }
}

/// Descriptive statistics over the numeric columns only
pub fn describe(dataset: &Dataset) -> Statistics {
    let columns: Vec<ColumnStats> = dataset
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .map(|c| describe_values(&c.name, &c.non_null_numbers()))
        .collect();

    if columns.is_empty() {
        Statistics::NoNumericColumns {
            message: NO_NUMERIC_COLUMNS_MESSAGE.to_string(),
        }
    } else {
        Statistics::Table { columns }
    }
}

fn describe_values(name: &str, values: &[f64]) -> ColumnStats {
    let sorted = sorted_values(values);
    let n = sorted.len();

    let mean = if n == 0 {
        f64::NAN
    } else {
        sorted.iter().sum::<f64>() / n as f64
    };
    let std = if n < 2 {
        f64::NAN
    } else {
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    };

    ColumnStats {
        column: name.to_string(),
        count: n,
        mean,
        std,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q3: percentile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}
