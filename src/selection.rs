//! Column and option pickers derived from a dataset.

use crate::color::DEFAULT_COLOR;
use crate::config::{PlotKind, DEFAULT_HEIGHT, DEFAULT_WIDTH, HEIGHT_RANGE, WIDTH_RANGE};
use crate::data::Dataset;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Which columns to plot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub x_column: String,
    #[serde(default)]
    pub y_columns: Vec<String>,
}

impl Selection {
    /// Y duplicates are dropped, keeping first occurrences.
    pub fn new(x_column: impl Into<String>, y_columns: Vec<String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(y_columns.len());
        for y in y_columns {
            if !deduped.contains(&y) {
                deduped.push(y);
            }
        }
        Self {
            x_column: x_column.into(),
            y_columns: deduped,
        }
    }

    /// First column as X and the first numeric column (if any) as Y.
    pub fn default_for(dataset: &Dataset) -> Option<Self> {
        let x = dataset.columns().first()?.name.clone();
        let y = dataset.numeric_columns().into_iter().take(1).collect();
        Some(Self::new(x, y))
    }

    pub fn has_y(&self) -> bool {
        !self.y_columns.is_empty()
    }

    /// X must exist; every Y must exist and be numeric.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        dataset.require_column(&self.x_column)?;
        for y in &self.y_columns {
            let column = dataset.require_column(y)?;
            if !column.is_numeric() {
                bail!("Column '{}' is not numeric and cannot be used on the Y axis", y);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

/// Valid choices for every control, plus their defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOptions {
    pub x_candidates: Vec<String>,
    pub y_candidates: Vec<String>,
    pub default_x: Option<String>,
    pub default_y: Vec<String>,
    pub plot_kinds: Vec<PlotKind>,
    pub default_plot_kind: PlotKind,
    pub default_color: String,
    pub width: SliderRange,
    pub height: SliderRange,
}

impl SelectionOptions {
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let defaults = Selection::default_for(dataset);
        Self {
            x_candidates: dataset.column_names(),
            y_candidates: dataset.numeric_columns(),
            default_x: defaults.as_ref().map(|s| s.x_column.clone()),
            default_y: defaults.map(|s| s.y_columns).unwrap_or_default(),
            plot_kinds: PlotKind::ALL.to_vec(),
            default_plot_kind: PlotKind::default(),
            default_color: DEFAULT_COLOR.to_string(),
            width: SliderRange {
                min: *WIDTH_RANGE.start(),
                max: *WIDTH_RANGE.end(),
                default: DEFAULT_WIDTH,
            },
            height: SliderRange {
                min: *HEIGHT_RANGE.start(),
                max: *HEIGHT_RANGE.end(),
                default: DEFAULT_HEIGHT,
            },
        }
    }
}
