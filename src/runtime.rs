// Runtime: upload -> summary -> chart, re-run in full for every interaction

use crate::compiler::compile_scene;
use crate::config::{ChartConfig, PlotKind};
use crate::csv_reader;
use crate::data::Dataset;
use crate::export::RenderedChart;
use crate::selection::Selection;
use crate::summary::{summarize, Summary};
use anyhow::{Context, Result};
use std::fmt;
use tracing::{debug, info};

pub const NO_UPLOAD_MESSAGE: &str = "Please upload a CSV file to get started.";
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";
pub const NO_Y_COLUMN_WARNING: &str = "Please select at least one numeric Y-axis column.";
pub const NO_DISTRIBUTION_COLUMN_WARNING: &str = "Please select at least one numeric column to plot.";

/// Context attached to failures caused by the caller's input rather than by
/// rendering. Recover it with `anyhow::Error::downcast_ref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    Csv,
    Selection,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Csv => f.write_str("Failed to parse uploaded CSV"),
            InputError::Selection => f.write_str("Invalid column selection"),
        }
    }
}

/// The chart half of a render pass
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Rendered(RenderedChart),
    Warning(String),
}

impl ChartOutcome {
    pub fn chart(&self) -> Option<&RenderedChart> {
        match self {
            ChartOutcome::Rendered(chart) => Some(chart),
            ChartOutcome::Warning(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            ChartOutcome::Rendered(_) => None,
            ChartOutcome::Warning(message) => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub summary: Summary,
    pub chart: ChartOutcome,
}

/// Result of one full cycle starting from the (possibly absent) upload
#[derive(Debug, Clone, PartialEq)]
pub enum Exploration {
    AwaitingUpload { message: String },
    Ready(RenderOutcome),
}

/// Warning shown instead of a chart when no Y column is selected
pub fn missing_y_warning(plot_kind: PlotKind) -> &'static str {
    if plot_kind.is_distribution() {
        NO_DISTRIBUTION_COLUMN_WARNING
    } else {
        NO_Y_COLUMN_WARNING
    }
}

/// Summarise the dataset and render the selected chart
pub fn render(
    dataset: &Dataset,
    selection: &Selection,
    config: &ChartConfig,
) -> Result<RenderOutcome> {
    let summary = summarize(dataset);
    let chart = render_chart(dataset, selection, config)?;
    Ok(RenderOutcome { summary, chart })
}

/// Render only the chart; an empty Y selection yields a warning instead.
pub fn render_chart(
    dataset: &Dataset,
    selection: &Selection,
    config: &ChartConfig,
) -> Result<ChartOutcome> {
    let selection = Selection::new(selection.x_column.clone(), selection.y_columns.clone());
    let config = config.clamped();

    if !selection.has_y() {
        debug!(plot_kind = %config.plot_kind, "no y column selected, skipping render");
        return Ok(ChartOutcome::Warning(
            missing_y_warning(config.plot_kind).to_string(),
        ));
    }

    selection.validate(dataset).context(InputError::Selection)?;

    let scene = compile_scene(dataset, &selection, &config)
        .context("Failed to build chart")?;
    let chart = RenderedChart::from_scene(config.plot_kind, &scene)
        .context("Failed to render chart")?;

    info!(
        plot_kind = %config.plot_kind,
        x = %selection.x_column,
        y = ?selection.y_columns,
        bytes = chart.png.len(),
        "chart rendered"
    );

    Ok(ChartOutcome::Rendered(chart))
}

/// Full cycle: parse the upload, then summarise and render. Without a
/// selection the dataset's default selection is used.
pub fn explore(
    upload: Option<&[u8]>,
    selection: Option<Selection>,
    config: &ChartConfig,
) -> Result<Exploration> {
    let Some(bytes) = upload.filter(|b| !b.is_empty()) else {
        return Ok(Exploration::AwaitingUpload {
            message: NO_UPLOAD_MESSAGE.to_string(),
        });
    };

    let dataset = csv_reader::read_csv(bytes).context(InputError::Csv)?;
    let (rows, columns) = dataset.shape();
    debug!(rows, columns, "upload parsed");

    let selection = match selection {
        Some(selection) => selection,
        None => Selection::default_for(&dataset).unwrap_or_default(),
    };

    render(&dataset, &selection, config).map(Exploration::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::read_csv;
    use crate::summary::Statistics;

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn dataset() -> Dataset {
        read_csv(b"a,b\n1,2\n3,4\n").unwrap()
    }

    #[test]
    fn test_missing_y_warning_wording() {
        assert_eq!(missing_y_warning(PlotKind::Line), NO_Y_COLUMN_WARNING);
        assert_eq!(missing_y_warning(PlotKind::Area), NO_Y_COLUMN_WARNING);
        assert_eq!(missing_y_warning(PlotKind::Histogram), NO_DISTRIBUTION_COLUMN_WARNING);
        assert_eq!(missing_y_warning(PlotKind::Box), NO_DISTRIBUTION_COLUMN_WARNING);
    }

    #[test]
    fn test_render_without_y_warns() {
        let selection = Selection::new("a", vec![]);
        let outcome = render(&dataset(), &selection, &ChartConfig::new(PlotKind::Line)).unwrap();
        assert_eq!(outcome.chart.warning(), Some(NO_Y_COLUMN_WARNING));
        assert!(outcome.chart.chart().is_none());
        assert_eq!(outcome.summary.row_count, 2);
    }

    #[test]
    fn test_render_histogram_png() {
        let selection = Selection::new("a", vec!["a".into()]);
        let outcome = render(&dataset(), &selection, &ChartConfig::new(PlotKind::Histogram)).unwrap();
        let chart = outcome.chart.chart().unwrap();
        assert_eq!(chart.file_name(), "Histogram_chart.png");
        assert_eq!(&chart.png[0..8], &PNG_MAGIC);
        assert_eq!((chart.width_px, chart.height_px), (800, 500));
    }

    #[test]
    fn test_render_every_kind() {
        let selection = Selection::new("a", vec!["b".into()]);
        for kind in PlotKind::ALL {
            let outcome = render_chart(&dataset(), &selection, &ChartConfig::new(kind)).unwrap();
            let chart = outcome.chart().unwrap_or_else(|| panic!("{} not rendered", kind));
            assert_eq!(chart.plot_kind, kind);
        }
    }

    #[test]
    fn test_render_clamps_dimensions() {
        let selection = Selection::new("a", vec!["b".into()]);
        let config = ChartConfig {
            width: 100,
            height: 0,
            ..ChartConfig::new(PlotKind::Scatter)
        };
        let outcome = render_chart(&dataset(), &selection, &config).unwrap();
        let chart = outcome.chart().unwrap();
        assert_eq!((chart.width_px, chart.height_px), (1500, 400));
    }

    #[test]
    fn test_render_values_near_f64_limits() {
        let ds = read_csv(b"x,y\n1,-1e308\n2,1e308\n").unwrap();
        let selection = Selection::new("x", vec!["y".into()]);
        for kind in [PlotKind::Line, PlotKind::Histogram] {
            let outcome = render_chart(&ds, &selection, &ChartConfig::new(kind)).unwrap();
            assert_eq!(&outcome.chart().unwrap().png[0..8], &PNG_MAGIC);
        }
    }

    #[test]
    fn test_render_unknown_column_errors() {
        let selection = Selection::new("a", vec!["zzz".into()]);
        let result = render_chart(&dataset(), &selection, &ChartConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_explore_without_upload() {
        let result = explore(None, None, &ChartConfig::default()).unwrap();
        assert_eq!(
            result,
            Exploration::AwaitingUpload {
                message: NO_UPLOAD_MESSAGE.to_string()
            }
        );
        let empty = explore(Some(b"".as_slice()), None, &ChartConfig::default()).unwrap();
        assert!(matches!(empty, Exploration::AwaitingUpload { .. }));
    }

    #[test]
    fn test_explore_uses_default_selection() {
        let result = explore(Some(b"a,b\n1,2\n3,4\n".as_slice()), None, &ChartConfig::default()).unwrap();
        match result {
            Exploration::Ready(outcome) => {
                let chart = outcome.chart.chart().unwrap();
                assert_eq!(chart.file_name(), "Line Chart_chart.png");
            }
            other => panic!("expected a rendered exploration, got {:?}", other),
        }
    }

    #[test]
    fn test_explore_text_only_csv() {
        let result = explore(Some(b"name\nann\nbo\n".as_slice()), None, &ChartConfig::default()).unwrap();
        match result {
            Exploration::Ready(outcome) => {
                assert!(matches!(outcome.summary.statistics, Statistics::NoNumericColumns { .. }));
                assert_eq!(outcome.chart.warning(), Some(NO_Y_COLUMN_WARNING));
            }
            other => panic!("expected ready, got {:?}", other),
        }
    }

    #[test]
    fn test_explore_malformed_csv_errors() {
        let result = explore(Some(b"a,b\n1,2,3\n".as_slice()), None, &ChartConfig::default());
        let err = result.unwrap_err();
        assert_eq!(err.downcast_ref::<InputError>(), Some(&InputError::Csv));
    }

    #[test]
    fn test_text_y_is_a_selection_error() {
        let ds = read_csv(b"a,name\n1,x\n").unwrap();
        let selection = Selection::new("a", vec!["name".into()]);
        let err = render_chart(&ds, &selection, &ChartConfig::default()).unwrap_err();
        assert_eq!(err.downcast_ref::<InputError>(), Some(&InputError::Selection));
        assert!(format!("{:#}", err).contains("not numeric"));
    }
}
