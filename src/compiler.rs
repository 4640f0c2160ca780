use anyhow::{bail, Result};
use crate::color::ChartColor;
use crate::config::{ChartConfig, PlotKind};
use crate::data::{Column, ColumnValues, Dataset};
use crate::graph::{AreaStyle, BarStyle, LineStyle, PointStyle};
use crate::ir::{Axis, DrawCommand, Scene};
use crate::selection::Selection;
use crate::transform::{compute_boxplot_stats, compute_histogram, HISTOGRAM_BINS};

use std::collections::HashMap;

/// Bar and box width in x-axis units
const BAR_WIDTH: f64 = 0.8;
const BAR_ALPHA: f64 = 0.7;
const HISTOGRAM_ALPHA: f64 = 0.7;
const AREA_ALPHA: f64 = 0.3;
const LINE_WIDTH: u32 = 2;
const MARKER_SIZE: u32 = 4;
const HISTOGRAM_X_LABEL: &str = "Values";

/// Whisker, median and outlier color for box plots
const BOX_LINE_COLOR: ChartColor = ChartColor::new(0x3d, 0x3d, 0x3d);

/// Marks drawn per Y column against the shared X column
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    Line,
    Bar,
    Scatter,
    Area,
}

/// Compile a dataset and the chosen chart settings into drawing commands.
/// Expects a non-empty Y selection.
pub fn compile_scene(
    dataset: &Dataset,
    selection: &Selection,
    config: &ChartConfig,
) -> Result<Scene> {
    if !selection.has_y() {
        bail!("At least one Y column is required to build a chart");
    }

    let kind = config.plot_kind;
    let y_list = selection.y_columns.join(", ");

    let (x_categories, x_label, y_label, title, commands, sticky_zero) = match kind {
        PlotKind::Line | PlotKind::Bar | PlotKind::Scatter | PlotKind::Area => {
            let mark = match kind {
                PlotKind::Line => Mark::Line,
                PlotKind::Bar => Mark::Bar,
                PlotKind::Scatter => Mark::Scatter,
                _ => Mark::Area,
            };
            let (categories, commands) = compile_cartesian(dataset, selection, config.color, mark)?;
            (
                categories,
                Some(selection.x_column.clone()),
                Some(selection.y_columns.join(" / ")),
                format!("{} of {} vs {}", kind.label(), y_list, selection.x_column),
                commands,
                matches!(mark, Mark::Bar | Mark::Area),
            )
        }
        PlotKind::Histogram => (
            None,
            Some(HISTOGRAM_X_LABEL.to_string()),
            None,
            format!("{} of {}", kind.label(), y_list),
            compile_histogram(dataset, selection, config.color)?,
            true,
        ),
        PlotKind::Box => (
            Some(selection.y_columns.clone()),
            None,
            None,
            format!("{} of {}", kind.label(), y_list),
            compile_boxplot(dataset, selection, config.color)?,
            false,
        ),
    };

    let bounds = data_bounds(&commands);

    let x_axis = match x_categories {
        Some(categories) => Axis::categorical(categories),
        None => Axis::continuous(
            bounds
                .map(|b| padded_range(b.x_min, b.x_max, false))
                .unwrap_or((0.0, 1.0)),
        ),
    };
    let y_axis = Axis::continuous(
        bounds
            .map(|b| padded_range(b.y_min, b.y_max, sticky_zero))
            .unwrap_or((0.0, 1.0)),
    );

    let (width, height) = config.pixel_size();

    Ok(Scene {
        width,
        height,
        title,
        x_label,
        y_label,
        x_axis,
        y_axis,
        commands,
    })
}

/// Line, bar, scatter and area: every Y column against the shared X column.
/// Returns the X categories when the X column is non-numeric.
fn compile_cartesian(
    dataset: &Dataset,
    selection: &Selection,
    color: ChartColor,
    mark: Mark,
) -> Result<(Option<Vec<String>>, Vec<DrawCommand>)> {
    let x_column = dataset.require_column(&selection.x_column)?;
    let (x_positions, categories) = x_positions(x_column);

    let mut commands = Vec::new();

    for y_name in &selection.y_columns {
        let y_values = numeric_values(dataset, y_name)?;

        let rows: Vec<Option<(f64, f64)>> = x_positions
            .iter()
            .zip(y_values)
            .map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
                _ => None,
            })
            .collect();
        let points: Vec<(f64, f64)> = rows.iter().flatten().copied().collect();
        let segments = split_segments(&rows);

        let line_style = LineStyle {
            color,
            width: LINE_WIDTH,
            alpha: 1.0,
        };

        match mark {
            Mark::Line => {
                for (i, segment) in segments.into_iter().enumerate() {
                    commands.push(DrawCommand::DrawLine {
                        points: segment,
                        style: line_style.clone(),
                        legend: if i == 0 { Some(y_name.clone()) } else { None },
                    });
                }
                commands.push(DrawCommand::DrawPoint {
                    points,
                    style: PointStyle {
                        color,
                        size: MARKER_SIZE,
                        alpha: 1.0,
                    },
                    legend: None,
                });
            }
            Mark::Bar => {
                let half = BAR_WIDTH / 2.0;
                commands.push(DrawCommand::DrawBars {
                    rects: points
                        .iter()
                        .map(|&(x, y)| [(x - half, 0.0), (x + half, y)])
                        .collect(),
                    style: BarStyle {
                        color,
                        alpha: BAR_ALPHA,
                        edge: None,
                    },
                    legend: Some(y_name.clone()),
                });
            }
            Mark::Scatter => {
                commands.push(DrawCommand::DrawPoint {
                    points,
                    style: PointStyle {
                        color,
                        size: MARKER_SIZE,
                        alpha: 1.0,
                    },
                    legend: Some(y_name.clone()),
                });
            }
            Mark::Area => {
                for (i, segment) in segments.into_iter().enumerate() {
                    commands.push(DrawCommand::DrawPolygon {
                        points: area_polygon(&segment),
                        style: AreaStyle {
                            color,
                            alpha: AREA_ALPHA,
                        },
                        legend: if i == 0 { Some(y_name.clone()) } else { None },
                    });
                    commands.push(DrawCommand::DrawLine {
                        points: segment,
                        style: line_style.clone(),
                        legend: None,
                    });
                }
            }
        }
    }

    Ok((categories, commands))
}

/// One 20-bin histogram per Y column over its own value range
fn compile_histogram(
    dataset: &Dataset,
    selection: &Selection,
    color: ChartColor,
) -> Result<Vec<DrawCommand>> {
    let mut commands = Vec::new();

    for y_name in &selection.y_columns {
        let values: Vec<f64> = numeric_values(dataset, y_name)?.iter().flatten().copied().collect();
        let histogram = compute_histogram(&values, HISTOGRAM_BINS);

        commands.push(DrawCommand::DrawBars {
            rects: histogram
                .bins()
                .map(|(left, right, count)| [(left, 0.0), (right, count as f64)])
                .collect(),
            style: BarStyle {
                color,
                alpha: HISTOGRAM_ALPHA,
                edge: None,
            },
            legend: Some(y_name.clone()),
        });
    }

    Ok(commands)
}

/// One box per Y column at categorical positions 0..n
fn compile_boxplot(
    dataset: &Dataset,
    selection: &Selection,
    color: ChartColor,
) -> Result<Vec<DrawCommand>> {
    let whisker_style = LineStyle {
        color: BOX_LINE_COLOR,
        width: 2,
        alpha: 1.0,
    };
    let box_style = BarStyle {
        color,
        alpha: 1.0,
        edge: Some(BOX_LINE_COLOR),
    };
    let outlier_style = PointStyle {
        color: BOX_LINE_COLOR,
        size: 3,
        alpha: 1.0,
    };

    let mut commands = Vec::new();

    for (i, y_name) in selection.y_columns.iter().enumerate() {
        let values: Vec<f64> = numeric_values(dataset, y_name)?.iter().flatten().copied().collect();
        let Some(stats) = compute_boxplot_stats(&values) else {
            continue;
        };

        let x = i as f64;
        let half = BAR_WIDTH / 2.0;
        let cap_half = BAR_WIDTH * 0.2;

        // Whiskers and caps first, then the box over them
        for points in [
            vec![(x, stats.lower_whisker), (x, stats.q1)],
            vec![(x, stats.q3), (x, stats.upper_whisker)],
            vec![(x - cap_half, stats.lower_whisker), (x + cap_half, stats.lower_whisker)],
            vec![(x - cap_half, stats.upper_whisker), (x + cap_half, stats.upper_whisker)],
        ] {
            commands.push(DrawCommand::DrawLine {
                points,
                style: whisker_style.clone(),
                legend: None,
            });
        }

        commands.push(DrawCommand::DrawBars {
            rects: vec![[(x - half, stats.q1), (x + half, stats.q3)]],
            style: box_style.clone(),
            legend: None,
        });

        commands.push(DrawCommand::DrawLine {
            points: vec![(x - half, stats.median), (x + half, stats.median)],
            style: whisker_style.clone(),
            legend: None,
        });

        if !stats.outliers.is_empty() {
            commands.push(DrawCommand::DrawPoint {
                points: stats.outliers.iter().map(|&v| (x, v)).collect(),
                style: outlier_style.clone(),
                legend: None,
            });
        }
    }

    Ok(commands)
}

/// Values of a numeric column, failing for text columns
fn numeric_values<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [Option<f64>]> {
    let column = dataset.require_column(name)?;
    match column.as_numbers() {
        Some(values) => Ok(values),
        None => bail!("Column '{}' is not numeric and cannot be used on the Y axis", name),
    }
}

/// X coordinates per row. Text columns map to category indices in order of
/// first appearance.
fn x_positions(column: &Column) -> (Vec<Option<f64>>, Option<Vec<String>>) {
    match &column.values {
        ColumnValues::Numeric(values) => (values.clone(), None),
        ColumnValues::Text(values) => {
            let mut index: HashMap<&str, usize> = HashMap::new();
            let mut categories: Vec<String> = Vec::new();
            let positions = values
                .iter()
                .map(|cell| {
                    let cell = cell.as_deref()?;
                    let idx = *index.entry(cell).or_insert_with(|| {
                        categories.push(cell.to_string());
                        categories.len() - 1
                    });
                    Some(idx as f64)
                })
                .collect();
            (positions, Some(categories))
        }
    }
}

/// Runs of consecutive present rows; a missing row breaks the run
fn split_segments(rows: &[Option<(f64, f64)>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for row in rows {
        match row {
            Some(point) => current.push(*point),
            None => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Closed outline from the baseline up through the segment and back down
fn area_polygon(segment: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut polygon = Vec::with_capacity(segment.len() + 2);
    if let (Some(first), Some(last)) = (segment.first(), segment.last()) {
        polygon.push((first.0, 0.0));
        polygon.extend_from_slice(segment);
        polygon.push((last.0, 0.0));
    }
    polygon
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

fn data_bounds(commands: &[DrawCommand]) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    for (x, y) in commands.iter().flat_map(DrawCommand::coordinates) {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        bounds = Some(match bounds {
            None => Bounds { x_min: x, x_max: x, y_min: y, y_max: y },
            Some(b) => Bounds {
                x_min: b.x_min.min(x),
                x_max: b.x_max.max(x),
                y_min: b.y_min.min(y),
                y_max: b.y_max.max(y),
            },
        });
    }
    bounds
}

/// Largest magnitude an axis bound may take. Keeping both bounds within half
/// the f64 range keeps the axis span itself finite.
const AXIS_LIMIT: f64 = f64::MAX / 2.0;

/// Data extent plus 5% either side (±1 when flat). With `sticky_zero` a
/// bound sitting exactly on zero is kept there.
fn padded_range(min: f64, max: f64, sticky_zero: bool) -> (f64, f64) {
    let min = min.clamp(-AXIS_LIMIT, AXIS_LIMIT);
    let max = max.clamp(-AXIS_LIMIT, AXIS_LIMIT);

    let (lower, upper) = if min == max {
        let pad = 1.0_f64.max(min.abs() * 0.05);
        (min - pad, max + pad)
    } else {
        let padding = (max / 2.0 - min / 2.0) * 0.1;
        let lower = if sticky_zero && min == 0.0 { 0.0 } else { min - padding };
        let upper = if sticky_zero && max == 0.0 { 0.0 } else { max + padding };
        (lower, upper)
    };

    let lower = lower.max(-AXIS_LIMIT);
    let upper = upper.min(AXIS_LIMIT);
    if lower.is_finite() && upper.is_finite() && lower < upper {
        (lower, upper)
    } else {
        (0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::read_csv;

    fn dataset() -> Dataset {
        read_csv(b"day,a,b,city\n1,10,5,oslo\n2,20,,rome\n3,30,15,oslo\n4,25,20,paris\n").unwrap()
    }

    fn compile(kind: PlotKind, x: &str, ys: &[&str]) -> Result<Scene> {
        let selection = Selection::new(x, ys.iter().map(|s| s.to_string()).collect());
        compile_scene(&dataset(), &selection, &ChartConfig::new(kind))
    }

    fn count<F: Fn(&DrawCommand) -> bool>(scene: &Scene, f: F) -> usize {
        scene.commands.iter().filter(|c| f(c)).count()
    }

    #[test]
    fn test_line_titles_and_labels() {
        let scene = compile(PlotKind::Line, "day", &["a", "b"]).unwrap();
        assert_eq!(scene.title, "Line Chart of a, b vs day");
        assert_eq!(scene.x_label.as_deref(), Some("day"));
        assert_eq!(scene.y_label.as_deref(), Some("a / b"));
        assert_eq!(scene.legend_entries(), vec!["a", "b"]);
        assert_eq!((scene.width, scene.height), (800, 500));
    }

    #[test]
    fn test_line_breaks_at_missing_values() {
        let scene = compile(PlotKind::Line, "day", &["b"]).unwrap();
        let lines = count(&scene, |c| matches!(c, DrawCommand::DrawLine { .. }));
        assert_eq!(lines, 2);
        // markers only for present rows
        let markers: usize = scene
            .commands
            .iter()
            .map(|c| match c {
                DrawCommand::DrawPoint { points, .. } => points.len(),
                _ => 0,
            })
            .sum();
        assert_eq!(markers, 3);
    }

    #[test]
    fn test_bar_uses_categorical_text_x() {
        let scene = compile(PlotKind::Bar, "city", &["a"]).unwrap();
        assert_eq!(
            scene.x_axis.categories,
            Some(vec!["oslo".to_string(), "rome".to_string(), "paris".to_string()])
        );
        match &scene.commands[0] {
            DrawCommand::DrawBars { rects, style, .. } => {
                assert_eq!(rects.len(), 4);
                assert_eq!(rects[0], [(-0.4, 0.0), (0.4, 10.0)]);
                assert_eq!(style.alpha, BAR_ALPHA);
            }
            other => panic!("expected bars, got {:?}", other),
        }
        assert_eq!(scene.y_axis.range.0, 0.0);
    }

    #[test]
    fn test_scatter_single_point_series() {
        let scene = compile(PlotKind::Scatter, "day", &["a"]).unwrap();
        assert_eq!(scene.commands.len(), 1);
        assert!(scene.x_axis.range.0 < 1.0 && scene.x_axis.range.1 > 4.0);
    }

    #[test]
    fn test_area_polygon_closes_on_baseline() {
        let scene = compile(PlotKind::Area, "day", &["a"]).unwrap();
        match &scene.commands[0] {
            DrawCommand::DrawPolygon { points, style, .. } => {
                assert_eq!(points.first(), Some(&(1.0, 0.0)));
                assert_eq!(points.last(), Some(&(4.0, 0.0)));
                assert_eq!(points.len(), 6);
                assert_eq!(style.alpha, AREA_ALPHA);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_one_series_twenty_bins() {
        let scene = compile(PlotKind::Histogram, "city", &["a"]).unwrap();
        assert_eq!(scene.title, "Histogram of a");
        assert_eq!(scene.x_label.as_deref(), Some("Values"));
        assert_eq!(scene.commands.len(), 1);
        match &scene.commands[0] {
            DrawCommand::DrawBars { rects, legend, .. } => {
                assert_eq!(rects.len(), HISTOGRAM_BINS);
                assert_eq!(legend.as_deref(), Some("a"));
                let total: f64 = rects.iter().map(|r| r[1].1).sum();
                assert_eq!(total, 4.0);
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_drops_missing_values() {
        let scene = compile(PlotKind::Histogram, "day", &["b"]).unwrap();
        match &scene.commands[0] {
            DrawCommand::DrawBars { rects, .. } => {
                let total: f64 = rects.iter().map(|r| r[1].1).sum();
                assert_eq!(total, 3.0);
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_boxplot_one_box_per_column() {
        let scene = compile(PlotKind::Box, "day", &["a", "b"]).unwrap();
        assert_eq!(scene.title, "Box Plot of a, b");
        assert_eq!(
            scene.x_axis.categories,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        let boxes = count(&scene, |c| matches!(c, DrawCommand::DrawBars { .. }));
        assert_eq!(boxes, 2);
        assert!(scene.legend_entries().is_empty());
    }

    #[test]
    fn test_boxplot_uses_uniform_fill() {
        let selection = Selection::new("day", vec!["a".into(), "b".into()]);
        let mut config = ChartConfig::new(PlotKind::Box);
        config.color = ChartColor::new(1, 2, 3);
        let scene = compile_scene(&dataset(), &selection, &config).unwrap();
        for command in &scene.commands {
            if let DrawCommand::DrawBars { style, .. } = command {
                assert_eq!(style.color, ChartColor::new(1, 2, 3));
            }
        }
    }

    #[test]
    fn test_empty_selection_rejected() {
        let result = compile(PlotKind::Line, "day", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_text_y_rejected() {
        let result = compile(PlotKind::Scatter, "day", &["city"]);
        assert!(result.unwrap_err().to_string().contains("not numeric"));
    }

    #[test]
    fn test_all_missing_series_gives_default_axes() {
        let ds = read_csv(b"x,y\n1,\n2,\n").unwrap();
        let selection = Selection::new("x", vec!["y".into()]);
        let scene = compile_scene(&ds, &selection, &ChartConfig::new(PlotKind::Scatter)).unwrap();
        assert_eq!(scene.x_axis.range, (0.0, 1.0));
        assert_eq!(scene.y_axis.range, (0.0, 1.0));
    }

    #[test]
    fn test_extreme_values_give_finite_axes() {
        let ds = read_csv(b"x,y\n1,-1e308\n2,1e308\n").unwrap();
        let selection = Selection::new("x", vec!["y".into()]);
        for kind in PlotKind::ALL {
            let scene = compile_scene(&ds, &selection, &ChartConfig::new(kind)).unwrap();
            for (lo, hi) in [scene.x_axis.range, scene.y_axis.range] {
                assert!(lo.is_finite() && hi.is_finite(), "{}: {} .. {}", kind, lo, hi);
                assert!(lo < hi, "{}: {} .. {}", kind, lo, hi);
                assert!((hi - lo).is_finite(), "{}: span overflows", kind);
            }
        }
    }

    #[test]
    fn test_padded_range_near_f64_limits() {
        let (lo, hi) = padded_range(0.0, 1.79e308, true);
        assert_eq!(lo, 0.0);
        assert!(hi.is_finite() && hi > lo);
        let (lo, hi) = padded_range(f64::MAX, f64::MAX, false);
        assert!(lo.is_finite() && hi.is_finite() && lo < hi);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(5.0, 5.0, false), (4.0, 6.0));
        assert_eq!(padded_range(0.0, 10.0, true), (0.0, 10.5));
        assert_eq!(padded_range(0.0, 10.0, false), (-0.5, 10.5));
    }

    #[test]
    fn test_split_segments() {
        let rows = vec![Some((0.0, 1.0)), None, Some((2.0, 3.0)), Some((3.0, 4.0)), None];
        let segments = split_segments(&rows);
        assert_eq!(segments, vec![vec![(0.0, 1.0)], vec![(2.0, 3.0), (3.0, 4.0)]]);
    }
}
