use crate::graph::{AreaStyle, BarStyle, LineStyle, PointStyle};

// =============================================================================
// Scene Graph
// =============================================================================

/// A list of primitive drawing commands plus axis setup.
/// The canvas just executes these blindly.
#[derive(Debug, Clone)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    /// Series names shown in the legend, in drawing order
    pub fn legend_entries(&self) -> Vec<&str> {
        self.commands.iter().filter_map(DrawCommand::legend).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub range: (f64, f64),
    /// Labels for integer positions 0..n on a categorical axis
    pub categories: Option<Vec<String>>,
}

impl Axis {
    pub fn continuous(range: (f64, f64)) -> Self {
        Self { range, categories: None }
    }

    pub fn categorical(categories: Vec<String>) -> Self {
        let n = categories.len().max(1) as f64;
        Self {
            range: (-0.5, n - 0.5),
            categories: Some(categories),
        }
    }

    /// Tick label for a categorical position, empty between categories.
    pub fn category_label(&self, value: f64) -> String {
        let Some(categories) = &self.categories else {
            return String::new();
        };
        let idx = value.round();
        if (value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        categories.get(idx as usize).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        style: LineStyle,
        legend: Option<String>,
    },
    DrawPoint {
        points: Vec<(f64, f64)>,
        style: PointStyle,
        legend: Option<String>,
    },
    DrawBars {
        /// (left, bottom) and (right, top) corners
        rects: Vec<[(f64, f64); 2]>,
        style: BarStyle,
        legend: Option<String>,
    },
    DrawPolygon {
        points: Vec<(f64, f64)>,
        style: AreaStyle,
        legend: Option<String>,
    },
}

impl DrawCommand {
    pub fn legend(&self) -> Option<&str> {
        match self {
            DrawCommand::DrawLine { legend, .. }
            | DrawCommand::DrawPoint { legend, .. }
            | DrawCommand::DrawBars { legend, .. }
            | DrawCommand::DrawPolygon { legend, .. } => legend.as_deref(),
        }
    }

    /// Every coordinate this command touches
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        match self {
            DrawCommand::DrawLine { points, .. }
            | DrawCommand::DrawPoint { points, .. }
            | DrawCommand::DrawPolygon { points, .. } => points.clone(),
            DrawCommand::DrawBars { rects, .. } => {
                rects.iter().flat_map(|r| r.iter().copied()).collect()
            }
        }
    }
}
