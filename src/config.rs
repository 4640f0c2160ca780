use crate::color::ChartColor;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Chart width in inches: slider bounds and default.
pub const WIDTH_RANGE: RangeInclusive<u32> = 6..=15;
pub const DEFAULT_WIDTH: u32 = 8;

/// Chart height in inches: slider bounds and default.
pub const HEIGHT_RANGE: RangeInclusive<u32> = 4..=10;
pub const DEFAULT_HEIGHT: u32 = 5;

/// Pixels per inch of chart size.
pub const DPI: u32 = 100;

/// The six supported chart kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlotKind {
    #[serde(rename = "Line Chart")]
    #[default]
    Line,
    #[serde(rename = "Bar Chart")]
    Bar,
    #[serde(rename = "Scatter Plot")]
    Scatter,
    #[serde(rename = "Area Chart")]
    Area,
    #[serde(rename = "Histogram")]
    Histogram,
    #[serde(rename = "Box Plot")]
    Box,
}

impl PlotKind {
    /// Display order for pickers
    pub const ALL: [PlotKind; 6] = [
        PlotKind::Line,
        PlotKind::Bar,
        PlotKind::Scatter,
        PlotKind::Area,
        PlotKind::Histogram,
        PlotKind::Box,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlotKind::Line => "Line Chart",
            PlotKind::Bar => "Bar Chart",
            PlotKind::Scatter => "Scatter Plot",
            PlotKind::Area => "Area Chart",
            PlotKind::Histogram => "Histogram",
            PlotKind::Box => "Box Plot",
        }
    }

    /// Histogram and box plot ignore the X column and plot value distributions.
    pub fn is_distribution(self) -> bool {
        match self {
            PlotKind::Histogram | PlotKind::Box => true,
            PlotKind::Line | PlotKind::Bar | PlotKind::Scatter | PlotKind::Area => false,
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlotKind {
    type Err = anyhow::Error;

    /// Accepts display labels ("Box Plot") and short names ("box").
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        if let Some(kind) = PlotKind::ALL.iter().find(|k| k.label().eq_ignore_ascii_case(wanted)) {
            return Ok(*kind);
        }
        match wanted.to_ascii_lowercase().as_str() {
            "line" => Ok(PlotKind::Line),
            "bar" => Ok(PlotKind::Bar),
            "scatter" => Ok(PlotKind::Scatter),
            "area" => Ok(PlotKind::Area),
            "histogram" | "hist" => Ok(PlotKind::Histogram),
            "box" | "boxplot" => Ok(PlotKind::Box),
            _ => Err(anyhow!(
                "Unknown plot type '{}' (expected one of: {})",
                s,
                PlotKind::ALL.map(PlotKind::label).join(", ")
            )),
        }
    }
}

/// Chart appearance chosen by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub plot_kind: PlotKind,
    #[serde(default)]
    pub color: ChartColor,
    /// Inches
    #[serde(default = "default_width")]
    pub width: u32,
    /// Inches
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 { DEFAULT_WIDTH }
fn default_height() -> u32 { DEFAULT_HEIGHT }

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            plot_kind: PlotKind::default(),
            color: ChartColor::default(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl ChartConfig {
    pub fn new(plot_kind: PlotKind) -> Self {
        Self {
            plot_kind,
            ..Self::default()
        }
    }

    /// Copy with width and height clamped to the slider bounds.
    pub fn clamped(&self) -> Self {
        Self {
            width: self.width.clamp(*WIDTH_RANGE.start(), *WIDTH_RANGE.end()),
            height: self.height.clamp(*HEIGHT_RANGE.start(), *HEIGHT_RANGE.end()),
            ..self.clone()
        }
    }

    /// Canvas size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width * DPI, self.height * DPI)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl ServeConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_kind_labels_round_trip() {
        for kind in PlotKind::ALL {
            assert_eq!(kind.label().parse::<PlotKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_plot_kind_short_names() {
        assert_eq!("hist".parse::<PlotKind>().unwrap(), PlotKind::Histogram);
        assert_eq!("BOX".parse::<PlotKind>().unwrap(), PlotKind::Box);
        assert!("pie".parse::<PlotKind>().is_err());
    }

    #[test]
    fn test_plot_kind_serde_uses_labels() {
        let json = serde_json::to_string(&PlotKind::Scatter).unwrap();
        assert_eq!(json, "\"Scatter Plot\"");
        let kind: PlotKind = serde_json::from_str("\"Box Plot\"").unwrap();
        assert_eq!(kind, PlotKind::Box);
    }

    #[test]
    fn test_distribution_kinds() {
        let dist: Vec<PlotKind> = PlotKind::ALL.into_iter().filter(|k| k.is_distribution()).collect();
        assert_eq!(dist, vec![PlotKind::Histogram, PlotKind::Box]);
    }

    #[test]
    fn test_chart_config_defaults() {
        let config: ChartConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ChartConfig::default());
        assert_eq!(config.color.to_hex(), "#69b3a2");
        assert_eq!(config.pixel_size(), (800, 500));
    }

    #[test]
    fn test_chart_config_from_json() {
        let config: ChartConfig = serde_json::from_str(
            r##"{"plot_kind": "Histogram", "color": "#ff0000", "width": 12}"##,
        )
        .unwrap();
        assert_eq!(config.plot_kind, PlotKind::Histogram);
        assert_eq!(config.width, 12);
        assert_eq!(config.height, DEFAULT_HEIGHT);
    }

    #[test]
    fn test_clamped_to_slider_bounds() {
        let config = ChartConfig {
            width: 40,
            height: 1,
            ..ChartConfig::default()
        };
        let clamped = config.clamped();
        assert_eq!(clamped.width, 15);
        assert_eq!(clamped.height, 4);
    }
}
