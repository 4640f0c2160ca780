// PNG export of rendered charts

use crate::config::PlotKind;
use crate::graph;
use crate::ir::Scene;
use anyhow::Result;

pub const PNG_MIME: &str = "image/png";

/// A chart rendered and encoded within one pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub plot_kind: PlotKind,
    pub width_px: u32,
    pub height_px: u32,
    pub png: Vec<u8>,
}

impl RenderedChart {
    /// Rasterise `scene` and encode it as PNG straight away
    pub fn from_scene(plot_kind: PlotKind, scene: &Scene) -> Result<Self> {
        let png = graph::draw_png(scene)?;
        Ok(Self {
            plot_kind,
            width_px: scene.width,
            height_px: scene.height,
            png,
        })
    }

    /// `<plot type>_chart.png`, e.g. `Histogram_chart.png`
    pub fn file_name(&self) -> String {
        file_name_for(self.plot_kind)
    }

    pub fn mime(&self) -> &'static str {
        PNG_MIME
    }

    /// Value for a `Content-Disposition` header offering the chart as a download
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name())
    }
}

pub fn file_name_for(plot_kind: PlotKind) -> String {
    format!("{}_chart.png", plot_kind.label())
}
