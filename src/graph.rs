use crate::color::ChartColor;
use crate::ir::{DrawCommand, Scene};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::prelude::*;

/// Width in pixels of a legend swatch
const LEGEND_SWATCH: i32 = 20;

/// Style configuration for line layers
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: ChartColor,
    pub width: u32,
    pub alpha: f64,
}

/// Style configuration for point layers
#[derive(Debug, Clone, PartialEq)]
pub struct PointStyle {
    pub color: ChartColor,
    pub size: u32,
    pub alpha: f64,
}

/// Style configuration for bar layers
#[derive(Debug, Clone, PartialEq)]
pub struct BarStyle {
    pub color: ChartColor,
    pub alpha: f64,
    /// Outline color, none for borderless bars
    pub edge: Option<ChartColor>,
}

/// Style configuration for filled areas
#[derive(Debug, Clone, PartialEq)]
pub struct AreaStyle {
    pub color: ChartColor,
    pub alpha: f64,
}

/// RGB bitmap that scenes are drawn onto
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot create a {}x{} canvas", width, height);
        }

        Ok(Canvas {
            buffer: vec![0u8; (width * height * 3) as usize],
            width,
            height,
        })
    }

    /// Draw a whole scene: background, axes, every command, then the legend
    pub fn draw(&mut self, scene: &Scene) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        root.fill(&WHITE).context("Failed to fill background")?;

        let (x_min, x_max) = scene.x_axis.range;
        let (y_min, y_max) = scene.y_axis.range;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(scene.title.as_str(), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .context("Failed to build chart")?;

        let x_axis = &scene.x_axis;
        let category_formatter = |v: &f64| x_axis.category_label(*v);

        let mut mesh = chart.configure_mesh();
        if let Some(label) = &scene.x_label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &scene.y_label {
            mesh.y_desc(label.as_str());
        }
        if let Some(categories) = &x_axis.categories {
            mesh.x_labels(categories.len().max(1))
                .x_label_formatter(&category_formatter)
                .disable_x_mesh();
        }
        mesh.draw().context("Failed to draw mesh")?;

        for command in &scene.commands {
            match command {
                DrawCommand::DrawLine { points, style, legend } => {
                    let stroke = style
                        .color
                        .to_rgb()
                        .mix(style.alpha)
                        .stroke_width(style.width);
                    let series = chart
                        .draw_series(LineSeries::new(points.iter().copied(), stroke))
                        .context("Failed to draw line series")?;
                    if let Some(name) = legend {
                        series.label(name.as_str()).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + LEGEND_SWATCH, y)], stroke)
                        });
                    }
                }
                DrawCommand::DrawPoint { points, style, legend } => {
                    let fill = style.color.to_rgb().mix(style.alpha).filled();
                    let size = style.size as i32;
                    let series = chart
                        .draw_series(
                            points
                                .iter()
                                .map(|&(x, y)| Circle::new((x, y), size, fill)),
                        )
                        .context("Failed to draw point series")?;
                    if let Some(name) = legend {
                        series.label(name.as_str()).legend(move |(x, y)| {
                            Circle::new((x + LEGEND_SWATCH / 2, y), size, fill)
                        });
                    }
                }
                DrawCommand::DrawBars { rects, style, legend } => {
                    let fill = style.color.to_rgb().mix(style.alpha).filled();
                    let series = chart
                        .draw_series(rects.iter().map(|r| Rectangle::new(*r, fill)))
                        .context("Failed to draw bars")?;
                    if let Some(name) = legend {
                        series.label(name.as_str()).legend(move |(x, y)| {
                            Rectangle::new([(x, y - 5), (x + LEGEND_SWATCH, y + 5)], fill)
                        });
                    }
                    if let Some(edge) = style.edge {
                        let outline = edge.to_rgb().stroke_width(1);
                        chart
                            .draw_series(rects.iter().map(|r| Rectangle::new(*r, outline)))
                            .context("Failed to draw bar outlines")?;
                    }
                }
                DrawCommand::DrawPolygon { points, style, legend } => {
                    let fill = style.color.to_rgb().mix(style.alpha).filled();
                    let series = chart
                        .draw_series(std::iter::once(Polygon::new(points.clone(), fill)))
                        .context("Failed to draw area")?;
                    if let Some(name) = legend {
                        series.label(name.as_str()).legend(move |(x, y)| {
                            Rectangle::new([(x, y - 5), (x + LEGEND_SWATCH, y + 5)], fill)
                        });
                    }
                }
            }
        }

        if !scene.legend_entries().is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .context("Failed to draw legend")?;
        }

        root.present().context("Failed to present drawing")?;

        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Rasterise a scene and return PNG bytes
pub fn draw_png(scene: &Scene) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(scene.width, scene.height)?;
    canvas.draw(scene)?;
    canvas.render()
}
