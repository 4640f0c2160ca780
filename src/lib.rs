// Library exports for csv-explorer

pub mod color;
pub mod config;
pub mod csv_reader;
pub mod data;
pub mod logging;
pub mod runtime;
pub mod selection;
pub mod server;
pub mod summary;

// Chart pipeline: data -> scene IR -> bitmap -> PNG
pub mod compiler;
pub mod export;
pub mod graph;
pub mod ir;
pub mod transform;

pub use color::ChartColor;
pub use config::{ChartConfig, PlotKind, ServeConfig};
pub use data::{Column, ColumnKind, Dataset};
pub use export::RenderedChart;
pub use runtime::{ChartOutcome, Exploration, RenderOutcome};
pub use selection::{Selection, SelectionOptions};
pub use summary::{Statistics, Summary};
