use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL_CONDENSED, Cell, CellAlignment,
    ContentArrangement, Table,
};
use csv_explorer::color::{ChartColor, DEFAULT_COLOR};
use csv_explorer::config::{ChartConfig, PlotKind, ServeConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use csv_explorer::csv_reader;
use csv_explorer::data::Dataset;
use csv_explorer::logging::{init_logging, LogConfig, LogFormat};
use csv_explorer::runtime::{self, ChartOutcome};
use csv_explorer::selection::Selection;
use csv_explorer::server;
use csv_explorer::summary::{summarize, ColumnStats, Statistics, Summary};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "csv-explorer", version)]
#[command(about = "Explore CSV files: summary statistics and charts", long_about = None)]
struct Cli {
    /// Log level (RUST_LOG overrides this)
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[arg(long, global = true, value_enum, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the browser UI and JSON API (default)
    Serve(ServeArgs),
    /// Print shape, missing values, statistics and a preview
    Summary(SummaryArgs),
    /// Render one chart to PNG
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8501)]
    port: u16,

    /// Largest accepted upload in megabytes
    #[arg(long, default_value_t = 200)]
    max_upload_mb: usize,
}

impl Default for ServeArgs {
    fn default() -> Self {
        let defaults = ServeConfig::default();
        Self {
            host: defaults.host,
            port: defaults.port,
            max_upload_mb: defaults.max_upload_bytes / (1024 * 1024),
        }
    }
}

impl From<ServeArgs> for ServeConfig {
    fn from(args: ServeArgs) -> Self {
        ServeConfig {
            host: args.host,
            port: args.port,
            max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
        }
    }
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// CSV file (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// CSV file (reads stdin when omitted)
    file: Option<PathBuf>,

    /// X-axis column (defaults to the first column)
    #[arg(long)]
    x: Option<String>,

    /// Y-axis column; repeat for several series
    #[arg(long = "y")]
    y: Vec<String>,

    /// Plot type, e.g. "Line Chart" or "box"
    #[arg(long, default_value = "Line Chart", value_parser = parse_plot_kind)]
    kind: PlotKind,

    #[arg(long, default_value = DEFAULT_COLOR, value_parser = parse_color)]
    color: ChartColor,

    /// Width in inches
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Height in inches
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Output PNG path (writes to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_plot_kind(s: &str) -> Result<PlotKind, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_color(s: &str) -> Result<ChartColor, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_config = LogConfig::default()
        .with_level(cli.log_level)
        .with_format(cli.log_format)
        .with_ansi(io::stderr().is_terminal());
    init_logging(&log_config)?;

    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => run_serve(args.into()),
        Command::Summary(args) => run_summary(args),
        Command::Render(args) => run_render(args),
    }
}

fn run_serve(config: ServeConfig) -> Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::serve(config))?;
    Ok(ExitCode::SUCCESS)
}

fn load_dataset(file: Option<&PathBuf>) -> Result<Dataset> {
    match file {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            csv_reader::read_csv(&bytes)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin"),
    }
}

fn run_summary(args: SummaryArgs) -> Result<ExitCode> {
    let dataset = load_dataset(args.file.as_ref())?;
    let summary = summarize(&dataset);

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        print_summary(&summary);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_render(args: RenderArgs) -> Result<ExitCode> {
    let dataset = load_dataset(args.file.as_ref())?;

    let x = match args.x {
        Some(x) => x,
        None => Selection::default_for(&dataset)
            .map(|s| s.x_column)
            .unwrap_or_default(),
    };
    let selection = Selection::new(x, args.y);
    let config = ChartConfig {
        plot_kind: args.kind,
        color: args.color,
        width: args.width,
        height: args.height,
    };

    let chart = match runtime::render_chart(&dataset, &selection, &config)? {
        ChartOutcome::Rendered(chart) => chart,
        ChartOutcome::Warning(message) => {
            eprintln!("Warning: {}", message);
            return Ok(ExitCode::FAILURE);
        }
    };

    match args.output {
        Some(path) => {
            fs::write(&path, &chart.png)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), suggested_name = %chart.file_name(), "chart written");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&chart.png)
                .context("Failed to write PNG to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn print_summary(summary: &Summary) {
    println!("Rows: {}  Columns: {}", summary.row_count, summary.column_count);
    println!("Numeric columns: {}", list_or_none(&summary.numeric_columns));
    println!("Non-numeric columns: {}", list_or_none(&summary.non_numeric_columns));

    println!("\nData preview");
    let mut preview = Table::new();
    apply_table_style(&mut preview);
    preview.set_header(&summary.preview.columns);
    for row in &summary.preview.rows {
        preview.add_row(row.iter().map(|v| v.as_deref().unwrap_or("NaN")));
    }
    println!("{}", preview);

    println!("\nMissing values (total {})", summary.total_missing);
    let mut missing = Table::new();
    apply_table_style(&mut missing);
    missing.set_header(vec!["Column", "Missing"]);
    for entry in &summary.missing_values {
        missing.add_row(vec![
            Cell::new(&entry.column),
            Cell::new(entry.missing).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", missing);

    println!("\nStatistics");
    match &summary.statistics {
        Statistics::Table { columns } => {
            let mut stats = Table::new();
            apply_table_style(&mut stats);
            let mut header = vec![String::new()];
            header.extend(columns.iter().map(|c| c.column.clone()));
            stats.set_header(header);

            stats.add_row(
                std::iter::once(Cell::new("count"))
                    .chain(columns.iter().map(|c| Cell::new(c.count).set_alignment(CellAlignment::Right))),
            );
            let rows: [(&str, fn(&ColumnStats) -> f64); 7] = [
                ("mean", |c| c.mean),
                ("std", |c| c.std),
                ("min", |c| c.min),
                ("25%", |c| c.q1),
                ("50%", |c| c.median),
                ("75%", |c| c.q3),
                ("max", |c| c.max),
            ];
            for (name, get) in rows {
                stats.add_row(std::iter::once(Cell::new(name)).chain(
                    columns
                        .iter()
                        .map(|c| Cell::new(format_stat(get(c))).set_alignment(CellAlignment::Right)),
                ));
            }
            println!("{}", stats);
        }
        Statistics::NoNumericColumns { message } => println!("{}", message),
    }
}

fn format_stat(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.6}", value)
    }
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
