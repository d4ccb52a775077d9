use crate::config::{load_config, Config};
use crate::coordinator::DataState;
use crate::dashboard::Dashboard;
use crate::data::{load_dataset, parse_dataset, Dataset};
use crate::layout::{compute_layout, ChartData, ChartKind, ChartLayout, Size};
use crate::layout_dump::write_layout_dump;
use crate::render::{paint_chart, render_svg, write_output_png, write_output_svg, Scene, Surface};
use crate::theme::Theme;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "bkcharts",
    version,
    about = "Render bar, heatmap and flow charts from a books CSV"
)]
pub struct Args {
    /// Input CSV file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, palette and chart settings)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Theme name, overrides the config file
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    /// Page or chart width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Page or chart height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Which chart to render; `all` renders the dashboard page
    #[arg(long = "chart", value_enum, default_value = "all")]
    pub chart: ChartSelection,

    /// Write computed aggregates and geometry as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSelection {
    All,
    Bar,
    Heatmap,
    Flow,
}

impl ChartSelection {
    fn kind(self) -> Option<ChartKind> {
        match self {
            Self::All => None,
            Self::Bar => Some(ChartKind::Bar),
            Self::Heatmap => Some(ChartKind::Heatmap),
            Self::Flow => Some(ChartKind::Flow),
        }
    }
}

type ChartRecord = (ChartKind, ChartData, Option<ChartLayout>);

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = resolve_config(&args)?;
    let dataset = read_dataset(args.input.as_deref())?;
    tracing::info!(
        records = dataset.records.len(),
        skipped = dataset.skipped,
        "loaded dataset"
    );

    let size = Size::new(config.render.width, config.render.height);
    let (svg, charts) = match args.chart.kind() {
        Some(kind) => render_single(kind, &dataset, size, &config),
        None => render_page(&dataset, size, config.clone()),
    };

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &charts)
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
    }

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // A second init (tests, embedding hosts) keeps the existing subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(name) = args.theme.as_deref() {
        config.theme =
            Theme::by_name(name).ok_or_else(|| anyhow::anyhow!("unknown theme `{name}`"))?;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn read_dataset(path: Option<&Path>) -> Result<Dataset> {
    match path {
        Some(path) if path != Path::new("-") => Ok(load_dataset(path)?),
        _ => parse_dataset(io::stdin().lock()).context("failed to read dataset from stdin"),
    }
}

fn render_single(
    kind: ChartKind,
    dataset: &Dataset,
    size: Size,
    config: &Config,
) -> (String, Vec<ChartRecord>) {
    let data = ChartData::aggregate(kind, &dataset.records, &config.layout);
    let layout = compute_layout(&data, size, &config.theme, &config.layout);
    let mut scene = Scene::new();
    match &layout {
        Some(layout) => paint_chart(layout, &mut scene, &config.theme),
        None => {
            tracing::warn!(
                chart = kind.name(),
                width = size.width,
                height = size.height,
                "container too small, writing an empty chart"
            );
            scene.clear(size);
        }
    }
    let svg = render_svg(&scene, &config.theme);
    (svg, vec![(kind, data, layout)])
}

fn render_page(dataset: &Dataset, page: Size, config: Config) -> (String, Vec<ChartRecord>) {
    let mut dashboard = Dashboard::new(page, config);
    dashboard.load_with(|| Ok(dataset.clone()));
    let charts = dashboard
        .charts()
        .iter()
        .filter_map(|chart| match chart.state() {
            DataState::Ready(data) => Some((chart.kind(), data.clone(), chart.layout().cloned())),
            _ => None,
        })
        .collect();
    (dashboard.render_svg(), charts)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "genre,age_category,rating_average,adapted_to_movie\n\
        Fantasy,Adult,4.0,TRUE\n\
        \"Fantasy, Sci-Fi\",Children,4.0,FALSE\n";

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "bkcharts",
            "-i",
            "books.csv",
            "--chart",
            "flow",
            "-w",
            "900",
            "--dumpLayout",
            "layout.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.chart, ChartSelection::Flow);
        assert_eq!(args.width, Some(900.0));
        assert!(args.verbose);
        assert_eq!(args.dump_layout, Some(PathBuf::from("layout.json")));
    }

    #[test]
    fn flag_overrides_beat_config() {
        let args =
            Args::try_parse_from(["bkcharts", "-t", "modern", "-H", "500"]).unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.render.height, 500.0);
        assert_eq!(config.render.width, 1200.0);
        assert_eq!(config.theme.panel_background, Theme::modern().panel_background);
        let bad = Args::try_parse_from(["bkcharts", "-t", "neon"]).unwrap();
        assert!(resolve_config(&bad).is_err());
    }

    #[test]
    fn single_chart_renders_svg() {
        let dataset = parse_dataset(CSV.as_bytes()).unwrap();
        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        let (svg, charts) =
            render_single(ChartKind::Bar, &dataset, Size::new(800.0, 600.0), &config);
        assert!(svg.contains("Top 5 Book Genres by Count"));
        assert_eq!(charts.len(), 1);
        assert!(charts[0].2.is_some());

        let (tiny, charts) =
            render_single(ChartKind::Bar, &dataset, Size::new(50.0, 50.0), &config);
        assert!(tiny.starts_with("<svg"));
        assert!(charts[0].2.is_none());
    }

    #[test]
    fn missing_input_is_an_error() {
        let err = read_dataset(Some(Path::new("/nonexistent/books.csv"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/books.csv"));
    }
}
