use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use carburants::config::Config;
use carburants::fetch::{DataFetcher, data_path_for};
use carburants::map::{LatLng, MapController, parse_regions};
use carburants::models::{Metrics, SalePoints};
use carburants::page::{self, Document, Element};
use carburants::viz::StaticMap;
use carburants::{stats, storage};

#[derive(Parser, Debug)]
#[command(
    name = "carburants",
    version,
    about = "Fetch French fuel-price data and render tables, a department map & a sale-point map"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the number of sale points.
    Stats(StatsArgs),
    /// National average price per fuel.
    Averages(AveragesArgs),
    /// Department choropleth of the average price of one fuel.
    Departments(DepartmentsArgs),
    /// One marker per sale point selling a fuel.
    SalePoints(SalePointsArgs),
    /// Build department metrics from a sale-point listing.
    Metrics(MetricsArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

/// Where the data file comes from. Without any of these, the configured data file is fetched.
#[derive(Args, Debug)]
struct InputArgs {
    /// Local JSON file or http(s) URL.
    #[arg(short, long, conflicts_with_all = ["remote", "date"])]
    input: Option<String>,
    /// Path inside the data repository (e.g., data/20220526.json).
    #[arg(long, conflicts_with = "date")]
    remote: Option<String>,
    /// Branch or commit of the data repository (default from config: data).
    #[arg(long = "ref")]
    git_ref: Option<String>,
    /// Day of the data file to fetch (YYYY-MM-DD).
    #[arg(short = 'd', long)]
    date: Option<String>,
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// More logging (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Render the map to an image (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Write a self-contained HTML page.
    #[arg(long)]
    html: Option<PathBuf>,
    /// Image width (default: configured viewport width).
    #[arg(long)]
    width: Option<u32>,
    /// Image height (default: configured viewport height).
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Write a self-contained HTML page.
    #[arg(long)]
    html: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AveragesArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Save the table to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Write a self-contained HTML page.
    #[arg(long)]
    html: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DepartmentsArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Departments GeoJSON (local file or http(s) URL).
    #[arg(long)]
    geojson: String,
    /// Fuel id or name (default: first fuel).
    #[arg(short, long)]
    fuel: Option<String>,
    /// Department to highlight, as if hovered (e.g., 75 or 2A).
    #[arg(long)]
    highlight: Option<String>,
    /// Department to zoom onto, as if clicked.
    #[arg(long)]
    focus: Option<String>,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct SalePointsArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Fuel name (default: first fuel column).
    #[arg(short, long)]
    fuel: Option<String>,
    /// Zoom level after loading.
    #[arg(long)]
    zoom: Option<f64>,
    /// Map center after loading, as LAT,LON.
    #[arg(long)]
    center: Option<String>,
    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct MetricsArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Output JSON file.
    #[arg(long)]
    out: PathBuf,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn parse_center(s: &str) -> Option<LatLng> {
    let (lat, lon) = s.split_once(',')?;
    Some(LatLng::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Raw text of a local file or remote URL.
fn read_source(fetcher: &DataFetcher, src: &str) -> Result<String> {
    if is_url(src) {
        let resp = page::log_fetch(src, fetcher.get(src))?;
        Ok(resp.text)
    } else {
        std::fs::read_to_string(src).with_context(|| format!("reading {}", src))
    }
}

/// Resolve the input options to the text of one JSON document.
fn load_text(input: &InputArgs, cfg: &Config) -> Result<String> {
    let fetcher = DataFetcher::with_base_url(cfg.base_url.clone());
    let git_ref = input.git_ref.as_deref().unwrap_or(&cfg.data_ref);
    if let Some(src) = &input.input {
        return read_source(&fetcher, src);
    }
    let path = match (&input.remote, &input.date) {
        (Some(p), _) => p.clone(),
        (None, Some(d)) => {
            let date = NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| anyhow!("invalid --date, expected YYYY-MM-DD"))?;
            data_path_for(date)
        }
        (None, None) => cfg.data_path.clone(),
    };
    let resp = page::log_fetch(&path, fetcher.get_file(&path, git_ref))?;
    Ok(resp.text)
}

fn load_sale_points(text: &str) -> Result<SalePoints> {
    serde_json::from_str(text).context("parsing sale points")
}

/// Metrics file, or a sale-point listing aggregated on the fly.
fn load_metrics(text: &str) -> Result<Metrics> {
    let value: serde_json::Value = serde_json::from_str(text).context("parsing JSON")?;
    if value.get("keys").is_some() && value.get("data").is_some() {
        let sale_points: SalePoints = serde_json::from_value(value).context("parsing sale points")?;
        log::info!("aggregating {} sale points into metrics", sale_points.len());
        return Ok(stats::build_metrics(&sale_points));
    }
    serde_json::from_value(value).context("parsing metrics")
}

fn write_html(path: &Path, title: &str, sections: Vec<Element>) -> Result<()> {
    let mut doc = Document::new(title);
    for s in sections {
        doc.push(s);
    }
    std::fs::write(path, doc.to_html()).with_context(|| format!("writing {}", path.display()))?;
    eprintln!("Wrote page to {}", path.display());
    Ok(())
}

/// Plot and/or page output of a finished map view.
fn render_map(
    controller: &MapController<StaticMap>,
    selector: Element,
    title: &str,
    args: &RenderArgs,
) -> Result<()> {
    let (vw, vh) = controller.options().viewport_px;
    let width = args.width.unwrap_or(vw);
    let height = args.height.unwrap_or(vh);
    let map = controller.backend();
    if let Some(path) = &args.plot {
        map.render(path, width, height)?;
        eprintln!("Wrote plot to {}", path.display());
    }
    if let Some(path) = &args.html {
        let figure = page::map_figure(map, "map", width, height)?;
        write_html(path, title, vec![selector, figure])?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let input = match &cli.cmd {
        Command::Stats(a) => &a.input,
        Command::Averages(a) => &a.input,
        Command::Departments(a) => &a.input,
        Command::SalePoints(a) => &a.input,
        Command::Metrics(a) => &a.input,
    };
    init_logging(input.verbose);
    let cfg = Config::load(input.config.as_deref())?;
    match cli.cmd {
        Command::Stats(args) => cmd_stats(args, &cfg),
        Command::Averages(args) => cmd_averages(args, &cfg),
        Command::Departments(args) => cmd_departments(args, &cfg),
        Command::SalePoints(args) => cmd_sale_points(args, &cfg),
        Command::Metrics(args) => cmd_metrics(args, &cfg),
    }
}

fn cmd_stats(args: StatsArgs, cfg: &Config) -> Result<()> {
    let sale_points = load_sale_points(&load_text(&args.input, cfg)?)?;
    let p = page::statistics_view(&sale_points);
    println!("{}", p.text_content());
    if let Some(path) = &args.html {
        write_html(path, "Points de vente", vec![p])?;
    }
    Ok(())
}

fn cmd_averages(args: AveragesArgs, cfg: &Config) -> Result<()> {
    let metrics = load_metrics(&load_text(&args.input, cfg)?)?;
    let section = page::averages_view(&metrics)?;
    let rows: Vec<Vec<String>> = section
        .find_by_id("averages")
        .into_iter()
        .flat_map(|t| t.elements())
        .map(|tr| tr.elements().map(|c| c.text_content()).collect())
        .collect();
    for row in &rows {
        println!("{}", row.join("\t"));
    }

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_table_csv(&rows, path)?,
            "json" => storage::save_table_json(&rows, path)?,
            other => bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", rows.len().saturating_sub(1), path.display());
    }
    if let Some(path) = &args.html {
        write_html(path, "Prix moyens", vec![section])?;
    }
    Ok(())
}

fn cmd_departments(args: DepartmentsArgs, cfg: &Config) -> Result<()> {
    let metrics = load_metrics(&load_text(&args.input, cfg)?)?;
    let fetcher = DataFetcher::with_base_url(cfg.base_url.clone());
    let geojson = read_source(&fetcher, &args.geojson)?;
    let regions = parse_regions(&geojson).context("loading departments GeoJSON")?;

    let mut view = page::departments_view(
        &metrics,
        regions,
        StaticMap::new(),
        args.fuel.as_deref(),
        cfg.map.clone(),
    )?;
    if let Some(code) = &args.focus {
        if !view.controller.click(code) {
            bail!("unknown department: {}", code);
        }
    }
    if let Some(code) = &args.highlight {
        if !view.controller.hover(code) {
            bail!("unknown department: {}", code);
        }
    }
    if let Some(range) = view.controller.range() {
        eprintln!(
            "{}: {:.3} – {:.3} over {} departments",
            view.fuel.as_deref().unwrap_or("-"),
            range.min,
            range.max,
            view.controller.regions().len()
        );
    }
    render_map(&view.controller, view.selector, "Prix par département", &args.render)
}

fn cmd_sale_points(args: SalePointsArgs, cfg: &Config) -> Result<()> {
    let sale_points = load_sale_points(&load_text(&args.input, cfg)?)?;
    let mut view = page::sale_points_view(
        &sale_points,
        StaticMap::new(),
        args.fuel.as_deref(),
        cfg.map.clone(),
    )?;
    if let Some(c) = &args.center {
        let center = parse_center(c).ok_or_else(|| anyhow!("invalid --center, expected LAT,LON"))?;
        view.controller.on_drag_end(center);
    }
    if let Some(z) = args.zoom {
        view.controller.on_zoom_end(z);
    }
    let markers = view.controller.markers();
    eprintln!(
        "{}: {} sale points, {} visible, {} popups open",
        view.fuel.as_deref().unwrap_or("-"),
        markers.len(),
        markers.iter().filter(|m| m.visible).count(),
        markers.iter().filter(|m| m.popup_open).count()
    );
    render_map(&view.controller, view.selector, "Points de vente", &args.render)
}

fn cmd_metrics(args: MetricsArgs, cfg: &Config) -> Result<()> {
    let sale_points = load_sale_points(&load_text(&args.input, cfg)?)?;
    let metrics = stats::build_metrics(&sale_points);
    storage::save_metrics_json(&metrics, &args.out)?;
    eprintln!(
        "Saved metrics for {} fuels to {}",
        metrics.fuel_types.len(),
        args.out.display()
    );
    Ok(())
}
