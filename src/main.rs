//! Climate Views CLI - derived chart datasets as JSON
//!
//! Human-readable progress goes to stderr so stdout stays valid JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use climate_views::{
    annotate, curve_chart, derive_view, heatmap, load_dataset, map_frame, small_multiples,
    time_series, Animation, ChartConfig, DataQualityEngine, Dataset, Observation, Scenario,
    TimeSeriesRecord, ViewState,
};

/// Climate chart data generator.
#[derive(Parser)]
#[command(name = "climate-views")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Chart configuration JSON (defaults built in).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON here instead of stdout.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Baselines and anomalies for a regional observation CSV.
    Anomalies {
        /// CSV with region,year,scenario,july_temp_c.
        input: PathBuf,
    },

    /// Small-multiple anomaly panels (one per region, one line per scenario).
    SmallMultiples {
        input: PathBuf,
    },

    /// Region × year heatmap of July temperatures.
    Heatmap {
        input: PathBuf,

        /// Only this scenario (historical, ssp245, ssp585).
        #[arg(short, long)]
        scenario: Option<Scenario>,
    },

    /// One region's line from a time-series CSV.
    Series {
        /// CSV with date,region,<metric>... (or date,value, named by the file)
        input: PathBuf,

        #[arg(short, long, default_value = "US")]
        region: String,

        #[arg(short, long, default_value = "anomaly")]
        metric: String,
    },

    /// Synthetic regional warming curves 2025-2100, with threshold crossings.
    Curves {
        /// Only this region (name, slug or alias).
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Synthetic 2100 warming grid.
    Grid,

    /// Map colours for one year.
    Frame {
        #[arg(short, long, default_value = "2100")]
        year: i32,
    },

    /// Full derived view for a (year, region, metric, selection) request.
    View {
        #[arg(short, long, default_value = "2100")]
        year: i32,

        /// Time-series region.
        #[arg(short, long, default_value = "US")]
        region: String,

        #[arg(short, long, default_value = "anomaly")]
        metric: String,

        /// Region to highlight.
        #[arg(long)]
        selected: Option<String>,

        /// Regional observation CSV.
        #[arg(long)]
        observations: Option<PathBuf>,

        /// Time-series CSV.
        #[arg(long)]
        series: Option<PathBuf>,
    },

    /// Play the year animation and emit one frame summary per tick.
    Animate {
        /// Year the slider starts at.
        #[arg(long, default_value = "2100")]
        from: i32,

        /// Number of ticks to emit.
        #[arg(long, default_value = "16")]
        frames: usize,
    },

    /// Data quality report for a regional observation CSV.
    Validate {
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct FrameSummary {
    year: i32,
    progress: f64,
    mean_temp: f64,
    max_temp: f64,
}

fn main() -> Result<()> {
    climate_views::init_logging("info");

    let cli = Cli::parse();
    let config = ChartConfig::load_or_default(cli.config.as_deref())?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Anomalies { input } => {
            let observations = load_observations(&input, &config)?;
            let dataset = annotate(&observations, &config.baseline);
            eprintln!(
                "✓ {} baselines, {} anomalies ({} regions without baseline)",
                dataset.baselines.len(),
                dataset.observations.len(),
                dataset.missing_baseline_regions.len()
            );
            write_json(output, &dataset)?;
        }

        Commands::SmallMultiples { input } => {
            let observations = load_observations(&input, &config)?;
            let dataset = annotate(&observations, &config.baseline);
            let chart = small_multiples(&dataset, &config);
            eprintln!("✓ {} panels", chart.panels.len());
            write_json(output, &chart)?;
        }

        Commands::Heatmap { input, scenario } => {
            let observations = load_observations(&input, &config)?;
            let layout = heatmap(&observations, scenario, &config);
            eprintln!(
                "✓ {} regions × {} years",
                layout.regions.len(),
                layout.years.len()
            );
            write_json(output, &layout)?;
        }

        Commands::Series { input, region, metric } => {
            let records = load_series(&input)?;
            let selection = time_series(&records, &region, &metric, &config);
            if selection.points.is_empty() {
                eprintln!("⚠️  No {} values for region {}", metric, region);
            }
            write_json(output, &selection)?;
        }

        Commands::Curves { region } => {
            let dataset = Dataset::synthetic(config);
            match region {
                Some(name) => {
                    let canonical = dataset
                        .canonical_region(&name)
                        .with_context(|| format!("Unknown region: {}", name))?;
                    let curve = dataset
                        .curves
                        .get(canonical)
                        .with_context(|| format!("No curve for region: {}", canonical))?;
                    write_json(output, curve)?;
                }
                None => write_json(output, &curve_chart(&dataset.curves, &dataset.config))?,
            }
        }

        Commands::Grid => {
            let dataset = Dataset::synthetic(config);
            eprintln!("✓ {} grid cells", dataset.grid.len());
            write_json(output, dataset.grid.cells())?;
        }

        Commands::Frame { year } => {
            let dataset = Dataset::synthetic(config);
            let frame = map_frame(&dataset, year)
                .with_context(|| format!("Year {} is outside the map range 2025-2100", year))?;
            write_json(output, &frame)?;
        }

        Commands::View {
            year,
            region,
            metric,
            selected,
            observations,
            series,
        } => {
            let observations = match observations {
                Some(path) => load_observations(&path, &config)?,
                None => Vec::new(),
            };
            let series = match series {
                Some(path) => load_series(&path)?,
                None => Vec::new(),
            };

            let dataset = Dataset::new(&observations, series, config);
            let state = ViewState::default()
                .with_year(year)
                .with_region(&region)
                .with_metric(&metric)
                .with_selection(selected.as_deref());

            write_json(output, &derive_view(&dataset, &state))?;
        }

        Commands::Animate { from, frames } => {
            let dataset = Dataset::synthetic(config);
            let mut animation = Animation::new(&dataset.config, from);
            animation.start();

            let summaries: Vec<FrameSummary> = (0..frames)
                .filter_map(|_| animation.tick())
                .filter_map(|year| map_frame(&dataset, year))
                .map(|frame| {
                    let temps: Vec<f64> = frame.cells.iter().map(|c| c.temp).collect();
                    FrameSummary {
                        year: frame.year,
                        progress: frame.progress,
                        mean_temp: temps.iter().sum::<f64>() / temps.len().max(1) as f64,
                        max_temp: temps.iter().cloned().fold(0.0, f64::max),
                    }
                })
                .collect();

            animation.stop();
            write_json(output, &summaries)?;
        }

        Commands::Validate { input } => {
            let observations = load_dataset(&input)?.into_observations()?;
            let engine = DataQualityEngine::new(config.baseline);
            let (_, summary) = engine.partition(observations);
            eprintln!("📋 {}", summary.summary());
            write_json(output, &summary)?;
        }
    }

    Ok(())
}

/// Load observations and drop rows that fail critical quality checks
fn load_observations(path: &Path, config: &ChartConfig) -> Result<Vec<Observation>> {
    eprintln!("📂 Loading {}...", path.display());
    let observations = load_dataset(path)?.into_observations()?;

    let engine = DataQualityEngine::new(config.baseline);
    let (accepted, summary) = engine.partition(observations);
    eprintln!("✓ {}", summary.summary());

    Ok(accepted)
}

fn load_series(path: &Path) -> Result<Vec<TimeSeriesRecord>> {
    eprintln!("📂 Loading {}...", path.display());
    let records = load_dataset(path)?.into_time_series()?;
    eprintln!("✓ Loaded {} time-series rows", records.len());
    Ok(records)
}

fn write_json<T: Serialize + ?Sized>(output: Option<&Path>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value).context("Failed to write JSON")?;
            writer.flush()?;
            eprintln!("💾 Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value).context("Failed to write JSON")?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
