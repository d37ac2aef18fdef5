// Climate Views - Core Library
// Derived datasets for the climate charts, exposed for the CLI, API server, and tests

pub mod observations;
pub mod parser;
pub mod data_quality;
pub mod baseline;  // Baseline-anomaly transform
pub mod regions;
pub mod curves;    // Synthetic regional warming curves
pub mod grid;      // Synthetic warming grid
pub mod palette;
pub mod config;
pub mod charts;
pub mod view;

// Re-export commonly used types
pub use observations::{load_csv, read_observations, Observation, Scenario, TimeSeriesRecord};
pub use parser::{
    DatasetParser, ObservationParser, TimeSeriesParser, ParsedDataset, SourceKind,
    detect_source, get_parser, load_dataset,
};
pub use data_quality::{
    DataQualityEngine, QualityReport, QualityIssue, Severity, BatchSummary,
};
pub use baseline::{
    Anomaly, AnomalyDataset, AnomalyObservation, BaselineMap, BaselineWindow,
    annotate, compute_baselines, derive_anomalies,
};
pub use regions::{RegionPreset, RegionRegistry};
pub use curves::{generate_temperature_curve, warming_factor, CurvePoint, RegionCurve, RegionalCurves};
pub use grid::{
    cell_temperature, cell_terms, generate_grid, temperature_at_year,
    CellTerms, GridCell, GridField, GridSpec,
};
pub use palette::{ColorRamp, OrdinalPalette};
pub use config::ChartConfig;
pub use charts::{
    curve_chart, heatmap, small_multiples, time_series, CurveChart, Extent, HeatmapLayout,
    SeriesSelection, SmallMultiples,
};
pub use view::{derive_view, map_frame, Animation, Dataset, DerivedView, MapFrame, ViewState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for the binaries
///
/// `RUST_LOG` overrides the default filter.
pub fn init_logging(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
