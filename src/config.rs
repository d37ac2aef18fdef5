// ⚙️ Chart Configuration - JSON file, every field optional
//
// Missing fields fall back to the built-in defaults, so `{}` is a valid config.

use crate::baseline::BaselineWindow;
use crate::grid::{GridSpec, MAX_AXIS_SAMPLES};
use crate::palette::{inferno_stops, parse_hex_color, ColorRamp, OrdinalPalette};
use crate::regions::{default_presets, RegionPreset};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Years advanced per tick
    pub step_years: i32,

    /// Delay between ticks for playback front-ends
    pub interval_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            step_years: 5,
            interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub baseline: BaselineWindow,

    /// First year shown on the anomaly small multiples
    pub plot_start_year: i32,

    /// Panels per row on the small-multiples grid
    pub small_multiple_columns: usize,

    pub grid: GridSpec,
    pub animation: AnimationConfig,
    pub regions: Vec<RegionPreset>,

    /// Map colour ramp (warming in °C)
    pub map_ramp: ColorRamp,

    /// Sequential stops for the heatmap, spread over the data extent
    pub heatmap_colors: Vec<String>,

    pub scenario_palette: OrdinalPalette,
    pub series_palette: OrdinalPalette,

    /// Padding added above and below the time-series value extent
    pub series_padding: f64,

    /// Heatmap x ticks: every year divisible by this, plus the first projection year
    pub heatmap_tick_every: i32,

    /// Reference lines drawn across the curve chart (°C)
    pub curve_thresholds: Vec<f64>,

    /// Fixed y domain of the curve chart (°C)
    pub curve_domain: (f64, f64),
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            baseline: BaselineWindow::default(),
            plot_start_year: 2025,
            small_multiple_columns: 2,
            grid: GridSpec::default(),
            animation: AnimationConfig::default(),
            regions: default_presets(),
            map_ramp: ColorRamp::warming(),
            heatmap_colors: inferno_stops(),
            scenario_palette: OrdinalPalette::scenarios(),
            series_palette: OrdinalPalette::series_regions(),
            series_padding: 0.2,
            heatmap_tick_every: 10,
            curve_thresholds: vec![2.0, 4.0],
            curve_domain: (0.0, 6.5),
        }
    }
}

impl ChartConfig {
    /// Load config from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json_str(&content)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: ChartConfig =
            serde_json::from_str(content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.baseline.start_year <= self.baseline.end_year,
            "Baseline window starts after it ends ({} > {})",
            self.baseline.start_year,
            self.baseline.end_year
        );
        anyhow::ensure!(self.small_multiple_columns > 0, "small_multiple_columns must be positive");
        anyhow::ensure!(self.animation.step_years > 0, "animation.step_years must be positive");
        anyhow::ensure!(
            self.grid.lat.step > 0.0 && self.grid.lon.step > 0.0,
            "Grid steps must be positive"
        );
        for (name, axis) in [("lat", &self.grid.lat), ("lon", &self.grid.lon)] {
            anyhow::ensure!(
                !axis.is_empty() && axis.len() <= MAX_AXIS_SAMPLES,
                "Grid {} axis yields {} samples (expected 1..={})",
                name,
                axis.len(),
                MAX_AXIS_SAMPLES
            );
        }
        anyhow::ensure!(
            self.map_ramp.domain.windows(2).all(|w| w[0] <= w[1]),
            "map_ramp domain must be ascending"
        );
        anyhow::ensure!(self.heatmap_colors.len() >= 2, "heatmap_colors needs at least 2 colours");
        anyhow::ensure!(self.series_padding >= 0.0, "series_padding must not be negative");
        anyhow::ensure!(self.heatmap_tick_every > 0, "heatmap_tick_every must be positive");

        let (low, high) = self.curve_domain;
        anyhow::ensure!(
            low.is_finite() && high.is_finite() && low < high,
            "curve_domain must be an ascending pair of finite values"
        );
        anyhow::ensure!(
            self.curve_thresholds.iter().all(|t| t.is_finite()),
            "curve_thresholds must be finite"
        );

        let colors = self
            .map_ramp
            .colors
            .iter()
            .chain(&self.heatmap_colors)
            .chain(&self.scenario_palette.colors)
            .chain(&self.series_palette.colors)
            .chain(self.regions.iter().map(|r| &r.color));
        for color in colors {
            anyhow::ensure!(
                parse_hex_color(color).is_some(),
                "Invalid colour {:?} (expected #RRGGBB)",
                color
            );
        }

        for region in &self.regions {
            anyhow::ensure!(
                region.final_temp.is_finite() && region.rate.is_finite(),
                "Region {} has non-finite curve parameters",
                region.name
            );
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = ChartConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ChartConfig::default());
        assert_eq!(config.baseline.start_year, 1850);
        assert_eq!(config.baseline.end_year, 1900);
        assert_eq!(config.animation.step_years, 5);
        assert_eq!(config.regions.len(), 5);
    }

    #[test]
    fn test_partial_override() {
        let config = ChartConfig::from_json_str(
            r#"{"plot_start_year": 2030, "animation": {"interval_ms": 250}}"#,
        )
        .unwrap();

        assert_eq!(config.plot_start_year, 2030);
        assert_eq!(config.animation.interval_ms, 250);
        assert_eq!(config.animation.step_years, 5);
    }

    #[test]
    fn test_custom_regions() {
        let config = ChartConfig::from_json_str(
            r##"{"regions": [{"name": "Alaska", "color": "#123456", "final_temp": 6.0, "rate": 1.3}]}"##,
        )
        .unwrap();

        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.regions[0].name, "Alaska");
        assert!(config.regions[0].boundary.is_empty());
    }

    #[test]
    fn test_rejects_inverted_baseline() {
        let result = ChartConfig::from_json_str(
            r#"{"baseline": {"scenario": "historical", "start_year": 1900, "end_year": 1850}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_step() {
        let result = ChartConfig::from_json_str(r#"{"animation": {"step_years": 0}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unparsable_colors() {
        let ramp = ChartConfig::from_json_str(
            r##"{"map_ramp": {"domain": [0.0, 7.0], "colors": ["ab€d", "#ffffff"]}}"##,
        );
        assert!(ramp.is_err());

        let heatmap = ChartConfig::from_json_str(r##"{"heatmap_colors": ["#000000", "red"]}"##);
        assert!(heatmap.is_err());

        let region = ChartConfig::from_json_str(
            r##"{"regions": [{"name": "Alaska", "color": "blue", "final_temp": 6.0, "rate": 1.3}]}"##,
        );
        assert!(region.is_err());
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let result = ChartConfig::from_json_str(
            r#"{"grid": {"lat": {"start": 25.0, "stop": 50.5, "step": 1e-12},
                         "lon": {"start": -125.0, "stop": -64.5, "step": 1.0}}}"#,
        );
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("lat axis"));

        let empty = ChartConfig::from_json_str(
            r#"{"grid": {"lat": {"start": 50.0, "stop": 25.0, "step": 0.8},
                         "lon": {"start": -125.0, "stop": -64.5, "step": 1.0}}}"#,
        );
        assert!(empty.is_err());
    }

    #[test]
    fn test_curve_chart_defaults_and_overrides() {
        let config = ChartConfig::default();
        assert_eq!(config.curve_thresholds, vec![2.0, 4.0]);
        assert_eq!(config.curve_domain, (0.0, 6.5));

        let custom = ChartConfig::from_json_str(r#"{"curve_domain": [0.0, 8.0]}"#).unwrap();
        assert_eq!(custom.curve_domain, (0.0, 8.0));

        assert!(ChartConfig::from_json_str(r#"{"curve_domain": [6.5, 0.0]}"#).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(ChartConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts.json");
        fs::write(&path, r#"{"series_padding": 0.5}"#).unwrap();

        let config = ChartConfig::from_file(&path).unwrap();
        assert_eq!(config.series_padding, 0.5);

        assert!(ChartConfig::from_file(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_load_or_default() {
        let config = ChartConfig::load_or_default(None).unwrap();
        assert_eq!(config.small_multiple_columns, 2);
    }
}
