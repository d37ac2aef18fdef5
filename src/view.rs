//! View derivation: (year, region, metric, selection) in, chart data out
//!
//! `ViewState` is owned by the caller. Every change of year, metric or region
//! is a fresh call to [`derive_view`]; nothing is updated in place.

use crate::baseline::{annotate, AnomalyDataset};
use crate::charts::{time_series, SeriesSelection};
use crate::config::ChartConfig;
use crate::curves::RegionalCurves;
use crate::grid::{temperature_at_year, year_progress, GridField, MAP_END_YEAR, MAP_START_YEAR};
use crate::observations::{Observation, TimeSeriesRecord};
use crate::regions::RegionRegistry;
use serde::{Deserialize, Serialize};

// ============================================================================
// DATASET
// ============================================================================

/// Everything computed once per load
#[derive(Debug, Clone)]
pub struct Dataset {
    pub config: ChartConfig,
    pub anomalies: AnomalyDataset,
    pub series: Vec<TimeSeriesRecord>,
    pub curves: RegionalCurves,
    pub grid: GridField,
    pub regions: RegionRegistry,
}

impl Dataset {
    pub fn new(
        observations: &[Observation],
        series: Vec<TimeSeriesRecord>,
        config: ChartConfig,
    ) -> Self {
        Dataset {
            anomalies: annotate(observations, &config.baseline),
            series,
            curves: RegionalCurves::from_presets(&config.regions),
            grid: GridField::new(config.grid),
            regions: RegionRegistry::new(config.regions.clone()),
            config,
        }
    }

    /// Synthetic curves and grid only
    pub fn synthetic(config: ChartConfig) -> Self {
        Self::new(&[], Vec::new(), config)
    }

    /// Resolve a user-supplied region name (alias or slug) to its canonical name
    pub fn canonical_region(&self, name: &str) -> Option<&str> {
        self.regions.find(name).map(|r| r.name.as_str())
    }
}

// ============================================================================
// VIEW STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Map year (slider position)
    pub year: i32,

    /// Time-series region
    pub region: String,

    /// Time-series metric column
    pub metric: String,

    /// Region highlighted on the map and curve chart
    pub selected_region: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            year: MAP_END_YEAR,
            region: "US".to_string(),
            metric: "anomaly".to_string(),
            selected_region: None,
        }
    }
}

impl ViewState {
    /// Move the slider, clamped to the map range
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year.clamp(MAP_START_YEAR, MAP_END_YEAR);
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    pub fn with_metric(mut self, metric: &str) -> Self {
        self.metric = metric.to_string();
        self
    }

    pub fn with_selection(mut self, region: Option<&str>) -> Self {
        self.selected_region = region.map(String::from);
        self
    }
}

// ============================================================================
// MAP FRAME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCell {
    pub lat: f64,
    pub lon: f64,
    pub temp2100: f64,
    /// Warming at the frame year
    pub temp: f64,
    pub color: String,
    /// Region whose boundary contains the cell
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFrame {
    pub year: i32,
    pub progress: f64,
    pub cells: Vec<FrameCell>,
}

/// Map colours for one year; None outside the slider range
pub fn map_frame(dataset: &Dataset, year: i32) -> Option<MapFrame> {
    let progress = year_progress(year)?;

    let cells = dataset
        .grid
        .cells()
        .iter()
        .filter_map(|cell| {
            let temp = temperature_at_year(cell, year)?;
            Some(FrameCell {
                lat: cell.lat,
                lon: cell.lon,
                temp2100: cell.temp2100,
                temp,
                color: dataset.config.map_ramp.color_at(temp),
                region: dataset
                    .regions
                    .region_at(cell.lon, cell.lat)
                    .map(|r| r.name.clone()),
            })
        })
        .collect();

    Some(MapFrame { year, progress, cells })
}

// ============================================================================
// DERIVED VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReading {
    pub region: String,
    pub color: String,
    /// Curve temperature at the view year
    pub temp: Option<f64>,
    pub highlighted: bool,
    pub dimmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedView {
    pub state: ViewState,
    pub frame: Option<MapFrame>,
    pub regions: Vec<RegionReading>,
    /// Year marker position on the curve chart
    pub year_marker: Option<i32>,
    pub series: SeriesSelection,
}

/// The single recompute path behind slider, dropdown, button and animation
pub fn derive_view(dataset: &Dataset, state: &ViewState) -> DerivedView {
    let selected = state
        .selected_region
        .as_deref()
        .and_then(|name| dataset.canonical_region(name));

    let regions = dataset
        .curves
        .iter()
        .map(|curve| {
            let highlighted = selected == Some(curve.region.as_str());
            RegionReading {
                region: curve.region.clone(),
                color: curve.color.clone(),
                temp: curve.temperature_at(state.year),
                highlighted,
                dimmed: selected.is_some() && !highlighted,
            }
        })
        .collect();

    let frame = map_frame(dataset, state.year);

    DerivedView {
        state: state.clone(),
        year_marker: frame.as_ref().map(|f| f.year),
        frame,
        regions,
        series: time_series(&dataset.series, &state.region, &state.metric, &dataset.config),
    }
}

// ============================================================================
// ANIMATION
// ============================================================================

/// Play/pause stepper over the map years
///
/// Front-ends call `tick` on their own timer (`interval_ms`); each returned
/// year is fed back through `derive_view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    year: i32,
    playing: bool,
    step: i32,
    pub interval_ms: u64,
}

impl Animation {
    pub fn new(config: &ChartConfig, year: i32) -> Self {
        Animation {
            year: year.clamp(MAP_START_YEAR, MAP_END_YEAR),
            playing: false,
            step: config.animation.step_years.max(1),
            interval_ms: config.animation.interval_ms,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start playback; from the end of the range it restarts at the beginning
    pub fn start(&mut self) {
        self.playing = true;
        if self.year >= MAP_END_YEAR {
            self.year = MAP_START_YEAR;
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Slider moved by the user
    pub fn seek(&mut self, year: i32) {
        self.year = year.clamp(MAP_START_YEAR, MAP_END_YEAR);
    }

    /// Advance one step, wrapping past the end; None while stopped
    pub fn tick(&mut self) -> Option<i32> {
        if !self.playing {
            return None;
        }

        self.year += self.step;
        if self.year > MAP_END_YEAR {
            self.year = MAP_START_YEAR;
        }
        Some(self.year)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::Scenario;
    use chrono::NaiveDate;

    fn dataset() -> Dataset {
        let observations = vec![
            Observation::new("West", 1850, Scenario::Historical, 20.0),
            Observation::new("West", 2050, Scenario::Ssp585, 23.0),
        ];
        let series = vec![TimeSeriesRecord::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), "US")
            .with_metric("anomaly", 0.5)];

        Dataset::new(&observations, series, ChartConfig::default())
    }

    #[test]
    fn test_dataset_builds_everything() {
        let data = dataset();

        assert_eq!(data.anomalies.baselines.get("West"), Some(20.0));
        assert_eq!(data.curves.len(), 5);
        assert_eq!(data.grid.len(), 32 * 61);
        assert_eq!(data.canonical_region("pnw"), Some("Pacific Northwest"));
    }

    #[test]
    fn test_view_state_clamps_year() {
        assert_eq!(ViewState::default().with_year(1990).year, 2025);
        assert_eq!(ViewState::default().with_year(3000).year, 2100);
        assert_eq!(ViewState::default().with_year(2060).year, 2060);
    }

    #[test]
    fn test_map_frame_scales_by_progress() {
        let data = dataset();

        let start = map_frame(&data, 2025).unwrap();
        assert_eq!(start.progress, 0.0);
        assert!(start.cells.iter().all(|c| c.temp == 0.0));

        let end = map_frame(&data, 2100).unwrap();
        assert_eq!(end.progress, 1.0);
        assert!(end.cells.iter().all(|c| c.temp == c.temp2100));
        assert_eq!(end.cells.len(), data.grid.len());

        assert!(map_frame(&data, 2101).is_none());
    }

    #[test]
    fn test_map_frame_tags_regions() {
        let data = dataset();
        let frame = map_frame(&data, 2100).unwrap();

        let cell = frame
            .cells
            .iter()
            .find(|c| c.lon == -100.0 && (c.lat - 41.0).abs() < 1e-9)
            .unwrap();
        assert_eq!(cell.region.as_deref(), Some("Great Plains"));
    }

    #[test]
    fn test_derive_view_highlight() {
        let data = dataset();
        let state = ViewState::default().with_selection(Some("Great-Plains"));
        let view = derive_view(&data, &state);

        let plains = view.regions.iter().find(|r| r.region == "Great Plains").unwrap();
        assert!(plains.highlighted);
        assert!(!plains.dimmed);
        assert!(view
            .regions
            .iter()
            .filter(|r| r.region != "Great Plains")
            .all(|r| r.dimmed && !r.highlighted));
    }

    #[test]
    fn test_derive_view_without_selection() {
        let data = dataset();
        let view = derive_view(&data, &ViewState::default());

        assert!(view.regions.iter().all(|r| !r.highlighted && !r.dimmed));
        assert_eq!(view.year_marker, Some(2100));
        assert_eq!(view.series.points.len(), 1);
        assert_eq!(
            view.regions[0].temp,
            data.curves.temperature_at("Southwest Interior", 2100)
        );
    }

    #[test]
    fn test_derive_view_is_idempotent() {
        let data = dataset();
        let state = ViewState::default().with_year(2060);

        let first = serde_json::to_string(&derive_view(&data, &state)).unwrap();
        let second = serde_json::to_string(&derive_view(&data, &state)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_range_state_year_has_no_frame() {
        let data = dataset();
        let state = ViewState {
            year: 1990,
            ..ViewState::default()
        };
        let view = derive_view(&data, &state);

        assert!(view.frame.is_none());
        assert!(view.year_marker.is_none());
        assert!(view.regions.iter().all(|r| r.temp.is_none()));
    }

    #[test]
    fn test_animation_restarts_from_end() {
        let mut animation = Animation::new(&ChartConfig::default(), 2100);

        animation.start();
        assert!(animation.is_playing());
        assert_eq!(animation.year(), 2025);
        assert_eq!(animation.tick(), Some(2030));
    }

    #[test]
    fn test_animation_wraps() {
        let mut animation = Animation::new(&ChartConfig::default(), 2090);
        animation.start();

        assert_eq!(animation.tick(), Some(2095));
        assert_eq!(animation.tick(), Some(2100));
        assert_eq!(animation.tick(), Some(2025));
    }

    #[test]
    fn test_animation_stop_cancels_ticks() {
        let mut animation = Animation::new(&ChartConfig::default(), 2050);

        assert_eq!(animation.tick(), None);
        animation.toggle();
        assert_eq!(animation.tick(), Some(2055));
        animation.toggle();
        assert!(!animation.is_playing());
        assert_eq!(animation.tick(), None);
        assert_eq!(animation.year(), 2055);
    }

    #[test]
    fn test_animation_seek() {
        let mut animation = Animation::new(&ChartConfig::default(), 2050);
        animation.seek(2062);
        animation.start();
        assert_eq!(animation.tick(), Some(2067));
    }
}
