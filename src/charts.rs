// 📊 Chart Layouts - Grouping and filtering for display
//
// Each builder turns already-computed records into the exact shape a chart
// draws. The rendering layer only reads these; it never recomputes.

use crate::baseline::AnomalyDataset;
use crate::config::ChartConfig;
use crate::curves::{RegionalCurves, CURVE_END_YEAR, CURVE_START_YEAR};
use crate::observations::{Observation, Scenario, TimeSeriesRecord};
use crate::palette::ColorRamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// EXTENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    /// Min/max of the finite values; None when there are none
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Extent> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Extent { min: v, max: v }),
                Some(e) => Some(Extent {
                    min: e.min.min(v),
                    max: e.max.max(v),
                }),
            })
    }

    pub fn padded(&self, by: f64) -> Extent {
        Extent {
            min: self.min - by,
            max: self.max + by,
        }
    }

    /// Widen to round tick bounds for about `count` ticks (linear-scale `nice`)
    pub fn nice(&self, count: usize) -> Extent {
        let (mut start, mut stop) = (self.min, self.max);
        if !start.is_finite() || !stop.is_finite() || stop <= start || count == 0 {
            return *self;
        }

        let mut previous = None;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if previous == Some(step) {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            previous = Some(step);
        }

        Extent { min: start, max: stop }
    }
}

/// Tick step as 1, 2 or 5 × 10^k; negative values encode 1 / step for k < 0
fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

/// Tick count the shared anomaly axis is rounded for
const NICE_TICK_COUNT: usize = 10;

/// First-seen order of keys
fn first_seen<T: PartialEq + Clone, I: IntoIterator<Item = T>>(items: I) -> Vec<T> {
    let mut seen: Vec<T> = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

// ============================================================================
// SMALL MULTIPLES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub year: i32,
    pub anomaly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSeries {
    pub scenario: Scenario,
    pub color: Option<String>,
    pub points: Vec<AnomalyPoint>,
}

/// One panel of the grid: a region with one line per scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPanel {
    pub region: String,
    pub row: usize,
    pub col: usize,
    pub series: Vec<ScenarioSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub key: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallMultiples {
    pub panels: Vec<RegionPanel>,
    /// Raw anomaly min/max across all panels
    pub anomaly_extent: Option<Extent>,
    /// Shared y domain: the extent rounded to tick-friendly bounds
    pub anomaly_domain: Option<Extent>,
    pub year_domain: (i32, i32),
    pub legend: Vec<LegendEntry>,
    /// Regions left out because they have no baseline
    pub missing_baseline_regions: Vec<String>,
}

/// Anomaly lines per region and scenario, from `plot_start_year` on
pub fn small_multiples(dataset: &AnomalyDataset, config: &ChartConfig) -> SmallMultiples {
    let plot: Vec<(&Observation, f64)> = dataset
        .with_anomaly()
        .filter(|(a, _)| a.observation.year >= config.plot_start_year)
        .map(|(a, v)| (&a.observation, v))
        .collect();

    let regions = first_seen(plot.iter().map(|(o, _)| o.region.as_str()));
    let columns = config.small_multiple_columns.max(1);

    let panels = regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let rows: Vec<&(&Observation, f64)> =
                plot.iter().filter(|(o, _)| o.region == *region).collect();
            let scenarios = first_seen(rows.iter().map(|(o, _)| o.scenario));

            let series = scenarios
                .into_iter()
                .map(|scenario| ScenarioSeries {
                    scenario,
                    color: config
                        .scenario_palette
                        .color_for(scenario.code())
                        .map(String::from),
                    points: rows
                        .iter()
                        .filter(|(o, _)| o.scenario == scenario)
                        .map(|(o, v)| AnomalyPoint {
                            year: o.year,
                            anomaly: *v,
                        })
                        .collect(),
                })
                .collect();

            RegionPanel {
                region: region.to_string(),
                row: i / columns,
                col: i % columns,
                series,
            }
        })
        .collect();

    let end_year = plot
        .iter()
        .map(|(o, _)| o.year)
        .max()
        .unwrap_or(config.plot_start_year);

    let legend = config
        .scenario_palette
        .domain
        .iter()
        .filter_map(|key| {
            let scenario: Scenario = key.parse().ok()?;
            Some(LegendEntry {
                key: key.clone(),
                label: scenario.label().to_string(),
                color: config.scenario_palette.color_for(key)?.to_string(),
            })
        })
        .collect();

    let anomaly_extent = Extent::from_values(plot.iter().map(|(_, v)| *v));

    SmallMultiples {
        panels,
        anomaly_extent,
        anomaly_domain: anomaly_extent.map(|e| e.nice(NICE_TICK_COUNT)),
        year_domain: (config.plot_start_year, end_year),
        legend,
        missing_baseline_regions: dataset.missing_baseline_regions.clone(),
    }
}

// ============================================================================
// REGIONAL CURVES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCrossing {
    pub region: String,
    /// First year the region's curve reaches the threshold
    pub year: Option<i32>,
}

/// Horizontal reference line across the curve chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLine {
    pub value: f64,
    pub label: String,
    pub crossings: Vec<ThresholdCrossing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveChart {
    pub x_domain: (i32, i32),
    /// Fixed, so the y axis does not move between region selections
    pub y_domain: (f64, f64),
    pub thresholds: Vec<ThresholdLine>,
    pub curves: RegionalCurves,
}

/// Warming curves with their axis domains and policy threshold lines
pub fn curve_chart(curves: &RegionalCurves, config: &ChartConfig) -> CurveChart {
    let thresholds = config
        .curve_thresholds
        .iter()
        .map(|&value| ThresholdLine {
            value,
            label: format!("{}°C threshold", value),
            crossings: curves
                .iter()
                .map(|curve| ThresholdCrossing {
                    region: curve.region.clone(),
                    year: curve.first_year_reaching(value),
                })
                .collect(),
        })
        .collect();

    CurveChart {
        x_domain: (CURVE_START_YEAR, CURVE_END_YEAR),
        y_domain: config.curve_domain,
        thresholds,
        curves: curves.clone(),
    }
}

// ============================================================================
// HEATMAP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub region: String,
    pub year: i32,
    pub july_temp_c: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapLayout {
    /// Sorted ascending, unique
    pub years: Vec<i32>,
    /// First-seen order
    pub regions: Vec<String>,
    pub temp_extent: Option<Extent>,
    pub x_ticks: Vec<i32>,
    pub cells: Vec<HeatmapCell>,
    /// Legend gradient (offset percent, colour)
    pub gradient: Vec<(f64, String)>,
}

/// Region × year grid of raw July temperatures, optionally for one scenario
pub fn heatmap(
    observations: &[Observation],
    scenario: Option<Scenario>,
    config: &ChartConfig,
) -> HeatmapLayout {
    let rows: Vec<&Observation> = observations
        .iter()
        .filter(|o| scenario.map_or(true, |s| o.scenario == s))
        .collect();

    let mut years: Vec<i32> = rows.iter().map(|o| o.year).collect();
    years.sort_unstable();
    years.dedup();

    let regions: Vec<String> = first_seen(rows.iter().map(|o| o.region.clone()));
    let temp_extent = Extent::from_values(rows.iter().map(|o| o.july_temp_c));

    let ramp = match temp_extent {
        Some(e) => ColorRamp::uniform(e.min, e.max, &config.heatmap_colors),
        None => ColorRamp::uniform(0.0, 1.0, &config.heatmap_colors),
    };

    let x_ticks = years
        .iter()
        .copied()
        .filter(|y| y % config.heatmap_tick_every == 0 || *y == config.plot_start_year)
        .collect();

    let cells = rows
        .iter()
        .map(|o| HeatmapCell {
            region: o.region.clone(),
            year: o.year,
            july_temp_c: o.july_temp_c,
            color: ramp.color_at(o.july_temp_c),
        })
        .collect();

    HeatmapLayout {
        years,
        regions,
        temp_extent,
        x_ticks,
        cells,
        gradient: ColorRamp::uniform(0.0, 1.0, &config.heatmap_colors).gradient_stops(),
    }
}

// ============================================================================
// TIME SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSelection {
    pub region: String,
    pub metric: String,
    pub color: Option<String>,
    pub points: Vec<SeriesPoint>,
    pub date_extent: Option<(NaiveDate, NaiveDate)>,
    /// Value extent padded by `series_padding` on both sides
    pub value_domain: Option<Extent>,
}

/// One region's line for one metric; rows without the metric are skipped
pub fn time_series(
    records: &[TimeSeriesRecord],
    region: &str,
    metric: &str,
    config: &ChartConfig,
) -> SeriesSelection {
    let points: Vec<SeriesPoint> = records
        .iter()
        .filter(|r| r.region == region)
        .filter_map(|r| {
            r.metric(metric)
                .filter(|v| v.is_finite())
                .map(|value| SeriesPoint { date: r.date, value })
        })
        .collect();

    let date_extent = points
        .iter()
        .map(|p| p.date)
        .min()
        .zip(points.iter().map(|p| p.date).max());

    SeriesSelection {
        region: region.to_string(),
        metric: metric.to_string(),
        color: config.series_palette.color_for(region).map(String::from),
        value_domain: Extent::from_values(points.iter().map(|p| p.value))
            .map(|e| e.padded(config.series_padding)),
        date_extent,
        points,
    }
}

// ============================================================================
// TESTS
// ============================================================================
