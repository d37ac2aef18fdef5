// 📐 Baseline-Anomaly Transform
// Per-region mean over a historical reference window, then every observation
// expressed relative to its region's baseline.
//
// Pure functions: same observations in, same baselines and anomalies out.

use crate::observations::{Observation, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// BASELINE WINDOW
// ============================================================================

/// Reference window used to compute baselines (inclusive year bounds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineWindow {
    pub scenario: Scenario,
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for BaselineWindow {
    fn default() -> Self {
        BaselineWindow {
            scenario: Scenario::Historical,
            start_year: 1850,
            end_year: 1900,
        }
    }
}

impl BaselineWindow {
    pub fn contains(&self, observation: &Observation) -> bool {
        observation.scenario == self.scenario
            && observation.year >= self.start_year
            && observation.year <= self.end_year
    }
}

// ============================================================================
// BASELINE MAP
// ============================================================================

/// Region → mean temperature over the baseline window
///
/// A region only has an entry when at least one observation fell inside the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineMap {
    baselines: BTreeMap<String, f64>,
}

impl BaselineMap {
    pub fn get(&self, region: &str) -> Option<f64> {
        self.baselines.get(region).copied()
    }

    pub fn contains(&self, region: &str) -> bool {
        self.baselines.contains_key(region)
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.baselines.iter().map(|(region, value)| (region.as_str(), *value))
    }
}

/// Compute the per-region baseline over `window`
pub fn compute_baselines(observations: &[Observation], window: &BaselineWindow) -> BaselineMap {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for obs in observations.iter().filter(|o| window.contains(o)) {
        let entry = sums.entry(obs.region.as_str()).or_insert((0.0, 0));
        entry.0 += obs.july_temp_c;
        entry.1 += 1;
    }

    let baselines = sums
        .into_iter()
        .map(|(region, (sum, count))| (region.to_string(), sum / count as f64))
        .collect();

    BaselineMap { baselines }
}

// ============================================================================
// ANOMALY
// ============================================================================

/// Difference from baseline, or an explicit marker when the region has none
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Anomaly {
    Value(f64),
    MissingBaseline,
}

impl Anomaly {
    pub fn value(&self) -> Option<f64> {
        match self {
            Anomaly::Value(v) => Some(*v),
            Anomaly::MissingBaseline => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Anomaly::MissingBaseline)
    }
}

/// Observation augmented with its anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyObservation {
    #[serde(flatten)]
    pub observation: Observation,
    pub anomaly: Anomaly,
}

pub fn anomaly_for(observation: &Observation, baselines: &BaselineMap) -> Anomaly {
    match baselines.get(&observation.region) {
        Some(baseline) => Anomaly::Value(observation.july_temp_c - baseline),
        None => Anomaly::MissingBaseline,
    }
}

/// Attach an anomaly to every observation, in input order
pub fn derive_anomalies(
    observations: &[Observation],
    baselines: &BaselineMap,
) -> Vec<AnomalyObservation> {
    observations
        .iter()
        .map(|obs| AnomalyObservation {
            observation: obs.clone(),
            anomaly: anomaly_for(obs, baselines),
        })
        .collect()
}

// ============================================================================
// ANOMALY DATASET
// ============================================================================

/// Result of running the full transform over one loaded dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDataset {
    pub window: BaselineWindow,
    pub baselines: BaselineMap,
    pub observations: Vec<AnomalyObservation>,
    /// Regions that appear in the data but have no baseline (sorted)
    pub missing_baseline_regions: Vec<String>,
}

/// Compute baselines, then anomalies, for a whole dataset
pub fn annotate(observations: &[Observation], window: &BaselineWindow) -> AnomalyDataset {
    let baselines = compute_baselines(observations, window);
    let annotated = derive_anomalies(observations, &baselines);

    let mut missing: Vec<String> = annotated
        .iter()
        .filter(|a| a.anomaly.is_missing())
        .map(|a| a.observation.region.clone())
        .collect();
    missing.sort();
    missing.dedup();

    for region in &missing {
        tracing::warn!(region = %region, "no baseline observations in reference window");
    }
    tracing::debug!(
        regions = baselines.len(),
        observations = annotated.len(),
        "computed baselines and anomalies"
    );

    AnomalyDataset {
        window: *window,
        baselines,
        observations: annotated,
        missing_baseline_regions: missing,
    }
}

impl AnomalyDataset {
    /// Observations that carry a usable anomaly
    pub fn with_anomaly(&self) -> impl Iterator<Item = (&AnomalyObservation, f64)> {
        self.observations
            .iter()
            .filter_map(|a| a.anomaly.value().map(|v| (a, v)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
