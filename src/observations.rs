// 🌡️ Observations - Regional July temperature records
// Loaded once from CSV, immutable afterwards. Everything downstream is derived.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// SCENARIO
// ============================================================================

/// Emissions pathway attached to an observation
///
/// Parsed case-insensitively everywhere (CSV, config JSON, CLI, query strings);
/// always written lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Scenario {
    Historical,
    Ssp245,
    Ssp585,
}

impl Scenario {
    /// Code used in CSV files and JSON output
    pub fn code(&self) -> &'static str {
        match self {
            Scenario::Historical => "historical",
            Scenario::Ssp245 => "ssp245",
            Scenario::Ssp585 => "ssp585",
        }
    }

    /// Human-readable legend label
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Historical => "Historical",
            Scenario::Ssp245 => "Medium Emission (ssp245)",
            Scenario::Ssp585 => "High Emission (ssp585)",
        }
    }

    pub fn all() -> [Scenario; 3] {
        [Scenario::Historical, Scenario::Ssp245, Scenario::Ssp585]
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "historical" => Ok(Scenario::Historical),
            "ssp245" => Ok(Scenario::Ssp245),
            "ssp585" => Ok(Scenario::Ssp585),
            other => Err(anyhow::anyhow!("Unknown scenario: {:?}", other)),
        }
    }
}

impl TryFrom<String> for Scenario {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

// ============================================================================
// OBSERVATION
// ============================================================================

/// One regional July temperature value for a year under a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region: String,
    pub year: i32,
    pub scenario: Scenario,
    pub july_temp_c: f64,
}

impl Observation {
    pub fn new(region: &str, year: i32, scenario: Scenario, july_temp_c: f64) -> Self {
        Observation {
            region: region.to_string(),
            year,
            scenario,
            july_temp_c,
        }
    }

    /// Identity of the record within a dataset: (region, year, scenario)
    pub fn key(&self) -> (&str, i32, Scenario) {
        (self.region.as_str(), self.year, self.scenario)
    }
}

/// Read observations from any CSV source with a `region,year,scenario,july_temp_c` header
///
/// Rows are rejected here, at the loader boundary, when a field is missing,
/// non-numeric, or the region is blank. The core never sees malformed records.
pub fn read_observations<R: io::Read>(reader: R, source_name: &str) -> Result<Vec<Observation>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut observations = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        // +2: 1-indexed plus header row
        let line = index + 2;
        let observation: Observation = result.with_context(|| {
            format!("Failed to deserialize observation on line {} of {}", line, source_name)
        })?;

        anyhow::ensure!(
            !observation.region.is_empty(),
            "Missing region on line {} of {}",
            line,
            source_name
        );
        anyhow::ensure!(
            observation.july_temp_c.is_finite(),
            "Non-finite temperature on line {} of {}",
            line,
            source_name
        );

        observations.push(observation);
    }

    tracing::debug!(source = source_name, count = observations.len(), "loaded observations");

    Ok(observations)
}

/// Load observations from a CSV file
pub fn load_csv(csv_path: &Path) -> Result<Vec<Observation>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    read_observations(file, &csv_path.display().to_string())
}

// ============================================================================
// TIME SERIES RECORD
// ============================================================================

/// One dated row of a regional time series (`date,region,<metric>...`)
///
/// Metric columns are open-ended: `anomaly`, `temp`, `value`... A blank cell
/// means the metric is absent for that row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub date: NaiveDate,
    pub region: String,
    pub metrics: BTreeMap<String, f64>,
}

impl TimeSeriesRecord {
    pub fn new(date: NaiveDate, region: &str) -> Self {
        TimeSeriesRecord {
            date,
            region: region.to_string(),
            metrics: BTreeMap::new(),
        }
    }

    /// Builder pattern: add a metric value
    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("historical".parse::<Scenario>().unwrap(), Scenario::Historical);
        assert_eq!(" SSP245 ".parse::<Scenario>().unwrap(), Scenario::Ssp245);
        assert_eq!("ssp585".parse::<Scenario>().unwrap(), Scenario::Ssp585);
        assert!("ssp126".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_read_observations() {
        let csv = "region,year,scenario,july_temp_c\n\
                   Northeast,1850,historical,21.5\n\
                   Northeast,2030,ssp585,23.25\n";

        let observations = read_observations(csv.as_bytes(), "inline.csv").unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0], Observation::new("Northeast", 1850, Scenario::Historical, 21.5));
        assert_eq!(observations[1].scenario, Scenario::Ssp585);
        assert_eq!(observations[1].july_temp_c, 23.25);
    }

    #[test]
    fn test_csv_scenario_is_case_insensitive() {
        let csv = "region,year,scenario,july_temp_c\n\
                   Northeast,1850,Historical,21.5\n\
                   Northeast,2030,SSP245,23.0\n";

        let observations = read_observations(csv.as_bytes(), "inline.csv").unwrap();
        assert_eq!(observations[0].scenario, Scenario::Historical);
        assert_eq!(observations[1].scenario, Scenario::Ssp245);

        // Written back in canonical lowercase
        let json = serde_json::to_value(&observations[1]).unwrap();
        assert_eq!(json["scenario"], "ssp245");
    }

    #[test]
    fn test_rejects_non_numeric_temperature() {
        let csv = "region,year,scenario,july_temp_c\n\
                   West,1850,historical,warm\n";

        let err = read_observations(csv.as_bytes(), "bad.csv").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_rejects_missing_region() {
        let csv = "region,year,scenario,july_temp_c\n\
                   ,1850,historical,20.0\n";

        let err = read_observations(csv.as_bytes(), "bad.csv").unwrap_err();
        assert!(err.to_string().contains("Missing region"));
    }

    #[test]
    fn test_rejects_unknown_scenario() {
        let csv = "region,year,scenario,july_temp_c\n\
                   West,2050,ssp126,20.0\n";

        assert!(read_observations(csv.as_bytes(), "bad.csv").is_err());
    }

    #[test]
    fn test_load_csv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regional_july.csv");
        std::fs::write(
            &path,
            "region,year,scenario,july_temp_c\nMidwest,1875,historical,22.0\n",
        )
        .unwrap();

        let observations = load_csv(&path).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].region, "Midwest");
    }

    #[test]
    fn test_time_series_metric_lookup() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let record = TimeSeriesRecord::new(date, "US").with_metric("anomaly", 0.42);

        assert_eq!(record.metric("anomaly"), Some(0.42));
        assert_eq!(record.metric("temp"), None);
    }
}
