// 🏗️ Parser Framework - Dataset loaders
// One trait, one parser per CSV layout, detection by filename then header.

use crate::observations::{read_observations, Observation, TimeSeriesRecord};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceKind - Which CSV layout a file uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// `region,year,scenario,july_temp_c`
    RegionalObservations,

    /// `date,region,<metric>...`
    TimeSeries,
}

impl SourceKind {
    pub fn name(&self) -> &str {
        match self {
            SourceKind::RegionalObservations => "Regional observations",
            SourceKind::TimeSeries => "Regional time series",
        }
    }
}

/// Output of `DatasetParser::parse`
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDataset {
    Observations(Vec<Observation>),
    TimeSeries(Vec<TimeSeriesRecord>),
}

impl ParsedDataset {
    pub fn len(&self) -> usize {
        match self {
            ParsedDataset::Observations(o) => o.len(),
            ParsedDataset::TimeSeries(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_observations(self) -> Result<Vec<Observation>> {
        match self {
            ParsedDataset::Observations(o) => Ok(o),
            ParsedDataset::TimeSeries(_) => {
                Err(anyhow::anyhow!("Expected regional observations, got a time series"))
            }
        }
    }

    pub fn into_time_series(self) -> Result<Vec<TimeSeriesRecord>> {
        match self {
            ParsedDataset::TimeSeries(s) => Ok(s),
            ParsedDataset::Observations(_) => {
                Err(anyhow::anyhow!("Expected a time series, got regional observations"))
            }
        }
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// DatasetParser - One implementation per CSV layout
pub trait DatasetParser: Send + Sync {
    /// Parse a file into typed records; malformed rows fail the whole file
    fn parse(&self, file_path: &Path) -> Result<ParsedDataset>;

    fn source_kind(&self) -> SourceKind;
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect the layout of a file
///
/// # Strategy:
/// 1. Filename patterns ("*timeseries*", "*series*" → TimeSeries)
/// 2. Otherwise peek at the CSV header
pub fn detect_source(file_path: &Path) -> Result<SourceKind> {
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if filename.contains("timeseries") || filename.contains("time_series") || filename.contains("series") {
        return Ok(SourceKind::TimeSeries);
    }

    let header = read_header(file_path)?;
    detect_from_header(&header).ok_or_else(|| {
        anyhow::anyhow!(
            "Could not detect dataset layout of {} from header: {:?}",
            file_path.display(),
            header
        )
    })
}

/// Layout implied by a list of column names
pub fn detect_from_header(columns: &[String]) -> Option<SourceKind> {
    let has = |name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));

    if has("july_temp_c") && has("scenario") {
        Some(SourceKind::RegionalObservations)
    } else if has("date") {
        Some(SourceKind::TimeSeries)
    } else {
        None
    }
}

fn read_header(file_path: &Path) -> Result<Vec<String>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .with_context(|| format!("Failed to read header of {}", file_path.display()))?;

    Ok(first_line
        .trim()
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect())
}

/// Parser for a layout (Box<dyn DatasetParser> for polymorphism)
pub fn get_parser(kind: SourceKind) -> Box<dyn DatasetParser> {
    match kind {
        SourceKind::RegionalObservations => Box::new(ObservationParser::new()),
        SourceKind::TimeSeries => Box::new(TimeSeriesParser::new()),
    }
}

/// Detect, then parse
pub fn load_dataset(file_path: &Path) -> Result<ParsedDataset> {
    let kind = detect_source(file_path)?;
    tracing::info!(path = %file_path.display(), kind = kind.name(), "loading dataset");
    get_parser(kind).parse(file_path)
}

// ============================================================================
// PARSERS
// ============================================================================

pub struct ObservationParser;

impl ObservationParser {
    pub fn new() -> Self {
        ObservationParser
    }
}

impl Default for ObservationParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetParser for ObservationParser {
    fn parse(&self, file_path: &Path) -> Result<ParsedDataset> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        let observations = read_observations(file, &file_path.display().to_string())?;
        Ok(ParsedDataset::Observations(observations))
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::RegionalObservations
    }
}

pub struct TimeSeriesParser;

impl TimeSeriesParser {
    pub fn new() -> Self {
        TimeSeriesParser
    }

    /// Accepts "YYYY-MM-DD", "YYYY-MM" and "YYYY" (first day of the period)
    pub fn parse_date(value: &str) -> Result<NaiveDate> {
        let value = value.trim();

        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(date);
        }
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d") {
            return Ok(date);
        }
        if let Ok(year) = value.parse::<i32>() {
            if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
                return Ok(date);
            }
        }

        Err(anyhow::anyhow!("Unrecognised date: {:?}", value))
    }

    pub fn read<R: std::io::Read>(&self, reader: R, source_name: &str) -> Result<Vec<TimeSeriesRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .with_context(|| format!("Failed to read header of {}", source_name))?
            .clone();

        let date_col = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("date"))
            .with_context(|| format!("{} has no date column", source_name))?;
        let region_col = headers.iter().position(|h| h.eq_ignore_ascii_case("region"));

        // Single-series files (`date,value`) are named after their source
        let default_region = Path::new(source_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(source_name)
            .to_string();
        if region_col.is_none() {
            tracing::info!(
                source = source_name,
                region = %default_region,
                "no region column, using file name as region"
            );
        }

        let mut records = Vec::new();

        for (index, result) in rdr.records().enumerate() {
            let line = index + 2;
            let row = result
                .with_context(|| format!("Failed to parse CSV line {} in {}", line, source_name))?;

            let date = Self::parse_date(row.get(date_col).unwrap_or(""))
                .with_context(|| format!("Bad date on line {} of {}", line, source_name))?;
            let region = match region_col {
                Some(col) => row.get(col).unwrap_or(""),
                None => default_region.as_str(),
            };
            anyhow::ensure!(!region.is_empty(), "Missing region on line {} of {}", line, source_name);

            let mut record = TimeSeriesRecord::new(date, region);
            for (col, name) in headers.iter().enumerate() {
                if col == date_col || Some(col) == region_col {
                    continue;
                }
                let cell = row.get(col).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell.parse().with_context(|| {
                    format!("Non-numeric {} {:?} on line {} of {}", name, cell, line, source_name)
                })?;
                record.metrics.insert(name.to_string(), value);
            }

            records.push(record);
        }

        tracing::debug!(source = source_name, count = records.len(), "loaded time series");

        Ok(records)
    }
}

impl Default for TimeSeriesParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetParser for TimeSeriesParser {
    fn parse(&self, file_path: &Path) -> Result<ParsedDataset> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        Ok(ParsedDataset::TimeSeries(self.read(file, &file_path.display().to_string())?))
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::TimeSeries
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regional_timeseries.csv");
        fs::write(&path, "date,region,anomaly\n").unwrap();

        assert_eq!(detect_source(&path).unwrap(), SourceKind::TimeSeries);
    }

    #[test]
    fn test_detect_by_header() {
        let dir = tempfile::tempdir().unwrap();

        let obs_path = dir.path().join("cmip6_july.csv");
        fs::write(&obs_path, "region,year,scenario,july_temp_c\n").unwrap();
        assert_eq!(detect_source(&obs_path).unwrap(), SourceKind::RegionalObservations);

        let series_path = dir.path().join("global.csv");
        fs::write(&series_path, "\"date\",\"region\",\"value\"\n").unwrap();
        assert_eq!(detect_source(&series_path).unwrap(), SourceKind::TimeSeries);

        let unknown = dir.path().join("other.csv");
        fs::write(&unknown, "a,b,c\n").unwrap();
        assert!(detect_source(&unknown).is_err());
    }

    #[test]
    fn test_parse_dates() {
        assert_eq!(
            TimeSeriesParser::parse_date("2001-07-15").unwrap(),
            NaiveDate::from_ymd_opt(2001, 7, 15).unwrap()
        );
        assert_eq!(
            TimeSeriesParser::parse_date("2001-07").unwrap(),
            NaiveDate::from_ymd_opt(2001, 7, 1).unwrap()
        );
        assert_eq!(
            TimeSeriesParser::parse_date("1999").unwrap(),
            NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()
        );
        assert!(TimeSeriesParser::parse_date("last tuesday").is_err());
    }

    #[test]
    fn test_time_series_metrics() {
        let csv = "date,region,anomaly,temp\n\
                   2000-01-01,US,0.4,12.5\n\
                   2001-01-01,US,,12.9\n";

        let records = TimeSeriesParser::new().read(csv.as_bytes(), "inline.csv").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].metric("anomaly"), Some(0.4));
        assert_eq!(records[0].metric("temp"), Some(12.5));
        assert_eq!(records[1].metric("anomaly"), None);
    }

    #[test]
    fn test_time_series_rejects_bad_values() {
        let csv = "date,region,anomaly\n2000-01-01,US,high\n";
        let err = TimeSeriesParser::new().read(csv.as_bytes(), "bad.csv").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let no_date = "region,anomaly\nUS,0.1\n";
        assert!(TimeSeriesParser::new().read(no_date.as_bytes(), "bad.csv").is_err());
    }

    #[test]
    fn test_time_series_without_region_uses_file_stem() {
        let csv = "date,value\n1990,0.25\n1991,0.31\n";
        let records = TimeSeriesParser::new()
            .read(csv.as_bytes(), "/data/Global.csv")
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.region == "Global"));
        assert_eq!(records[1].metric("value"), Some(0.31));
    }

    #[test]
    fn test_load_single_series_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arctic_series.csv");
        fs::write(&path, "date,value\n2000-06,1.5\n").unwrap();

        let records = load_dataset(&path).unwrap().into_time_series().unwrap();
        assert_eq!(records[0].region, "arctic_series");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2000, 6, 1).unwrap());
    }

    #[test]
    fn test_load_dataset_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regional.csv");
        fs::write(
            &path,
            "region,year,scenario,july_temp_c\nWest,1850,historical,20.0\nWest,2050,ssp245,22.0\n",
        )
        .unwrap();

        let parsed = load_dataset(&path).unwrap();
        assert_eq!(parsed.len(), 2);

        let observations = parsed.into_observations().unwrap();
        assert_eq!(observations[1].year, 2050);
    }

    #[test]
    fn test_wrong_dataset_kind() {
        let parsed = ParsedDataset::TimeSeries(Vec::new());
        assert!(parsed.into_observations().is_err());
    }

    #[test]
    fn test_parser_source_kind() {
        assert_eq!(
            get_parser(SourceKind::TimeSeries).source_kind(),
            SourceKind::TimeSeries
        );
    }
}
