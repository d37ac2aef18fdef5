// ✅ Data Quality Engine - Observation checks at the loader boundary
//
// Critical issues reject a row before it reaches the anomaly transform.
// Warnings are reported but the row is kept.

use crate::baseline::BaselineWindow;
use crate::observations::{Observation, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, field: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: "ok".to_string(),
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, field: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Row cannot be used
    Warning,  // Row is suspicious but usable
    Info,
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    /// Zero-based position in the validated batch
    pub row: usize,
    pub severity: Severity,
    pub field: String,
    pub issue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub row: usize,
    pub validations: Vec<ValidationResult>,
    pub passed_count: usize,
    pub failed_count: usize,
}

impl QualityReport {
    pub fn has_critical_issues(&self) -> bool {
        self.validations
            .iter()
            .any(|v| !v.passed && v.severity == Severity::Critical)
    }

    pub fn issues(&self) -> impl Iterator<Item = QualityIssue> + '_ {
        self.validations.iter().filter(|v| !v.passed).map(|v| QualityIssue {
            row: self.row,
            severity: v.severity,
            field: v.field.clone(),
            issue: v.message.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_observations: usize,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub warning_count: usize,
    pub issues: Vec<QualityIssue>,
    /// Regions with no observation inside the baseline window (sorted)
    pub regions_without_baseline: Vec<String>,
}

impl BatchSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} observations: {} accepted, {} rejected, {} warnings | {} regions without baseline",
            self.total_observations,
            self.accepted_count,
            self.rejected_count,
            self.warning_count,
            self.regions_without_baseline.len()
        )
    }
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine {
    /// Plausible July temperature range (°C)
    temp_range: (f64, f64),

    /// Plausible year range
    year_range: (i32, i32),

    baseline: BaselineWindow,
}

impl DataQualityEngine {
    pub fn new(baseline: BaselineWindow) -> Self {
        DataQualityEngine {
            temp_range: (-90.0, 60.0),
            year_range: (1800, 2300),
            baseline,
        }
    }

    /// Validate a single observation
    pub fn validate(&self, row: usize, obs: &Observation) -> QualityReport {
        let validations = vec![
            self.validate_region(&obs.region),
            self.validate_temperature(obs.july_temp_c),
            self.validate_year(obs.year, obs.scenario),
        ];

        let passed_count = validations.iter().filter(|v| v.passed).count();
        let failed_count = validations.len() - passed_count;

        QualityReport {
            row,
            validations,
            passed_count,
            failed_count,
        }
    }

    /// Validate a batch, returning the usable observations and a summary
    ///
    /// Rows with critical issues are dropped. Duplicate (region, year, scenario)
    /// keys are kept but flagged: they all contribute to the baseline mean.
    pub fn partition(&self, observations: Vec<Observation>) -> (Vec<Observation>, BatchSummary) {
        let total = observations.len();
        let mut accepted = Vec::with_capacity(total);
        let mut issues = Vec::new();
        let mut seen: HashSet<(String, i32, Scenario)> = HashSet::new();

        for (row, obs) in observations.into_iter().enumerate() {
            let report = self.validate(row, &obs);
            issues.extend(report.issues());

            if report.has_critical_issues() {
                tracing::warn!(row, region = %obs.region, "rejected observation");
                continue;
            }

            if !seen.insert((obs.region.clone(), obs.year, obs.scenario)) {
                issues.push(QualityIssue {
                    row,
                    severity: Severity::Warning,
                    field: "key".to_string(),
                    issue: format!(
                        "Duplicate observation for {} {} {}",
                        obs.region, obs.year, obs.scenario
                    ),
                });
            }

            accepted.push(obs);
        }

        let regions: BTreeSet<&str> = accepted.iter().map(|o| o.region.as_str()).collect();
        let with_baseline: HashSet<&str> = accepted
            .iter()
            .filter(|o| self.baseline.contains(o))
            .map(|o| o.region.as_str())
            .collect();
        let regions_without_baseline: Vec<String> = regions
            .into_iter()
            .filter(|r| !with_baseline.contains(r))
            .map(String::from)
            .collect();

        let summary = BatchSummary {
            total_observations: total,
            accepted_count: accepted.len(),
            rejected_count: total - accepted.len(),
            warning_count: issues
                .iter()
                .filter(|i| i.severity == Severity::Warning)
                .count(),
            issues,
            regions_without_baseline,
        };

        tracing::debug!("{}", summary.summary());

        (accepted, summary)
    }

    // ========================================================================
    // VALIDATION RULES
    // ========================================================================

    fn validate_region(&self, region: &str) -> ValidationResult {
        if region.trim().is_empty() {
            return ValidationResult::fail(
                "region_not_empty",
                "region",
                "Region is empty",
                Severity::Critical,
            );
        }
        ValidationResult::pass("region_not_empty", "region")
    }

    fn validate_temperature(&self, temp: f64) -> ValidationResult {
        if !temp.is_finite() {
            return ValidationResult::fail(
                "temperature_finite",
                "july_temp_c",
                "Temperature is not a finite number",
                Severity::Critical,
            );
        }

        let (min, max) = self.temp_range;
        if temp < min || temp > max {
            return ValidationResult::fail(
                "temperature_plausible",
                "july_temp_c",
                &format!("Temperature {:.1}°C outside plausible range {}..{}", temp, min, max),
                Severity::Warning,
            );
        }

        ValidationResult::pass("temperature_plausible", "july_temp_c")
    }

    fn validate_year(&self, year: i32, scenario: Scenario) -> ValidationResult {
        let (min, max) = self.year_range;
        if year < min || year > max {
            return ValidationResult::fail(
                "year_in_range",
                "year",
                &format!("Year {} outside {}..{}", year, min, max),
                Severity::Warning,
            );
        }

        // Projections are only meaningful after the historical record
        if scenario != Scenario::Historical && year <= self.baseline.end_year {
            return ValidationResult::fail(
                "projection_after_baseline",
                "year",
                &format!("{} projection dated {} falls inside the baseline era", scenario, year),
                Severity::Warning,
            );
        }

        ValidationResult::pass("year_in_range", "year")
    }
}

impl Default for DataQualityEngine {
    fn default() -> Self {
        Self::new(BaselineWindow::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(region: &str, year: i32, scenario: Scenario, temp: f64) -> Observation {
        Observation::new(region, year, scenario, temp)
    }

    #[test]
    fn test_clean_observation_passes() {
        let engine = DataQualityEngine::default();
        let report = engine.validate(0, &obs("West", 1875, Scenario::Historical, 21.0));

        assert_eq!(report.failed_count, 0);
        assert!(!report.has_critical_issues());
    }

    #[test]
    fn test_empty_region_is_critical() {
        let engine = DataQualityEngine::default();
        let report = engine.validate(3, &obs("  ", 1875, Scenario::Historical, 21.0));

        assert!(report.has_critical_issues());
        let issue = report.issues().next().unwrap();
        assert_eq!(issue.row, 3);
        assert_eq!(issue.field, "region");
    }

    #[test]
    fn test_nan_temperature_is_critical() {
        let engine = DataQualityEngine::default();
        let report = engine.validate(0, &obs("West", 1875, Scenario::Historical, f64::NAN));
        assert!(report.has_critical_issues());
    }

    #[test]
    fn test_implausible_temperature_is_warning() {
        let engine = DataQualityEngine::default();
        let report = engine.validate(0, &obs("West", 1875, Scenario::Historical, 75.0));

        assert!(!report.has_critical_issues());
        assert_eq!(report.failed_count, 1);
    }

    #[test]
    fn test_projection_in_baseline_era_is_warning() {
        let engine = DataQualityEngine::default();
        let report = engine.validate(0, &obs("West", 1880, Scenario::Ssp585, 21.0));

        assert!(!report.has_critical_issues());
        assert_eq!(report.issues().next().unwrap().field, "year");
    }

    #[test]
    fn test_partition_drops_critical_rows() {
        let engine = DataQualityEngine::default();
        let input = vec![
            obs("West", 1875, Scenario::Historical, 21.0),
            obs("", 1876, Scenario::Historical, 21.0),
            obs("West", 2050, Scenario::Ssp585, f64::INFINITY),
            obs("West", 2050, Scenario::Ssp245, 23.0),
        ];

        let (accepted, summary) = engine.partition(input);

        assert_eq!(accepted.len(), 2);
        assert_eq!(summary.total_observations, 4);
        assert_eq!(summary.rejected_count, 2);
        assert!(summary.regions_without_baseline.is_empty());
    }

    #[test]
    fn test_partition_flags_duplicates_and_missing_baselines() {
        let engine = DataQualityEngine::default();
        let input = vec![
            obs("West", 1875, Scenario::Historical, 21.0),
            obs("West", 1875, Scenario::Historical, 21.5),
            obs("Arctic", 2050, Scenario::Ssp585, 4.0),
        ];

        let (accepted, summary) = engine.partition(input);

        assert_eq!(accepted.len(), 3);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.issues[0].field, "key");
        assert_eq!(summary.regions_without_baseline, vec!["Arctic".to_string()]);
        assert!(summary.summary().contains("3 accepted"));
    }
}
