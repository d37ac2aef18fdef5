// 📈 Regional Curve Generator - Synthetic warming trajectories 2025-2100
//
// Piecewise-linear progress curve plus a small sinusoidal wobble.
// No randomness: the same (region, final_temp, rate) always yields the same curve.

use crate::regions::RegionPreset;
use serde::{Deserialize, Serialize};

pub const CURVE_START_YEAR: i32 = 2025;
pub const CURVE_END_YEAR: i32 = 2100;

/// Number of points per curve (2025..=2100)
pub const CURVE_LEN: usize = (CURVE_END_YEAR - CURVE_START_YEAR + 1) as usize;

// ============================================================================
// CURVE POINT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub year: i32,
    pub temp: f64,
    pub region: String,
}

// ============================================================================
// GENERATOR
// ============================================================================

/// Warming factor for a progress value in [0, 1)
///
/// Slow start, steep middle, flattening tail. The constants are literal and the
/// branches meet at 0.24 and 0.8 only up to floating point.
pub fn warming_factor(progress: f64) -> f64 {
    if progress < 0.3 {
        progress * 0.8
    } else if progress < 0.7 {
        0.24 + (progress - 0.3) * 1.4
    } else {
        0.8 + (progress - 0.7) * 0.7
    }
}

/// Sinusoidal wobble added at index `i`
pub fn curve_noise(index: usize) -> f64 {
    (index as f64 * 0.5).sin() * 0.15
}

/// Generate one point per year from 2025 to 2100 inclusive
///
/// Progress is `i / 76`, so the last point sits at 75/76 and never reaches 1.0.
pub fn generate_temperature_curve(region: &str, final_temp: f64, rate: f64) -> Vec<CurvePoint> {
    (CURVE_START_YEAR..=CURVE_END_YEAR)
        .enumerate()
        .map(|(i, year)| {
            let progress = i as f64 / CURVE_LEN as f64;
            let temp = final_temp * warming_factor(progress) * rate / 1.1;

            CurvePoint {
                year,
                temp: (temp + curve_noise(i)).max(0.0),
                region: region.to_string(),
            }
        })
        .collect()
}

// ============================================================================
// REGIONAL CURVES
// ============================================================================

/// One generated curve with the colour it is drawn in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCurve {
    pub region: String,
    pub color: String,
    pub points: Vec<CurvePoint>,
}

impl RegionCurve {
    pub fn from_preset(preset: &RegionPreset) -> Self {
        RegionCurve {
            region: preset.name.clone(),
            color: preset.color.clone(),
            points: generate_temperature_curve(&preset.name, preset.final_temp, preset.rate),
        }
    }

    /// Temperature at `year`, or None outside 2025..=2100
    pub fn temperature_at(&self, year: i32) -> Option<f64> {
        if !(CURVE_START_YEAR..=CURVE_END_YEAR).contains(&year) {
            return None;
        }
        self.points
            .get((year - CURVE_START_YEAR) as usize)
            .filter(|p| p.year == year)
            .map(|p| p.temp)
    }

    /// Point used for the end-of-line label
    pub fn last_point(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    /// First year the curve reaches `threshold`; None if it never does
    pub fn first_year_reaching(&self, threshold: f64) -> Option<i32> {
        self.points.iter().find(|p| p.temp >= threshold).map(|p| p.year)
    }
}

/// Curves for every region preset, in preset order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionalCurves {
    curves: Vec<RegionCurve>,
}

impl RegionalCurves {
    pub fn from_presets(presets: &[RegionPreset]) -> Self {
        let curves: Vec<RegionCurve> = presets.iter().map(RegionCurve::from_preset).collect();
        tracing::debug!(regions = curves.len(), "generated regional curves");
        RegionalCurves { curves }
    }

    pub fn get(&self, region: &str) -> Option<&RegionCurve> {
        self.curves.iter().find(|c| c.region == region)
    }

    /// Temperature for a region at a year; None for unknown region or out-of-range year
    pub fn temperature_at(&self, region: &str, year: i32) -> Option<f64> {
        self.get(region).and_then(|c| c.temperature_at(year))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionCurve> {
        self.curves.iter()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::default_presets;

    #[test]
    fn test_curve_covers_2025_to_2100() {
        let curve = generate_temperature_curve("X", 5.5, 1.2);

        assert_eq!(curve.len(), 76);
        assert_eq!(curve.first().unwrap().year, 2025);
        assert_eq!(curve.last().unwrap().year, 2100);
        assert!(curve.iter().all(|p| p.region == "X"));
    }

    #[test]
    fn test_first_point_is_zero() {
        let curve = generate_temperature_curve("X", 5.5, 1.2);
        assert_eq!(curve[0].temp, 0.0);
    }

    #[test]
    fn test_point_matches_formula() {
        let curve = generate_temperature_curve("X", 5.5, 1.2);

        let i = 40;
        let p = i as f64 / 76.0;
        let factor = 0.24 + (p - 0.3) * 1.4;
        let expected = (5.5 * factor * 1.2 / 1.1 + (i as f64 * 0.5).sin() * 0.15).max(0.0);

        assert_eq!(curve[i].year, 2065);
        assert_eq!(curve[i].temp, expected);
    }

    #[test]
    fn test_last_point_uses_progress_below_one() {
        let curve = generate_temperature_curve("X", 4.0, 1.0);

        let p: f64 = 75.0 / 76.0;
        let expected = 4.0 * (0.8 + (p - 0.7) * 0.7) * 1.0 / 1.1 + (75.0_f64 * 0.5).sin() * 0.15;
        assert_eq!(curve[75].temp, expected.max(0.0));
    }

    #[test]
    fn test_warming_factor_branches() {
        assert_eq!(warming_factor(0.0), 0.0);
        assert_eq!(warming_factor(0.1), 0.1 * 0.8);
        assert_eq!(warming_factor(0.3), 0.24);
        assert_eq!(warming_factor(0.5), 0.24 + (0.5 - 0.3) * 1.4);
        assert_eq!(warming_factor(0.7), 0.8);
        assert_eq!(warming_factor(0.9), 0.8 + (0.9 - 0.7) * 0.7);
    }

    #[test]
    fn test_curve_is_deterministic() {
        let a = generate_temperature_curve("Great Plains", 5.0, 1.1);
        let b = generate_temperature_curve("Great Plains", 5.0, 1.1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_temperatures_never_negative() {
        // Tiny final_temp lets the negative noise dominate
        for (final_temp, rate) in [(0.0, 1.0), (0.1, 0.5), (3.5, 0.9), (5.5, 1.2)] {
            let curve = generate_temperature_curve("X", final_temp, rate);
            assert!(curve.iter().all(|p| p.temp >= 0.0));
        }
    }

    #[test]
    fn test_regional_curves_lookup() {
        let curves = RegionalCurves::from_presets(&default_presets());

        assert_eq!(curves.len(), 5);
        assert_eq!(curves.temperature_at("Great Plains", 2025), Some(0.0));
        assert!(curves.temperature_at("Great Plains", 2100).unwrap() > 3.0);
        assert_eq!(curves.get("Great Plains").unwrap().color, "#FF4500");
    }

    #[test]
    fn test_out_of_range_year_is_no_data() {
        let curves = RegionalCurves::from_presets(&default_presets());

        assert_eq!(curves.temperature_at("Great Plains", 2024), None);
        assert_eq!(curves.temperature_at("Great Plains", 2101), None);
        assert_eq!(curves.temperature_at("Atlantis", 2050), None);
    }

    #[test]
    fn test_first_year_reaching() {
        let curve = RegionCurve::from_preset(&default_presets()[0]);

        let year = curve.first_year_reaching(2.0).unwrap();
        assert!(curve.temperature_at(year).unwrap() >= 2.0);
        assert!(curve.temperature_at(year - 1).unwrap() < 2.0);

        assert_eq!(curve.first_year_reaching(0.0), Some(2025));
        assert_eq!(curve.first_year_reaching(100.0), None);
    }

    #[test]
    fn test_last_point_label() {
        let curve = RegionCurve::from_preset(&default_presets()[0]);
        let last = curve.last_point().unwrap();

        assert_eq!(last.year, 2100);
        assert_eq!(curve.temperature_at(2100), Some(last.temp));
    }
}
