//! Colour scales for the rendering layer
//!
//! - `ColorRamp`: piecewise-linear RGB interpolation over numeric domain stops
//!   (map warming ramp, heatmap sequential ramp)
//! - `OrdinalPalette`: fixed key → colour mapping (scenarios, series regions)

use serde::{Deserialize, Serialize};

/// Gray fallback for unparsable colours
const FALLBACK_RGB: [u8; 3] = [128, 128, 128];

/// Parse "#RRGGBB" (or "RRGGBB") into RGB
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let channel = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8;
    [channel(a[0], b[0]), channel(a[1], b[1]), channel(a[2], b[2])]
}

// ============================================================================
// COLOR RAMP
// ============================================================================

/// Piecewise-linear colour scale
///
/// Only the first `min(domain.len(), colors.len())` stops are used. Values
/// outside the domain clamp to the end colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    pub domain: Vec<f64>,
    pub colors: Vec<String>,
}

impl ColorRamp {
    pub fn new(domain: Vec<f64>, colors: Vec<String>) -> Self {
        ColorRamp { domain, colors }
    }

    /// Ramp with `colors` spread evenly over [min, max]
    pub fn uniform(min: f64, max: f64, colors: &[String]) -> Self {
        let n = colors.len();
        let domain = (0..n)
            .map(|i| {
                if n <= 1 {
                    min
                } else {
                    min + (max - min) * i as f64 / (n - 1) as f64
                }
            })
            .collect();
        ColorRamp::new(domain, colors.to_vec())
    }

    /// Map warming ramp: 0..7 °C, yellow to deep red
    pub fn warming() -> Self {
        ColorRamp::new(
            vec![0.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
            [
                "#FFFFCC", "#FFEDA0", "#FED976", "#FEB24C", "#FD8D3C", "#FC4E2A", "#E31A1C",
                "#BD0026",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        )
    }

    fn stops(&self) -> usize {
        self.domain.len().min(self.colors.len())
    }

    pub fn rgb_at(&self, value: f64) -> [u8; 3] {
        let n = self.stops();
        if n == 0 || !value.is_finite() {
            return FALLBACK_RGB;
        }

        let color = |i: usize| parse_hex_color(&self.colors[i]).unwrap_or(FALLBACK_RGB);
        if n == 1 || value <= self.domain[0] {
            return color(0);
        }
        if value >= self.domain[n - 1] {
            return color(n - 1);
        }

        // First segment whose upper stop reaches the value
        let upper = (1..n).find(|&i| value <= self.domain[i]).unwrap_or(n - 1);
        let lower = upper - 1;
        let span = self.domain[upper] - self.domain[lower];
        let t = if span == 0.0 {
            0.0
        } else {
            (value - self.domain[lower]) / span
        };

        lerp_rgb(color(lower), color(upper), t)
    }

    pub fn color_at(&self, value: f64) -> String {
        to_hex(self.rgb_at(value))
    }

    /// Legend gradient: (offset percent, colour) for each used stop
    pub fn gradient_stops(&self) -> Vec<(f64, String)> {
        let n = self.stops();
        (0..n)
            .map(|i| {
                let offset = if n <= 1 { 0.0 } else { i as f64 / (n - 1) as f64 * 100.0 };
                (offset, self.colors[i].clone())
            })
            .collect()
    }
}

/// Eleven evenly spaced anchors of the Inferno colormap (t = 0.0, 0.1, ..., 1.0)
pub fn inferno_stops() -> Vec<String> {
    [
        "#000004", "#160b39", "#420a68", "#6a176e", "#932667", "#bc3754", "#dd513a", "#f37819",
        "#fca50a", "#f6d746", "#fcffa4",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

// ============================================================================
// ORDINAL PALETTE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalPalette {
    pub domain: Vec<String>,
    pub colors: Vec<String>,
}

impl OrdinalPalette {
    pub fn new(domain: &[&str], colors: &[&str]) -> Self {
        OrdinalPalette {
            domain: domain.iter().map(|s| s.to_string()).collect(),
            colors: colors.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Colour for a known key (wraps if the domain is longer than the colours)
    pub fn color_for(&self, key: &str) -> Option<&str> {
        if self.colors.is_empty() {
            return None;
        }
        let index = self.domain.iter().position(|d| d == key)?;
        Some(self.colors[index % self.colors.len()].as_str())
    }

    /// Emission scenarios: blue for medium, red for high
    pub fn scenarios() -> Self {
        OrdinalPalette::new(&["ssp245", "ssp585"], &["#4e79a7", "#e15759"])
    }

    /// Time-series regions
    pub fn series_regions() -> Self {
        OrdinalPalette::new(
            &["Global", "US", "Europe", "Arctic", "Tropics"],
            &["#3b82f6", "#ef4444", "#10b981", "#a855f7", "#f59e0b"],
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
