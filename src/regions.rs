// 🗺️ Region Presets - Named regions with curve parameters and boundaries
//
// Each preset drives one synthetic warming curve (final_temp, rate) and
// carries the colour and boundary polygon the map layer draws.

use serde::{Deserialize, Serialize};

// ============================================================================
// REGION PRESET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPreset {
    /// Canonical name (used as curve key)
    pub name: String,

    /// Alternative names that resolve to this region
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Hex colour for lines, labels and highlighted boundaries
    pub color: String,

    /// Warming reached at the end of the curve (°C, before rate scaling)
    pub final_temp: f64,

    /// Regional warming rate multiplier
    pub rate: f64,

    /// Boundary polygon as [lon, lat] pairs
    #[serde(default)]
    pub boundary: Vec<[f64; 2]>,
}

impl RegionPreset {
    pub fn new(name: &str, color: &str, final_temp: f64, rate: f64) -> Self {
        RegionPreset {
            name: name.to_string(),
            aliases: Vec::new(),
            color: color.to_string(),
            final_temp,
            rate,
            boundary: Vec::new(),
        }
    }

    /// Builder pattern: add boundary polygon
    pub fn with_boundary(mut self, boundary: &[[f64; 2]]) -> Self {
        self.boundary = boundary.to_vec();
        self
    }

    /// Add an alias (ignored if duplicate or equal to the canonical name)
    pub fn add_alias(&mut self, alias: &str) {
        if alias != self.name && !self.aliases.iter().any(|a| a == alias) {
            self.aliases.push(alias.to_string());
        }
    }

    /// CSS-safe identifier: "Great Plains" → "Great-Plains"
    pub fn slug(&self) -> String {
        self.name.split_whitespace().collect::<Vec<_>>().join("-")
    }

    /// Case-insensitive match on name, slug or alias
    pub fn matches(&self, name: &str) -> bool {
        let lower = name.trim().to_lowercase();

        self.name.to_lowercase() == lower
            || self.slug().to_lowercase() == lower
            || self.aliases.iter().any(|a| a.to_lowercase() == lower)
    }

    /// Ray-casting point-in-polygon test against the boundary
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let n = self.boundary.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let [xi, yi] = self.boundary[i];
            let [xj, yj] = self.boundary[j];

            if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }

        inside
    }
}

/// The five US regions shown on the warming map
pub fn default_presets() -> Vec<RegionPreset> {
    let mut southwest = RegionPreset::new("Southwest Interior", "#8B0000", 5.5, 1.2).with_boundary(&[
        [-115.0, 34.0], [-115.0, 32.0], [-113.0, 31.0], [-110.0, 31.0], [-108.0, 31.0],
        [-106.0, 32.0], [-106.0, 34.0], [-105.0, 37.0], [-110.0, 37.0], [-113.0, 37.0],
        [-115.0, 36.0],
    ]);
    southwest.add_alias("Southwest");

    let plains = RegionPreset::new("Great Plains", "#FF4500", 5.0, 1.1).with_boundary(&[
        [-105.0, 37.0], [-105.0, 42.0], [-102.0, 45.0], [-98.0, 45.0], [-95.0, 43.0],
        [-95.0, 40.0], [-98.0, 38.0], [-102.0, 37.0], [-105.0, 37.0],
    ]);

    let mut northwest = RegionPreset::new("Pacific Northwest", "#FF8C00", 4.0, 1.0).with_boundary(&[
        [-125.0, 42.0], [-125.0, 49.0], [-120.0, 49.0], [-117.0, 46.0], [-120.0, 42.0],
        [-125.0, 42.0],
    ]);
    northwest.add_alias("PNW");

    let mut southeast = RegionPreset::new("Southeast Coast", "#FFA500", 3.5, 0.9).with_boundary(&[
        [-90.0, 30.0], [-85.0, 30.0], [-80.0, 28.0], [-75.0, 32.0], [-80.0, 35.0],
        [-85.0, 33.0], [-90.0, 32.0], [-90.0, 30.0],
    ]);
    southeast.add_alias("Southeast");

    let mut northeast = RegionPreset::new("Northeast Coast", "#FFD700", 3.8, 0.95).with_boundary(&[
        [-80.0, 38.0], [-75.0, 38.0], [-70.0, 41.0], [-70.0, 45.0], [-75.0, 45.0],
        [-78.0, 42.0], [-80.0, 40.0], [-80.0, 38.0],
    ]);
    northeast.add_alias("Northeast");

    vec![southwest, plains, northwest, southeast, northeast]
}

// ============================================================================
// REGION REGISTRY
// ============================================================================

/// Ordered set of presets; order is display order
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRegistry {
    regions: Vec<RegionPreset>,
}

impl RegionRegistry {
    pub fn new(regions: Vec<RegionPreset>) -> Self {
        RegionRegistry { regions }
    }

    /// Find a region by name, slug or alias
    pub fn find(&self, name: &str) -> Option<&RegionPreset> {
        self.regions.iter().find(|r| r.matches(name))
    }

    /// First region whose boundary contains the point
    pub fn region_at(&self, lon: f64, lat: f64) -> Option<&RegionPreset> {
        self.regions.iter().find(|r| r.contains(lon, lat))
    }

    pub fn names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionPreset> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new(default_presets())
    }
}

// ============================================================================
// TESTS
// ============================================================================
