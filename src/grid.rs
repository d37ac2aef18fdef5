// 🌐 Grid Generator - Synthetic 2100 warming field over the contiguous US
//
// Every cell is computed independently from its (lat, lon), so the field does
// not depend on iteration order.

use serde::{Deserialize, Serialize};

/// Lower clamp for a cell's 2100 value (°C)
pub const GRID_TEMP_MIN: f64 = 2.0;
/// Upper clamp for a cell's 2100 value (°C)
pub const GRID_TEMP_MAX: f64 = 7.0;

const BASE_TEMP: f64 = 3.5;
const WEST_COAST_LON: f64 = -125.0;
const EAST_COAST_LON: f64 = -65.0;

/// Largest sample count a configured axis may produce
pub const MAX_AXIS_SAMPLES: usize = 10_000;

/// Year range the map slider covers
pub const MAP_START_YEAR: i32 = 2025;
pub const MAP_END_YEAR: i32 = 2100;

// ============================================================================
// SAMPLING AXES
// ============================================================================

/// Half-open stepped range: `start + i * step` for `i < ceil((stop - start) / step)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl AxisRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        AxisRange { start, stop, step }
    }

    pub fn len(&self) -> usize {
        if self.step == 0.0 || !self.step.is_finite() {
            return 0;
        }
        let n = ((self.stop - self.start) / self.step).ceil();
        if n.is_finite() && n > 0.0 {
            n as usize
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample values; each computed from the index, not accumulated
    pub fn values(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }

    /// Index of the sample equal to `value` (within 1e-9), if any
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if self.step == 0.0 {
            return None;
        }
        let i = ((value - self.start) / self.step).round();
        if i < 0.0 || i >= self.len() as f64 {
            return None;
        }
        let i = i as usize;
        let sample = self.start + i as f64 * self.step;
        ((sample - value).abs() < 1e-9).then_some(i)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat: AxisRange,
    pub lon: AxisRange,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec {
            lat: AxisRange::new(25.0, 50.5, 0.8),
            lon: AxisRange::new(-125.0, -64.5, 1.0),
        }
    }
}

// ============================================================================
// CELL TERMS
// ============================================================================

/// Rectangular area that adds a fixed bonus (open bounds on both axes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotspot {
    pub name: &'static str,
    pub lon: (f64, f64),
    pub lat: (f64, f64),
    pub bonus: f64,
}

impl Hotspot {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lon > self.lon.0 && lon < self.lon.1 && lat > self.lat.0 && lat < self.lat.1
    }

    fn bonus_at(&self, lat: f64, lon: f64) -> f64 {
        if self.contains(lat, lon) {
            self.bonus
        } else {
            0.0
        }
    }
}

pub const SOUTHWEST_HOTSPOT: Hotspot = Hotspot {
    name: "Southwest",
    lon: (-115.0, -103.0),
    lat: (31.0, 37.0),
    bonus: 1.2,
};

pub const GREAT_PLAINS_HOTSPOT: Hotspot = Hotspot {
    name: "Great Plains",
    lon: (-105.0, -95.0),
    lat: (35.0, 45.0),
    bonus: 0.8,
};

/// Additive breakdown of one cell's unclamped value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellTerms {
    pub base: f64,
    pub interior: f64,
    pub latitude: f64,
    pub southwest: f64,
    pub great_plains: f64,
    pub noise: f64,
}

impl CellTerms {
    /// Sum in the order the terms are applied
    pub fn total(&self) -> f64 {
        let mut temp = self.base;
        temp += self.interior;
        temp += self.latitude;
        temp += self.southwest;
        temp += self.great_plains;
        temp += self.noise;
        temp
    }

    pub fn clamped(&self) -> f64 {
        self.total().clamp(GRID_TEMP_MIN, GRID_TEMP_MAX)
    }
}

pub fn cell_terms(lat: f64, lon: f64) -> CellTerms {
    // Distance to the nearer coast, saturating 10° inland
    let dist_west = (lon - WEST_COAST_LON).abs().min(10.0) / 10.0;
    let dist_east = (lon - EAST_COAST_LON).abs().min(10.0) / 10.0;

    CellTerms {
        base: BASE_TEMP,
        interior: dist_west.min(dist_east) * 1.5,
        latitude: (lat - 25.0) / 25.0 * 0.8,
        southwest: SOUTHWEST_HOTSPOT.bonus_at(lat, lon),
        great_plains: GREAT_PLAINS_HOTSPOT.bonus_at(lat, lon),
        noise: (lat * 10.0).sin() * (lon * 10.0).cos() * 0.2,
    }
}

/// Clamped 2100 warming for a single (lat, lon)
pub fn cell_temperature(lat: f64, lon: f64) -> f64 {
    cell_terms(lat, lon).clamped()
}

// ============================================================================
// GRID
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
    pub temp2100: f64,
}

/// Generate all cells, latitude-major
pub fn generate_grid(spec: &GridSpec) -> Vec<GridCell> {
    let lons = spec.lon.values();

    spec.lat
        .values()
        .into_iter()
        .flat_map(|lat| {
            lons.iter().map(move |&lon| GridCell {
                lat,
                lon,
                temp2100: cell_temperature(lat, lon),
            })
        })
        .collect()
}

/// Fraction of 2025→2100 elapsed at `year`; None outside the slider range
pub fn year_progress(year: i32) -> Option<f64> {
    if !(MAP_START_YEAR..=MAP_END_YEAR).contains(&year) {
        return None;
    }
    Some((year - MAP_START_YEAR) as f64 / (MAP_END_YEAR - MAP_START_YEAR) as f64)
}

/// Cell warming at `year`, scaled linearly from 0 in 2025 to temp2100 in 2100
pub fn temperature_at_year(cell: &GridCell, year: i32) -> Option<f64> {
    year_progress(year).map(|progress| cell.temp2100 * progress)
}

/// Generated grid with indexed lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridField {
    pub spec: GridSpec,
    cells: Vec<GridCell>,
}

impl GridField {
    pub fn new(spec: GridSpec) -> Self {
        let cells = generate_grid(&spec);
        tracing::debug!(
            cells = cells.len(),
            lat_samples = spec.lat.len(),
            lon_samples = spec.lon.len(),
            "generated warming grid"
        );
        GridField { spec, cells }
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Cell at an exact sample coordinate; None for off-grid points
    pub fn cell_at(&self, lat: f64, lon: f64) -> Option<&GridCell> {
        let row = self.spec.lat.index_of(lat)?;
        let col = self.spec.lon.index_of(lon)?;
        self.cells.get(row * self.spec.lon.len() + col)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Default for GridField {
    fn default() -> Self {
        Self::new(GridSpec::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_ranges_match_stepped_semantics() {
        let spec = GridSpec::default();

        let lats = spec.lat.values();
        assert_eq!(lats.len(), 32);
        assert_eq!(lats[0], 25.0);
        assert!((lats[31] - 49.8).abs() < 1e-9);

        let lons = spec.lon.values();
        assert_eq!(lons.len(), 61);
        assert_eq!(lons[0], -125.0);
        assert_eq!(lons[60], -65.0);
    }

    #[test]
    fn test_empty_axis() {
        assert!(AxisRange::new(10.0, 0.0, 1.0).is_empty());
        assert!(AxisRange::new(0.0, 10.0, 0.0).is_empty());
    }

    #[test]
    fn test_grid_size() {
        let field = GridField::default();
        assert_eq!(field.len(), 32 * 61);
    }

    #[test]
    fn test_southwest_hotspot_bonus() {
        let terms = cell_terms(33.0, -110.0);
        assert_eq!(terms.southwest, 1.2);
        assert_eq!(terms.great_plains, 0.0);

        let temp = cell_temperature(33.0, -110.0);
        assert!((GRID_TEMP_MIN..=GRID_TEMP_MAX).contains(&temp));
    }

    #[test]
    fn test_hotspot_bounds_are_open() {
        // lat 31 sits on the Southwest box edge
        assert_eq!(cell_terms(31.0, -110.0).southwest, 0.0);
        assert_eq!(cell_terms(31.0001, -110.0).southwest, 1.2);
        assert_eq!(cell_terms(33.0, -115.0).southwest, 0.0);
    }

    #[test]
    fn test_great_plains_bonus() {
        let terms = cell_terms(40.0, -100.0);
        assert_eq!(terms.great_plains, 0.8);
        assert_eq!(terms.southwest, 0.0);

        let temp = cell_temperature(40.0, -100.0);
        assert!((GRID_TEMP_MIN..=GRID_TEMP_MAX).contains(&temp));
    }

    #[test]
    fn test_overlapping_hotspots_stack() {
        // lon -104, lat 36 is inside both boxes
        let terms = cell_terms(36.0, -104.0);
        assert_eq!(terms.southwest, 1.2);
        assert_eq!(terms.great_plains, 0.8);
    }

    #[test]
    fn test_cell_value_matches_formula() {
        let (lat, lon): (f64, f64) = (40.0, -100.0);
        // Both coasts are more than 10° away: full interior term
        let mut expected = 3.5;
        expected += 1.5;
        expected += (lat - 25.0) / 25.0 * 0.8;
        expected += 0.8;
        expected += (lat * 10.0).sin() * (lon * 10.0).cos() * 0.2;

        assert!((cell_terms(lat, lon).total() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_interior_term_saturates() {
        assert_eq!(cell_terms(30.0, -125.0).interior, 0.0);
        assert_eq!(cell_terms(30.0, -65.0).interior, 0.0);
        assert_eq!(cell_terms(30.0, -95.0).interior, 1.5);
        assert!((cell_terms(30.0, -120.0).interior - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_all_cells_clamped() {
        let field = GridField::default();
        assert!(field
            .cells()
            .iter()
            .all(|c| c.temp2100 >= GRID_TEMP_MIN && c.temp2100 <= GRID_TEMP_MAX));
    }

    #[test]
    fn test_cell_lookup() {
        let field = GridField::default();

        let cell = field.cell_at(25.8, -100.0).unwrap();
        assert!((cell.lat - 25.8).abs() < 1e-9);
        assert_eq!(cell.lon, -100.0);
        assert_eq!(cell.temp2100, cell_temperature(cell.lat, cell.lon));

        assert!(field.cell_at(25.5, -100.0).is_none());
        assert!(field.cell_at(60.0, -100.0).is_none());
        assert!(field.cell_at(30.2, -60.0).is_none());
    }

    #[test]
    fn test_generation_is_order_independent() {
        let field = GridField::default();
        for cell in field.cells().iter().step_by(97) {
            assert_eq!(cell.temp2100, cell_temperature(cell.lat, cell.lon));
        }
    }

    #[test]
    fn test_year_scaling() {
        let cell = GridCell { lat: 40.0, lon: -100.0, temp2100: 6.0 };

        assert_eq!(temperature_at_year(&cell, 2025), Some(0.0));
        assert_eq!(temperature_at_year(&cell, 2100), Some(6.0));
        assert_eq!(temperature_at_year(&cell, 2055), Some(6.0 * (30.0 / 75.0)));
        assert_eq!(temperature_at_year(&cell, 2024), None);
        assert_eq!(temperature_at_year(&cell, 2101), None);
    }
}
