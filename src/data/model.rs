use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CoordinateRow – one row of the source CSV
// ---------------------------------------------------------------------------

/// A single enrollment location. Rows have no identity beyond their position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRow {
    pub lon: f64,
    pub lat: f64,
}

impl CoordinateRow {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

// ---------------------------------------------------------------------------
// ColumnOrder – positional binding of the first two columns
// ---------------------------------------------------------------------------

/// How the first two columns of the input map onto longitude / latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrder {
    #[default]
    LonLat,
    LatLon,
}

impl ColumnOrder {
    /// Bind a positional `(first, second)` pair to a row.
    pub fn bind(self, first: f64, second: f64) -> CoordinateRow {
        match self {
            ColumnOrder::LonLat => CoordinateRow::new(first, second),
            ColumnOrder::LatLon => CoordinateRow::new(second, first),
        }
    }
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnOrder::LonLat => write!(f, "lon,lat"),
            ColumnOrder::LatLon => write!(f, "lat,lon"),
        }
    }
}

// ---------------------------------------------------------------------------
// CoordinateDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The parsed dataset. Never mutated after load; shared as `Arc`.
#[derive(Debug, Clone)]
pub struct CoordinateDataset {
    pub rows: Vec<CoordinateRow>,
    /// Human-readable description of where the rows came from.
    pub origin: String,
}

impl CoordinateDataset {
    pub fn new(rows: Vec<CoordinateRow>, origin: impl Into<String>) -> Self {
        Self {
            rows,
            origin: origin.into(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Static locations
// ---------------------------------------------------------------------------

/// A named, hardcoded map centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityLocation {
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
}

/// Built-in city table used by the default panel configuration.
pub const TEXAS_CITIES: &[CityLocation] = &[
    CityLocation { name: "All Texas", lon: -99.17065, lat: 31.391533 },
    CityLocation { name: "Houston", lon: -95.3701, lat: 29.7601 },
    CityLocation { name: "Dallas", lon: -96.9209, lat: 32.7079 },
    CityLocation { name: "Austin", lon: -97.740556, lat: 30.274722 },
    CityLocation { name: "San Antonio", lon: -98.491142, lat: 29.424349 },
];

/// Look up a city by name in the built-in table.
pub fn city(name: &str) -> Option<&'static CityLocation> {
    TEXAS_CITIES.iter().find(|c| c.name == name)
}

// ---------------------------------------------------------------------------
// Midpoint
// ---------------------------------------------------------------------------

/// Arithmetic-mean coordinate of a dataset, used as a default map centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Midpoint {
    pub lon: f64,
    pub lat: f64,
}

impl fmt::Display for Midpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lon, self.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_order_binds_positionally() {
        assert_eq!(ColumnOrder::LonLat.bind(-95.0, 29.0), CoordinateRow::new(-95.0, 29.0));
        assert_eq!(ColumnOrder::LatLon.bind(29.0, -95.0), CoordinateRow::new(-95.0, 29.0));
    }

    #[test]
    fn city_lookup() {
        let houston = city("Houston").unwrap();
        assert_eq!(houston.lon, -95.3701);
        assert_eq!(houston.lat, 29.7601);
        assert!(city("El Paso").is_none());
    }
}
