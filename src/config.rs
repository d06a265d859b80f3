use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{city, ColumnOrder};
use crate::data::source::{DEFAULT_DATA_PATH, DEFAULT_FALLBACK_BASE_URL};

/// File looked up in the working directory when `ENROLLMENT_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "enrollment.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("config defines no panels")]
    NoPanels,
    #[error("layout refers to unknown panel '{0}'")]
    UnknownPanel(String),
    #[error("panel '{0}' is placed {1} times in the layout")]
    PlacedTwice(String, usize),
    #[error("panel '{0}' is not placed in the layout")]
    Unplaced(String),
    #[error("panel '{name}' has zoom {zoom}, expected a value in (0, 24]")]
    BadZoom { name: String, zoom: f64 },
    #[error("hexagon radius must be positive, got {0}")]
    BadRadius(f64),
}

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Camera parameters shared by every panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub pitch: f64,
    pub bearing: f64,
    pub max_zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            pitch: 45.0,
            bearing: 0.0,
            max_zoom: 16.0,
        }
    }
}

/// Hexagon layer parameters shared by every panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Hexagon radius in metres.
    pub radius: f64,
    pub elevation_scale: f64,
    pub elevation_range: [f64; 2],
    pub extruded: bool,
    pub pickable: bool,
    pub auto_highlight: bool,
    /// Fraction of the radius actually drawn.
    pub coverage: f64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            radius: 500.0,
            elevation_scale: 4.0,
            elevation_range: [0.0, 1000.0],
            extruded: true,
            pickable: true,
            auto_highlight: true,
            coverage: 1.0,
        }
    }
}

/// Where a panel's camera looks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PanelCenter {
    /// Literal `"midpoint"`: the dataset's mean coordinate.
    Midpoint(MidpointTag),
    Fixed { lon: f64, lat: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MidpointTag {
    Midpoint,
}

impl PanelCenter {
    pub const MIDPOINT: PanelCenter = PanelCenter::Midpoint(MidpointTag::Midpoint);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub name: String,
    pub center: PanelCenter,
    pub zoom: f64,
}

impl PanelConfig {
    fn at_city(name: &str, zoom: f64) -> Option<Self> {
        let c = city(name)?;
        Some(Self {
            name: name.to_string(),
            center: PanelCenter::Fixed { lon: c.lon, lat: c.lat },
            zoom,
        })
    }
}

/// Everything the page needs, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub fallback_base_url: String,
    pub column_order: ColumnOrder,
    pub page_title: String,
    pub subtitle: String,
    pub map_style: String,
    pub camera: CameraConfig,
    pub layer: LayerConfig,
    pub panels: Vec<PanelConfig>,
    /// Rows of panel names; each row is split into equal-width columns.
    pub layout: Vec<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut panels = vec![PanelConfig {
            name: "All Texas".to_string(),
            center: PanelCenter::MIDPOINT,
            zoom: 7.0,
        }];
        panels.extend(
            ["Houston", "Dallas", "Austin", "San Antonio"]
                .into_iter()
                .filter_map(|name| PanelConfig::at_city(name, 9.0)),
        );

        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            fallback_base_url: DEFAULT_FALLBACK_BASE_URL.to_string(),
            column_order: ColumnOrder::LonLat,
            page_title: "Enrollment Sources Data".to_string(),
            subtitle: "Visualizing enrollments".to_string(),
            map_style: "mapbox://styles/mapbox/light-v9".to_string(),
            camera: CameraConfig::default(),
            layer: LayerConfig::default(),
            panels,
            layout: vec![
                vec!["All Texas".to_string()],
                vec!["Houston".to_string(), "Dallas".to_string()],
                vec!["Austin".to_string(), "San Antonio".to_string()],
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// `ENROLLMENT_CONFIG`, else `enrollment.json` if present, else defaults;
    /// then `ENROLLMENT_DATA_PATH` / `ENROLLMENT_FALLBACK_URL` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os("ENROLLMENT_CONFIG").map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(path) = std::env::var("ENROLLMENT_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("ENROLLMENT_FALLBACK_URL") {
            config.fallback_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.panels.is_empty() {
            return Err(ConfigError::NoPanels);
        }
        if !(self.layer.radius > 0.0) {
            return Err(ConfigError::BadRadius(self.layer.radius));
        }
        for panel in &self.panels {
            if !(panel.zoom > 0.0 && panel.zoom <= 24.0) {
                return Err(ConfigError::BadZoom {
                    name: panel.name.clone(),
                    zoom: panel.zoom,
                });
            }
        }

        let known: BTreeSet<&str> = self.panels.iter().map(|p| p.name.as_str()).collect();
        for name in self.layout.iter().flatten() {
            if !known.contains(name.as_str()) {
                return Err(ConfigError::UnknownPanel(name.clone()));
            }
        }
        for name in &known {
            let placed = self.layout.iter().flatten().filter(|n| n.as_str() == *name).count();
            match placed {
                0 => return Err(ConfigError::Unplaced(name.to_string())),
                1 => {}
                n => return Err(ConfigError::PlacedTwice(name.to_string(), n)),
            }
        }
        Ok(())
    }

    pub fn panel(&self, name: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.name == name)
    }
}
