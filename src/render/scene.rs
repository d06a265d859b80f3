use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

use super::hexbin::{bin_dataset, HexBin, HexGrid};
use super::projection::LocalProjection;
use crate::color::ColorRamp;
use crate::config::{AppConfig, LayerConfig};
use crate::data::model::CoordinateDataset;
use crate::layout::PanelSpec;

// ---------------------------------------------------------------------------
// Declarative scene, serialisable as deck.gl JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexagonLayer {
    #[serde(rename = "@@type")]
    pub kind: &'static str,
    pub id: String,
    #[serde(serialize_with = "serialize_rows")]
    pub data: Arc<CoordinateDataset>,
    pub get_position: &'static str,
    pub radius: f64,
    pub elevation_scale: f64,
    pub elevation_range: [f64; 2],
    pub extruded: bool,
    pub pickable: bool,
    pub auto_highlight: bool,
    pub coverage: f64,
    pub color_range: Vec<[u8; 3]>,
    /// Aggregated cells, ordered far to near.
    #[serde(skip)]
    pub bins: Vec<HexBin>,
}

/// One panel: camera, base map and the hexagon layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub description: String,
    pub map_style: String,
    pub initial_view_state: ViewState,
    pub layers: Vec<HexagonLayer>,
    #[serde(skip)]
    pub projection: LocalProjection,
}

fn serialize_rows<S: Serializer>(data: &Arc<CoordinateDataset>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(data.rows.iter())
}

impl Scene {
    /// Build the scene for one panel. The camera looks at the panel's own
    /// centre; pitch, bearing and max zoom come from the shared camera config.
    pub fn build(
        dataset: &Arc<CoordinateDataset>,
        panel: &PanelSpec,
        config: &AppConfig,
        ramp: &ColorRamp,
    ) -> Self {
        let projection = LocalProjection::new(panel.lon, panel.lat);
        let layer = &config.layer;
        let bins = bin_dataset(dataset, &projection, layer, ramp.len());

        Scene {
            description: panel.title.clone(),
            map_style: config.map_style.clone(),
            initial_view_state: ViewState {
                longitude: panel.lon,
                latitude: panel.lat,
                zoom: panel.zoom,
                max_zoom: config.camera.max_zoom,
                pitch: config.camera.pitch,
                bearing: config.camera.bearing,
            },
            layers: vec![HexagonLayer::new(dataset, &panel.title, layer, ramp, bins)],
            projection,
        }
    }

    pub fn hex_layer(&self) -> Option<&HexagonLayer> {
        self.layers.first()
    }
}

impl HexagonLayer {
    fn new(
        dataset: &Arc<CoordinateDataset>,
        title: &str,
        layer: &LayerConfig,
        ramp: &ColorRamp,
        bins: Vec<HexBin>,
    ) -> Self {
        Self {
            kind: "HexagonLayer",
            id: format!("hexagons-{}", title.to_ascii_lowercase().replace(' ', "-")),
            data: Arc::clone(dataset),
            get_position: "@@=[lon, lat]",
            radius: layer.radius,
            elevation_scale: layer.elevation_scale,
            elevation_range: layer.elevation_range,
            extruded: layer.extruded,
            pickable: layer.pickable,
            auto_highlight: layer.auto_highlight,
            coverage: layer.coverage,
            color_range: ramp.rgb().to_vec(),
            bins,
        }
    }

    pub fn grid(&self) -> HexGrid {
        HexGrid::new(self.radius)
    }
}

/// Write scenes as a pretty-printed JSON array. Returns how many were written.
pub fn write_scenes<'a>(scenes: impl IntoIterator<Item = &'a Scene>, path: &Path) -> Result<usize> {
    let scenes: Vec<&Scene> = scenes.into_iter().collect();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &scenes).context("serialising scenes")?;
    writer.flush().context("flushing scene file")?;
    Ok(scenes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CoordinateRow;

    fn houston_panel() -> PanelSpec {
        PanelSpec {
            title: "Houston".to_string(),
            lon: -95.3701,
            lat: 29.7601,
            zoom: 9.0,
        }
    }

    fn dataset() -> Arc<CoordinateDataset> {
        Arc::new(CoordinateDataset::new(
            vec![CoordinateRow::new(-95.0, 29.0), CoordinateRow::new(-97.0, 31.0)],
            "test",
        ))
    }

    #[test]
    fn camera_follows_panel_centre() {
        let scene = Scene::build(&dataset(), &houston_panel(), &AppConfig::default(), &ColorRamp::default());
        let view = &scene.initial_view_state;
        assert_eq!((view.longitude, view.latitude, view.zoom), (-95.3701, 29.7601, 9.0));
        assert_eq!((view.pitch, view.bearing, view.max_zoom), (45.0, 0.0, 16.0));
        let layer = scene.hex_layer().unwrap();
        assert_eq!(layer.radius, 500.0);
        assert_eq!(layer.bins.len(), 2);
    }

    #[test]
    fn serialises_as_deck_json() {
        let scene = Scene::build(&dataset(), &houston_panel(), &AppConfig::default(), &ColorRamp::default());
        let json = serde_json::to_value(&scene).unwrap();

        assert_eq!(json["mapStyle"], "mapbox://styles/mapbox/light-v9");
        assert_eq!(json["initialViewState"]["maxZoom"], 16.0);
        let layer = &json["layers"][0];
        assert_eq!(layer["@@type"], "HexagonLayer");
        assert_eq!(layer["id"], "hexagons-houston");
        assert_eq!(layer["getPosition"], "@@=[lon, lat]");
        assert_eq!(layer["elevationRange"], serde_json::json!([0.0, 1000.0]));
        assert_eq!(layer["data"][1], serde_json::json!({ "lon": -97.0, "lat": 31.0 }));
        assert_eq!(layer["colorRange"].as_array().unwrap().len(), 6);
        assert!(layer.get("bins").is_none());
    }

    #[test]
    fn writes_scene_array() {
        let scene = Scene::build(&dataset(), &houston_panel(), &AppConfig::default(), &ColorRamp::default());
        let path = std::env::temp_dir().join(format!("enrollment-scenes-{}.json", std::process::id()));
        let written = write_scenes([&scene, &scene], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, 2);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["description"], "Houston");
    }
}
