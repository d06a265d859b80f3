use eframe::egui::{Color32, RichText, Stroke, Ui, Vec2b};
use egui_plot::{Plot, PlotBounds, PlotPoints, Polygon};

use crate::color::{highlight, shade, ColorRamp};
use crate::render::hexbin::HexBin;
use crate::render::scene::Scene;

/// Room kept under the plot for the hover readout.
const READOUT_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Hexagon heatmap panel
// ---------------------------------------------------------------------------

/// Render one map panel: bold title, extruded hexagons seen from the scene's
/// camera pitch, and a readout of the hovered hexagon.
pub fn hex_panel(ui: &mut Ui, scene: &Scene) {
    ui.label(RichText::new(&scene.description).strong());

    let Some(layer) = scene.hex_layer() else {
        return;
    };
    let view = &scene.initial_view_state;
    let camera = Oblique::new(view.pitch);
    let grid = layer.grid();
    let ramp = ColorRamp::new(layer.color_range.clone());
    let extrude = |bin: &HexBin| if layer.extruded { bin.elevation } else { 0.0 };

    let width = ui.available_width();
    let height = (ui.available_height() - READOUT_HEIGHT).max(80.0);
    let home = view_bounds(scene, width as f64, height as f64);

    // Bounds are pushed once per camera; afterwards the user pans and zooms.
    let seeded_id = ui.id().with((
        "hex_panel_view",
        &scene.description,
        view.longitude.to_bits(),
        view.latitude.to_bits(),
        view.zoom.to_bits(),
    ));
    let seeded = ui.data(|d| d.get_temp::<bool>(seeded_id)).unwrap_or(false);

    let response = Plot::new(("hex_panel", &scene.description))
        .width(width)
        .height(height)
        .data_aspect(1.0)
        .auto_bounds(Vec2b::new(false, false))
        .allow_double_click_reset(false)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            let reset = !seeded || plot_ui.response().double_clicked();
            if reset {
                plot_ui.set_plot_bounds(home);
            }
            let bounds = if reset { home } else { plot_ui.plot_bounds() };
            // Skip hexagons more than one radius outside the view.
            let margin = layer.radius * layer.coverage.max(1.0);
            let visible: Vec<usize> = (0..layer.bins.len())
                .filter(|&i| {
                    let bin = &layer.bins[i];
                    let ground = camera.project(bin.center, 0.0);
                    let roof = camera.project(bin.center, extrude(bin));
                    overlaps(
                        &bounds,
                        [ground[0] - margin, ground[1].min(roof[1]) - margin],
                        [ground[0] + margin, ground[1].max(roof[1]) + margin],
                    )
                })
                .collect();

            let hovered = match plot_ui.pointer_coordinate() {
                Some(p) if layer.pickable => visible.iter().rev().copied().find(|&i| {
                    let bin = &layer.bins[i];
                    let top = camera.face(&grid.corners(bin.center, layer.coverage), extrude(bin));
                    contains(&top, [p.x, p.y])
                }),
                _ => None,
            };

            for &i in &visible {
                let bin = &layer.bins[i];
                let base = ramp.color(bin.color_index);
                let fill = if layer.auto_highlight && hovered == Some(i) {
                    highlight(base, 0.25)
                } else {
                    base
                };
                let corners = grid.corners(bin.center, layer.coverage);
                let z = extrude(bin);

                if z > 0.0 {
                    for k in south_faces(&corners, bin.center) {
                        let (a, b) = (corners[k], corners[(k + 1) % 6]);
                        let side = vec![
                            camera.project(a, 0.0),
                            camera.project(b, 0.0),
                            camera.project(b, z),
                            camera.project(a, z),
                        ];
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(side))
                                .fill_color(shade(fill, 0.2))
                                .stroke(Stroke::NONE),
                        );
                    }
                }

                let top = camera.face(&corners, z);
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(top))
                        .fill_color(fill)
                        .stroke(Stroke::new(0.5, shade(base, 0.3))),
                );
            }
            hovered
        });

    if !seeded {
        ui.data_mut(|d| d.insert_temp(seeded_id, true));
    }

    match response.inner.and_then(|i| layer.bins.get(i)) {
        Some(bin) => ui.label(format!(
            "{} enrollments near ({:.4}, {:.4})",
            bin.count, bin.lon, bin.lat
        )),
        None => ui.label(RichText::new(format!("{} hexagons", layer.bins.len())).color(Color32::GRAY)),
    };
}

/// Plot bounds for a `width` × `height` pixel panel at the scene's zoom,
/// centred on the scene's own centre.
pub fn view_bounds(scene: &Scene, width: f64, height: f64) -> PlotBounds {
    let view = &scene.initial_view_state;
    let mpp = scene.projection.meters_per_pixel(view.zoom);
    let [cx, cy] = scene.projection.project(view.longitude, view.latitude);
    let (half_w, half_h) = (width * mpp / 2.0, height * mpp / 2.0);
    PlotBounds::from_min_max([cx - half_w, cy - half_h], [cx + half_w, cy + half_h])
}

fn overlaps(bounds: &PlotBounds, lo: [f64; 2], hi: [f64; 2]) -> bool {
    let (min, max) = (bounds.min(), bounds.max());
    lo[0] <= max[0] && hi[0] >= min[0] && lo[1] <= max[1] && hi[1] >= min[1]
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Camera looking north, tilted `pitch` degrees from straight down: ground
/// `y` is foreshortened and height lifts points up the screen.
#[derive(Debug, Clone, Copy)]
struct Oblique {
    ground: f64,
    lift: f64,
}

impl Oblique {
    fn new(pitch_deg: f64) -> Self {
        let pitch = pitch_deg.to_radians();
        Self {
            ground: pitch.cos(),
            lift: pitch.sin(),
        }
    }

    fn project(&self, p: [f64; 2], z: f64) -> [f64; 2] {
        [p[0], p[1] * self.ground + z * self.lift]
    }

    fn face(&self, corners: &[[f64; 2]; 6], z: f64) -> Vec<[f64; 2]> {
        corners.iter().map(|&c| self.project(c, z)).collect()
    }
}

/// Indices `k` of edges `k → k+1` whose outward side faces the camera.
fn south_faces(corners: &[[f64; 2]; 6], center: [f64; 2]) -> Vec<usize> {
    (0..6)
        .filter(|&k| {
            let mid_y = (corners[k][1] + corners[(k + 1) % 6][1]) / 2.0;
            mid_y < center[1] - 1e-9
        })
        .collect()
}

/// Point-in-convex-polygon, either winding.
fn contains(polygon: &[[f64; 2]], p: [f64; 2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
        if cross != 0.0 {
            if sign != 0.0 && cross.signum() != sign {
                return false;
            }
            sign = cross.signum();
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::data::model::{CoordinateDataset, CoordinateRow};
    use crate::layout::PanelSpec;
    use crate::render::hexbin::HexGrid;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn scene_at(zoom: f64) -> Scene {
        let dataset = Arc::new(CoordinateDataset::new(
            vec![CoordinateRow::new(-95.0, 29.0), CoordinateRow::new(-97.0, 31.0)],
            "test",
        ));
        let panel = PanelSpec {
            title: "Houston".to_string(),
            lon: -95.3701,
            lat: 29.7601,
            zoom,
        };
        Scene::build(&dataset, &panel, &AppConfig::default(), &ColorRamp::default())
    }

    fn width(bounds: &PlotBounds) -> f64 {
        bounds.max()[0] - bounds.min()[0]
    }

    #[test]
    fn higher_zoom_narrows_the_view() {
        let at_8 = view_bounds(&scene_at(8.0), 400.0, 300.0);
        let at_9 = view_bounds(&scene_at(9.0), 400.0, 300.0);
        assert_relative_eq!(width(&at_9), width(&at_8) / 2.0, max_relative = 1e-9);
        // Roughly 133 m per pixel over Houston at zoom 9.
        let mpp = 2.0 * std::f64::consts::PI * 6_378_137.0 * 29.7601f64.to_radians().cos() / (512.0 * 512.0);
        assert_relative_eq!(width(&at_9), 400.0 * mpp, max_relative = 1e-9);
    }

    #[test]
    fn view_is_centred_on_the_panel() {
        let scene = scene_at(9.0);
        let bounds = view_bounds(&scene, 400.0, 300.0);
        let centre = [
            (bounds.min()[0] + bounds.max()[0]) / 2.0,
            (bounds.min()[1] + bounds.max()[1]) / 2.0,
        ];
        let (lon, lat) = scene.projection.unproject(centre);
        assert_relative_eq!(lon, -95.3701, epsilon = 1e-9);
        assert_relative_eq!(lat, 29.7601, epsilon = 1e-9);
        assert_relative_eq!(bounds.max()[1] - bounds.min()[1], width(&bounds) * 0.75, max_relative = 1e-9);
    }

    #[test]
    fn bins_outside_the_view_are_skipped() {
        let bounds = PlotBounds::from_min_max([-1000.0, -1000.0], [1000.0, 1000.0]);
        assert!(overlaps(&bounds, [900.0, 900.0], [1900.0, 1900.0]));
        assert!(overlaps(&bounds, [-500.0, -500.0], [500.0, 500.0]));
        assert!(!overlaps(&bounds, [1001.0, 0.0], [2001.0, 500.0]));
        assert!(!overlaps(&bounds, [0.0, -3000.0], [500.0, -1001.0]));
    }

    #[test]
    fn flat_camera_is_identity() {
        let camera = Oblique::new(0.0);
        assert_eq!(camera.project([10.0, 20.0], 500.0), [10.0, 20.0]);
    }

    #[test]
    fn pitched_camera_lifts_height() {
        let camera = Oblique::new(45.0);
        let [x, y] = camera.project([0.0, 100.0], 100.0);
        assert_eq!(x, 0.0);
        assert_relative_eq!(y, 200.0 * 45f64.to_radians().cos(), epsilon = 1e-9);
    }

    #[test]
    fn two_side_faces_face_south() {
        let grid = HexGrid::new(500.0);
        let corners = grid.corners([0.0, 0.0], 1.0);
        assert_eq!(south_faces(&corners, [0.0, 0.0]), vec![2, 3]);
    }

    #[test]
    fn hexagon_contains_its_centre_only() {
        let grid = HexGrid::new(500.0);
        let corners = grid.corners([1000.0, 1000.0], 1.0);
        assert!(contains(&corners, [1000.0, 1000.0]));
        assert!(contains(&corners, [1000.0, 1400.0]));
        assert!(!contains(&corners, [1000.0, 1600.0]));
        assert!(!contains(&corners, [1480.0, 1000.0]));
    }
}
