use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_3;

use super::projection::LocalProjection;
use crate::config::LayerConfig;
use crate::data::model::CoordinateDataset;

// ---------------------------------------------------------------------------
// Hexagon grid
// ---------------------------------------------------------------------------

/// Pointy-top hexagon grid over planar metres. Odd rows are shifted east by
/// half a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexGrid {
    radius: f64,
    dx: f64,
    dy: f64,
}

impl HexGrid {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            dx: 2.0 * radius * FRAC_PI_3.sin(),
            dy: 1.5 * radius,
        }
    }

    /// `(column, row)` of the hexagon containing `point`.
    pub fn cell_of(&self, point: [f64; 2]) -> (i64, i64) {
        let py = point[1] / self.dy;
        let mut pj = round_half_up(py);
        let px = point[0] / self.dx - odd(pj) / 2.0;
        let mut pi = round_half_up(px);
        let py1 = py - pj;

        // Inside the slanted band between rows: take the closer of the two
        // candidate centres, measured in metres.
        if py1.abs() * 3.0 > 1.0 {
            let px1 = px - pi;
            let pi2 = pi + if px < pi { -0.5 } else { 0.5 };
            let pj2 = pj + if py < pj { -1.0 } else { 1.0 };
            let px2 = px - pi2;
            let py2 = py - pj2;
            let near = (px1 * self.dx).powi(2) + (py1 * self.dy).powi(2);
            let far = (px2 * self.dx).powi(2) + (py2 * self.dy).powi(2);
            if near > far {
                pi = pi2 + if odd(pj) == 1.0 { 0.5 } else { -0.5 };
                pj = pj2;
            }
        }
        (pi.round() as i64, pj.round() as i64)
    }

    pub fn center_of(&self, cell: (i64, i64)) -> [f64; 2] {
        let (col, row) = cell;
        [
            (col as f64 + (row & 1) as f64 / 2.0) * self.dx,
            row as f64 * self.dy,
        ]
    }

    /// Corner points clockwise from north, at `coverage` × radius.
    pub fn corners(&self, center: [f64; 2], coverage: f64) -> [[f64; 2]; 6] {
        let r = self.radius * coverage;
        std::array::from_fn(|k| {
            let angle = k as f64 * FRAC_PI_3;
            [center[0] + r * angle.sin(), center[1] + r * angle.cos()]
        })
    }
}

fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn odd(row: f64) -> f64 {
    ((row as i64) & 1) as f64
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// One non-empty hexagon.
#[derive(Debug, Clone, PartialEq)]
pub struct HexBin {
    pub cell: (i64, i64),
    /// Planar centre in the panel's projection.
    pub center: [f64; 2],
    pub lon: f64,
    pub lat: f64,
    pub count: usize,
    /// Extrusion height in metres.
    pub elevation: f64,
    /// Index into the colour ramp.
    pub color_index: usize,
}

/// Count points per hexagon.
pub fn count_cells(grid: &HexGrid, points: impl IntoIterator<Item = [f64; 2]>) -> BTreeMap<(i64, i64), usize> {
    let mut counts = BTreeMap::new();
    for point in points {
        *counts.entry(grid.cell_of(point)).or_insert(0) += 1;
    }
    counts
}

/// Bin every row of the dataset, then scale counts to elevations and
/// quantise them to `color_steps` colours. Ordered north to south, then west
/// to east, so later bins are nearer the camera.
pub fn bin_dataset(
    dataset: &CoordinateDataset,
    projection: &LocalProjection,
    layer: &LayerConfig,
    color_steps: usize,
) -> Vec<HexBin> {
    let grid = HexGrid::new(layer.radius);
    let counts = count_cells(
        &grid,
        dataset.rows.iter().map(|row| projection.project(row.lon, row.lat)),
    );

    let min = counts.values().copied().min().unwrap_or(0);
    let max = counts.values().copied().max().unwrap_or(0);

    let mut bins: Vec<HexBin> = counts
        .into_iter()
        .map(|(cell, count)| {
            let center = grid.center_of(cell);
            let (lon, lat) = projection.unproject(center);
            HexBin {
                cell,
                center,
                lon,
                lat,
                count,
                elevation: elevation(count, min, max, layer),
                color_index: quantize(count, min, max, color_steps),
            }
        })
        .collect();

    bins.sort_by(|a, b| b.cell.1.cmp(&a.cell.1).then(a.cell.0.cmp(&b.cell.0)));
    bins
}

/// Linear map of `[min, max]` onto the elevation range, times the scale.
/// A single distinct count sits mid-range.
pub fn elevation(count: usize, min: usize, max: usize, layer: &LayerConfig) -> f64 {
    let [low, high] = layer.elevation_range;
    let t = if max > min {
        (count - min) as f64 / (max - min) as f64
    } else {
        0.5
    };
    (low + t * (high - low)) * layer.elevation_scale
}

/// Equal-width buckets over `[min, max]`. A single distinct count takes the
/// first colour.
pub fn quantize(count: usize, min: usize, max: usize, steps: usize) -> usize {
    if steps == 0 || max <= min {
        return 0;
    }
    let t = (count - min) as f64 / (max - min) as f64;
    ((t * steps as f64).floor() as usize).min(steps - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CoordinateRow;
    use approx::assert_relative_eq;

    fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
    }

    #[test]
    fn centres_map_to_their_own_cell() {
        let grid = HexGrid::new(500.0);
        for cell in [(0, 0), (3, -2), (-4, 7), (-1, -1), (10, 5)] {
            assert_eq!(grid.cell_of(grid.center_of(cell)), cell);
        }
    }

    #[test]
    fn points_go_to_nearest_centre() {
        let grid = HexGrid::new(500.0);
        // A lattice of probe points; the assigned centre must be at least as
        // close as any neighbouring centre.
        for i in -20..20 {
            for j in -20..20 {
                let p = [i as f64 * 97.3, j as f64 * 113.9];
                let cell = grid.cell_of(p);
                let own = distance(p, grid.center_of(cell));
                assert!(own <= 500.0 + 1e-9, "{p:?} is {own} m from its centre");
                for dc in -1..=1 {
                    for dr in -1..=1 {
                        let other = grid.center_of((cell.0 + dc, cell.1 + dr));
                        assert!(own <= distance(p, other) + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn corners_sit_on_the_radius() {
        let grid = HexGrid::new(500.0);
        let center = grid.center_of((2, 3));
        for corner in grid.corners(center, 1.0) {
            assert_relative_eq!(distance(center, corner), 500.0, epsilon = 1e-9);
        }
        assert_relative_eq!(grid.corners(center, 0.5)[0][1] - center[1], 250.0, epsilon = 1e-9);
    }

    #[test]
    fn counts_and_scales_bins() {
        let projection = LocalProjection::new(-95.3701, 29.7601);
        // Three points in Houston, one in Dallas.
        let dataset = CoordinateDataset::new(
            vec![
                CoordinateRow::new(-95.3701, 29.7601),
                CoordinateRow::new(-95.3702, 29.7602),
                CoordinateRow::new(-95.3700, 29.7600),
                CoordinateRow::new(-96.9209, 32.7079),
            ],
            "test",
        );
        let bins = bin_dataset(&dataset, &projection, &LayerConfig::default(), 6);

        assert_eq!(bins.len(), 2);
        // Dallas is further north, so it comes first.
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 3);
        assert_relative_eq!(bins[0].elevation, 0.0);
        assert_relative_eq!(bins[1].elevation, 4000.0);
        assert_eq!(bins[0].color_index, 0);
        assert_eq!(bins[1].color_index, 5);
        assert_relative_eq!(bins[1].lon, -95.3701, epsilon = 0.01);
        assert_relative_eq!(bins[1].lat, 29.7601, epsilon = 0.01);
    }

    #[test]
    fn uniform_counts_sit_mid_range() {
        let layer = LayerConfig::default();
        assert_relative_eq!(elevation(4, 4, 4, &layer), 2000.0);
        assert_eq!(quantize(4, 4, 4, 6), 0);
    }

    #[test]
    fn quantize_buckets() {
        assert_eq!(quantize(1, 1, 13, 6), 0);
        assert_eq!(quantize(6, 1, 13, 6), 2);
        assert_eq!(quantize(7, 1, 13, 6), 3);
        assert_eq!(quantize(13, 1, 13, 6), 5);
    }
}
