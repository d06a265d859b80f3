use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// World width in pixels at zoom 0.
const WORLD_TILE_PX: f64 = 512.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Web-Mercator projection re-centred on a panel, in metres that are true to
/// scale at the centre latitude. `x` grows east, `y` grows north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: [f64; 2],
    scale: f64,
    center_lat: f64,
}

impl LocalProjection {
    pub fn new(center_lon: f64, center_lat: f64) -> Self {
        let center_lat = center_lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        Self {
            origin: mercator(center_lon, center_lat),
            scale: center_lat.to_radians().cos(),
            center_lat,
        }
    }

    pub fn project(&self, lon: f64, lat: f64) -> [f64; 2] {
        let [x, y] = mercator(lon, lat);
        [
            (x - self.origin[0]) * self.scale,
            (y - self.origin[1]) * self.scale,
        ]
    }

    pub fn unproject(&self, point: [f64; 2]) -> (f64, f64) {
        let x = point[0] / self.scale + self.origin[0];
        let y = point[1] / self.scale + self.origin[1];
        let lon = (x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
        (lon, lat)
    }

    /// Ground metres covered by one screen pixel at `zoom`.
    pub fn meters_per_pixel(&self, zoom: f64) -> f64 {
        2.0 * PI * EARTH_RADIUS_M * self.center_lat.to_radians().cos()
            / (WORLD_TILE_PX * 2f64.powf(zoom))
    }
}

fn mercator(lon: f64, lat: f64) -> [f64; 2] {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    [
        EARTH_RADIUS_M * lon.to_radians(),
        EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    ]
}
