use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Enrollment clusters: (lon, lat, spread in degrees, share of points).
const CLUSTERS: &[(f64, f64, f64, f64)] = &[
    (-95.3701, 29.7601, 0.25, 0.34),   // Houston
    (-96.9209, 32.7079, 0.22, 0.26),   // Dallas
    (-97.740556, 30.274722, 0.15, 0.16), // Austin
    (-98.491142, 29.424349, 0.18, 0.14), // San Antonio
];

/// Bounding box for the scattered remainder.
const TEXAS_BOUNDS: ((f64, f64), (f64, f64)) = ((-106.6, -93.5), (25.8, 36.5));

const N_POINTS: usize = 5000;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn sample_point(rng: &mut SimpleRng) -> (f64, f64) {
    let mut pick = rng.next_f64();
    for &(lon, lat, spread, share) in CLUSTERS {
        if pick < share {
            return (rng.gauss(lon, spread), rng.gauss(lat, spread));
        }
        pick -= share;
    }
    let ((lon_lo, lon_hi), (lat_lo, lat_hi)) = TEXAS_BOUNDS;
    (rng.uniform(lon_lo, lon_hi), rng.uniform(lat_lo, lat_hi))
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let (lons, lats): (Vec<f64>, Vec<f64>) = (0..N_POINTS).map(|_| sample_point(&mut rng)).unzip();

    // CSV: header row, then lon,lat
    let csv_path = "data.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating data.csv")?;
    writer.write_record(["lon", "lat"])?;
    for (lon, lat) in lons.iter().zip(&lats) {
        writer.write_record([format!("{lon:.6}"), format!("{lat:.6}")])?;
    }
    writer.flush().context("flushing data.csv")?;

    // Parquet: same two columns
    let schema = Arc::new(Schema::new(vec![
        Field::new("lon", DataType::Float64, false),
        Field::new("lat", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(lons)),
            Arc::new(Float64Array::from(lats)),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "data.parquet";
    let file = std::fs::File::create(parquet_path).context("creating data.parquet")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    println!("Wrote {N_POINTS} enrollment points to {csv_path} and {parquet_path}");
    Ok(())
}
