use std::sync::Arc;

use super::model::{CoordinateDataset, Midpoint};

/// Componentwise arithmetic mean of the dataset. `None` when empty.
pub fn midpoint(dataset: &CoordinateDataset) -> Option<Midpoint> {
    if dataset.is_empty() {
        return None;
    }
    let n = dataset.len() as f64;
    let (lon_sum, lat_sum) = dataset
        .rows
        .iter()
        .fold((0.0, 0.0), |(lon, lat), row| (lon + row.lon, lat + row.lat));
    Some(Midpoint {
        lon: lon_sum / n,
        lat: lat_sum / n,
    })
}

// ---------------------------------------------------------------------------
// Memoisation keyed by dataset identity
// ---------------------------------------------------------------------------

/// Remembers the midpoint of the last dataset it was asked about. A
/// different `Arc` (a newly loaded dataset) triggers a recompute.
#[derive(Debug, Default)]
pub struct MidpointMemo {
    entry: Option<(Arc<CoordinateDataset>, Option<Midpoint>)>,
    computations: usize,
}

impl MidpointMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, dataset: &Arc<CoordinateDataset>) -> Option<Midpoint> {
        if let Some((cached, value)) = &self.entry {
            if Arc::ptr_eq(cached, dataset) {
                return *value;
            }
        }
        let value = midpoint(dataset);
        self.computations += 1;
        log::debug!("Computed midpoint {value:?} for {}", dataset.origin);
        self.entry = Some((Arc::clone(dataset), value));
        value
    }

    /// How many times the mean has actually been computed.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
