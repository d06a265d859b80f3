use std::sync::Arc;

use crate::color::ColorRamp;
use crate::config::{AppConfig, PanelCenter};
use crate::data::error::LoadError;
use crate::data::loader::{CoordinateLoader, DatasetCache};
use crate::data::midpoint::MidpointMemo;
use crate::data::model::{CoordinateDataset, Midpoint};
use crate::data::source::SourceFetcher;
use crate::render::scene::Scene;

/// Fewest rows a heatmap is drawn for.
pub const MIN_ROWS: usize = 2;

// ---------------------------------------------------------------------------
// Page plan
// ---------------------------------------------------------------------------

/// A resolved panel: everything the renderer needs besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub title: String,
    pub lon: f64,
    pub lat: f64,
    pub zoom: f64,
}

/// Panels arranged in rows; each row is split into equal columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub midpoint: Midpoint,
    pub rows: Vec<Vec<PanelSpec>>,
}

impl PagePlan {
    pub fn panels(&self) -> impl Iterator<Item = &PanelSpec> {
        self.rows.iter().flatten()
    }
}

/// Validate the row count, compute the (memoised) midpoint and resolve every
/// configured panel, in layout order.
pub fn compose_page(
    dataset: &Arc<CoordinateDataset>,
    config: &AppConfig,
    memo: &mut MidpointMemo,
) -> Result<PagePlan, LoadError> {
    if dataset.len() < MIN_ROWS {
        return Err(LoadError::InsufficientData { rows: dataset.len() });
    }
    let midpoint = memo
        .get(dataset)
        .ok_or(LoadError::InsufficientData { rows: 0 })?;

    let rows = config
        .layout
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|name| {
                    let Some(panel) = config.panel(name) else {
                        log::warn!("Layout names unknown panel '{name}', skipping");
                        return None;
                    };
                    let (lon, lat) = match panel.center {
                        PanelCenter::Midpoint(_) => (midpoint.lon, midpoint.lat),
                        PanelCenter::Fixed { lon, lat } => (lon, lat),
                    };
                    Some(PanelSpec {
                        title: panel.name.clone(),
                        lon,
                        lat,
                        zoom: panel.zoom,
                    })
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(PagePlan { midpoint, rows })
}

// ---------------------------------------------------------------------------
// Page: plan + one scene per panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Page {
    pub dataset: Arc<CoordinateDataset>,
    pub plan: PagePlan,
    /// Same shape as `plan.rows`.
    pub scenes: Vec<Vec<Scene>>,
}

impl Page {
    pub fn build(
        dataset: Arc<CoordinateDataset>,
        config: &AppConfig,
        memo: &mut MidpointMemo,
        ramp: &ColorRamp,
    ) -> Result<Self, LoadError> {
        let plan = compose_page(&dataset, config, memo)?;
        let scenes = plan
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|panel| Scene::build(&dataset, panel, config, ramp))
                    .collect()
            })
            .collect();
        log::info!(
            "Composed {} panels in {} rows around midpoint {}",
            plan.panels().count(),
            plan.rows.len(),
            plan.midpoint
        );
        Ok(Self {
            dataset,
            plan,
            scenes,
        })
    }

    pub fn all_scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().flatten()
    }
}

/// Load (through the cache) and compose: the whole pipeline short of drawing.
pub fn load_page<F: SourceFetcher>(
    config: &AppConfig,
    loader: &CoordinateLoader<F>,
    cache: &DatasetCache,
    memo: &mut MidpointMemo,
    ramp: &ColorRamp,
) -> Result<Page, LoadError> {
    let dataset = cache.get_or_load(loader)?;
    Page::build(dataset, config, memo, ramp)
}
