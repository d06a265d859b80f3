use std::path::Path;
use std::sync::Arc;

use crate::color::ColorRamp;
use crate::config::AppConfig;
use crate::data::error::LoadError;
use crate::data::loader::{self, CoordinateLoader, DATASET};
use crate::data::midpoint::MidpointMemo;
use crate::data::model::CoordinateDataset;
use crate::layout::{self, Page};
use crate::render::scene::write_scenes;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    pub ramp: ColorRamp,

    /// Midpoint of the current dataset, recomputed only for a new dataset.
    pub memo: MidpointMemo,

    /// Composed page, or the error that halted it.
    pub page: Result<Page, LoadError>,

    /// Non-fatal status (export results, dialog errors) shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    /// Run the pipeline for the configured source through the process-wide
    /// cache.
    pub fn new(config: AppConfig) -> Self {
        let ramp = ColorRamp::default();
        let mut memo = MidpointMemo::new();
        let loader = CoordinateLoader::new(
            config.data_path.clone(),
            config.fallback_base_url.clone(),
            config.column_order,
        );
        let page = layout::load_page(&config, &loader, &DATASET, &mut memo, &ramp);
        if let Err(e) = &page {
            log::error!("Halting page render: {e}");
        }
        Self {
            config,
            ramp,
            memo,
            page,
            status_message: None,
        }
    }

    /// Replace the dataset with one opened by the user.
    pub fn open_file(&mut self, path: &Path) {
        match loader::load_file(path, self.config.column_order) {
            Ok(dataset) => {
                log::info!("Loaded {} coordinates from {}", dataset.len(), path.display());
                self.set_dataset(Arc::new(dataset));
            }
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.page = Err(e);
            }
        }
    }

    /// Compose the page for a new dataset.
    pub fn set_dataset(&mut self, dataset: Arc<CoordinateDataset>) {
        self.page = Page::build(dataset, &self.config, &mut self.memo, &self.ramp);
        if let Err(e) = &self.page {
            log::error!("Halting page render: {e}");
        }
        self.status_message = None;
    }

    /// Write the current page's scenes as JSON.
    pub fn export_scenes(&mut self, path: &Path) {
        let Ok(page) = &self.page else {
            self.status_message = Some("Nothing to export".to_string());
            return;
        };
        self.status_message = Some(match write_scenes(page.all_scenes(), path) {
            Ok(n) => format!("Exported {n} scenes to {}", path.display()),
            Err(e) => {
                log::error!("Scene export failed: {e:#}");
                format!("Error: {e:#}")
            }
        });
    }

    /// Banner text when the page halted.
    pub fn halt_message(&self) -> Option<String> {
        self.page.as_ref().err().map(LoadError::user_message)
    }
}
