mod app;
mod cli;
mod color;
mod config;
mod data;
mod layout;
mod render;
mod state;
mod ui;

use anyhow::{Context, Result};
use app::EnrollmentApp;
use config::AppConfig;
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let args: Vec<String> = std::env::args().collect();
    if cli::handle_commands(&args, &config)? {
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    let title = config.page_title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            // Light base map.
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Ok(Box::new(EnrollmentApp::new(config)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("running the viewer: {e}"))
}
