use eframe::egui::{self, Color32, Frame, RichText, Ui};
use egui_extras::{Size, StripBuilder};

use crate::state::AppState;
use crate::ui::map;

/// Height of one row of map panels.
const ROW_HEIGHT: f32 = 420.0;

// ---------------------------------------------------------------------------
// Page body – title, then the map grid or the halt banner
// ---------------------------------------------------------------------------

/// Render the page: title, subtitle, and either the panel grid or, when the
/// pipeline halted, only the error banner.
pub fn page(ui: &mut Ui, state: &AppState) {
    ui.heading(&state.config.page_title);
    ui.label(RichText::new(&state.config.subtitle).size(18.0));
    ui.add_space(8.0);

    let page = match &state.page {
        Ok(page) => page,
        Err(e) => {
            error_banner(ui, &e.user_message());
            return;
        }
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            StripBuilder::new(ui)
                .sizes(Size::exact(ROW_HEIGHT), page.scenes.len())
                .vertical(|mut rows| {
                    for row in &page.scenes {
                        rows.strip(|builder| {
                            builder
                                .sizes(Size::remainder(), row.len())
                                .horizontal(|mut cells| {
                                    for scene in row {
                                        cells.cell(|ui: &mut Ui| map::hex_panel(ui, scene));
                                    }
                                });
                        });
                    }
                });
        });
}

fn error_banner(ui: &mut Ui, message: &str) {
    Frame::new()
        .fill(Color32::from_rgb(255, 235, 235))
        .stroke((1.0, Color32::from_rgb(220, 80, 80)))
        .inner_margin(12.0)
        .corner_radius(4.0)
        .show(ui, |ui: &mut Ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(message).color(Color32::from_rgb(160, 20, 20)));
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.page.is_ok(), egui::Button::new("Export scenes…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Ok(page) = &state.page {
            ui.label(format!(
                "{} enrollments from {}, midpoint {}",
                page.dataset.len(),
                page.dataset.origin,
                page.plan.midpoint
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::DARK_GRAY));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open enrollment coordinates")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_file(&path);
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export scenes")
        .add_filter("JSON", &["json"])
        .set_file_name("scenes.json")
        .save_file();

    if let Some(path) = file {
        state.export_scenes(&path);
    }
}
