use eframe::egui;

use crate::state::{AppState, Tab};
use crate::ui::{overview, panels, rankings};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ScoutboardApp {
    pub state: AppState,
}

impl ScoutboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ScoutboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // First frame after startup (or after swapping the store) loads
        // synchronously; expiry re-loads the same way. Accepted blocking.
        if self.state.data.is_none() && self.state.load_error.is_none() {
            self.state.reload();
        }
        self.state.maybe_refresh();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Fetch failure: nothing else renders ----
        if let Some(message) = self.state.load_error.clone() {
            egui::CentralPanel::default().show(ctx, |ui| {
                panels::error_screen(ui, &message);
            });
            return;
        }

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.state.active_tab, Tab::Rankings, "Company Rankings");
                ui.selectable_value(&mut self.state.active_tab, Tab::Overview, "Data Overview");
            });
            ui.separator();

            match self.state.active_tab {
                Tab::Rankings => rankings::show(ui, &mut self.state),
                Tab::Overview => overview::show(ui, &self.state),
            }
        });
    }
}
