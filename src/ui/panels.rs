use std::collections::BTreeSet;

use eframe::egui::{self, RichText, ScrollArea, Slider, Ui};

use crate::color::tier_color;
use crate::data::master::TIER_ORDER;
use crate::data::remote::ObjectStore;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open local snapshot…").clicked() {
                open_snapshot_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.strong("Scoutboard");
        ui.label(RichText::new("weekly startup hiring & momentum rankings").weak());
        ui.separator();

        if ui.button("⟳ Refresh").clicked() {
            state.refresh();
        }

        if let Some(data) = &state.data {
            ui.separator();
            ui.label(format!(
                "{} companies · {} visible · loaded {} min ago",
                data.master.len(),
                state.visible.len(),
                data.loaded_at.elapsed().as_secs() / 60
            ));
        }
    });
}

/// Point the app at a snapshot directory written by `generate_snapshot`.
fn open_snapshot_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open snapshot directory")
        .pick_folder();
    if let Some(root) = folder {
        state.open_local_snapshot(root);
    }
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Any change recomputes the visible set.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let (industry_options, stage_options) = match &state.data {
        Some(data) => (
            data.master.industry_options.clone(),
            data.master.stage_options.clone(),
        ),
        None => {
            ui.label("No data loaded.");
            return;
        }
    };
    let tier_options: Vec<String> = TIER_ORDER.iter().map(|t| t.to_string()).collect();

    let before = state.filters.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Minimum hiring score");
            ui.add(
                Slider::new(&mut state.filters.min_score, 0.0..=100.0)
                    .step_by(5.0)
                    .integer(),
            );
            ui.separator();

            checkbox_group(
                ui,
                "Momentum tier",
                &tier_options,
                &mut state.filters.tiers,
                true,
            );
            checkbox_group(
                ui,
                "Industry",
                &industry_options,
                &mut state.filters.industries,
                false,
            );
            checkbox_group(
                ui,
                "Funding stage",
                &stage_options,
                &mut state.filters.stages,
                false,
            );

            ui.strong("Company search");
            ui.text_edit_singleline(&mut state.filters.search);
            ui.add_space(8.0);
            ui.separator();
            ui.label(RichText::new(format!("Source: {}", state.store.describe())).weak());
        });

    if state.filters != before {
        state.refilter();
    }
}

/// A collapsible multi-select over `options`. An empty `selected` set means
/// "no constraint", so every box renders checked; a full explicit selection
/// is normalized back to the empty set.
fn checkbox_group(
    ui: &mut Ui,
    label: &str,
    options: &[String],
    selected: &mut BTreeSet<String>,
    color_labels: bool,
) {
    let shown = if selected.is_empty() {
        options.len()
    } else {
        selected.len()
    };
    let header = format!("{label}  ({shown}/{})", options.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(label)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("All").clicked() {
                selected.clear();
            }

            let all_checked = selected.is_empty();
            for option in options {
                let mut checked = all_checked || selected.contains(option);
                let mut text = RichText::new(option);
                if color_labels {
                    text = text.color(tier_color(option));
                }
                if ui.checkbox(&mut checked, text).changed() {
                    if all_checked {
                        // Unchecking one box turns "everything" into an
                        // explicit selection of the rest.
                        *selected = options
                            .iter()
                            .filter(|o| *o != option)
                            .cloned()
                            .collect();
                    } else if checked {
                        selected.insert(option.clone());
                    } else {
                        selected.remove(option);
                    }
                }
            }
            if selected.len() == options.len() {
                selected.clear();
            }
        });
    ui.separator();
}

// ---------------------------------------------------------------------------
// Fetch failure screen
// ---------------------------------------------------------------------------

/// Full-window error panel; shown instead of any data when a load fails.
pub fn error_screen(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() * 0.3);
        ui.heading("⚠ Could not load data");
        ui.add_space(8.0);
        ui.label(message);
        ui.add_space(8.0);
        ui.label(
            RichText::new(
                "Check the AWS credentials and bucket settings in scoutboard.toml \
                 (or the AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY environment \
                 variables), then press Refresh.",
            )
            .weak(),
        );
    });
}
