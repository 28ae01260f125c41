use eframe::egui::{RichText, ScrollArea, Ui};

use crate::data::stats::{industry_counts, stage_counts, tier_histogram};
use crate::state::AppState;
use crate::ui::charts;

/// The aggregate-distribution tab. Always drawn over the full master table
/// and the raw features dataset; the sidebar filters do not apply here.
pub fn show(ui: &mut Ui, state: &AppState) {
    let Some(data) = &state.data else {
        return;
    };
    let records = &data.master.records;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Data Overview");
            ui.label(
                RichText::new(format!(
                    "Distributions over all {} scored companies.",
                    records.len()
                ))
                .weak(),
            );
            ui.add_space(8.0);

            let hiring_samples: Vec<(f64, &str)> = records
                .iter()
                .filter_map(|r| r.hiring_tier.as_deref().map(|tier| (r.hiring_score, tier)))
                .collect();
            charts::stacked_histogram(
                ui,
                "hiring_histogram",
                "Hiring score distribution",
                &tier_histogram(&hiring_samples, 0.0, 100.0, 20),
                "Hiring score",
            );
            ui.add_space(12.0);

            let momentum_samples: Vec<(f64, &str)> = records
                .iter()
                .filter_map(|r| {
                    match (r.momentum_score, r.momentum_tier.as_deref()) {
                        (Some(score), Some(tier)) => Some((score, tier)),
                        _ => None,
                    }
                })
                .collect();
            charts::stacked_histogram(
                ui,
                "momentum_histogram",
                "Momentum score distribution",
                &tier_histogram(&momentum_samples, 0.0, 1.0, 20),
                "Momentum score",
            );
            ui.add_space(12.0);
            ui.separator();

            ui.columns(2, |columns| {
                charts::horizontal_bar_chart(
                    &mut columns[0],
                    "industry_bars",
                    "Industry breakdown",
                    &industry_counts(&data.bundle.features),
                );
                charts::donut_chart(
                    &mut columns[1],
                    "Funding stage mix",
                    &stage_counts(records),
                );
            });
        });
}
