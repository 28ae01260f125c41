use eframe::egui::{self, ProgressBar, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::tier_color;
use crate::data::loader::DataBundle;
use crate::data::master::{CompanyRecord, MasterTable};
use crate::data::model::Row;
use crate::data::stats::KpiSummary;
use crate::state::{AppState, SortKey, SortState};
use crate::ui::charts;

/// The ranked-table tab: KPI cards, the sortable ranking table and the
/// detail pane for the selected company.
pub fn show(ui: &mut Ui, state: &mut AppState) {
    let (clicked_sort, clicked_company) = {
        let Some(data) = &state.data else {
            return;
        };

        let summary = KpiSummary::over(state.visible.iter().map(|&i| &data.master.records[i]));
        kpi_cards(ui, &summary);
        ui.add_space(8.0);

        if state.visible.is_empty() {
            ui.label(
                RichText::new("No companies match the current filters. Loosen them to see results.")
                    .italics(),
            );
            return;
        }

        let mut clicked_sort: Option<SortKey> = None;
        let mut clicked_company: Option<String> = None;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                ranking_table(
                    ui,
                    &data.master,
                    &state.visible,
                    state.sort,
                    state.selected_company.as_deref(),
                    &mut clicked_sort,
                    &mut clicked_company,
                );

                if let Some(id) = &state.selected_company {
                    if let Some(record) = data.master.find(id) {
                        ui.add_space(12.0);
                        ui.separator();
                        detail_view(ui, record, &data.master, &data.bundle);
                    }
                }
            });

        (clicked_sort, clicked_company)
    };

    if let Some(key) = clicked_sort {
        state.set_sort(key);
    }
    if let Some(id) = clicked_company {
        state.selected_company = Some(id);
    }
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

fn kpi_cards(ui: &mut Ui, summary: &KpiSummary) {
    ui.columns(4, |columns| {
        kpi_card(&mut columns[0], "Companies Shown", summary.shown.to_string(), None);
        kpi_card(
            &mut columns[1],
            "Avg Hiring Score",
            format!("{:.1}", summary.avg_hiring_score),
            None,
        );
        kpi_card(
            &mut columns[2],
            "High Momentum",
            summary.high_momentum.to_string(),
            Some(format!("{:.0}% of shown", summary.high_momentum_pct)),
        );
        kpi_card(
            &mut columns[3],
            "Actively Hiring",
            summary.actively_hiring.to_string(),
            Some(format!("{:.0}% of shown", summary.actively_hiring_pct)),
        );
    });
}

fn kpi_card(ui: &mut Ui, label: &str, value: String, caption: Option<String>) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.label(RichText::new(label).small().weak());
        ui.label(RichText::new(value).heading());
        if let Some(caption) = caption {
            ui.label(RichText::new(caption).small().weak());
        }
    });
}

// ---------------------------------------------------------------------------
// Ranking table
// ---------------------------------------------------------------------------

const HEADERS: [(&str, SortKey); 9] = [
    ("Rank", SortKey::Rank),
    ("Company", SortKey::Company),
    ("Hiring Score", SortKey::HiringScore),
    ("Hiring Tier", SortKey::HiringTier),
    ("Momentum", SortKey::Momentum),
    ("Momentum Tier", SortKey::MomentumTier),
    ("Industry", SortKey::Industry),
    ("Stage", SortKey::Stage),
    ("Total Funding", SortKey::Funding),
];

fn ranking_table(
    ui: &mut Ui,
    master: &MasterTable,
    visible: &[usize],
    sort: Option<SortState>,
    selected: Option<&str>,
    clicked_sort: &mut Option<SortKey>,
    clicked_company: &mut Option<String>,
) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::remainder().at_least(150.0))
        .columns(Column::auto(), 7)
        .header(22.0, |mut header| {
            for (label, key) in HEADERS {
                header.col(|ui| {
                    let is_active = sort.map(|s| s.key == key).unwrap_or(false);
                    let text = match sort {
                        Some(s) if s.key == key && s.ascending => format!("{label} ▲"),
                        Some(s) if s.key == key => format!("{label} ▼"),
                        _ => label.to_string(),
                    };
                    if ui
                        .selectable_label(is_active, RichText::new(text).strong())
                        .clicked()
                    {
                        *clicked_sort = Some(key);
                    }
                });
            }
        })
        .body(|body| {
            body.rows(20.0, visible.len(), |mut row| {
                let record = &master.records[visible[row.index()]];
                row.col(|ui| {
                    ui.label(record.hiring_rank.to_string());
                });
                row.col(|ui| {
                    let name = record.name.as_deref().unwrap_or(&record.company_id);
                    let is_selected = selected == Some(record.company_id.as_str());
                    if ui.selectable_label(is_selected, name).clicked() {
                        *clicked_company = Some(record.company_id.clone());
                    }
                });
                row.col(|ui| {
                    ui.label(format!("{:.1}", record.hiring_score));
                });
                row.col(|ui| {
                    tier_label(ui, record.hiring_tier.as_deref());
                });
                row.col(|ui| match record.momentum_score {
                    Some(score) => {
                        ui.add(
                            ProgressBar::new(score as f32)
                                .desired_width(80.0)
                                .text(format!("{score:.2}")),
                        );
                    }
                    None => {
                        ui.label("N/A");
                    }
                });
                row.col(|ui| {
                    tier_label(ui, record.momentum_tier.as_deref());
                });
                row.col(|ui| {
                    ui.label(&record.primary_industry);
                });
                row.col(|ui| {
                    ui.label(&record.funding_stage_label);
                });
                row.col(|ui| {
                    ui.label(&record.total_funding_display);
                });
            });
        });
}

fn tier_label(ui: &mut Ui, tier: Option<&str>) {
    match tier {
        Some(tier) => {
            ui.colored_label(tier_color(tier), tier);
        }
        None => {
            ui.label("N/A");
        }
    }
}

// ---------------------------------------------------------------------------
// Company detail
// ---------------------------------------------------------------------------

fn detail_view(ui: &mut Ui, record: &CompanyRecord, master: &MasterTable, bundle: &DataBundle) {
    ui.heading(record.name.as_deref().unwrap_or(&record.company_id));
    let location = location_line(record);
    if !location.is_empty() {
        ui.label(RichText::new(location).weak());
    }
    if let Some(industries) = &record.industries {
        ui.label(RichText::new(industries).weak());
    }
    if let Some(description) = &record.description {
        ui.add_space(4.0);
        ui.label(description);
    }

    ui.horizontal(|ui: &mut Ui| {
        if let Some(website) = &record.website {
            ui.hyperlink_to("Website", website);
        }
        if let Some(linkedin) = &record.linkedin {
            ui.hyperlink_to("LinkedIn", linkedin);
        }
    });
    ui.add_space(8.0);

    ui.columns(2, |columns| {
        metric(
            &mut columns[0],
            "Hiring Score",
            format!("{:.1} (rank #{})", record.hiring_score, record.hiring_rank),
            record.hiring_tier.as_deref(),
        );
        metric(
            &mut columns[1],
            "Momentum Score",
            record
                .momentum_score
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "N/A".to_string()),
            record.momentum_tier.as_deref(),
        );
    });
    ui.add_space(8.0);

    egui::Grid::new("company_facts")
        .num_columns(2)
        .spacing([24.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            fact(ui, "Total funding", Some(record.total_funding_display.clone()));
            fact(ui, "Funding stage", Some(record.funding_stage_label.clone()));
            fact(
                ui,
                "Last funding",
                match (&record.last_funding_type, &record.last_funding_date) {
                    (Some(kind), Some(date)) => Some(format!("{kind} ({date})")),
                    (Some(kind), None) => Some(kind.clone()),
                    (None, Some(date)) => Some(date.clone()),
                    (None, None) => None,
                },
            );
            fact(ui, "Employees", record.num_employees.clone());
            fact(
                ui,
                "Investors",
                match (&record.top_investors, record.num_investors) {
                    (Some(top), Some(n)) => Some(format!("{top} ({n} total)")),
                    (Some(top), None) => Some(top.clone()),
                    (None, Some(n)) => Some(n.to_string()),
                    (None, None) => None,
                },
            );
            fact(ui, "Founded", record.founded_date.clone());
        });
    ui.add_space(8.0);

    ui.strong("Signal Breakdown");
    ui.label(RichText::new("Company signals vs the population median, 0–100.").weak());
    charts::radar_chart(ui, "signal_radar", &record.signals, &master.signal_medians);

    feature_explorer(ui, bundle, &record.company_id);
}

fn metric(ui: &mut Ui, label: &str, value: String, tier: Option<&str>) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.label(RichText::new(label).small().weak());
        ui.label(RichText::new(value).heading());
        tier_label(ui, tier);
    });
}

fn fact(ui: &mut Ui, label: &str, value: Option<String>) {
    ui.label(RichText::new(label).weak());
    ui.label(value.unwrap_or_else(|| "N/A".to_string()));
    ui.end_row();
}

fn location_line(record: &CompanyRecord) -> String {
    let parts: Vec<&str> = [&record.city, &record.state, &record.country]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();
    if parts.is_empty() {
        record.hq_location.clone().unwrap_or_default()
    } else {
        parts.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Full feature explorer
// ---------------------------------------------------------------------------

/// Every raw feature for the company, grouped by the metadata `group`
/// column, with the population stats alongside.
fn feature_explorer(ui: &mut Ui, bundle: &DataBundle, company_id: &str) {
    let Some(features_row) = bundle
        .features
        .rows
        .iter()
        .find(|row| row.str_at("company_id") == Some(company_id))
    else {
        return;
    };

    egui::CollapsingHeader::new("All Features")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut groups: Vec<(&str, Vec<&Row>)> = Vec::new();
            for meta in &bundle.metadata.rows {
                let Some(group) = meta.str_at("group") else {
                    continue;
                };
                match groups.iter_mut().find(|(g, _)| *g == group) {
                    Some((_, rows)) => rows.push(meta),
                    None => groups.push((group, vec![meta])),
                }
            }

            for (group, rows) in groups {
                egui::CollapsingHeader::new(group)
                    .id_salt(group)
                    .show(ui, |ui: &mut Ui| {
                        egui::Grid::new(group).striped(true).show(ui, |ui: &mut Ui| {
                            for header in ["Feature", "Value", "Mean", "Min", "Max"] {
                                ui.strong(header);
                            }
                            ui.end_row();
                            for meta in rows {
                                let Some(feature) = meta.str_at("feature_name") else {
                                    continue;
                                };
                                ui.label(feature);
                                ui.label(features_row.display_at(feature));
                                ui.label(meta.display_at("mean"));
                                ui.label(meta.display_at("min"));
                                ui.label(meta.display_at("max"));
                                ui.end_row();
                            }
                        });
                    });
            }
        });
}
