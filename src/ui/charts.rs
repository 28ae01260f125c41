use eframe::egui::{Align2, Color32, FontId, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::color::{stage_color, tier_color, ACCENT_BLUE, MEDIAN_GRAY, RADAR_BLUE};
use crate::data::master::{SIGNAL_COLUMNS, TIER_ORDER};
use crate::data::stats::TierHistogram;

// ---------------------------------------------------------------------------
// Stacked score histogram
// ---------------------------------------------------------------------------

/// Score distribution as one bar series per tier, stacked in tier order.
pub fn stacked_histogram(ui: &mut Ui, id: &str, title: &str, hist: &TierHistogram, x_label: &str) {
    ui.strong(title);
    if hist.is_empty() {
        ui.label(RichText::new("No tiered scores to plot.").weak());
        return;
    }

    let mut charts: Vec<BarChart> = Vec::new();
    for (tier_idx, tier) in TIER_ORDER.iter().enumerate() {
        let bars: Vec<Bar> = hist.counts[tier_idx]
            .iter()
            .enumerate()
            .map(|(bin, &count)| {
                Bar::new(hist.bin_center(bin), count as f64).width(hist.bin_width * 0.9)
            })
            .collect();
        let refs: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(*tier)
            .color(tier_color(tier))
            .stack_on(&refs);
        charts.push(chart);
    }

    Plot::new(id)
        .height(220.0)
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label("Companies")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Horizontal bar chart
// ---------------------------------------------------------------------------

/// One horizontal bar per label, in the given order (bottom to top).
pub fn horizontal_bar_chart(ui: &mut Ui, id: &str, title: &str, counts: &[(String, u64)]) {
    ui.strong(title);
    if counts.is_empty() {
        ui.label(RichText::new("No data to plot.").weak());
        return;
    }

    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (label, count))| {
            Bar::new(i as f64, *count as f64)
                .width(0.6)
                .fill(ACCENT_BLUE)
                .name(label)
        })
        .collect();
    let labels: Vec<String> = counts.iter().map(|(label, _)| label.clone()).collect();
    let top = counts.len() as f64;

    Plot::new(id)
        .height(260.0)
        .x_axis_label("Companies")
        .include_y(-0.6)
        .include_y(top - 0.4)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .y_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

// ---------------------------------------------------------------------------
// Donut chart
// ---------------------------------------------------------------------------

/// Ring chart with the total count in the hole and a legend underneath.
/// egui_plot has no pie primitive, so the ring is painted directly as a fan
/// of convex quads.
pub fn donut_chart(ui: &mut Ui, title: &str, slices: &[(String, u64)]) {
    ui.strong(title);
    let total: u64 = slices.iter().map(|(_, count)| count).sum();
    if total == 0 {
        ui.label(RichText::new("No data to plot.").weak());
        return;
    }

    let size = Vec2::new(ui.available_width().min(280.0), 220.0);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let center = response.rect.center();
    let outer = response.rect.height().min(response.rect.width()) * 0.45;
    let inner = outer * 0.55;

    let mut start = -std::f32::consts::FRAC_PI_2;
    for (i, (_, count)) in slices.iter().enumerate() {
        let sweep = *count as f32 / total as f32 * std::f32::consts::TAU;
        let color = stage_color(i, slices.len());
        let steps = (sweep / 0.06).ceil().max(1.0) as usize;
        for step in 0..steps {
            let a0 = start + sweep * step as f32 / steps as f32;
            let a1 = start + sweep * (step + 1) as f32 / steps as f32;
            painter.add(Shape::convex_polygon(
                vec![
                    center + inner * Vec2::angled(a0),
                    center + outer * Vec2::angled(a0),
                    center + outer * Vec2::angled(a1),
                    center + inner * Vec2::angled(a1),
                ],
                color,
                Stroke::NONE,
            ));
        }
        start += sweep;
    }
    painter.text(
        center,
        Align2::CENTER_CENTER,
        total.to_string(),
        FontId::proportional(24.0),
        ui.visuals().strong_text_color(),
    );

    ui.horizontal_wrapped(|ui| {
        for (i, (label, count)) in slices.iter().enumerate() {
            ui.colored_label(stage_color(i, slices.len()), "■");
            ui.label(format!("{label} ({count})"));
        }
    });
}

// ---------------------------------------------------------------------------
// Signal radar
// ---------------------------------------------------------------------------

/// Five-axis radar of a company's signal values against the population
/// median. Axes run 0–100 from the center; missing signals plot at 0.
pub fn radar_chart(ui: &mut Ui, id: &str, values: &[Option<f64>; 5], medians: &[f64; 5]) {
    let angle = |i: usize| {
        std::f64::consts::FRAC_PI_2 - std::f64::consts::TAU * i as f64 / SIGNAL_COLUMNS.len() as f64
    };
    let point = |i: usize, value: f64| {
        let r = (value / 100.0).clamp(0.0, 1.0);
        [r * angle(i).cos(), r * angle(i).sin()]
    };
    let ring = |value: f64| -> PlotPoints {
        (0..=SIGNAL_COLUMNS.len())
            .map(|i| point(i % SIGNAL_COLUMNS.len(), value))
            .collect()
    };
    let shape = |values: &[f64; 5]| -> PlotPoints {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| point(i, v))
            .collect()
    };

    let company: [f64; 5] = std::array::from_fn(|i| values[i].unwrap_or(0.0));

    Plot::new(id)
        .height(260.0)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .include_x(-1.5)
        .include_x(1.5)
        .include_y(-1.3)
        .include_y(1.3)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for grid_value in [25.0, 50.0, 75.0, 100.0] {
                plot_ui.line(
                    Line::new(ring(grid_value))
                        .color(Color32::from_gray(90))
                        .style(LineStyle::Dashed { length: 4.0 })
                        .width(0.5),
                );
            }
            for i in 0..SIGNAL_COLUMNS.len() {
                let [x, y] = point(i, 100.0);
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![[0.0, 0.0], [x, y]]))
                        .color(Color32::from_gray(90))
                        .width(0.5),
                );
                plot_ui.text(Text::new(
                    PlotPoint::new(x * 1.22, y * 1.14),
                    SIGNAL_COLUMNS[i].1,
                ));
            }
            plot_ui.polygon(
                Polygon::new(shape(medians))
                    .name("Population median")
                    .stroke(Stroke::new(1.5, MEDIAN_GRAY))
                    .fill_color(Color32::from_rgba_unmultiplied(0xbb, 0xbb, 0xbb, 30)),
            );
            plot_ui.polygon(
                Polygon::new(shape(&company))
                    .name("Company")
                    .stroke(Stroke::new(2.0, RADAR_BLUE))
                    .fill_color(Color32::from_rgba_unmultiplied(0x3b, 0x82, 0xf6, 60)),
            );
        });
}
