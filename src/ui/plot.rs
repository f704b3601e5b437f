use chrono::{Datelike, NaiveDate};
use eframe::egui::{RichText, Ui};
use egui_plot::{Corner, Legend, Line, LineStyle, Plot, PlotPoints};

use crate::chart::ChartSeries;
use crate::color::{DashStyle, to_color32};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Enrollment chart (central panel)
// ---------------------------------------------------------------------------

/// Render the enrollment chart in the central panel.
pub fn enrollment_plot(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.view else {
        empty_state(ui);
        return;
    };
    let layout = &view.chart.layout;

    Plot::new("enrollment_plot")
        .legend(Legend::default().position(Corner::LeftTop))
        .x_axis_label(layout.xaxis_title)
        .y_axis_label(layout.yaxis_title)
        .x_axis_formatter(|mark, _range| format_day(mark.value))
        .label_formatter(|name, value| {
            if name.is_empty() {
                format_day(value.x)
            } else {
                format!("{name}\n{}: {:.0}", format_day(value.x), value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &view.chart.series {
                let color = to_color32(series.color);
                // Same name on every segment keeps one legend entry per series.
                for segment in segments(series) {
                    let line = Line::new(segment)
                        .name(&series.name)
                        .color(color)
                        .style(line_style(series.dash))
                        .width(series.width);
                    plot_ui.line(line);
                }
            }
        });
}

fn empty_state(ui: &mut Ui) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() * 0.3);
        ui.heading("Open a file to start  (File → Open…, or drop it here)");
        ui.add_space(8.0);
        ui.label(RichText::new("Expected format:").strong());
        ui.label("• a column `dzien_zapisu` with dates");
        ui.label(
            "• columns named like `online_platni_2023`, `platni_2024`, \
             `sala_platni_2025`, `suma_zapisow_2026`",
        );
        ui.label("• spreadsheets: data in a sheet named `dane`");
    });
}

/// Split a series at absent values so gaps are not bridged.
fn segments(series: &ChartSeries) -> Vec<PlotPoints> {
    let mut out = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for p in &series.points {
        match p.value {
            Some(v) => current.push([day_to_x(p.date), v]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current).into()),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current.into());
    }
    out
}

fn line_style(dash: DashStyle) -> LineStyle {
    match dash {
        DashStyle::Solid => LineStyle::Solid,
        DashStyle::Dash => LineStyle::dashed_loose(),
        DashStyle::Dot => LineStyle::dotted_dense(),
        DashStyle::DashDot => LineStyle::Dashed { length: 18.0 },
    }
}

fn day_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn format_day(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::SeriesPoint;
    use crate::data::classify::Group;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn day_axis_round_trips() {
        assert_eq!(format_day(day_to_x(day(9))), "2024-03-09");
    }

    #[test]
    fn gaps_split_segments() {
        let values = [Some(1.0), Some(2.0), None, None, Some(5.0), None];
        let series = ChartSeries {
            name: "platni_2024".to_string(),
            group: Group::Platni,
            year: Some("2024".to_string()),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    date: day(i as u32 + 1),
                    value: *v,
                })
                .collect(),
            color: "#ff7f0e",
            dash: DashStyle::Dash,
            width: 2.0,
        };
        let lens: Vec<usize> = segments(&series).iter().map(|s| s.points().len()).collect();
        assert_eq!(lens, vec![2, 1]);
    }
}
