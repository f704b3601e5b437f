use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::chart::{SummaryTable, TAIL_ROWS};

// ---------------------------------------------------------------------------
// Recent values (bottom panel)
// ---------------------------------------------------------------------------

/// Collapsible table with the last rows of the filtered data.
pub fn summary_table(ui: &mut Ui, summary: &SummaryTable) {
    egui::CollapsingHeader::new(RichText::new("Recent values").strong())
        .id_salt("recent_values")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if summary.rows.is_empty() {
                ui.label("No rows in the selected date range.");
                return;
            }

            let metric_cols = summary.columns.len().saturating_sub(1);
            egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .column(Column::auto().at_least(90.0))
                    .columns(Column::auto().at_least(70.0), metric_cols)
                    .max_scroll_height(TAIL_ROWS as f32 * 20.0)
                    .header(20.0, |mut header| {
                        for name in &summary.columns {
                            header.col(|ui| {
                                ui.strong(name);
                            });
                        }
                    })
                    .body(|mut body| {
                        for row in &summary.rows {
                            body.row(18.0, |mut table_row| {
                                table_row.col(|ui| {
                                    ui.label(row.date.to_string());
                                });
                                for value in &row.values {
                                    table_row.col(|ui| {
                                        ui.label(format_cell(*value));
                                    });
                                }
                            });
                        }
                    });
            });
        });
}

/// Absent values render as empty cells.
fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => String::new(),
    }
}
