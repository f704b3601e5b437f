use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, DroppedFile, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::chart::ChartSpec;
use crate::color::{to_color32, year_color};
use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(file) = &state.file else {
        ui.label("No file loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the closures.
    let groups = file.groups.clone();
    let years = file.years.clone();
    let bounds = file.table.date_bounds();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Series type ----
            ui.strong(format!(
                "Series type  ({}/{})",
                state.controls.groups.len(),
                groups.len()
            ));
            all_none_buttons(ui, |all| state.select_all_groups(all));
            for group in &groups {
                let mut checked = state.controls.groups.contains(group);
                if ui.checkbox(&mut checked, group.as_str()).changed() {
                    state.toggle_group(*group);
                }
            }
            ui.separator();

            // ---- Year ----
            ui.strong(format!(
                "Year  ({}/{})",
                state.controls.years.len(),
                years.len()
            ));
            all_none_buttons(ui, |all| state.select_all_years(all));
            for year in &years {
                let mut checked = state.controls.years.contains(year);
                let text = RichText::new(year).color(to_color32(year_color(Some(year.as_str()))));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_year(year);
                }
            }
            ui.separator();

            // ---- Date range ----
            ui.strong("Date range");
            if let Some((min, max)) = bounds {
                date_range(ui, state, min, max);
            } else {
                ui.label("No rows.");
            }
        });
}

fn all_none_buttons(ui: &mut Ui, mut on_click: impl FnMut(bool)) {
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            on_click(true);
        }
        if ui.small_button("None").clicked() {
            on_click(false);
        }
    });
}

/// Two date pickers, each switchable. Filtering by date needs both.
fn date_range(ui: &mut Ui, state: &mut AppState, min: chrono::NaiveDate, max: chrono::NaiveDate) {
    let mut from = state.controls.date_from;
    let mut to = state.controls.date_to;

    for (label, salt, bound, default) in [
        ("From", "date_from", &mut from, min),
        ("To", "date_to", &mut to, max),
    ] {
        ui.horizontal(|ui: &mut Ui| {
            let mut enabled = bound.is_some();
            if ui.checkbox(&mut enabled, label).changed() {
                *bound = enabled.then_some(default);
            }
            if let Some(date) = bound.as_mut() {
                ui.add(DatePickerButton::new(date).id_salt(salt));
                *date = (*date).clamp(min, max);
            }
        });
    }

    if from.is_some() != to.is_some() {
        ui.label(
            RichText::new("Set both dates to filter by date.")
                .small()
                .color(Color32::GRAY),
        );
    }

    if (from, to) != (state.controls.date_from, state.controls.date_to) {
        state.set_date_range(from, to);
    }
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
            let can_export = state.view.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export chart JSON…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(file), Some(view)) = (&state.file, &state.view) {
            ui.label(format!(
                "{}: {} rows, {} in range, {} series",
                file.name,
                file.table.len(),
                view.visible_rows,
                view.chart.series.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Uploads and export
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open enrollment data")
        .add_filter("Supported files", &SUPPORTED_EXTENSIONS)
        .add_filter("CSV", &["csv"])
        .add_filter("Spreadsheet", &SUPPORTED_EXTENSIONS[1..])
        .pick_file();

    if let Some(path) = file {
        accept_upload(state, read_upload(&path));
    }
}

/// Ingest a file dropped onto the window (bytes on web, a path on native).
pub fn ingest_dropped(state: &mut AppState, file: DroppedFile) {
    let upload = match (file.bytes, file.path) {
        (Some(bytes), _) => Ok((file.name, bytes.to_vec())),
        (None, Some(path)) => read_upload(&path),
        (None, None) => return,
    };
    accept_upload(state, upload);
}

/// Hand an upload to the state. Returns whether the dashboard now shows it.
fn accept_upload(state: &mut AppState, upload: Result<(String, Vec<u8>)>) -> bool {
    match upload {
        Ok((name, bytes)) => match state.ingest(&name, &bytes) {
            Ok(()) => true,
            // `ingest` has already logged it and set the status message.
            Err(_) => false,
        },
        Err(e) => {
            report(state, e);
            false
        }
    }
}

fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((name, bytes))
}

fn export_dialog(state: &mut AppState) {
    let Some(view) = &state.view else {
        return;
    };
    let target = rfd::FileDialog::new()
        .set_title("Export chart")
        .set_file_name("chart.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = target {
        match export_chart(&path, &view.chart) {
            Ok(()) => log::info!("Exported chart to {}", path.display()),
            Err(e) => report(state, e),
        }
    }
}

/// Write the chart as a Plotly figure document.
pub fn export_chart(path: &Path, chart: &ChartSpec) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &chart.to_plotly_json())
        .context("writing chart JSON")?;
    Ok(())
}

fn report(state: &mut AppState, e: anyhow::Error) {
    log::error!("{e:#}");
    state.status_message = Some(format!("Error: {e:#}"));
}
