use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct EnrollmentApp {
    pub state: AppState,
}

impl eframe::App for EnrollmentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Files dropped onto the window count as uploads.
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            panels::ingest_dropped(&mut self.state, file);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: most recent values ----
        if let Some(view) = &self.state.view {
            egui::TopBottomPanel::bottom("summary_panel")
                .resizable(true)
                .show(ctx, |ui| {
                    table::summary_table(ui, &view.summary);
                });
        }

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::enrollment_plot(ui, &self.state);
        });
    }
}
