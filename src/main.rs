mod app;
mod chart;
mod color;
mod data;
mod state;
mod ui;

use app::EnrollmentApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Enrollment Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(EnrollmentApp::default()))),
    )
}
