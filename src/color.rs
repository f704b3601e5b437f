use eframe::egui::Color32;
use palette::Srgb;
use serde::Serialize;

use crate::data::classify::Group;

// ---------------------------------------------------------------------------
// Series encodings: colour by year, dash by group
// ---------------------------------------------------------------------------

const YEAR_COLORS: [(&str, &str); 4] = [
    ("2023", "#1f77b4"),
    ("2024", "#ff7f0e"),
    ("2025", "#2ca02c"),
    ("2026", "#d62728"),
];

/// Colour for years outside the palette and for columns without a year.
pub const NEUTRAL_GRAY: &str = "#888888";

/// Line dash pattern, serialized with Plotly's names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashStyle {
    Solid,
    Dash,
    Dot,
    #[serde(rename = "dashdot")]
    DashDot,
}

/// Hex colour of a series given its year token.
pub fn year_color(year: Option<&str>) -> &'static str {
    year.and_then(|y| YEAR_COLORS.iter().find(|(k, _)| *k == y))
        .map(|(_, c)| *c)
        .unwrap_or(NEUTRAL_GRAY)
}

pub fn group_dash(group: Group) -> DashStyle {
    match group {
        Group::OnlinePlatni => DashStyle::Solid,
        Group::Platni => DashStyle::Dash,
        Group::SalaPlatni => DashStyle::Dot,
        Group::SumaZapisow => DashStyle::DashDot,
        Group::Other => DashStyle::Solid,
    }
}

/// Convert a `#rrggbb` string to an egui colour. Invalid input is gray.
pub fn to_color32(hex: &str) -> Color32 {
    match hex.parse::<Srgb<u8>>() {
        Ok(rgb) => Color32::from_rgb(rgb.red, rgb.green, rgb.blue),
        Err(_) => Color32::GRAY,
    }
}
