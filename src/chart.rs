use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::color::{DashStyle, group_dash, year_color};
use crate::data::classify::{Group, classify};
use crate::data::model::Table;

/// Number of trailing rows shown in the summary table.
pub const TAIL_ROWS: usize = 10;

const LINE_WIDTH: f32 = 2.0;
const CHART_HEIGHT: u32 = 600;

// ---------------------------------------------------------------------------
// Chart specification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// One plotted line, one per selected column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub group: Group,
    pub year: Option<String>,
    pub points: Vec<SeriesPoint>,
    /// `#rrggbb`
    pub color: &'static str,
    pub dash: DashStyle,
    pub width: f32,
}

/// Legend placement: horizontal, bottom edge anchored just above the plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLayout {
    pub orientation: &'static str,
    pub yanchor: &'static str,
    pub y: f64,
    pub xanchor: &'static str,
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub height: u32,
    pub hovermode: &'static str,
    pub legend: LegendLayout,
    pub xaxis_title: &'static str,
    pub yaxis_title: &'static str,
    pub margin_top: u32,
}

impl Default for ChartLayout {
    fn default() -> Self {
        ChartLayout {
            height: CHART_HEIGHT,
            hovermode: "x unified",
            legend: LegendLayout {
                orientation: "h",
                yanchor: "bottom",
                y: 1.02,
                xanchor: "left",
                x: 0.0,
            },
            xaxis_title: "Date",
            yaxis_title: "Count",
            margin_top: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub series: Vec<ChartSeries>,
    pub layout: ChartLayout,
}

impl ChartSpec {
    /// Plotly figure document (`{"data": [...], "layout": {...}}`).
    pub fn to_plotly_json(&self) -> JsonValue {
        let data: Vec<JsonValue> = self
            .series
            .iter()
            .map(|s| {
                let x: Vec<String> = s.points.iter().map(|p| p.date.to_string()).collect();
                let y: Vec<Option<f64>> = s.points.iter().map(|p| p.value).collect();
                json!({
                    "type": "scatter",
                    "mode": "lines",
                    "name": s.name,
                    "x": x,
                    "y": y,
                    "line": { "color": s.color, "dash": s.dash, "width": s.width },
                })
            })
            .collect();

        let l = &self.layout;
        json!({
            "data": data,
            "layout": {
                "height": l.height,
                "hovermode": l.hovermode,
                "legend": l.legend,
                "xaxis": { "title": { "text": l.xaxis_title } },
                "yaxis": { "title": { "text": l.yaxis_title } },
                "margin": { "t": l.margin_top },
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Summary table (last rows of the filtered data)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub date: NaiveDate,
    /// Aligned with `SummaryTable::columns[1..]`.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    /// Date column first, then the selected metric columns.
    pub columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Build the chart and the trailing summary for an already filtered table.
pub fn render(table: &Table, selected_columns: &[String]) -> (ChartSpec, SummaryTable) {
    let series = selected_columns
        .iter()
        .map(|col| {
            let key = classify(col);
            let points = table
                .records
                .iter()
                .map(|r| SeriesPoint {
                    date: r.date,
                    value: r.get(col),
                })
                .collect();
            ChartSeries {
                name: key.raw_name,
                color: year_color(key.year.as_deref()),
                dash: group_dash(key.group),
                group: key.group,
                year: key.year,
                points,
                width: LINE_WIDTH,
            }
        })
        .collect();

    let skip = table.len().saturating_sub(TAIL_ROWS);
    let rows = table.records[skip..]
        .iter()
        .map(|r| SummaryRow {
            date: r.date,
            values: selected_columns.iter().map(|c| r.get(c)).collect(),
        })
        .collect();

    let columns = std::iter::once(table.date_column.clone())
        .chain(selected_columns.iter().cloned())
        .collect();

    (
        ChartSpec {
            series,
            layout: ChartLayout::default(),
        },
        SummaryTable { columns, rows },
    )
}
