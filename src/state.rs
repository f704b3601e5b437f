use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::chart::{ChartSpec, SummaryTable, render};
use crate::data::classify::{Group, discover_groups, discover_years};
use crate::data::error::LoadError;
use crate::data::filter::{DateInterval, FilterSpec, filter};
use crate::data::loader;
use crate::data::model::Table;

// ---------------------------------------------------------------------------
// Control values (widget state), turned into a FilterSpec on demand
// ---------------------------------------------------------------------------

/// Current values of the sidebar widgets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Controls {
    pub groups: BTreeSet<Group>,
    pub years: BTreeSet<String>,
    /// `None` when the bound is switched off in the UI.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Controls {
    /// Everything selected, dates spanning the whole table.
    pub fn defaults_for(table: &Table) -> Self {
        let spec = FilterSpec::select_all(table);
        Controls {
            groups: spec.groups,
            years: spec.years,
            date_from: spec.interval.start,
            date_to: spec.interval.end,
        }
    }

    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            groups: self.groups.clone(),
            years: self.years.clone(),
            interval: DateInterval {
                start: self.date_from,
                end: self.date_to,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub chart: ChartSpec,
    pub summary: SummaryTable,
    /// Rows left after date filtering.
    pub visible_rows: usize,
}

/// Filter then render. Pure: same table and spec give the same view.
pub fn build_view(table: &Table, spec: &FilterSpec) -> DashboardView {
    let (rows, selected) = filter(table, spec);
    let (chart, summary) = render(&rows, &selected);
    DashboardView {
        chart,
        summary,
        visible_rows: rows.len(),
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The current upload.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub table: Table,
    pub groups: Vec<Group>,
    pub years: Vec<String>,
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded upload (None until the user opens a file).
    pub file: Option<LoadedFile>,

    pub controls: Controls,

    /// Result of the last pipeline run.
    pub view: Option<DashboardView>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Parse an upload and reset the controls to their defaults.
    /// On failure nothing from the previous upload stays on screen.
    pub fn ingest(&mut self, name: &str, bytes: &[u8]) -> Result<(), LoadError> {
        match loader::load(bytes, name) {
            Ok(table) => {
                self.controls = Controls::defaults_for(&table);
                self.file = Some(LoadedFile {
                    name: name.to_string(),
                    groups: discover_groups(&table),
                    years: discover_years(&table),
                    table,
                });
                self.status_message = None;
                self.refresh();
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {name}: {e}");
                self.file = None;
                self.view = None;
                self.controls = Controls::default();
                let kind = if e.is_schema() {
                    "Invalid layout"
                } else {
                    "Cannot read file"
                };
                self.status_message = Some(format!("{kind}: {e}"));
                Err(e)
            }
        }
    }

    /// Re-run the pipeline with the current controls.
    pub fn refresh(&mut self) {
        self.view = self
            .file
            .as_ref()
            .map(|f| build_view(&f.table, &self.controls.filter_spec()));
    }

    pub fn toggle_group(&mut self, group: Group) {
        if !self.controls.groups.remove(&group) {
            self.controls.groups.insert(group);
        }
        self.refresh();
    }

    pub fn toggle_year(&mut self, year: &str) {
        if !self.controls.years.remove(year) {
            self.controls.years.insert(year.to_string());
        }
        self.refresh();
    }

    pub fn select_all_groups(&mut self, all: bool) {
        self.controls.groups = match (&self.file, all) {
            (Some(f), true) => f.groups.iter().copied().collect(),
            _ => BTreeSet::new(),
        };
        self.refresh();
    }

    pub fn select_all_years(&mut self, all: bool) {
        self.controls.years = match (&self.file, all) {
            (Some(f), true) => f.years.iter().cloned().collect(),
            _ => BTreeSet::new(),
        };
        self.refresh();
    }

    /// Set one bound of the date range; `None` switches it off.
    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.controls.date_from = from;
        self.controls.date_to = to;
        self.refresh();
    }
}
