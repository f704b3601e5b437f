use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::classify::{Group, classify, discover_groups, discover_years};
use super::model::Table;

// ---------------------------------------------------------------------------
// Filter inputs, rebuilt from the controls on every refresh
// ---------------------------------------------------------------------------

/// Inclusive date range. Filtering only applies when both bounds are set;
/// a single bound means "no date filter", not an open-ended range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateInterval {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateInterval {
            start: Some(start),
            end: Some(end),
        }
    }

    /// `[min date, max date]` of the table, or unbounded when it is empty.
    pub fn full(table: &Table) -> Self {
        table
            .date_bounds()
            .map(|(start, end)| DateInterval::new(start, end))
            .unwrap_or_default()
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub groups: BTreeSet<Group>,
    pub years: BTreeSet<String>,
    pub interval: DateInterval,
}

impl FilterSpec {
    /// Every discovered group and year over the full date range.
    pub fn select_all(table: &Table) -> Self {
        FilterSpec {
            groups: discover_groups(table).into_iter().collect(),
            years: discover_years(table).into_iter().collect(),
            interval: DateInterval::full(table),
        }
    }

    /// Whether a metric column is selected by group and year.
    /// Columns without a year token never match.
    pub fn selects(&self, column: &str) -> bool {
        let key = classify(column);
        self.groups.contains(&key.group)
            && key.year.is_some_and(|y| self.years.contains(&y))
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return the rows inside the date interval and the selected columns in
/// their source order. The returned table keeps all metric columns.
pub fn filter(table: &Table, spec: &FilterSpec) -> (Table, Vec<String>) {
    let rows = match spec.interval.bounds() {
        Some((start, end)) => table
            .records
            .iter()
            .filter(|r| start <= r.date && r.date <= end)
            .cloned()
            .collect(),
        None => table.records.clone(),
    };

    let selected: Vec<String> = table
        .columns
        .iter()
        .filter(|c| spec.selects(c))
        .cloned()
        .collect();

    log::debug!(
        "Filter kept {} of {} rows, {} of {} columns",
        rows.len(),
        table.len(),
        selected.len(),
        table.columns.len()
    );

    (table.with_records(rows), selected)
}
