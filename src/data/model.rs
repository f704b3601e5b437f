use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Name of the mandatory date column ("enrollment day").
pub const DATE_COLUMN: &str = "dzien_zapisu";

// ---------------------------------------------------------------------------
// Record – one row of the upload
// ---------------------------------------------------------------------------

/// A single day of enrollment counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    /// Metric columns: column_name → value. A column missing here is an
    /// absent cell, never zero.
    pub metrics: BTreeMap<String, f64>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.metrics.get(column).copied()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded upload
// ---------------------------------------------------------------------------

/// Rows ordered ascending by date (duplicates allowed, order stable).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Header of the date column as it appears in the source.
    pub date_column: String,
    /// Metric column names in their original left-to-right order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    /// Build a table and sort it by date.
    pub fn new(columns: Vec<String>, mut records: Vec<Record>) -> Self {
        // `sort_by_key` is stable: rows sharing a date keep their input order.
        records.sort_by_key(|r| r.date);
        Table {
            date_column: DATE_COLUMN.to_string(),
            columns,
            records,
        }
    }

    /// Same columns, different rows. The rows must already be in date order.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Table {
            date_column: self.date_column.clone(),
            columns: self.columns.clone(),
            records,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest date, `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.date, last.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn record(d: u32, tag: f64) -> Record {
        Record {
            date: day(d),
            metrics: BTreeMap::from([("platni_2023".to_string(), tag)]),
        }
    }

    #[test]
    fn new_sorts_by_date_and_keeps_ties_in_order() {
        let table = Table::new(
            vec!["platni_2023".to_string()],
            vec![record(3, 1.0), record(1, 2.0), record(3, 3.0), record(2, 4.0)],
        );
        let tags: Vec<f64> = table
            .records
            .iter()
            .map(|r| r.get("platni_2023").unwrap())
            .collect();
        assert_eq!(tags, vec![2.0, 4.0, 1.0, 3.0]);
        assert_eq!(table.date_bounds(), Some((day(1), day(3))));
    }

    #[test]
    fn absent_values_are_none() {
        let table = Table::new(
            vec!["platni_2023".to_string(), "platni_2024".to_string()],
            vec![record(1, 7.0)],
        );
        assert_eq!(table.records[0].get("platni_2024"), None);
        assert_eq!(table.records[0].get("platni_2023"), Some(7.0));
    }

    #[test]
    fn empty_table_has_no_bounds() {
        let table = Table::new(Vec::new(), Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.date_bounds(), None);
    }
}
