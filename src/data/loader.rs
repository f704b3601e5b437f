use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};

use super::error::{FormatError, LoadError, SchemaError};
use super::model::{DATE_COLUMN, Record, Table};

/// Sheet holding the data inside a spreadsheet upload ("data" in Polish).
pub const SHEET_NAME: &str = "dane";

/// Extensions accepted by [`load`].
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["csv", "xlsx", "xlsm", "xlsb", "xls", "ods"];

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 10;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse an uploaded buffer.  Dispatch by the extension of `filename`.
///
/// * `.csv` – delimiter is auto-detected
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – sheet `dane`
pub fn load(bytes: &[u8], filename: &str) -> Result<Table, LoadError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" => load_csv(bytes)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(bytes)?,
        _ => return Err(FormatError::UnsupportedExtension(ext).into()),
    };

    log::info!(
        "Loaded {filename}: {} rows, {} metric columns",
        table.len(),
        table.columns.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Shared row assembly
// ---------------------------------------------------------------------------

/// A raw cell before type coercion.
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

/// Collects rows for one upload once the header is known.
struct TableBuilder {
    date_idx: usize,
    /// (source index, name) of every metric column, in source order.
    metric_cols: Vec<(usize, String)>,
    decimal_comma: bool,
    warned: BTreeSet<String>,
    records: Vec<Record>,
}

impl TableBuilder {
    fn from_header(header: Vec<String>, decimal_comma: bool) -> Result<Self, LoadError> {
        let mut seen = BTreeSet::new();
        for name in header.iter().filter(|h| !h.is_empty()) {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateColumn(name.clone()).into());
            }
        }

        let date_idx = header
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or(SchemaError::MissingDateColumn)?;

        // Unnamed columns (trailing delimiters, stray cells) carry no series.
        let metric_cols = header
            .into_iter()
            .enumerate()
            .filter(|(i, name)| *i != date_idx && !name.is_empty())
            .collect();

        Ok(TableBuilder {
            date_idx,
            metric_cols,
            decimal_comma,
            warned: BTreeSet::new(),
            records: Vec::new(),
        })
    }

    /// `row_no` is 1-based, counted after the header.
    fn push_row<'a>(
        &mut self,
        row_no: usize,
        cell: impl Fn(usize) -> Cell<'a>,
    ) -> Result<(), SchemaError> {
        let date = match cell(self.date_idx) {
            Cell::Date(d) => Some(d),
            Cell::Text(s) => parse_date(s),
            Cell::Number(_) | Cell::Empty => None,
        }
        .ok_or_else(|| SchemaError::InvalidDate {
            row: row_no,
            value: match cell(self.date_idx) {
                Cell::Text(s) => s.to_string(),
                Cell::Number(n) => n.to_string(),
                _ => String::new(),
            },
        })?;

        let mut metrics = BTreeMap::new();
        for (idx, name) in &self.metric_cols {
            let value = match cell(*idx) {
                Cell::Number(n) => Some(n).filter(|v| v.is_finite()),
                Cell::Text(s) => {
                    let parsed = parse_metric(s, self.decimal_comma);
                    if parsed.is_none() && !s.trim().is_empty() && self.warned.insert(name.clone())
                    {
                        log::warn!("Column '{name}': non-numeric value '{s}' treated as empty");
                    }
                    parsed
                }
                Cell::Date(_) | Cell::Empty => None,
            };
            if let Some(v) = value {
                metrics.insert(name.clone(), v);
            }
        }

        self.records.push(Record { date, metrics });
        Ok(())
    }

    fn finish(self) -> Table {
        let columns = self.metric_cols.into_iter().map(|(_, name)| name).collect();
        Table::new(columns, self.records)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// `NaN` and infinities count as missing, like any other non-number.
fn parse_metric(s: &str, decimal_comma: bool) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .or_else(|| {
            if decimal_comma {
                s.replacen(',', ".", 1).parse::<f64>().ok()
            } else {
                None
            }
        })
        .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(bytes: &[u8]) -> Result<Table, LoadError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let delimiter = sniff_delimiter(bytes);
    log::debug!("CSV delimiter detected: {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(FormatError::Empty.into());
    }

    let mut builder = TableBuilder::from_header(header, delimiter != b',')?;

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        builder.push_row(i + 1, |idx| match record.get(idx) {
            Some(s) if !s.trim().is_empty() => Cell::Text(s),
            _ => Cell::Empty,
        })?;
    }

    Ok(builder.finish())
}

/// Guess the field delimiter from the first lines of a CSV buffer.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let Some(header) = lines.first() else {
        return b',';
    };

    let consistent = DELIMITER_CANDIDATES
        .iter()
        .filter_map(|&d| {
            let n = count_unquoted(header, d);
            (n > 0 && lines.iter().all(|l| count_unquoted(l, d) == n)).then_some((d, n))
        })
        .max_by_key(|&(_, n)| n);

    if let Some((d, _)) = consistent {
        return d;
    }

    DELIMITER_CANDIDATES
        .iter()
        .map(|&d| (d, count_unquoted(header, d)))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(_, n)| n)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    if !workbook.sheet_names().iter().any(|n| n == SHEET_NAME) {
        return Err(FormatError::MissingSheet(SHEET_NAME.to_string()).into());
    }
    let range = workbook.worksheet_range(SHEET_NAME)?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or(FormatError::Empty)?
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    // Numbers arrive as numeric cells; text like `1,234` stays non-numeric.
    let mut builder = TableBuilder::from_header(header, false)?;

    for (i, row) in rows.enumerate() {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        builder.push_row(i + 1, |idx| match row.get(idx) {
            Some(Data::Int(n)) => Cell::Number(*n as f64),
            Some(Data::Float(n)) => Cell::Number(*n),
            Some(Data::DateTime(dt)) => dt
                .as_datetime()
                .map(|d| Cell::Date(d.date()))
                .unwrap_or(Cell::Empty),
            Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => Cell::Text(s.as_str()),
            _ => Cell::Empty,
        })?;
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).unwrap()
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter(b"a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2,5;3\n"), b';');
        assert_eq!(sniff_delimiter(b"a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter(b"a|b\n1|2\n"), b'|');
        assert_eq!(sniff_delimiter(b"single\n1\n"), b',');
        assert_eq!(sniff_delimiter(b""), b',');
    }

    #[test]
    fn sniff_ignores_quoted_delimiters() {
        let csv = b"\"a;x\",b,c\n\"1;2\",2,3\n";
        assert_eq!(sniff_delimiter(csv), b',');
    }

    #[test]
    fn loads_csv_sorted_with_trimmed_headers() {
        let csv = " dzien_zapisu ; platni_2023 ;online_platni_2024\n\
                   2023-01-03;3;30\n\
                   2023-01-01;1;\n\
                   2023-01-02;2;20\n";
        let table = load(csv.as_bytes(), "zapisy.CSV").unwrap();

        assert_eq!(table.columns, vec!["platni_2023", "online_platni_2024"]);
        let dates: Vec<NaiveDate> = table.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1, 1), day(1, 2), day(1, 3)]);
        assert_eq!(table.records[0].get("platni_2023"), Some(1.0));
        assert_eq!(table.records[0].get("online_platni_2024"), None);
        assert_eq!(table.records[2].get("online_platni_2024"), Some(30.0));
    }

    #[test]
    fn decimal_comma_is_accepted_with_semicolons() {
        let csv = "dzien_zapisu;platni_2023\n2023-01-01;12,5\n";
        let table = load(csv.as_bytes(), "a.csv").unwrap();
        assert_eq!(table.records[0].get("platni_2023"), Some(12.5));
    }

    #[test]
    fn non_numeric_metric_is_absent() {
        let csv = "dzien_zapisu,platni_2023\n2023-01-01,n/a\n2023-01-02,4\n";
        let table = load(csv.as_bytes(), "a.csv").unwrap();
        assert_eq!(table.records[0].get("platni_2023"), None);
        assert_eq!(table.records[1].get("platni_2023"), Some(4.0));
    }

    #[test]
    fn nan_and_infinity_are_absent() {
        let csv = "dzien_zapisu,platni_2023\n\
                   2023-01-01,NaN\n\
                   2023-01-02,nan\n\
                   2023-01-03,inf\n\
                   2023-01-04,7\n";
        let table = load(csv.as_bytes(), "a.csv").unwrap();
        let values: Vec<Option<f64>> =
            table.records.iter().map(|r| r.get("platni_2023")).collect();
        assert_eq!(values, vec![None, None, None, Some(7.0)]);
    }

    #[test]
    fn blank_header_cells_are_dropped() {
        let table = load(b"dzien_zapisu,platni_2023,,\n2023-01-01,1,,\n", "a.csv").unwrap();
        assert_eq!(table.columns, vec!["platni_2023"]);
        assert_eq!(table.records[0].get("platni_2023"), Some(1.0));
        assert_eq!(table.records[0].metrics.len(), 1);

        let csv = "dzien_zapisu;platni_2023;;platni_2023\n2023-01-01;1;;2\n";
        let err = load(csv.as_bytes(), "a.csv").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(SchemaError::DuplicateColumn(ref c)) if c == "platni_2023"
        ));
    }

    #[test]
    fn accepts_several_date_formats() {
        assert_eq!(parse_date("2023-02-01"), Some(day(2, 1)));
        assert_eq!(parse_date("2023/02/01"), Some(day(2, 1)));
        assert_eq!(parse_date("01.02.2023"), Some(day(2, 1)));
        assert_eq!(parse_date("02/01/2023"), Some(day(2, 1)));
        assert_eq!(parse_date("2023-02-01 13:45:00"), Some(day(2, 1)));
        assert_eq!(parse_date("2023-02-01T00:00:00"), Some(day(2, 1)));
        assert_eq!(parse_date("2023-02-01 00:00:00.000"), Some(day(2, 1)));
        assert_eq!(parse_date("2023-02-01T08:30:15.250"), Some(day(2, 1)));
        assert_eq!(parse_date("2023-02-01 13:45"), Some(day(2, 1)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn missing_date_column_is_schema_error() {
        let err = load(b"date,platni_2023\n2023-01-01,1\n", "a.csv").unwrap_err();
        assert!(matches!(err, LoadError::Schema(SchemaError::MissingDateColumn)));
        assert!(err.is_schema());
    }

    #[test]
    fn bad_date_reports_row() {
        let csv = "dzien_zapisu,platni_2023\n2023-01-01,1\nsoon,2\n";
        let err = load(csv.as_bytes(), "a.csv").unwrap_err();
        match err {
            LoadError::Schema(SchemaError::InvalidDate { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_date_cell_is_schema_error() {
        let csv = "dzien_zapisu,platni_2023\n,1\n";
        let err = load(csv.as_bytes(), "a.csv").unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn duplicate_columns_after_trim_are_rejected() {
        let csv = "dzien_zapisu,platni_2023, platni_2023\n2023-01-01,1,2\n";
        let err = load(csv.as_bytes(), "a.csv").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(SchemaError::DuplicateColumn(ref c)) if c == "platni_2023"
        ));
    }

    #[test]
    fn unsupported_extension_is_format_error() {
        let err = load(b"whatever", "notes.txt").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Format(FormatError::UnsupportedExtension(ref e)) if e == "txt"
        ));
        let err = load(b"whatever", "no_extension").unwrap_err();
        assert!(matches!(err, LoadError::Format(FormatError::UnsupportedExtension(_))));
    }

    #[test]
    fn empty_csv_is_format_error() {
        let err = load(b"", "a.csv").unwrap_err();
        assert!(matches!(err, LoadError::Format(FormatError::Empty)));
    }

    #[test]
    fn bom_and_blank_rows_are_skipped() {
        let csv = "\u{feff}dzien_zapisu,platni_2023\n2023-01-01,1\n,\n";
        let table = load(csv.as_bytes(), "a.csv").unwrap();
        assert_eq!(table.columns, vec!["platni_2023"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn garbage_spreadsheet_is_format_error() {
        let err = load(b"not a workbook", "a.xlsx").unwrap_err();
        assert!(matches!(err, LoadError::Format(FormatError::Spreadsheet(_))));
    }

    fn workbook(sheet: &str) -> Vec<u8> {
        use rust_xlsxwriter::Workbook;

        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.set_name(sheet).unwrap();
        ws.write_string(0, 0, "platni_2023 ").unwrap();
        ws.write_string(0, 1, "dzien_zapisu").unwrap();
        ws.write_string(0, 2, "sala_platni_2024").unwrap();
        ws.write_number(1, 0, 5.0).unwrap();
        ws.write_string(1, 1, "2023-01-02").unwrap();
        ws.write_number(2, 0, 4.0).unwrap();
        ws.write_string(2, 1, "2023-01-01").unwrap();
        ws.write_number(2, 2, 9.0).unwrap();
        wb.save_to_buffer().unwrap()
    }

    #[test]
    fn loads_sheet_named_dane() {
        let table = load(&workbook(SHEET_NAME), "zapisy.xlsx").unwrap();
        assert_eq!(table.columns, vec!["platni_2023", "sala_platni_2024"]);
        assert_eq!(table.records[0].date, day(1, 1));
        assert_eq!(table.records[0].get("platni_2023"), Some(4.0));
        assert_eq!(table.records[0].get("sala_platni_2024"), Some(9.0));
        assert_eq!(table.records[1].get("sala_platni_2024"), None);
    }

    #[test]
    fn spreadsheet_text_with_comma_is_not_a_number() {
        use rust_xlsxwriter::Workbook;

        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.set_name(SHEET_NAME).unwrap();
        ws.write_string(0, 0, "dzien_zapisu").unwrap();
        ws.write_string(0, 1, "platni_2023").unwrap();
        ws.write_string(1, 0, "2023-01-01").unwrap();
        ws.write_string(1, 1, "1,234").unwrap();
        ws.write_string(1, 3, "note").unwrap();
        ws.write_string(2, 0, "2023-01-02").unwrap();
        ws.write_string(2, 1, "12.5").unwrap();
        let bytes = wb.save_to_buffer().unwrap();

        let table = load(&bytes, "zapisy.xlsx").unwrap();
        assert_eq!(table.columns, vec!["platni_2023"]);
        assert_eq!(table.records[0].get("platni_2023"), None);
        assert_eq!(table.records[1].get("platni_2023"), Some(12.5));
    }

    #[test]
    fn missing_dane_sheet_is_format_error() {
        let err = load(&workbook("Arkusz1"), "zapisy.xlsx").unwrap_err();
        assert!(matches!(err, LoadError::Format(FormatError::MissingSheet(_))));
    }
}
