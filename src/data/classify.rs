use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::model::Table;

// ---------------------------------------------------------------------------
// Group – naming-convention category of a metric column
// ---------------------------------------------------------------------------

/// Series type. Variants are declared in label order so that `Ord` sorts
/// them the same way as their labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    OnlinePlatni,
    Other,
    Platni,
    SalaPlatni,
    SumaZapisow,
}

/// Prefix rules, most specific first. `online_platni` and `sala_platni`
/// must be tested before `platni`.
const PREFIX_RULES: [(&str, Group); 4] = [
    ("online_platni", Group::OnlinePlatni),
    ("sala_platni", Group::SalaPlatni),
    ("platni", Group::Platni),
    ("suma_zapisow", Group::SumaZapisow),
];

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::OnlinePlatni => "online_platni",
            Group::SalaPlatni => "sala_platni",
            Group::Platni => "platni",
            Group::SumaZapisow => "suma_zapisow",
            Group::Other => "other",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ColumnKey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnKey {
    pub group: Group,
    /// Trailing four-digit token, e.g. `2024` in `platni_2024`.
    pub year: Option<String>,
    pub raw_name: String,
}

/// Classify a metric column by its name. Total over all strings.
pub fn classify(column_name: &str) -> ColumnKey {
    let group = PREFIX_RULES
        .iter()
        .find(|(prefix, _)| column_name.starts_with(prefix))
        .map(|&(_, group)| group)
        .unwrap_or(Group::Other);

    ColumnKey {
        group,
        year: year_token(column_name).map(str::to_string),
        raw_name: column_name.to_string(),
    }
}

/// Last `_`-separated token when it is exactly four ASCII digits.
pub fn year_token(column_name: &str) -> Option<&str> {
    // `rsplit` always yields at least one item.
    let last = column_name.rsplit('_').next()?;
    (last.len() == 4 && last.bytes().all(|b| b.is_ascii_digit())).then_some(last)
}

/// All groups present among the table's metric columns, sorted.
pub fn discover_groups(table: &Table) -> Vec<Group> {
    table
        .columns
        .iter()
        .map(|c| classify(c).group)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// All year tokens present among the table's metric columns, sorted.
pub fn discover_years(table: &Table) -> Vec<String> {
    table
        .columns
        .iter()
        .filter_map(|c| year_token(c))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
