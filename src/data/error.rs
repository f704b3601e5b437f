use thiserror::Error;

/// The upload does not have the expected shape.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("required column 'dzien_zapisu' is missing")]
    MissingDateColumn,
    #[error("row {row}: '{value}' is not a valid date in 'dzien_zapisu'")]
    InvalidDate { row: usize, value: String },
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),
}

/// The upload could not be read at all.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("spreadsheet has no sheet named '{0}'")]
    MissingSheet(String),
    #[error("file has no header row")]
    Empty,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl LoadError {
    pub fn is_schema(&self) -> bool {
        matches!(self, LoadError::Schema(_))
    }
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        LoadError::Format(FormatError::Csv(e))
    }
}

impl From<calamine::Error> for LoadError {
    fn from(e: calamine::Error) -> Self {
        LoadError::Format(FormatError::Spreadsheet(e))
    }
}
