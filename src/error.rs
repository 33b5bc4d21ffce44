use std::fmt;

use thiserror::Error;

/// Why an uploaded file was refused before any decoding was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidType { extension: String },
    TooLarge { size: u64, limit: u64 },
}

impl RejectReason {
    /// Stable reason code reported alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidType { .. } => "file-invalid-type",
            Self::TooLarge { .. } => "file-too-large",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidType { extension } if extension.is_empty() => {
                write!(f, "please upload an Excel or CSV file (.xlsx, .xls, .csv)")
            }
            Self::InvalidType { extension } => write!(
                f,
                "'.{extension}' is not supported; please upload an Excel or CSV file (.xlsx, .xls, .csv)"
            ),
            Self::TooLarge { size, limit } => write!(
                f,
                "file size {} exceeds the {} limit",
                crate::fmt::format_bytes(*size),
                crate::fmt::format_bytes(*limit)
            ),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("could not parse the file as a spreadsheet or CSV: {0}")]
    Unreadable(String),

    #[error("the workbook contains no sheets")]
    NoSheet,

    #[error("the file contains no data")]
    EmptySheet,
}

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File rejected ({code}): {0}", code = .0.code())]
    FileRejected(RejectReason),

    #[error("Failed to read spreadsheet: {0}")]
    Decode(#[from] DecodeError),

    #[error("Import blocked: {invalid} row(s) are missing required fields")]
    CommitBlocked { invalid: usize },

    #[error("An import is already in progress")]
    CommitInProgress,

    #[error("Nothing to import: no records are loaded")]
    NothingToImport,

    #[error("Could not reach the student store: {0}")]
    Connection(String),

    #[error("Batch {number} was rejected after importing {imported} of {total}: {detail}", number = .batch_index + 1)]
    BatchInsert {
        batch_index: usize,
        imported: usize,
        total: usize,
        detail: String,
    },

    #[error("'{file}' has already been imported (use --allow-duplicate to import it again)")]
    DuplicateImport { file: String },

    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
