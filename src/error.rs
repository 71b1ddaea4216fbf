use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while reading the source table. All of them are fatal.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no draft table configured; pass --data or set SCHOOL_RANKINGS_DATA")]
    NoSource,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {path} contains no sheets")]
    NoSheets { path: PathBuf },

    #[error("unsupported data file {path}; expected .csv or a spreadsheet workbook")]
    UnsupportedFormat { path: PathBuf },

    #[error("required column '{column}' not found in {origin}")]
    MissingColumn { column: &'static str, origin: String },

    #[error("invalid Year value '{value}' on row {row} of {origin}")]
    InvalidYear {
        row: usize,
        value: String,
        origin: String,
    },
}

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("invalid goal selection '{0}'; expected one of: Max Salary, Best CAV, Most Picks")]
    InvalidGoal(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidGoal,
    LoadError,
    InternalError,
}

/// Failure payload handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "errorKind")]
    pub error_kind: ErrorKind,
    pub message: String,
}

impl RankingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RankingError::InvalidGoal(_) => ErrorKind::InvalidGoal,
            RankingError::Load(_) => ErrorKind::LoadError,
            RankingError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Internal causes are logged here and replaced by a generic message.
    pub fn response(&self) -> ErrorResponse {
        let message = match self {
            RankingError::Internal(cause) => {
                tracing::error!(%cause, "ranking request failed");
                "an internal error occurred while ranking schools".to_string()
            }
            other => other.to_string(),
        };
        ErrorResponse {
            error_kind: self.kind(),
            message,
        }
    }
}
