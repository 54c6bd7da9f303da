//! Error taxonomy for the comparison engine.
//!
//! Whole-workbook failures (`Io`, `Workbook`, `Write`, `Config`) abort the run.
//! `MissingKeyColumn` and `DuplicateKey` are recovered per sheet by the
//! orchestrator, which substitutes a placeholder report.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Which of the two compared workbooks an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Old => f.write_str("old"),
            Side::New => f.write_str("new"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to read workbook {path:?}: {message}")]
    Workbook { path: PathBuf, message: String },
    #[error("Sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },
    #[error("key column '{column}' not found in {side} workbook (sheet '{sheet}')")]
    MissingKeyColumn {
        sheet: String,
        column: String,
        side: Side,
    },
    #[error("duplicate key(s) in {side} workbook (sheet '{sheet}'): {}", .keys.join(", "))]
    DuplicateKey {
        sheet: String,
        side: Side,
        keys: Vec<String>,
    },
    #[error("Unable to write report {path:?}: {message}")]
    Write { path: PathBuf, message: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DiffError {
    /// Errors the orchestrator converts into a placeholder report instead of
    /// aborting the run.
    pub fn is_sheet_recoverable(&self) -> bool {
        matches!(
            self,
            DiffError::MissingKeyColumn { .. } | DiffError::DuplicateKey { .. }
        )
    }
}

pub type DiffResult<T> = std::result::Result<T, DiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_message_lists_keys() {
        let err = DiffError::DuplicateKey {
            sheet: "Inputs".into(),
            side: Side::Old,
            keys: vec!["IO1".into(), "IO7".into()],
        };
        assert_eq!(
            err.to_string(),
            "duplicate key(s) in old workbook (sheet 'Inputs'): IO1, IO7"
        );
        assert!(err.is_sheet_recoverable());
    }

    #[test]
    fn config_errors_abort_the_run() {
        assert!(!DiffError::Config("bad".into()).is_sheet_recoverable());
        let missing = DiffError::MissingKeyColumn {
            sheet: "Inputs".into(),
            column: "Test ID".into(),
            side: Side::New,
        };
        assert_eq!(
            missing.to_string(),
            "key column 'Test ID' not found in new workbook (sheet 'Inputs')"
        );
    }
}
