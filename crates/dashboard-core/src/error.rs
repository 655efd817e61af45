use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the registration dashboard pipeline.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from a CSV header.
    #[error("Missing required column `{column}` in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// The data root (or a directory beneath it) could not be listed.
    #[error("Could not read data directory {path}: {message}")]
    DirectoryUnreadable { path: PathBuf, message: String },

    /// A filter specification is internally inconsistent.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = DashboardError::FileRead {
            path: PathBuf::from("/data/2023/2023-JAN.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("2023-JAN.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = DashboardError::MissingColumn {
            path: PathBuf::from("/data/2023/2023-FEB.csv"),
            column: "3W".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required column `3W` in /data/2023/2023-FEB.csv"
        );
    }

    #[test]
    fn test_error_display_directory_unreadable() {
        let err = DashboardError::DirectoryUnreadable {
            path: PathBuf::from("/missing"),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not read data directory /missing: permission denied"
        );
    }

    #[test]
    fn test_error_display_invalid_filter() {
        let err = DashboardError::InvalidFilter("month 13 is out of range".to_string());
        assert_eq!(err.to_string(), "Invalid filter: month 13 is out of range");
    }

    #[test]
    fn test_error_display_config() {
        let err = DashboardError::Config("unknown category `5W`".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown category `5W`");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DashboardError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }
}
