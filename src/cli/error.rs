use crate::application::LibraryError;
use crate::config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the command-line layer
///
/// Wraps application errors and maps every kind to a message and an exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("Please provide at least one search criteria")]
    MissingSearchCriteria,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Connect(String),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code
    ///
    /// - 1: not found or lending rule violation
    /// - 2: invalid input
    /// - 3: database, configuration or output failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Library(err) => match err {
                LibraryError::BookNotFound { .. }
                | LibraryError::MemberNotFound { .. }
                | LibraryError::BookUnavailable { .. }
                | LibraryError::BookNotBorrowed { .. } => 1,
                LibraryError::Validation(_) => 2,
                LibraryError::DatabaseError { .. } => 3,
            },
            CliError::MissingSearchCriteria => 2,
            CliError::Config(_) | CliError::Connect(_) | CliError::Io(_) | CliError::Json(_) => 3,
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::Library(err) => match err {
                LibraryError::BookNotFound { .. } => "BOOK_NOT_FOUND",
                LibraryError::MemberNotFound { .. } => "MEMBER_NOT_FOUND",
                LibraryError::BookUnavailable { .. } => "BOOK_UNAVAILABLE",
                LibraryError::BookNotBorrowed { .. } => "BOOK_NOT_BORROWED",
                LibraryError::DatabaseError { .. } => "DATABASE_ERROR",
                LibraryError::Validation(_) => "VALIDATION_ERROR",
            },
            CliError::MissingSearchCriteria => "MISSING_SEARCH_CRITERIA",
            CliError::Config(_) => "CONFIG_ERROR",
            CliError::Connect(_) => "DATABASE_ERROR",
            CliError::Io(_) | CliError::Json(_) => "OUTPUT_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookId, MemberId, ValidationError};

    #[test]
    fn test_business_errors_exit_with_one() {
        let err = CliError::from(LibraryError::BookNotBorrowed {
            book_id: BookId::from_i64(1),
            member_id: MemberId::from_i64(1),
        });
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.kind(), "BOOK_NOT_BORROWED");
        assert_eq!(err.to_string(), "Book 1 is not borrowed by member 1");
    }

    #[test]
    fn test_validation_errors_exit_with_two() {
        let err = CliError::from(LibraryError::from(ValidationError::EmptyTitle));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Book title is required");
    }

    #[test]
    fn test_database_errors_exit_with_three() {
        let err = CliError::from(LibraryError::DatabaseError {
            message: "disk I/O error".to_string(),
        });
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "Database error: disk I/O error");
    }

    #[test]
    fn test_unavailable_message_quotes_title() {
        let err = CliError::from(LibraryError::BookUnavailable {
            book_id: BookId::from_i64(4),
            title: "Dune".to_string(),
        });
        assert_eq!(err.to_string(), "Book \"Dune\" (ID: 4) is not available");
    }
}
