use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for store operations.
///
/// Each kind names one category of failure so callers can branch on it
/// without parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use memstore::errors::{StoreError, ErrorKind, StoreResult};
///
/// fn example() -> StoreResult<()> {
///     Err(StoreError::new("Model not found", ErrorKind::ModelNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Validation Errors - raised before any document is scanned
    /// Generic validation error
    ValidationError,
    /// Malformed where clause or operator value
    FilterError,
    /// Geographic input could not be turned into a valid point
    InvalidGeoPoint,
    /// An order clause carries an unrecognized direction
    InvalidSortOrder,

    // ID and Identity Errors
    /// The provided ID is missing or invalid
    InvalidId,
    /// The requested document does not exist
    NotFound,
    /// A document with the same id already exists
    DuplicateEntry,

    // Model Errors
    /// The model is not attached to this store
    ModelNotFound,
    /// Error during collection (re)initialization
    MigrationError,

    // IO and Storage Errors
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// Error encoding or decoding data
    EncodingError,
    /// The backing destination could not be written
    DurabilityError,
    /// Store has already been closed
    StoreAlreadyClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::InvalidGeoPoint => write!(f, "Invalid geo point"),
            ErrorKind::InvalidSortOrder => write!(f, "Invalid sort order"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::DuplicateEntry => write!(f, "Duplicate entry"),
            ErrorKind::ModelNotFound => write!(f, "Model not found"),
            ErrorKind::MigrationError => write!(f, "Migration error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::DurabilityError => write!(f, "Durability error"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

impl ErrorKind {
    /// Returns `true` for the synchronous validation failures that abort a
    /// request before any data is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::ValidationError
                | ErrorKind::FilterError
                | ErrorKind::InvalidGeoPoint
                | ErrorKind::InvalidSortOrder
        )
    }
}

/// Custom store error type.
///
/// `StoreError` carries a message, an [ErrorKind], an optional cause and a
/// backtrace captured at construction.
///
/// # Examples
///
/// ```rust,ignore
/// use memstore::errors::{StoreError, ErrorKind};
///
/// let cause = StoreError::new("disk is full", ErrorKind::IOError);
/// let err = StoreError::new_with_cause("flush failed", ErrorKind::DurabilityError, cause);
/// ```
#[derive(Clone)]
pub struct StoreError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StoreError>>,
    backtrace: Atomic<Backtrace>,
}

impl StoreError {
    /// Creates a new `StoreError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `StoreError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StoreError) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StoreError> {
        self.cause.as_deref()
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        StoreError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<regex::Error> for StoreError {
    fn from(err: regex::Error) -> Self {
        StoreError::new(&format!("Invalid regular expression: {}", err), ErrorKind::FilterError)
    }
}

impl From<chrono::ParseError> for StoreError {
    fn from(err: chrono::ParseError) -> Self {
        StoreError::new(&format!("Date parsing error: {}", err), ErrorKind::ValidationError)
    }
}

impl From<String> for StoreError {
    fn from(msg: String) -> Self {
        StoreError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for StoreError {
    fn from(msg: &str) -> Self {
        StoreError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_new_creates_error() {
        let error = StoreError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message, "An error occurred");
        assert_eq!(error.error_kind, ErrorKind::IOError);
        assert!(error.cause.is_none());
    }

    #[test]
    fn store_error_new_with_cause_creates_error() {
        let error = StoreError::new_with_cause(
            "flush failed",
            ErrorKind::DurabilityError,
            StoreError::new("disk full", ErrorKind::IOError),
        );
        assert_eq!(error.kind(), &ErrorKind::DurabilityError);
        assert_eq!(error.cause().map(|c| c.message()), Some("disk full"));
    }

    #[test]
    fn store_error_display_formats_message_only() {
        let error = StoreError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(format!("{}", error), "An error occurred");
    }

    #[test]
    fn store_error_debug_formats_with_cause() {
        let error = StoreError::new_with_cause(
            "outer",
            ErrorKind::IOError,
            StoreError::new("inner", ErrorKind::IOError),
        );
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("outer"));
        assert!(formatted.contains("Caused by:"));
    }

    #[test]
    fn store_error_source_returns_cause() {
        let error = StoreError::new_with_cause(
            "outer",
            ErrorKind::IOError,
            StoreError::new("inner", ErrorKind::IOError),
        );
        assert!(error.source().is_some());
        assert!(StoreError::new("alone", ErrorKind::IOError).source().is_none());
    }

    #[test]
    fn io_error_kind_is_mapped() {
        let err: StoreError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), &ErrorKind::FileNotFound);

        let err: StoreError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(err.kind(), &ErrorKind::PermissionDenied);

        let err: StoreError = std::io::Error::other("boom").into();
        assert_eq!(err.kind(), &ErrorKind::IOError);
    }

    #[test]
    fn json_error_is_encoding_error() {
        let err: StoreError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn validation_kinds() {
        assert!(ErrorKind::InvalidGeoPoint.is_validation());
        assert!(ErrorKind::InvalidSortOrder.is_validation());
        assert!(ErrorKind::FilterError.is_validation());
        assert!(!ErrorKind::NotFound.is_validation());
        assert!(!ErrorKind::DurabilityError.is_validation());
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::DuplicateEntry.to_string(), "Duplicate entry");
        assert_eq!(ErrorKind::ModelNotFound.to_string(), "Model not found");
    }
}
